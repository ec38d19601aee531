//! Byte-to-text decoding for candidate files.
//!
//! Signature rules only look at ASCII structure (tag names, JSON keys), so the
//! decoder reduces every file to ASCII, tolerating loss of anything else:
//!
//! 1. strict 7-bit ASCII
//! 2. strict UTF-8, dropping non-ASCII characters
//! 3. UTF-16 (BOM-directed, little-endian otherwise), dropping non-ASCII
//!    characters
//!
//! A file that survives none of these is reported and left out of every
//! bucket.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Encoding that successfully decoded a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Ascii,
    Utf8,
    Utf16,
}

/// Decodes raw bytes to ASCII text, trying each supported encoding in turn.
pub fn decode(bytes: &[u8]) -> Option<(String, Encoding)> {
    if bytes.is_ascii() {
        // Every byte is < 0x80, so this cannot fail.
        return std::str::from_utf8(bytes)
            .ok()
            .map(|s| (s.to_string(), Encoding::Ascii));
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return Some((keep_ascii(text.chars()), Encoding::Utf8));
    }

    decode_utf16(bytes).map(|text| (text, Encoding::Utf16))
}

fn decode_utf16(bytes: &[u8]) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }

    let (big_endian, body) = match bytes {
        [0xFE, 0xFF, rest @ ..] => (true, rest),
        [0xFF, 0xFE, rest @ ..] => (false, rest),
        _ => (false, bytes),
    };

    let units = body.chunks_exact(2).map(|pair| {
        if big_endian {
            u16::from_be_bytes([pair[0], pair[1]])
        } else {
            u16::from_le_bytes([pair[0], pair[1]])
        }
    });

    let chars: Result<Vec<char>, _> = char::decode_utf16(units).collect();
    chars.ok().map(|chars| keep_ascii(chars.into_iter()))
}

fn keep_ascii(chars: impl Iterator<Item = char>) -> String {
    chars.filter(char::is_ascii).collect()
}

/// A file selected for classification.
///
/// Built once from disk; the raw bytes are consumed by the decoder and only
/// the decoded text is kept.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    /// Absolute path.
    pub path: PathBuf,

    /// Path relative to the working directory.
    pub relative: PathBuf,

    /// Lower-cased extension including the leading dot, e.g. `.xml`.
    /// Empty when the file has none.
    pub extension: String,

    /// Decoded text, or `None` when no encoding applied.
    pub text: Option<String>,

    /// Last modification time, if the platform reports one.
    pub modified: Option<SystemTime>,
}

impl CandidateFile {
    /// Reads and decodes a file.
    ///
    /// Never fails: an unreadable or undecodable file yields a candidate
    /// without text, and a warning is logged.
    pub fn load(path: &Path, relative: &Path) -> Self {
        let extension = path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
            .unwrap_or_default();

        let modified = std::fs::metadata(path).and_then(|m| m.modified()).ok();

        let text = match std::fs::read(path) {
            Ok(bytes) => match decode(&bytes) {
                Some((text, encoding)) => {
                    tracing::debug!("Decoded {} as {:?}", path.display(), encoding);
                    Some(text)
                }
                None => {
                    tracing::warn!(
                        "Can't figure out encoding of file {}, ignoring it",
                        path.display()
                    );
                    None
                }
            },
            Err(e) => {
                tracing::warn!("Can't read file {}, ignoring it: {}", path.display(), e);
                None
            }
        };

        Self {
            path: path.to_path_buf(),
            relative: relative.to_path_buf(),
            extension,
            text,
            modified,
        }
    }

    /// Builds a candidate from text already in memory.
    #[cfg(test)]
    pub(crate) fn from_text(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        let path = path.into();
        let extension = path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
            .unwrap_or_default();
        Self {
            relative: path.clone(),
            path,
            extension,
            text: Some(text.into()),
            modified: None,
        }
    }

    /// Sets the modification time.
    #[cfg(test)]
    pub(crate) fn with_modified(mut self, modified: SystemTime) -> Self {
        self.modified = Some(modified);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ascii() {
        let (text, encoding) = decode(b"<testsuite/>").unwrap();
        assert_eq!(text, "<testsuite/>");
        assert_eq!(encoding, Encoding::Ascii);
    }

    #[test]
    fn test_utf8_drops_non_ascii() {
        let (text, encoding) = decode("<name>caf\u{e9}</name>".as_bytes()).unwrap();
        assert_eq!(text, "<name>caf</name>");
        assert_eq!(encoding, Encoding::Utf8);
    }

    #[test]
    fn test_utf16_le_with_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "<TestRun>\u{e9}".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let (text, encoding) = decode(&bytes).unwrap();
        assert_eq!(text, "<TestRun>");
        assert_eq!(encoding, Encoding::Utf16);
    }

    #[test]
    fn test_utf16_without_bom_is_little_endian() {
        let bytes: Vec<u8> = "<TestRun>\u{e9}"
            .encode_utf16()
            .flat_map(u16::to_le_bytes)
            .collect();
        assert_eq!(
            decode(&bytes),
            Some(("<TestRun>".to_string(), Encoding::Utf16))
        );
    }

    #[test]
    fn test_utf16_be_with_bom() {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in "<TestRun>".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode(&bytes).unwrap().0, "<TestRun>");
    }

    #[test]
    fn test_undecodable() {
        // Invalid UTF-8 and an odd byte count rules out UTF-16.
        assert!(decode(&[0xC3, 0x28, 0x80]).is_none());
    }

    #[test]
    fn test_unpaired_surrogate_is_undecodable() {
        // 0xD800 followed by a non-surrogate, little-endian.
        assert!(decode(&[0xFF, 0xFE, 0x00, 0xD8, 0x41, 0x00]).is_none());
    }

    #[test]
    fn test_load_lowercases_extension() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("Results.XML");
        std::fs::write(&path, "<doctest/>").unwrap();

        let file = CandidateFile::load(&path, Path::new("Results.XML"));
        assert_eq!(file.extension, ".xml");
        assert_eq!(file.text.as_deref(), Some("<doctest/>"));
        assert!(file.modified.is_some());
    }

    #[test]
    fn test_load_undecodable_file_has_no_text() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.xml");
        std::fs::write(&path, [0xC3, 0x28, 0x80]).unwrap();

        let file = CandidateFile::load(&path, Path::new("bad.xml"));
        assert!(file.text.is_none());
    }
}
