//! Candidate file selection.
//!
//! Produces the set of files the classifier looks at, either by walking a
//! root directory or from an explicit list supplied by the caller.
//!
//! # Matching
//!
//! In walk mode every regular file is *scanned*. A scanned file becomes a
//! *candidate* when its path relative to the current working directory, or
//! its absolute path, matches any include glob and neither form matches an
//! exclude glob. Globs are shell-style and `*` crosses directory separators,
//! so `*.xml` matches `build/reports/TEST-foo.xml`.
//!
//! Directories whose name starts with `.git` (`.git`, `.github`, ...) are
//! pruned from the walk.
//!
//! In list mode the globs are bypassed; every listed path must exist as a
//! regular file.

use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::{DirEntry, WalkDir};

/// Include patterns used when neither the command line nor the configuration
/// file provides any.
pub const DEFAULT_INCLUDE: &[&str] = &["*.xml", "*.json", "*.trx", "*.tap"];

/// Result type for selection operations.
pub type SelectResult<T> = Result<T, SelectError>;

/// Errors that abort file selection.
///
/// All of these are fatal: nothing is classified when selection fails.
#[derive(Debug, thiserror::Error)]
pub enum SelectError {
    /// A file named in an explicit file list does not exist or is not a
    /// regular file.
    #[error("Could not find file '{}'", .0.display())]
    MissingFile(PathBuf),

    /// The directory to walk does not exist.
    #[error("Root directory does not exist: {}", .0.display())]
    MissingRoot(PathBuf),

    /// An include or exclude pattern is not a valid glob.
    #[error("Invalid glob pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// The current working directory could not be determined.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where candidate files come from.
#[derive(Debug, Clone)]
pub enum Source {
    /// Recursively walk this directory.
    Walk(PathBuf),
    /// Use exactly these files, bypassing include/exclude.
    Files(Vec<PathBuf>),
}

/// Outcome of selection.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Every file seen, before include/exclude filtering, as absolute paths.
    ///
    /// Some envelopes list these as a provenance trail.
    pub scanned: Vec<PathBuf>,

    /// Files that passed filtering, in walk (or list) order.
    pub candidates: Vec<PathBuf>,
}

/// Applies include/exclude globs to a directory walk or an explicit list.
pub struct FileSelector {
    include: GlobSet,
    exclude: GlobSet,
    cwd: PathBuf,
}

impl FileSelector {
    /// Builds a selector relative to the process working directory.
    ///
    /// An empty `include` list falls back to [`DEFAULT_INCLUDE`].
    pub fn new(include: &[String], exclude: &[String]) -> SelectResult<Self> {
        let cwd = std::env::current_dir()?;
        Self::with_cwd(include, exclude, cwd)
    }

    /// Builds a selector that resolves relative paths against `cwd`.
    pub fn with_cwd(
        include: &[String],
        exclude: &[String],
        cwd: impl Into<PathBuf>,
    ) -> SelectResult<Self> {
        let include = if include.is_empty() {
            build_globset(DEFAULT_INCLUDE.iter().copied())?
        } else {
            build_globset(include.iter().map(String::as_str))?
        };
        let exclude = build_globset(exclude.iter().map(String::as_str))?;

        Ok(Self {
            include,
            exclude,
            cwd: normalize(&cwd.into()),
        })
    }

    /// Returns whether an absolute path passes the include/exclude filter.
    pub fn matches(&self, abs_path: &Path) -> bool {
        let relative = relative_to(abs_path, &self.cwd);

        let included = self.include.is_match(&relative) || self.include.is_match(abs_path);
        if !included {
            return false;
        }

        !(self.exclude.is_match(&relative) || self.exclude.is_match(abs_path))
    }

    /// Path of `abs_path` relative to the working directory.
    pub fn relative(&self, abs_path: &Path) -> PathBuf {
        relative_to(abs_path, &self.cwd)
    }

    /// Runs selection over the given source.
    pub fn select(&self, source: &Source) -> SelectResult<Selection> {
        match source {
            Source::Walk(root) => self.walk(root),
            Source::Files(files) => self.list(files),
        }
    }

    fn walk(&self, root: &Path) -> SelectResult<Selection> {
        let root = normalize(&self.cwd.join(root));
        if !root.is_dir() {
            return Err(SelectError::MissingRoot(root));
        }

        let mut selection = Selection::default();

        let walker = WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_vcs_dir(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable path: {}", e);
                    continue;
                }
            };

            if entry.file_type().is_dir() || !entry.path().is_file() {
                continue;
            }

            let path = entry.into_path();
            if self.matches(&path) {
                selection.candidates.push(path.clone());
            } else {
                tracing::debug!("Not included: {}", path.display());
            }
            selection.scanned.push(path);
        }

        tracing::debug!(
            "Scanned {} files under {}, {} selected",
            selection.scanned.len(),
            root.display(),
            selection.candidates.len()
        );

        Ok(selection)
    }

    fn list(&self, files: &[PathBuf]) -> SelectResult<Selection> {
        let mut selection = Selection::default();

        for file in files {
            let abs = normalize(&self.cwd.join(file));
            if !abs.is_file() {
                return Err(SelectError::MissingFile(file.clone()));
            }
            selection.scanned.push(abs.clone());
            selection.candidates.push(abs);
        }

        Ok(selection)
    }
}

fn build_globset<'a>(patterns: impl IntoIterator<Item = &'a str>) -> SelectResult<GlobSet> {
    let patterns: Vec<&str> = patterns.into_iter().collect();
    let mut builder = GlobSetBuilder::new();
    for &pattern in &patterns {
        let glob = Glob::new(pattern).map_err(|source| SelectError::InvalidGlob {
            pattern: pattern.to_string(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| SelectError::InvalidGlob {
        pattern: patterns.join(", "),
        source,
    })
}

fn is_vcs_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_string_lossy().starts_with(".git")
}

/// Lexically resolves `.` and `..` components without touching the
/// filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Lexical equivalent of `os.path.relpath`: may climb out of `base` with
/// `..` components.
fn relative_to(path: &Path, base: &Path) -> PathBuf {
    let path_parts: Vec<Component> = path.components().collect();
    let base_parts: Vec<Component> = base.components().collect();

    let common = path_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..base_parts.len() {
        out.push("..");
    }
    for part in &path_parts[common..] {
        out.push(part);
    }

    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}
