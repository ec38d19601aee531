//! Test Anything Protocol signature.

use std::sync::LazyLock;

use regex::Regex;

static TAP_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\ATAP version \d+").expect("signature pattern is a valid regex"));

static AVA_CLI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ava[\\/]cli\.js").expect("signature pattern is a valid regex"));

/// Which producer a TAP stream appears to come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapFlavor {
    /// Written by the AVA test runner.
    Ava,
    /// Any other TAP producer.
    Generic,
}

impl TapFlavor {
    /// Label used in "looks like ..." log lines.
    pub fn label(&self) -> &'static str {
        match self {
            TapFlavor::Ava => "AVA",
            TapFlavor::Generic => "TAP",
        }
    }
}

/// Classifies a `.tap` file, or `None` if it lacks a `TAP version` header.
pub fn classify(text: &str) -> Option<TapFlavor> {
    if !TAP_HEADER.is_match(text) {
        return None;
    }

    if AVA_CLI.is_match(text) {
        Some(TapFlavor::Ava)
    } else {
        Some(TapFlavor::Generic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_tap() {
        let text = "TAP version 13\n1..1\nok 1 - adds\n";
        assert_eq!(classify(text), Some(TapFlavor::Generic));
    }

    #[test]
    fn test_ava_marker() {
        let text = "TAP version 13\n# node_modules/ava/cli.js\nok 1 - works\n";
        assert_eq!(classify(text), Some(TapFlavor::Ava));
    }

    #[test]
    fn test_ava_marker_windows_separator() {
        let text = "TAP version 13\n# node_modules\\ava\\cli.js\n";
        assert_eq!(classify(text), Some(TapFlavor::Ava));
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(classify("1..1\nok 1\n"), None);
        assert_eq!(classify("# TAP version 13\n"), None);
    }
}
