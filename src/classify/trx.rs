//! MSTest `.trx` signature.

use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::SystemTime;

use regex::Regex;

static TEST_RUN_ROOT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A(?:<\?[^?]*\?>\s*)?<TestRun").expect("signature pattern is a valid regex")
});

/// Returns whether the text is a Visual Studio test results document.
pub fn is_test_run(text: &str) -> bool {
    TEST_RUN_ROOT.is_match(text)
}

/// One MSTest results file.
///
/// Only a single `.trx` is ever uploaded, so the modification time is kept
/// to pick the newest one at composition time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrxReport {
    pub path: PathBuf,
    pub content: String,
    pub modified: Option<SystemTime>,
}
