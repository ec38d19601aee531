//! JSON report signatures.
//!
//! Two shapes are recognised: line-delimited JSON (one object per line, as
//! written by `go test -json`) and a single document (RSpec, Mocha). Parse
//! errors never propagate; they simply mean "not this format".

use serde_json::Value;

/// A JSON file claimed by one of the JSON signatures.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonMatch {
    /// Every line of a `go test -json` stream, in file order.
    GoTest(Vec<Value>),
    RSpec(Value),
    Mocha(Value),
}

impl JsonMatch {
    /// Label used in "looks like ..." log lines.
    pub fn label(&self) -> &'static str {
        match self {
            JsonMatch::GoTest(_) => "GoTest",
            JsonMatch::RSpec(_) => "RSpec",
            JsonMatch::Mocha(_) => "Mocha",
        }
    }
}

const GO_TEST_KEYS: &[&str] = &["Time", "Action", "Package"];
const RSPEC_KEYS: &[&str] = &["version", "examples", "summary", "summary_line"];
const MOCHA_KEYS: &[&str] = &["stats", "tests", "pending", "passes", "failures"];

/// Classifies JSON text.
pub fn classify(text: &str) -> Option<JsonMatch> {
    if !text.trim_start().starts_with(['{', '[']) {
        return None;
    }

    if let Some(lines) = parse_lines(text)
        && lines.first().is_some_and(|first| has_keys(first, GO_TEST_KEYS))
    {
        return Some(JsonMatch::GoTest(lines));
    }

    let document: Value = serde_json::from_str(text).ok()?;
    if has_keys(&document, RSPEC_KEYS) {
        Some(JsonMatch::RSpec(document))
    } else if has_keys(&document, MOCHA_KEYS) {
        Some(JsonMatch::Mocha(document))
    } else {
        None
    }
}

/// Parses each line as its own JSON value; any failure rejects the file.
fn parse_lines(text: &str) -> Option<Vec<Value>> {
    text.lines()
        .map(|line| serde_json::from_str(line).ok())
        .collect()
}

fn has_keys(value: &Value, keys: &[&str]) -> bool {
    value
        .as_object()
        .is_some_and(|object| keys.iter().all(|key| object.contains_key(*key)))
}
