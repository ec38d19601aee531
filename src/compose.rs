//! Upload payload composition.
//!
//! Merges the fragments of the winning framework into the single body the
//! reporting service expects for that framework:
//!
//! - XML formats: fragments concatenated inside one synthetic `<root>`
//!   element. junit and xunit additionally list every scanned file as
//!   `<file>` elements.
//! - rspec, mocha: a JSON array of the parsed documents.
//! - go-test: `{"files": [...], "test_data": [...]}`.
//! - TAP family and unity: fragments joined by newlines.
//! - mstest: the newest `.trx` verbatim.
//!
//! A framework with no fragments, or whose trimmed body is empty, has no test
//! data and composition fails.

use std::borrow::Cow;
use std::path::PathBuf;

use quick_xml::escape::escape;
use serde::Serialize;

use crate::classify::{Classification, TrxReport};
use crate::framework::Framework;

/// `Content-Type` values used by payloads.
pub mod content_type {
    pub const XML: &str = "text/xml";
    pub const JSON: &str = "application/json";
    pub const PLAIN: &str = "text/plain";
}

/// Result type for composition.
pub type ComposeResult<T> = Result<T, ComposeError>;

/// Errors that can occur while composing a payload.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    /// The winning framework's envelope is empty after trimming.
    #[error("No test data to upload.")]
    NoTestData { framework: Framework },

    /// JSON fragments could not be serialized.
    #[error("Failed to serialize {framework} payload: {source}")]
    Serialize {
        framework: Framework,
        #[source]
        source: serde_json::Error,
    },
}

/// A composed upload body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub framework: Framework,
    pub content_type: &'static str,
    /// Whitespace-trimmed, never empty.
    pub body: String,
    /// Run name used when the caller does not supply one.
    pub default_run_name: &'static str,
}

#[derive(Serialize)]
struct GoTestBody<'a> {
    files: Vec<Cow<'a, str>>,
    test_data: &'a [serde_json::Value],
}

/// Composes the payload for `framework`.
///
/// `scanned` lists every file seen during selection; it feeds the provenance
/// trail of junit/xunit and the `files` field of go-test.
pub fn compose(
    framework: Framework,
    classification: &Classification,
    scanned: &[PathBuf],
) -> ComposeResult<Payload> {
    let c = classification;
    let no_data = || ComposeError::NoTestData { framework };

    let (content_type, body) = match framework {
        Framework::TestNg => (content_type::XML, wrap_xml(&[&c.testng], None)),
        Framework::JUnit | Framework::XUnit => (
            content_type::XML,
            wrap_xml(&[&c.xunit, &c.junit], Some(scanned)),
        ),
        Framework::Bandit => (content_type::XML, wrap_xml(&[&c.bandit], None)),
        Framework::Boost => (content_type::XML, wrap_xml(&[&c.boost], None)),
        Framework::Criterion => (content_type::XML, wrap_xml(&[&c.criterion], None)),
        Framework::Catch => (content_type::XML, wrap_xml(&[&c.catch], None)),
        Framework::Doctest => (content_type::XML, wrap_xml(&[&c.doctest], None)),
        Framework::CxxTest => (content_type::XML, wrap_xml(&[&c.cxxtest, &c.xunit], None)),
        Framework::QTest => (content_type::XML, wrap_xml(&[&c.qtest], None)),
        Framework::TestUnit => (content_type::XML, wrap_xml(&[&c.testunit], None)),
        Framework::XUnitNet => (content_type::XML, wrap_xml(&[&c.xunitnet], None)),
        Framework::NUnit => (content_type::XML, wrap_xml(&[&c.nunit], None)),
        Framework::CMocka
        | Framework::CppUTest
        | Framework::Minitest
        | Framework::Cute
        | Framework::GTest
        | Framework::PhpUnit
        | Framework::PyTest
        | Framework::PyUnit => (content_type::XML, wrap_xml(&[&c.xunit], None)),
        Framework::Unity => (content_type::PLAIN, Some(c.complete_contents.join("\n"))),
        Framework::Ava | Framework::QUnit | Framework::Tap | Framework::Tape => {
            (content_type::PLAIN, Some(c.tap.join("\n")))
        }
        Framework::RSpec => (content_type::JSON, json_array(framework, &c.rspec)?),
        Framework::Mocha => (content_type::JSON, json_array(framework, &c.mocha)?),
        Framework::GoTest => {
            let body = if c.go_test.is_empty() {
                None
            } else {
                let body = GoTestBody {
                    files: scanned.iter().map(|p| p.to_string_lossy()).collect(),
                    test_data: &c.go_test,
                };
                Some(to_json(framework, &body)?)
            };
            (content_type::JSON, body)
        }
        Framework::MsTest => {
            let body = newest_trx(&c.mstest).map(|report| {
                tracing::info!("MSTest picked {}", report.path.display());
                report.content.clone()
            });
            (content_type::XML, body)
        }
    };

    let body = body.ok_or_else(no_data)?;
    let body = body.trim();
    if body.is_empty() {
        return Err(no_data());
    }

    Ok(Payload {
        framework,
        content_type,
        body: body.to_string(),
        default_run_name: framework.display_name(),
    })
}

/// Concatenates fragments inside `<root>`, optionally followed by one
/// `<file>` element per scanned path.
///
/// Returns `None` when every bucket is empty; the file list alone is not
/// test data.
fn wrap_xml(buckets: &[&Vec<String>], files: Option<&[PathBuf]>) -> Option<String> {
    if buckets.iter().all(|bucket| bucket.is_empty()) {
        return None;
    }

    let mut xml = String::from("<root>");
    for fragment in buckets.iter().flat_map(|bucket| bucket.iter()) {
        xml.push_str(fragment);
    }
    for file in files.unwrap_or_default() {
        let path = file.to_string_lossy();
        xml.push_str("\n    <file>");
        xml.push_str(&escape(path.as_ref()));
        xml.push_str("</file>");
    }
    xml.push_str("</root>");
    Some(xml)
}

fn json_array(
    framework: Framework,
    documents: &[serde_json::Value],
) -> ComposeResult<Option<String>> {
    if documents.is_empty() {
        return Ok(None);
    }
    to_json(framework, documents).map(Some)
}

fn to_json<T: Serialize + ?Sized>(framework: Framework, value: &T) -> ComposeResult<String> {
    serde_json::to_string(value).map_err(|source| ComposeError::Serialize { framework, source })
}

/// Newest report by modification time; the earliest seen wins a tie.
fn newest_trx(reports: &[TrxReport]) -> Option<&TrxReport> {
    let mut newest: Option<&TrxReport> = None;
    for report in reports {
        match newest {
            Some(current) if report.modified <= current.modified => {}
            _ => newest = Some(report),
        }
    }
    newest
}

/// Final run name for an upload.
///
/// An explicit name is used verbatim. Otherwise the default is suffixed with
/// the CI service, and the OS when known: `JUnit [travis-ci, linux]`.
pub fn run_name(
    default: &str,
    explicit: Option<&str>,
    service: Option<&str>,
    os_name: Option<&str>,
) -> String {
    if let Some(name) = explicit {
        return name.to_string();
    }

    match (service, os_name) {
        (Some(service), Some(os)) => format!("{} [{}, {}]", default, service, os),
        (Some(service), None) => format!("{} [{}]", default, service),
        _ => default.to_string(),
    }
}
