//! Content-signature classification of candidate files.
//!
//! Each decoded file is routed by its (lower-cased) extension to a family of
//! signature rules and lands in at most one bucket of a [`Classification`].
//! Filenames are never inspected beyond the extension.
//!
//! | Extension | Rules | Buckets |
//! |-----------|-------|---------|
//! | `.xml` | [`xml::XML_RULES`], first match wins | boost, qtest, criterion, junit, testng, bandit, xunit, catch, testunit, nunit, xunitnet, doctest |
//! | `.json` | [`json::classify`] | go-test, rspec, mocha |
//! | `.trx` | [`trx::is_test_run`] | mstest |
//! | `.tap` | [`tap::classify`] | tap (ava counted separately) |
//!
//! Independently of the verdict, every decoded file is appended to
//! [`Classification::complete_contents`] for formats that have no structural
//! signature and can only be chosen explicitly.

pub mod json;
pub mod tap;
pub mod trx;
pub mod xml;

use serde_json::Value;

use crate::decode::CandidateFile;

use self::json::JsonMatch;
use self::tap::TapFlavor;
pub use self::trx::TrxReport;
use self::xml::XmlBucket;

/// All buckets produced by one classification pass.
///
/// Buckets are append-only and keep the order in which files were
/// classified. phpunit, pytest and ava are counters: their fragments live in
/// the `xunit` and `tap` buckets respectively.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub boost: Vec<String>,
    pub qtest: Vec<String>,
    pub criterion: Vec<String>,
    pub junit: Vec<String>,
    pub testng: Vec<String>,
    pub bandit: Vec<String>,
    pub xunit: Vec<String>,
    pub phpunit: usize,
    pub pytest: usize,
    pub catch: Vec<String>,
    /// No signature fills this bucket; it is only composed when cxxtest is
    /// chosen explicitly.
    pub cxxtest: Vec<String>,
    pub testunit: Vec<String>,
    pub nunit: Vec<String>,
    pub xunitnet: Vec<String>,
    pub doctest: Vec<String>,
    /// Flattened `go test -json` lines from every matching file.
    pub go_test: Vec<Value>,
    pub rspec: Vec<Value>,
    pub mocha: Vec<Value>,
    pub mstest: Vec<TrxReport>,
    pub tap: Vec<String>,
    pub ava: usize,
    /// Text of every decoded candidate, matched or not.
    pub complete_contents: Vec<String>,
}

impl Classification {
    /// Creates an empty classification.
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies every file in order.
    pub fn from_files<'a>(files: impl IntoIterator<Item = &'a CandidateFile>) -> Self {
        let mut classification = Self::new();
        for file in files {
            classification.classify(file);
        }
        classification
    }

    /// Classifies a single file, returning the label of the bucket that
    /// claimed it.
    ///
    /// Files without decoded text are skipped entirely.
    pub fn classify(&mut self, file: &CandidateFile) -> Option<&'static str> {
        let text = file.text.as_deref()?;
        self.complete_contents.push(text.to_string());

        let label = match file.extension.as_str() {
            ".xml" => {
                let bucket = xml::classify(text)?;
                self.add_xml(bucket, text);
                bucket.label()
            }
            ".json" => {
                let matched = json::classify(text)?;
                let label = matched.label();
                self.add_json(matched);
                label
            }
            ".trx" => {
                if !trx::is_test_run(text) {
                    return None;
                }
                self.mstest.push(TrxReport {
                    path: file.path.clone(),
                    content: text.to_string(),
                    modified: file.modified,
                });
                "MsTest"
            }
            ".tap" => {
                let flavor = tap::classify(text)?;
                if flavor == TapFlavor::Ava {
                    self.ava += 1;
                }
                self.tap.push(text.to_string());
                flavor.label()
            }
            _ => return None,
        };

        tracing::info!("Found {}, looks like {}", file.relative.display(), label);
        Some(label)
    }

    /// Size of every bucket and counter, keyed by framework name.
    pub fn counts(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("testng", self.testng.len()),
            ("junit", self.junit.len()),
            ("bandit", self.bandit.len()),
            ("phpunit", self.phpunit),
            ("pytest", self.pytest),
            ("xunit", self.xunit.len()),
            ("boost", self.boost.len()),
            ("criterion", self.criterion.len()),
            ("catch", self.catch.len()),
            ("cxxtest", self.cxxtest.len()),
            ("qtest", self.qtest.len()),
            ("go-test", self.go_test.len()),
            ("testunit", self.testunit.len()),
            ("mstest", self.mstest.len()),
            ("nunit", self.nunit.len()),
            ("xunitnet", self.xunitnet.len()),
            ("rspec", self.rspec.len()),
            ("mocha", self.mocha.len()),
            ("ava", self.ava),
            ("tap", self.tap.len()),
            ("doctest", self.doctest.len()),
        ]
    }

    fn add_xml(&mut self, bucket: XmlBucket, text: &str) {
        let content = text.to_string();
        match bucket {
            XmlBucket::Boost => self.boost.push(content),
            XmlBucket::QTest => self.qtest.push(content),
            XmlBucket::Criterion => self.criterion.push(content),
            XmlBucket::JUnit => self.junit.push(content),
            XmlBucket::TestNg => self.testng.push(content),
            XmlBucket::Bandit => self.bandit.push(content),
            XmlBucket::PhpUnit => {
                self.phpunit += 1;
                self.xunit.push(content);
            }
            XmlBucket::PyTest => {
                self.pytest += 1;
                self.xunit.push(content);
            }
            XmlBucket::XUnit => self.xunit.push(content),
            XmlBucket::Catch => self.catch.push(content),
            XmlBucket::TestUnit => self.testunit.push(content),
            XmlBucket::NUnit => self.nunit.push(content),
            XmlBucket::XUnitNet => self.xunitnet.push(content),
            XmlBucket::Doctest => self.doctest.push(content),
        }
    }

    fn add_json(&mut self, matched: JsonMatch) {
        match matched {
            JsonMatch::GoTest(lines) => self.go_test.extend(lines),
            JsonMatch::RSpec(document) => self.rspec.push(document),
            JsonMatch::Mocha(document) => self.mocha.push(document),
        }
    }
}
