//! XML report signatures.
//!
//! Rules are tried top to bottom and the first one that matches claims the
//! file. Specific formats come before the generic xUnit rule so that, for
//! example, a Criterion report (which is also a `<testsuites>` document) is
//! never filed as plain xUnit.
//!
//! Every root-element pattern tolerates a leading `<?xml ...?>` declaration.

use std::sync::LazyLock;

use regex::Regex;

/// Bucket an XML file can be classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlBucket {
    Boost,
    QTest,
    Criterion,
    JUnit,
    TestNg,
    Bandit,
    /// xUnit-style report mentioning `.php`; stored with generic xUnit.
    PhpUnit,
    /// xUnit-style report mentioning `.py`; stored with generic xUnit.
    PyTest,
    XUnit,
    Catch,
    TestUnit,
    NUnit,
    XUnitNet,
    Doctest,
}

impl XmlBucket {
    /// Label used in "looks like ..." log lines.
    pub fn label(&self) -> &'static str {
        match self {
            XmlBucket::Boost => "boost.test",
            XmlBucket::QTest => "qtest",
            XmlBucket::Criterion => "criterion",
            XmlBucket::JUnit => "JUnit",
            XmlBucket::TestNg => "TestNG",
            XmlBucket::Bandit => "Bandit",
            XmlBucket::PhpUnit => "PHPUnit",
            XmlBucket::PyTest => "PyTest",
            XmlBucket::XUnit => "some xUnit",
            XmlBucket::Catch => "catch",
            XmlBucket::TestUnit => "TestUnit",
            XmlBucket::NUnit => "NUnit",
            XmlBucket::XUnitNet => "xUnit.net",
            XmlBucket::Doctest => "doctest",
        }
    }
}

/// A content signature for one XML dialect (or family of dialects).
pub struct SignatureRule {
    /// Short name for diagnostics.
    pub name: &'static str,

    /// Returns the claimed bucket, or `None` to pass the file on to the next
    /// rule.
    pub probe: fn(&str) -> Option<XmlBucket>,
}

/// Ordered XML rule table.
pub static XML_RULES: &[SignatureRule] = &[
    SignatureRule {
        name: "boost",
        probe: probe_boost,
    },
    SignatureRule {
        name: "qtest",
        probe: probe_qtest,
    },
    SignatureRule {
        name: "criterion",
        probe: probe_criterion,
    },
    SignatureRule {
        name: "xunit",
        probe: probe_xunit_family,
    },
    SignatureRule {
        name: "catch",
        probe: probe_catch,
    },
    SignatureRule {
        name: "testunit",
        probe: probe_testunit,
    },
    SignatureRule {
        name: "nunit",
        probe: probe_nunit,
    },
    SignatureRule {
        name: "xunitnet",
        probe: probe_xunitnet,
    },
    SignatureRule {
        name: "doctest",
        probe: probe_doctest,
    },
];

/// Classifies XML text by the first matching rule in [`XML_RULES`].
pub fn classify(text: &str) -> Option<XmlBucket> {
    XML_RULES.iter().find_map(|rule| (rule.probe)(text))
}

const DECL: &str = r"(?:<\?[^?]*\?>\s*)?";

fn anchored(pattern: &str) -> Regex {
    Regex::new(&format!(r"\A{}", pattern)).expect("signature pattern is a valid regex")
}

static BOOST_ROOT: LazyLock<Regex> =
    LazyLock::new(|| anchored(&format!(r"{DECL}<(?:TestResult|TestLog)>\s*<TestSuite")));

static QTEST_ROOT: LazyLock<Regex> = LazyLock::new(|| anchored(&format!(r"{DECL}<TestCase")));

static QT_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<qtversion>").expect("signature pattern is a valid regex"));

static CRITERION_ROOT: LazyLock<Regex> = LazyLock::new(|| {
    anchored(&format!(
        r#"{DECL}<!-- Tests compiled with Criterion v[0-9.]+ -->\s*<testsuites name="Criterion Tests""#
    ))
});

static XUNIT_ROOT: LazyLock<Regex> =
    LazyLock::new(|| anchored(&format!(r"{DECL}(?:<testsuites>\s*)?<testsuite[^>]")));

static CATCH_ROOT: LazyLock<Regex> =
    LazyLock::new(|| anchored(&format!(r"{DECL}<Catch\s+name=")));

static TESTUNIT_ROOT: LazyLock<Regex> =
    LazyLock::new(|| anchored(&format!(r"{DECL}<stream>\s*<ready-test-suite>")));

static NUNIT2_ROOT: LazyLock<Regex> = LazyLock::new(|| {
    anchored(&format!(
        r"{DECL}(?:<!--This file represents the results of running a test suite-->)?<test-results\s+name"
    ))
});

static NUNIT3_ROOT: LazyLock<Regex> =
    LazyLock::new(|| anchored(&format!(r#"{DECL}<test-run id="2""#)));

static XUNITNET_ROOT: LazyLock<Regex> =
    LazyLock::new(|| anchored(r"(?:<\?[^?]*\?>)?\s*<assemblies"));

static DOCTEST_ROOT: LazyLock<Regex> = LazyLock::new(|| anchored(r"(?:<\?[^?]*\?>)?\s*<doctest"));

const JAVA_VERSION: &str = "\"java.version\"";
const JUNIT_PACKAGES: &[&str] = &["org.junit", "org/junit", "org\\junit"];
const TESTNG_PACKAGES: &[&str] = &["org.testng", "org/testng", "org\\testng"];
const BANDIT_SUITE: &str = "<testsuite name=\"bandit\" tests=\"";

fn probe_boost(text: &str) -> Option<XmlBucket> {
    BOOST_ROOT.is_match(text).then_some(XmlBucket::Boost)
}

fn probe_qtest(text: &str) -> Option<XmlBucket> {
    (QTEST_ROOT.is_match(text) && QT_VERSION.is_match(text)).then_some(XmlBucket::QTest)
}

fn probe_criterion(text: &str) -> Option<XmlBucket> {
    CRITERION_ROOT
        .is_match(text)
        .then_some(XmlBucket::Criterion)
}

/// Generic `<testsuite>` documents, told apart by embedded markers.
///
/// The `.php` / `.py` checks are a weak heuristic: any file path with those
/// extensions, e.g. inside a stack trace, flips the verdict.
fn probe_xunit_family(text: &str) -> Option<XmlBucket> {
    if !XUNIT_ROOT.is_match(text) {
        return None;
    }

    let java = text.contains(JAVA_VERSION);
    let mentions = |needles: &[&str]| needles.iter().any(|n| text.contains(n));

    let bucket = if java && mentions(JUNIT_PACKAGES) {
        XmlBucket::JUnit
    } else if java && mentions(TESTNG_PACKAGES) {
        XmlBucket::TestNg
    } else if !java && text.contains(BANDIT_SUITE) {
        XmlBucket::Bandit
    } else if text.contains(".php") {
        XmlBucket::PhpUnit
    } else if text.contains(".py") {
        XmlBucket::PyTest
    } else {
        XmlBucket::XUnit
    };
    Some(bucket)
}

fn probe_catch(text: &str) -> Option<XmlBucket> {
    CATCH_ROOT.is_match(text).then_some(XmlBucket::Catch)
}

fn probe_testunit(text: &str) -> Option<XmlBucket> {
    TESTUNIT_ROOT.is_match(text).then_some(XmlBucket::TestUnit)
}

fn probe_nunit(text: &str) -> Option<XmlBucket> {
    (NUNIT2_ROOT.is_match(text) || NUNIT3_ROOT.is_match(text)).then_some(XmlBucket::NUnit)
}

fn probe_xunitnet(text: &str) -> Option<XmlBucket> {
    XUNITNET_ROOT.is_match(text).then_some(XmlBucket::XUnitNet)
}

fn probe_doctest(text: &str) -> Option<XmlBucket> {
    DOCTEST_ROOT.is_match(text).then_some(XmlBucket::Doctest)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

    #[test]
    fn test_boost_log() {
        let xml = "<TestLog><TestSuite name=\"Master\"></TestSuite></TestLog>";
        assert_eq!(classify(xml), Some(XmlBucket::Boost));
    }

    #[test]
    fn test_boost_result_with_declaration() {
        let xml = format!("{DECLARATION}<TestResult>\n  <TestSuite name=\"a\"/></TestResult>");
        assert_eq!(classify(&xml), Some(XmlBucket::Boost));
    }

    #[test]
    fn test_qtest_any_case_version_marker() {
        let upper = "<TestCase name=\"tst_foo\"><Environment><QtVersion>5.12</QtVersion>";
        let lower = "<TestCase name=\"tst_foo\"><qtversion>5.12</qtversion>";
        assert_eq!(classify(upper), Some(XmlBucket::QTest));
        assert_eq!(classify(lower), Some(XmlBucket::QTest));
    }

    #[test]
    fn test_testcase_without_qt_marker_is_unclassified() {
        assert_eq!(classify("<TestCase name=\"x\"></TestCase>"), None);
    }

    #[test]
    fn test_criterion_beats_generic_xunit() {
        let xml = format!(
            "{DECLARATION}<!-- Tests compiled with Criterion v2.3.3 -->\n\
             <testsuites name=\"Criterion Tests\" tests=\"1\">\n\
             <testsuite name=\"suite\" tests=\"1\"><testcase name=\"t\"/></testsuite>\n\
             </testsuites>"
        );
        assert_eq!(classify(&xml), Some(XmlBucket::Criterion));
    }

    #[test]
    fn test_generic_xunit() {
        let xml = "<testsuites><testsuite name=\"x\"><testcase name=\"t\"/></testsuite></testsuites>";
        assert_eq!(classify(xml), Some(XmlBucket::XUnit));
    }

    #[test]
    fn test_testsuites_with_attributes_is_xunit() {
        let xml = "<testsuites name=\"all\"><testsuite name=\"x\"/></testsuites>";
        assert_eq!(classify(xml), Some(XmlBucket::XUnit));
    }

    #[test]
    fn test_junit_needs_java_and_package() {
        let xml = "<testsuite name=\"FooTest\"><properties>\
                   <property name=\"java.version\" value=\"11\"/></properties>\
                   <testcase classname=\"org.junit.FooTest\" name=\"t\"/></testsuite>";
        assert_eq!(classify(xml), Some(XmlBucket::JUnit));
    }

    #[test]
    fn test_junit_windows_package_path() {
        let xml = "<testsuite name=\"a\"><property name=\"java.version\"/>at org\\junit\\Assert</testsuite>";
        assert_eq!(classify(xml), Some(XmlBucket::JUnit));
    }

    #[test]
    fn test_testng() {
        let xml = "<testsuite name=\"Suite\"><property name=\"java.version\" value=\"1.8\"/>\
                   <testcase classname=\"org.testng.Sample\" name=\"t\"/></testsuite>";
        assert_eq!(classify(xml), Some(XmlBucket::TestNg));
    }

    #[test]
    fn test_java_without_known_package_is_generic() {
        let xml = "<testsuite name=\"Suite\"><property name=\"java.version\"/></testsuite>";
        assert_eq!(classify(xml), Some(XmlBucket::XUnit));
    }

    #[test]
    fn test_bandit() {
        let xml = "<testsuite name=\"bandit\" tests=\"3\"><testcase name=\"B101\"/></testsuite>";
        assert_eq!(classify(xml), Some(XmlBucket::Bandit));
    }

    #[test]
    fn test_bandit_marker_ignored_for_java_reports() {
        let xml = "<testsuite name=\"bandit\" tests=\"3\"><property name=\"java.version\"/></testsuite>";
        assert_eq!(classify(xml), Some(XmlBucket::XUnit));
    }

    #[test]
    fn test_php_substring() {
        let xml = "<testsuites><testsuite name=\"Calc\" file=\"/src/CalcTest.php\"/></testsuites>";
        assert_eq!(classify(xml), Some(XmlBucket::PhpUnit));
    }

    #[test]
    fn test_py_substring() {
        let xml = "<testsuite name=\"pytest\"><testcase file=\"tests/test_a.py\"/></testsuite>";
        assert_eq!(classify(xml), Some(XmlBucket::PyTest));
    }

    #[test]
    fn test_php_checked_before_py() {
        let xml = "<testsuite name=\"x\">a.php b.py</testsuite>";
        assert_eq!(classify(xml), Some(XmlBucket::PhpUnit));
    }

    #[test]
    fn test_catch() {
        let xml = format!("{DECLARATION}<Catch name=\"tests\"><Group/></Catch>");
        assert_eq!(classify(&xml), Some(XmlBucket::Catch));
    }

    #[test]
    fn test_testunit() {
        let xml = "<stream>\n  <ready-test-suite><n-tests>3</n-tests></ready-test-suite></stream>";
        assert_eq!(classify(xml), Some(XmlBucket::TestUnit));
    }

    #[test]
    fn test_nunit2_with_comment() {
        let xml = format!(
            "{DECLARATION}<!--This file represents the results of running a test suite-->\
             <test-results name=\"a.dll\" total=\"1\"></test-results>"
        );
        assert_eq!(classify(&xml), Some(XmlBucket::NUnit));
    }

    #[test]
    fn test_nunit3() {
        let xml = "<test-run id=\"2\" testcasecount=\"4\"></test-run>";
        assert_eq!(classify(xml), Some(XmlBucket::NUnit));
    }

    #[test]
    fn test_nunit3_other_id_is_unclassified() {
        assert_eq!(classify("<test-run id=\"7\"></test-run>"), None);
    }

    #[test]
    fn test_xunitnet_allows_leading_whitespace() {
        let xml = "\n  <assemblies><assembly name=\"a.dll\"/></assemblies>";
        assert_eq!(classify(xml), Some(XmlBucket::XUnitNet));
    }

    #[test]
    fn test_doctest() {
        let xml = format!("{DECLARATION}<doctest binary=\"tests\"></doctest>");
        assert_eq!(classify(&xml), Some(XmlBucket::Doctest));
    }

    #[test]
    fn test_signature_must_be_at_root() {
        let xml = "<report><testsuite name=\"x\"/></report>";
        assert_eq!(classify(xml), None);
    }

    #[test]
    fn test_rule_order_is_stable() {
        let names: Vec<_> = XML_RULES.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![
                "boost",
                "qtest",
                "criterion",
                "xunit",
                "catch",
                "testunit",
                "nunit",
                "xunitnet",
                "doctest"
            ]
        );
    }
}
