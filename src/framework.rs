//! Test framework identities.
//!
//! A [`Framework`] names the report format that ends up on the wire. Most
//! frameworks are produced by the resolver from classified files; a handful
//! (unity, gtest, cmocka, ...) have no distinctive signature of their own and
//! can only be chosen explicitly by the caller.
//!
//! | Name | Detected | Envelope |
//! |------|----------|----------|
//! | `junit`, `xunit`, `testng`, `bandit`, ... | yes | `<root>` XML |
//! | `rspec`, `mocha` | yes | JSON array |
//! | `go-test` | yes | `{files, test_data}` JSON |
//! | `tap`, `ava` | yes | newline-joined text |
//! | `unity`, `qunit`, `tape` | no | newline-joined text |
//! | `cmocka`, `cpputest`, `cute`, `gtest`, `minitest`, `pyunit` | no | `<root>` XML |

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// A unit-test framework whose reports can be uploaded.
///
/// Names follow the lowercase identifiers accepted on the command line and in
/// the `[upload]` section of the configuration file. `go` is accepted as an
/// alias of `go-test`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    Boost,
    #[value(name = "junit")]
    JUnit,
    #[value(name = "testng")]
    TestNg,
    #[value(name = "xunit")]
    XUnit,
    #[value(name = "cmocka")]
    CMocka,
    Unity,
    Criterion,
    Bandit,
    Catch,
    #[value(name = "cpputest")]
    CppUTest,
    Cute,
    #[value(name = "cxxtest")]
    CxxTest,
    #[value(name = "gtest")]
    GTest,
    #[value(name = "qtest")]
    QTest,
    #[value(name = "go-test", alias = "go")]
    #[serde(rename = "go-test", alias = "go")]
    GoTest,
    #[value(name = "testunit")]
    TestUnit,
    #[value(name = "rspec")]
    RSpec,
    Minitest,
    #[value(name = "mstest")]
    MsTest,
    #[value(name = "xunitnet")]
    XUnitNet,
    #[value(name = "nunit")]
    NUnit,
    #[value(name = "phpunit")]
    PhpUnit,
    #[value(name = "pytest")]
    PyTest,
    #[value(name = "pyunit")]
    PyUnit,
    Mocha,
    Ava,
    Tap,
    Tape,
    #[value(name = "qunit")]
    QUnit,
    Doctest,
}

impl Framework {
    /// The identifier sent to the reporting service as the `framework` query
    /// parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::Boost => "boost",
            Framework::JUnit => "junit",
            Framework::TestNg => "testng",
            Framework::XUnit => "xunit",
            Framework::CMocka => "cmocka",
            Framework::Unity => "unity",
            Framework::Criterion => "criterion",
            Framework::Bandit => "bandit",
            Framework::Catch => "catch",
            Framework::CppUTest => "cpputest",
            Framework::Cute => "cute",
            Framework::CxxTest => "cxxtest",
            Framework::GTest => "gtest",
            Framework::QTest => "qtest",
            Framework::GoTest => "go-test",
            Framework::TestUnit => "testunit",
            Framework::RSpec => "rspec",
            Framework::Minitest => "minitest",
            Framework::MsTest => "mstest",
            Framework::XUnitNet => "xunitnet",
            Framework::NUnit => "nunit",
            Framework::PhpUnit => "phpunit",
            Framework::PyTest => "pytest",
            Framework::PyUnit => "pyunit",
            Framework::Mocha => "mocha",
            Framework::Ava => "ava",
            Framework::Tap => "tap",
            Framework::Tape => "tape",
            Framework::QUnit => "qunit",
            Framework::Doctest => "doctest",
        }
    }

    /// Human-readable label used in log lines and as the default run name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Framework::Boost => "boost.test",
            Framework::JUnit => "JUnit",
            Framework::TestNg => "TestNG",
            Framework::XUnit => "xUnit",
            Framework::CMocka => "CMocka",
            Framework::Unity => "Unity",
            Framework::Criterion => "Criterion",
            Framework::Bandit => "Bandit",
            Framework::Catch => "Catch",
            Framework::CppUTest => "CppUTest",
            Framework::Cute => "Cute",
            Framework::CxxTest => "CxxTest",
            Framework::GTest => "GoogleTest",
            Framework::QTest => "QTest",
            Framework::GoTest => "Go",
            Framework::TestUnit => "TestUnit",
            Framework::RSpec => "RSpec",
            Framework::Minitest => "Minitest",
            Framework::MsTest => "MSTest",
            Framework::XUnitNet => "XUnit.Net",
            Framework::NUnit => "NUnit",
            Framework::PhpUnit => "PHPUnit",
            Framework::PyTest => "PyTest",
            Framework::PyUnit => "PyUnit",
            Framework::Mocha => "Mocha",
            Framework::Ava => "Ava",
            Framework::Tap => "Tap",
            Framework::Tape => "Tape",
            Framework::QUnit => "QUnit",
            Framework::Doctest => "Doctest",
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
