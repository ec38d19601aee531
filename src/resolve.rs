//! Framework resolution.
//!
//! When several buckets are non-empty (mixed or ambiguous file sets) a single
//! winner is picked from a fixed priority table. An explicit choice by the
//! caller always wins and is not checked against the buckets.

use crate::classify::Classification;
use crate::framework::Framework;

/// Result type for resolution.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Errors that can occur while resolving the framework.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// No framework was given and no bucket is populated.
    #[error("No framework selected and not detected.")]
    NotDetected,
}

/// One entry of the detection priority table.
pub struct DetectionRule {
    pub framework: Framework,

    /// Number of fragments (or counted files) backing this framework.
    pub weight: fn(&Classification) -> usize,
}

/// Detection priority, highest first.
pub static DETECTION_ORDER: &[DetectionRule] = &[
    DetectionRule {
        framework: Framework::TestNg,
        weight: |c| c.testng.len(),
    },
    DetectionRule {
        framework: Framework::JUnit,
        weight: |c| c.junit.len(),
    },
    DetectionRule {
        framework: Framework::Bandit,
        weight: |c| c.bandit.len(),
    },
    DetectionRule {
        framework: Framework::PhpUnit,
        weight: |c| c.phpunit,
    },
    DetectionRule {
        framework: Framework::PyTest,
        weight: |c| c.pytest,
    },
    DetectionRule {
        framework: Framework::XUnit,
        weight: |c| c.xunit.len(),
    },
    DetectionRule {
        framework: Framework::Boost,
        weight: |c| c.boost.len(),
    },
    DetectionRule {
        framework: Framework::Criterion,
        weight: |c| c.criterion.len(),
    },
    DetectionRule {
        framework: Framework::Catch,
        weight: |c| c.catch.len(),
    },
    DetectionRule {
        framework: Framework::CxxTest,
        weight: |c| c.cxxtest.len(),
    },
    DetectionRule {
        framework: Framework::QTest,
        weight: |c| c.qtest.len(),
    },
    DetectionRule {
        framework: Framework::GoTest,
        weight: |c| c.go_test.len(),
    },
    DetectionRule {
        framework: Framework::TestUnit,
        weight: |c| c.testunit.len(),
    },
    DetectionRule {
        framework: Framework::MsTest,
        weight: |c| c.mstest.len(),
    },
    DetectionRule {
        framework: Framework::NUnit,
        weight: |c| c.nunit.len(),
    },
    DetectionRule {
        framework: Framework::XUnitNet,
        weight: |c| c.xunitnet.len(),
    },
    DetectionRule {
        framework: Framework::RSpec,
        weight: |c| c.rspec.len(),
    },
    DetectionRule {
        framework: Framework::Mocha,
        weight: |c| c.mocha.len(),
    },
    DetectionRule {
        framework: Framework::Ava,
        weight: |c| c.ava,
    },
    DetectionRule {
        framework: Framework::Tap,
        weight: |c| c.tap.len(),
    },
    DetectionRule {
        framework: Framework::Doctest,
        weight: |c| c.doctest.len(),
    },
];

/// Returns the highest-priority framework with a non-empty bucket.
pub fn detect(classification: &Classification) -> Option<Framework> {
    DETECTION_ORDER
        .iter()
        .find(|rule| (rule.weight)(classification) > 0)
        .map(|rule| rule.framework)
}

/// Picks the framework to upload as.
pub fn resolve(
    explicit: Option<Framework>,
    classification: &Classification,
) -> ResolveResult<Framework> {
    if let Some(framework) = explicit {
        tracing::info!("{} selected", framework);
        return Ok(framework);
    }

    match detect(classification) {
        Some(framework) => {
            tracing::info!("{} detected", framework.display_name());
            Ok(framework)
        }
        None => Err(ResolveError::NotDetected),
    }
}
