//! Detection pipeline.
//!
//! Ties the stages together for one invocation:
//!
//! ```text
//!   Source ──► FileSelector ──► Selection
//!                                   │ load + decode
//!                                   ▼
//!                          Vec<CandidateFile>
//!                                   │ classify
//!                                   ▼
//!                            Classification
//!                                   │ resolve (explicit or priority table)
//!                                   ▼
//!                               Framework
//!                                   │ compose
//!                                   ▼
//!                                Payload
//! ```
//!
//! Everything is synchronous; files are read one after another in selection
//! order, which keeps bucket order deterministic.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::classify::Classification;
use crate::compose::{self, ComposeError, Payload};
use crate::decode::CandidateFile;
use crate::framework::Framework;
use crate::resolve::{self, ResolveError};
use crate::select::{FileSelector, SelectError, Selection, Source};

/// Result type for pipeline runs.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

/// Fatal pipeline failures, one per stage.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Select(#[from] SelectError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Compose(#[from] ComposeError),
}

/// Outcome of selection and classification.
#[derive(Debug, Clone)]
pub struct Scan {
    /// Every file seen during selection.
    pub scanned: Vec<PathBuf>,

    /// Files that passed the include/exclude filter.
    pub candidates: usize,

    /// Candidates that could not be read or decoded.
    pub skipped: usize,

    pub classification: Classification,
}

impl Scan {
    /// Framework the priority table would pick, if any.
    pub fn detected(&self) -> Option<Framework> {
        resolve::detect(&self.classification)
    }
}

/// Outcome of a full run.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub scan: Scan,
    pub framework: Framework,
    pub payload: Payload,
}

/// Runs selection, classification, resolution and composition.
pub struct Orchestrator {
    selector: FileSelector,
    source: Source,
    framework: Option<Framework>,
}

impl Orchestrator {
    /// Creates a pipeline that reads files from `source`.
    pub fn new(selector: FileSelector, source: Source) -> Self {
        Self {
            selector,
            source,
            framework: None,
        }
    }

    /// Forces the framework instead of detecting it.
    pub fn with_framework(mut self, framework: Option<Framework>) -> Self {
        self.framework = framework;
        self
    }

    /// Selects, decodes and classifies files.
    pub fn scan(&self) -> OrchestratorResult<Scan> {
        let Selection {
            scanned,
            candidates,
        } = self.selector.select(&self.source)?;

        let mut classification = Classification::new();
        let mut skipped = 0;

        for path in &candidates {
            let file = CandidateFile::load(path, &self.selector.relative(path));
            if file.text.is_none() {
                skipped += 1;
                continue;
            }
            if classification.classify(&file).is_none() {
                debug!("No signature matched {}", file.relative.display());
            }
        }

        info!(
            "Classified {} of {} candidate files",
            candidates.len() - skipped,
            candidates.len()
        );

        Ok(Scan {
            scanned,
            candidates: candidates.len(),
            skipped,
            classification,
        })
    }

    /// Runs the whole pipeline and composes the upload payload.
    pub fn run(&self) -> OrchestratorResult<RunResult> {
        let scan = self.scan()?;
        let framework = resolve::resolve(self.framework, &scan.classification)?;
        let payload = compose::compose(framework, &scan.classification, &scan.scanned)?;

        Ok(RunResult {
            scan,
            framework,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const JUNIT: &str = r#"<?xml version="1.0"?>
<testsuite name="com.acme.FooTest" tests="1">
  <properties><property name="java.version" value="17"/></properties>
  <testcase classname="org.junit.Test" name="works"/>
</testsuite>"#;

    const BOOST: &str = "<TestLog><TestSuite name=\"all\"></TestSuite></TestLog>";

    fn orchestrator(dir: &TempDir, source: Source) -> Orchestrator {
        let selector = FileSelector::with_cwd(&[], &[], dir.path()).unwrap();
        Orchestrator::new(selector, source)
    }

    #[test]
    fn test_detects_junit_over_boost() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("reports")).unwrap();
        fs::write(dir.path().join("reports/TEST-foo.xml"), JUNIT).unwrap();
        fs::write(dir.path().join("boost.xml"), BOOST).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let result = orchestrator(&dir, Source::Walk(".".into())).run().unwrap();

        assert_eq!(result.framework, Framework::JUnit);
        assert_eq!(result.scan.scanned.len(), 3);
        assert_eq!(result.scan.candidates, 2);
        assert!(result.payload.body.starts_with("<root><?xml"));
        assert!(result.payload.body.contains("<file>"));
        assert!(result.payload.body.ends_with("</root>"));
    }

    #[test]
    fn test_explicit_framework_wins() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("boost.xml"), BOOST).unwrap();
        fs::write(dir.path().join("a.xml"), JUNIT).unwrap();

        let result = orchestrator(&dir, Source::Walk(".".into()))
            .with_framework(Some(Framework::Boost))
            .run()
            .unwrap();

        assert_eq!(result.framework, Framework::Boost);
        assert_eq!(result.payload.body, format!("<root>{}</root>", BOOST));
    }

    #[test]
    fn test_repeated_runs_compose_identical_bodies() {
        let dir = TempDir::new().unwrap();
        for i in 0..5 {
            let nested = dir.path().join(format!("d{}/sub{}", i, i % 2));
            fs::create_dir_all(&nested).unwrap();
            fs::write(
                nested.join("r.xml"),
                format!("<testsuite name=\"s{}\"><testcase name=\"t\"/></testsuite>", i),
            )
            .unwrap();
        }

        let first = orchestrator(&dir, Source::Walk(".".into())).run().unwrap();
        let second = orchestrator(&dir, Source::Walk(".".into())).run().unwrap();

        assert_eq!(first.framework, Framework::XUnit);
        assert_eq!(first.payload.body, second.payload.body);
        assert_eq!(first.payload.body.matches("<testsuite ").count(), 5);
    }

    #[test]
    fn test_nothing_detected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("plain.xml"), "<config/>").unwrap();

        let err = orchestrator(&dir, Source::Walk(".".into())).run().unwrap_err();
        assert!(matches!(err, OrchestratorError::Resolve(ResolveError::NotDetected)));
        assert_eq!(err.to_string(), "No framework selected and not detected.");
    }

    #[test]
    fn test_forced_framework_without_data() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("boost.xml"), BOOST).unwrap();

        let err = orchestrator(&dir, Source::Walk(".".into()))
            .with_framework(Some(Framework::Mocha))
            .run()
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::Compose(ComposeError::NoTestData { .. })));
    }

    #[test]
    fn test_missing_listed_file() {
        let dir = TempDir::new().unwrap();

        let err = orchestrator(&dir, Source::Files(vec!["nope.xml".into()]))
            .run()
            .unwrap_err();
        assert_eq!(err.to_string(), "Could not find file 'nope.xml'");
    }

    #[test]
    fn test_undecodable_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.xml"), [0xff, 0xfe, 0x00]).unwrap();
        fs::write(dir.path().join("boost.xml"), BOOST).unwrap();

        let scan = orchestrator(&dir, Source::Walk(".".into())).scan().unwrap();

        assert_eq!(scan.skipped, 1);
        assert_eq!(scan.classification.complete_contents.len(), 1);
        assert_eq!(scan.detected(), Some(Framework::Boost));
    }

    #[test]
    fn test_unity_uses_complete_contents() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("out.xml"), "test.c:3:test_one:PASS\n").unwrap();

        let result = orchestrator(&dir, Source::Walk(".".into()))
            .with_framework(Some(Framework::Unity))
            .run()
            .unwrap();

        assert_eq!(result.payload.body, "test.c:3:test_one:PASS");
        assert_eq!(result.payload.content_type, "text/plain");
    }
}
