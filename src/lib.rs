//! report-ci: test-report format detection and normalization.
//!
//! Finds the result files a test run left behind, works out which framework
//! produced them from their content, and merges them into the single body a
//! reporting service accepts for that framework.
//!
//! # Architecture
//!
//! The main components are:
//!
//! - **Select**: Walk a directory or take an explicit list, filtered by globs
//! - **Decode**: Read candidates as ASCII text, whatever their encoding
//! - **Classify**: Sort files into per-framework buckets by signature
//! - **Resolve**: Pick one framework from a fixed priority table
//! - **Compose**: Build the upload body for that framework
//! - **CI / Upload**: Describe the build and assemble the request
//!
//! # Example
//!
//! ```no_run
//! use report_ci::orchestrator::Orchestrator;
//! use report_ci::select::{FileSelector, Source};
//!
//! let selector = FileSelector::new(&[], &[])?;
//! let result = Orchestrator::new(selector, Source::Walk(".".into())).run()?;
//!
//! println!("{} ({} bytes)", result.framework, result.payload.body.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod ci;
pub mod classify;
pub mod compose;
pub mod config;
pub mod decode;
pub mod framework;
pub mod orchestrator;
pub mod report;
pub mod resolve;
pub mod select;
pub mod upload;

// Re-export commonly used types
pub use classify::Classification;
pub use compose::Payload;
pub use config::{Config, load_config};
pub use framework::Framework;
pub use orchestrator::{Orchestrator, RunResult};
pub use upload::UploadRequest;
