//! Configuration schema definitions for report-ci.
//!
//! # Schema Overview
//!
//! ```text
//! Config (root)
//! ├── ScanConfig       - Which files are looked at
//! └── UploadConfig     - Framework override and request settings
//! ```
//!
//! Every section and field is optional; an empty file is a valid
//! configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::framework::Framework;
use crate::select::DEFAULT_INCLUDE;
use crate::upload::DEFAULT_ID_FILE;

/// Root configuration structure.
///
/// # Example
///
/// ```
/// use report_ci::config::Config;
///
/// let config: Config = toml::from_str(r#"
///     [scan]
///     include = ["build/**/*.xml"]
///
///     [upload]
///     framework = "junit"
/// "#).unwrap();
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub upload: UploadConfig,
}

/// File selection settings.
///
/// # Defaults
///
/// | Field | Default |
/// |-------|---------|
/// | `include` | `*.xml`, `*.json`, `*.trx`, `*.tap` |
/// | `exclude` | none |
/// | `root_dir` | None (current directory) |
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanConfig {
    /// Shell-style globs; `*` crosses directory separators.
    #[serde(default = "default_include")]
    pub include: Vec<String>,

    /// Globs removing files that matched `include`.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Directory to walk, and the root directory reported with the upload.
    pub root_dir: Option<PathBuf>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            include: default_include(),
            exclude: Vec::new(),
            root_dir: None,
        }
    }
}

fn default_include() -> Vec<String> {
    DEFAULT_INCLUDE.iter().map(|s| s.to_string()).collect()
}

/// Upload request settings.
///
/// # Example
///
/// ```toml
/// [upload]
/// framework = "gtest"
/// name = "Linux build"
/// preset = "default"
/// merge = "annotations"
/// define = ["NDEBUG"]
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    /// Skip detection and upload as this framework.
    pub framework: Option<Framework>,

    /// Run name, replacing the generated `Framework [service, os]`.
    pub name: Option<String>,

    /// File holding the id of a previous check run.
    #[serde(default = "default_id_file")]
    pub id_file: PathBuf,

    pub preset: Option<String>,

    pub merge: Option<String>,

    #[serde(default)]
    pub define: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            framework: None,
            name: None,
            id_file: default_id_file(),
            preset: None,
            merge: None,
            define: Vec::new(),
        }
    }
}

fn default_id_file() -> PathBuf {
    PathBuf::from(DEFAULT_ID_FILE)
}
