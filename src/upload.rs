//! Upload request assembly.
//!
//! Turns a composed [`Payload`] and the detected CI environment into the
//! request the reporting service expects. Sending it is left to the caller.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::ci::CiEnvironment;
use crate::compose::{Payload, run_name};
use crate::framework::Framework;

/// File holding the check-run id returned by a previous upload.
pub const DEFAULT_ID_FILE: &str = ".report-ci-id.json";

/// Services that identify the build by id instead of a token.
const BUILD_ID_SERVICES: &[&str] = &["travis-ci", "appveyor", "circle-ci"];

/// Caller-supplied upload settings, already merged from CLI and config.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    /// Explicit run name; suppresses the generated one.
    pub name: Option<String>,
    pub root_dir: Option<String>,
    /// Overrides the detected CI service name.
    pub ci_system: Option<String>,
    pub sha: Option<String>,
    pub build_id: Option<String>,
    pub check_run: Option<String>,
    /// Consulted for a check-run id when `check_run` is not set.
    pub id_file: Option<PathBuf>,
    pub preset: Option<String>,
    pub merge: Option<String>,
    pub define: Vec<String>,
}

/// HTTP method of the upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// New check run.
    Post,
    /// Update of an existing check run.
    Patch,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Post => write!(f, "POST"),
            Method::Patch => write!(f, "PATCH"),
        }
    }
}

/// A fully assembled upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadRequest {
    pub method: Method,
    /// Endpoint path below the service root.
    pub path: String,
    pub framework: Framework,
    pub content_type: &'static str,
    pub service: Option<String>,
    pub run_name: Option<String>,
    /// Ordered query pairs; `define` may repeat.
    pub query: Vec<(String, String)>,
    pub body_length: usize,
    #[serde(skip)]
    pub body: String,
}

impl UploadRequest {
    /// Assembles the request for `payload`.
    pub fn build(payload: Payload, ci: &CiEnvironment, options: &UploadOptions) -> Self {
        let service = options.ci_system.clone().or_else(|| ci.service.clone());

        let commit = options.sha.clone().or_else(|| ci.commit.clone());
        if commit.is_none() {
            tracing::warn!("No commit hash found, pass one with --sha");
        }

        let root_dir = options
            .root_dir
            .clone()
            .or_else(|| ci.root_dir.clone())
            .or_else(|| {
                std::env::current_dir()
                    .ok()
                    .map(|dir| dir.to_string_lossy().into_owned())
            });

        let (owner, repo) = match ci.slug.as_deref().and_then(split_slug) {
            Some((owner, repo)) => (Some(owner), Some(repo)),
            None => (None, None),
        };

        let check_run = options.check_run.clone().or_else(|| {
            options
                .id_file
                .as_deref()
                .and_then(read_check_run_id)
        });

        let mut name = Some(run_name(
            payload.default_run_name,
            options.name.as_deref(),
            service.as_deref(),
            ci.os_name.as_deref(),
        ));
        if check_run.is_some() && options.name.is_none() {
            name = None;
        }

        let mut query = Query::default();
        query.push("framework", Some(payload.framework.as_str()));
        query.push("owner", owner.as_deref());
        query.push("repo", repo.as_deref());
        query.push("head-sha", commit.as_deref());
        query.push("root-dir", root_dir.as_deref());
        query.push("branch", ci.branch.as_deref());
        query.push("account-name", ci.account_name.as_deref());
        query.push("run-name", name.as_deref());
        query.push("check-run-id", check_run.as_deref());
        query.push("preset", options.preset.as_deref());
        for define in &options.define {
            query.push("define", Some(define.as_str()));
        }
        query.push("merge", options.merge.as_deref());

        let mut path = String::from("/publish/");
        if let Some(service) = service.as_deref()
            && BUILD_ID_SERVICES.contains(&service)
        {
            let build_id = options.build_id.clone().or_else(|| ci.build_id.clone());
            query.push("build-id", build_id.as_deref());
            path.push_str(service);
            path.push('/');
        }

        let method = if check_run.is_some() {
            Method::Patch
        } else {
            Method::Post
        };

        Self {
            method,
            path,
            framework: payload.framework,
            content_type: payload.content_type,
            service,
            run_name: name,
            query: query.0,
            body_length: payload.body.len(),
            body: payload.body,
        }
    }

    /// Value of the first query pair named `key`.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
struct Query(Vec<(String, String)>);

impl Query {
    fn push(&mut self, key: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.0.push((key.to_string(), value.to_string()));
        }
    }
}

/// Splits an `owner/repo` slug. Anything else is rejected with a warning.
pub fn split_slug(slug: &str) -> Option<(String, String)> {
    match slug.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Some((owner.to_string(), repo.to_string()))
        }
        _ => {
            tracing::warn!("Invalid Slug: '{}'", slug);
            None
        }
    }
}

/// Reads the `id` of a previous check run, if the file exists and holds one.
pub fn read_check_run_id(path: &Path) -> Option<String> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!("No check-run id from {}: {}", path.display(), e);
            return None;
        }
    };

    let value: serde_json::Value = match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!("Ignoring malformed {}: {}", path.display(), e);
            return None;
        }
    };

    match value.get("id")? {
        serde_json::Value::String(id) => Some(id.clone()),
        serde_json::Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}
