//! Console output for finished runs.
//!
//! Summaries go to stderr so that stdout stays reserved for the
//! machine-readable request description.

use crate::orchestrator::{RunResult, Scan};
use crate::upload::UploadRequest;

/// Prints a summary of the files looked at and the buckets they landed in.
pub fn print_scan(scan: &Scan) {
    eprintln!();
    eprintln!("Files:");
    eprintln!("  Scanned:    {}", scan.scanned.len());
    eprintln!("  Candidates: {}", scan.candidates);
    if scan.skipped > 0 {
        eprintln!("  Skipped:    {}", console::style(scan.skipped).yellow());
    }

    let populated: Vec<_> = scan
        .classification
        .counts()
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .collect();

    if !populated.is_empty() {
        eprintln!("Buckets:");
        for (name, count) in populated {
            eprintln!("  {:<10} {}", name, count);
        }
    }
}

/// Prints what is about to be uploaded.
pub fn print_summary(result: &RunResult, request: &UploadRequest) {
    print_scan(&result.scan);

    eprintln!();
    eprintln!("Upload:");
    eprintln!(
        "  Framework: {}",
        console::style(result.framework).green().bold()
    );
    if let Some(service) = &request.service {
        eprintln!("  Service:   {}", service);
    }
    if let Some(sha) = request.query_value("head-sha") {
        eprintln!("  Commit:    {}", console::style(sha).cyan());
    }
    if let Some(root) = request.query_value("root-dir") {
        eprintln!("  Root dir:  {}", root);
    }
    match (request.query_value("owner"), request.query_value("repo")) {
        (Some(owner), Some(repo)) => eprintln!("  Project:   {}/{}", owner, repo),
        _ => eprintln!(
            "  Project:   {}",
            console::style("unknown (no repository slug)").dim()
        ),
    }
    if let Some(name) = &request.run_name {
        eprintln!("  Run name:  {}", name);
    }
    eprintln!(
        "  Request:   {} {} ({}, {} bytes)",
        request.method, request.path, request.content_type, request.body_length
    );
}
