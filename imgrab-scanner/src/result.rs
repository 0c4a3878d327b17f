use crate::error::{DownloadError, DownloadErrorKind};
use serde::Serialize;
use std::path::PathBuf;

/// Outcome of one image download attempt.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadResult {
    /// The reference exactly as it appeared in the markup
    pub source: String,
    /// Absent only when the reference could not be resolved
    pub resolved_url: Option<String>,
    pub path: Option<PathBuf>,
    pub bytes_written: u64,
    pub error: Option<String>,
    pub error_kind: Option<DownloadErrorKind>,
}

impl DownloadResult {
    pub fn succeeded(source: String, resolved_url: String, path: PathBuf, bytes_written: u64) -> Self {
        Self {
            source,
            resolved_url: Some(resolved_url),
            path: Some(path),
            bytes_written,
            error: None,
            error_kind: None,
        }
    }

    pub fn with_error(source: String, resolved_url: Option<String>, error: &DownloadError) -> Self {
        Self {
            source,
            resolved_url,
            path: None,
            bytes_written: 0,
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// URL to show the operator: the resolved one, or the raw reference if
    /// resolution failed.
    pub fn display_url(&self) -> &str {
        self.resolved_url.as_deref().unwrap_or(&self.source)
    }
}

/// Every result of a batch, in source order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DownloadSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<DownloadResult>,
}

impl DownloadSummary {
    pub fn push(&mut self, result: DownloadResult) {
        if result.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.results.push(result);
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn failures(&self) -> impl Iterator<Item = &DownloadResult> {
        self.results.iter().filter(|r| !r.is_success())
    }
}
