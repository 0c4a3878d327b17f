use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that end a run.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Failed to build HTTP client: {0}")]
    ClientError(#[source] reqwest::Error),

    #[error(transparent)]
    FetchError(#[from] FetchError),

    #[error(transparent)]
    ExtractError(#[from] ExtractError),
}

pub type Result<T> = std::result::Result<T, ScanError>;

/// Page retrieval failures.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The body could not be read to the end
    #[error("Failed to decode response body of {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("<{tag}> element #{index} has no {attribute} attribute")]
    MissingAttribute {
        tag: &'static str,
        attribute: &'static str,
        /// Zero-based position among the matched elements
        index: usize,
    },

    #[error("Invalid selector: {0}")]
    Selector(String),
}

/// Cause code carried by a [`DownloadError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadErrorKind {
    Resolve,
    Request,
    Status,
    Body,
    FileName,
    Write,
}

impl DownloadErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadErrorKind::Resolve => "resolve",
            DownloadErrorKind::Request => "request",
            DownloadErrorKind::Status => "status",
            DownloadErrorKind::Body => "body",
            DownloadErrorKind::FileName => "file_name",
            DownloadErrorKind::Write => "write",
        }
    }
}

/// Failure of a single image download. Never ends a run.
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Cannot resolve {reference:?}: {source}")]
    Resolve {
        reference: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Server returned HTTP {0}")]
    Status(u16),

    #[error("Failed to read response body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("No usable file name in {0:?}")]
    FileName(String),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    pub fn kind(&self) -> DownloadErrorKind {
        match self {
            DownloadError::Resolve { .. } => DownloadErrorKind::Resolve,
            DownloadError::Request(_) => DownloadErrorKind::Request,
            DownloadError::Status(_) => DownloadErrorKind::Status,
            DownloadError::Body(_) => DownloadErrorKind::Body,
            DownloadError::FileName(_) => DownloadErrorKind::FileName,
            DownloadError::Write { .. } => DownloadErrorKind::Write,
        }
    }
}
