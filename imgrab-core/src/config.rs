// Run configuration and the validating constructors behind it

use imgrab_scanner::{DEFAULT_TIMEOUT_SECS, MissingSrcPolicy};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;
use url::Url;

const REQUIRED_SCHEME_PREFIX: &str = "http://";

/// Malformed or unusable input. Recoverable by asking again when the value
/// came from a prompt.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Invalid URL, make sure URL is in the format 'http://' (got {0:?})")]
    InvalidScheme(String),

    #[error("Invalid URL {input:?}: {source}")]
    InvalidUrl {
        input: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid local path {0:?}")]
    EmptyPath(String),

    #[error("Invalid local path {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid local path {0}: not a directory")]
    NotADirectory(PathBuf),

    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("No {0} was provided")]
    MissingValue(&'static str),

    #[error("Input closed before a value was entered")]
    InputClosed,

    #[error("Failed to read input: {0}")]
    Io(#[from] io::Error),
}

/// Absolute `http://` URL of the page to scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSource(Url);

impl PageSource {
    /// Accepts anything starting with `http://` (any case) that parses as a URL.
    pub fn parse(input: &str) -> Result<Self, InputError> {
        let input = input.trim();
        let has_scheme = input
            .get(..REQUIRED_SCHEME_PREFIX.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(REQUIRED_SCHEME_PREFIX));
        if !has_scheme {
            return Err(InputError::InvalidScheme(input.to_string()));
        }

        let url = Url::parse(input).map_err(|source| InputError::InvalidUrl {
            input: input.to_string(),
            source,
        })?;
        Ok(Self(url))
    }

    pub fn url(&self) -> &Url {
        &self.0
    }
}

impl FromStr for PageSource {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A directory that exists and accepted a probe write when it was prepared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationDir(PathBuf);

impl DestinationDir {
    /// Expand `~`, create the directory if needed and check it is writable.
    /// Preparing an existing directory is not an error.
    pub fn prepare(input: &str) -> Result<Self, InputError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(InputError::EmptyPath(input.to_string()));
        }

        let expanded = shellexpand::tilde(trimmed);
        let path = PathBuf::from(expanded.as_ref());

        fs::create_dir_all(&path).map_err(|source| InputError::Directory {
            path: path.clone(),
            source,
        })?;
        if !path.is_dir() {
            return Err(InputError::NotADirectory(path));
        }

        // Unnamed temp file, gone as soon as it is dropped
        tempfile::tempfile_in(&path).map_err(|source| InputError::Directory {
            path: path.clone(),
            source,
        })?;

        debug!("Destination directory ready: {}", path.display());
        Ok(Self(path))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

/// Everything a run needs, fully validated.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub page: PageSource,
    pub destination: DestinationDir,
    pub timeout_secs: u64,
    pub missing_src: MissingSrcPolicy,
}

/// Optional settings read from a JSON config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub url: Option<String>,
    pub dest: Option<String>,
    pub timeout_secs: Option<u64>,
    pub skip_missing_src: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, InputError> {
        let content = fs::read_to_string(path).map_err(|source| InputError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| InputError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Raw, unvalidated settings gathered from flags and/or a config file.
/// Missing URL or destination are asked for interactively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialConfig {
    pub url: Option<String>,
    pub dest: Option<String>,
    pub timeout_secs: Option<u64>,
    pub skip_missing_src: bool,
}

impl PartialConfig {
    /// Fill gaps in `self` from `file`. Values already set win.
    pub fn merge_file(self, file: FileConfig) -> Self {
        Self {
            url: self.url.or(file.url),
            dest: self.dest.or(file.dest),
            timeout_secs: self.timeout_secs.or(file.timeout_secs),
            skip_missing_src: self.skip_missing_src || file.skip_missing_src.unwrap_or(false),
        }
    }

    pub fn missing_src_policy(&self) -> MissingSrcPolicy {
        if self.skip_missing_src {
            MissingSrcPolicy::Skip
        } else {
            MissingSrcPolicy::Abort
        }
    }

    /// Validate without prompting. Fails if URL or destination is missing.
    pub fn into_run_config(self) -> Result<RunConfig, InputError> {
        let missing_src = self.missing_src_policy();
        let page = PageSource::parse(self.url.as_deref().ok_or(InputError::MissingValue("page URL"))?)?;
        let dest = self.dest.as_deref().ok_or(InputError::MissingValue("destination directory"))?;
        let destination = DestinationDir::prepare(dest)?;

        Ok(RunConfig {
            page,
            destination,
            timeout_secs: self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            missing_src,
        })
    }
}
