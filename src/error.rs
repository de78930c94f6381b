//! Error types for a single scrape cycle.
//!
//! Every failure is scoped to the scrape that produced it: the collector logs
//! it, records it in the health statistics and leaves the published gauges
//! untouched.

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

/// Failure to obtain raw text from the sample source.
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error("failed to run {}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} exited with {status}: {detail}", path.display())]
    ExitStatus {
        path: PathBuf,
        status: ExitStatus,
        /// First non-empty line of stderr, or of stdout when stderr is empty.
        detail: String,
    },

    #[error("{} did not exit within {timeout:?} and was killed", path.display())]
    Timeout { path: PathBuf, timeout: Duration },

    #[error("output of {} is not valid UTF-8", path.display())]
    InvalidUtf8 { path: PathBuf },

    #[error("failed to read sample file {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Malformed gcutil output.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("data row has {found} fields, layout needs at least {expected}")]
    TooFewFields { expected: usize, found: usize },

    #[error("column {column} (field {index}) is not a number: {value:?}")]
    InvalidNumber {
        column: &'static str,
        index: usize,
        value: String,
    },

    #[error("header line has no {column} column")]
    MissingColumn { column: &'static str },
}

/// Anything that aborts one scrape cycle.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("sample failed: {0}")]
    Sample(#[from] SampleError),

    #[error("parse failed: {0}")]
    Parse(#[from] ParseError),
}

impl ScrapeError {
    /// Short label used for the `kind` dimension of error counters.
    pub fn kind(&self) -> &'static str {
        match self {
            ScrapeError::Sample(_) => "sample",
            ScrapeError::Parse(_) => "parse",
        }
    }
}
