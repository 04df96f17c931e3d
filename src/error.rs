//! Error types for timing, comparison and export.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Error type returned by a snippet or setup body.
pub type SnippetError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Where in a timing run a fault happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Untimed setup before a repetition
    Setup,
    /// Discarded warm-up execution
    WarmUp,
    /// Timed execution
    Measurement,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Setup => write!(f, "setup"),
            Phase::WarmUp => write!(f, "warm-up"),
            Phase::Measurement => write!(f, "measurement"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// The code under test returned an error or panicked.
    #[error("{snippet} faulted during {phase}: {message}")]
    SnippetFault {
        snippet: String,
        phase: Phase,
        message: String,
    },

    /// A timing run finished without a single sample (zero repetitions).
    #[error("{snippet} produced no timing samples")]
    NoSamples { snippet: String },

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Name of the snippet responsible for the error, if any
    pub fn snippet(&self) -> Option<&str> {
        match self {
            Error::SnippetFault { snippet, .. } | Error::NoSamples { snippet } => Some(snippet),
            _ => None,
        }
    }
}
