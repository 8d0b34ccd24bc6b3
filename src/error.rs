use std::path::PathBuf;

use thiserror::Error;

/// Startup-time artifact failures. `Missing` is reported once and puts the
/// service into degraded mode; the other variants cover files that exist but
/// cannot be used.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("required artifact not found: {}", .path.display())]
    Missing { path: PathBuf },

    #[error("failed to read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid artifact {}: {}", .path.display(), .reason)]
    Invalid { path: PathBuf, reason: String },
}

/// Per-submission failures. Reported inline, never retried, and never fatal
/// to the process or to later submissions.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("unknown {field} category: {value:?}")]
    UnknownCategory { field: &'static str, value: String },

    #[error("{field} out of range: {reason}")]
    OutOfRange { field: &'static str, reason: String },

    #[error("scoring failed: {0}")]
    Scoring(String),
}
