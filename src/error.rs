use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the sequencing engine. All validation failures are
/// detected before any scoring begins; there are no partial results.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("track collection is empty")]
    EmptyCollection,

    #[error("duplicate track id: {0}")]
    DuplicateTrackId(String),

    #[error("invalid track data for \"{id}\": {reason}")]
    InvalidTrackData { id: String, reason: String },

    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid track JSON in {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;
