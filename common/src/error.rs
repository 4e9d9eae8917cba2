use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("cannot open directory {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Missing or malformed settings. Always fatal for the current request.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("empty setting name not supported")]
    EmptyKey,

    #[error("setting \"{0}\" not found")]
    Missing(String),

    #[error("setting \"{0}\" is a section, not a value")]
    NotLeaf(String),

    #[error("invalid value for \"{key}\": {reason}")]
    Invalid { key: String, reason: String },

    #[error("invalid heatmap colors: {0}")]
    InvalidColorTable(String),

    #[error("invalid date format for \"{key}\": {pattern:?}")]
    InvalidFormat { key: String, pattern: String },
}
