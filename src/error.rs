use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("no study set named '{0}'")]
    NotFound(String),

    #[error("study file {} is corrupt: {source}", .path.display())]
    CorruptData {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("study set has no cards")]
    EmptySet,

    #[error("cannot {op} while the quiz is {state}")]
    InvalidState {
        op: &'static str,
        state: &'static str,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
