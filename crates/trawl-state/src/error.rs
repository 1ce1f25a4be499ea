use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Fs(#[from] trawl_fs::Error),

    #[error("checkpoint file {path} is not a JSON object: {source}")]
    Corrupt {
        path:   PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("checkpoint entry {key} in {path} is neither a string nor null")]
    InvalidEntry { path: PathBuf, key: String },

    #[error("failed to encode checkpoint: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("checkpoint store lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, Error>;
