use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Fs(#[from] trawl_fs::Error),

    #[error("failed to list staging directory {path}: {source}")]
    List {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid record identifier {0:?}")]
    InvalidId(String),

    #[error("record has no usable `{field}` field")]
    MissingIdentity { field: String },

    #[error("staging store lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, Error>;
