use std::io;

use trawl_store::RecordId;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown output format {0:?}, expected `array` or `lines`")]
    UnknownFormat(String),

    #[error("unknown text encoding {0:?}")]
    UnknownEncoding(String),

    #[error("text encoding {0} cannot be used for output")]
    UnsupportedEncoding(String),

    #[error("staged record {id} is not valid UTF-8")]
    InvalidStagedText { id: RecordId },

    #[error("{context} contains characters that {encoding} cannot represent")]
    Unmappable { context: String, encoding: &'static str },

    #[error("failed to write artifact: {0}")]
    Write(#[source] io::Error),

    #[error(transparent)]
    Fs(#[from] trawl_fs::Error),

    #[error(transparent)]
    Store(#[from] trawl_store::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
