use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Anchor {0} not found. Consider calling register({0:?}, handle) first")]
    InvalidAnchorKey(String),

    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    #[error("Host error: {0}")]
    Host(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for the transient "element went away" failure that batch
    /// operations skip instead of propagating.
    pub fn is_invalid_handle(&self) -> bool {
        matches!(self, Error::InvalidHandle(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
