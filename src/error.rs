pub type QuakeResult<T> = Result<T, QuakeError>;

#[derive(thiserror::Error, Debug)]
pub enum QuakeError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("ingest error: {0}")]
    Ingest(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("playback error: {0}")]
    Playback(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl QuakeError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn ingest(msg: impl Into<String>) -> Self {
        Self::Ingest(msg.into())
    }

    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    pub fn playback(msg: impl Into<String>) -> Self {
        Self::Playback(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}
