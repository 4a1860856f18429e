use thiserror::Error;

/// Reasons an inbound frame could not be turned into a [`crate::ClientEvent`].
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid event json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown event `{0}`")]
    UnknownEvent(String),

    #[error("event `{0}` requires a data payload")]
    MissingData(&'static str),
}
