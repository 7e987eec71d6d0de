use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ProviderError {
    #[error("provider returned {status}: {message}")]
    Api { status: u16, message: String },

    /// A long-running operation reached a terminal state other than success.
    #[error("operation {status}: {message}")]
    OperationFailed { status: String, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("apply failed: {0}")]
    ApplyFailed(String),

    #[error("destroy failed: {0}")]
    DestroyFailed(String),

    #[error("could not decode provider response: {0}")]
    Decode(String),

    #[error("internal provider error: {0}")]
    Internal(String),
}
