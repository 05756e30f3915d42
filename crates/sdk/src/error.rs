//! SDK Error Types

use jsonrpsee::core::ClientError;
use thiserror::Error;

/// SDK Result type
pub type Result<T> = std::result::Result<T, SdkError>;

const CODE_VALIDATION: i32 = 4000;
const CODE_NOT_FOUND: i32 = 4001;

/// SDK Error
#[derive(Debug, Error)]
pub enum SdkError {
    #[error("Cannot reach daemon: {0}")]
    Connection(String),

    /// The daemon answered with a JSON-RPC error object
    #[error("Daemon rejected call ({code}): {message}")]
    Rpc { code: i32, message: String },

    #[error("Unexpected payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Client error: {0}")]
    Other(String),
}

impl SdkError {
    /// True for a job id the daemon does not know
    pub fn is_not_found(&self) -> bool {
        matches!(self, SdkError::Rpc { code, .. } if *code == CODE_NOT_FOUND)
    }

    /// True when the daemon refused the request as malformed
    pub fn is_validation(&self) -> bool {
        matches!(self, SdkError::Rpc { code, .. } if *code == CODE_VALIDATION)
    }
}

impl From<ClientError> for SdkError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Call(call) => SdkError::Rpc {
                code: call.code(),
                message: call.message().to_string(),
            },
            ClientError::Transport(e) => SdkError::Transport(e.to_string()),
            ClientError::RestartNeeded(reason) => {
                SdkError::Connection(format!("connection lost: {}", reason))
            }
            ClientError::ParseError(e) => SdkError::Serialization(e),
            other => SdkError::Other(other.to_string()),
        }
    }
}
