//! RPC Error Types
//!
//! Maps application errors to JSON-RPC error codes.

use extracta_core::error::AppError;
use jsonrpsee::types::ErrorObjectOwned;

/// RPC Error Codes
pub mod code {
    pub const VALIDATION_ERROR: i32 = 4000;
    pub const NOT_FOUND: i32 = 4001;
    pub const CONFLICT: i32 = 4002;
    pub const UNSUPPORTED_SOURCE: i32 = 4004;
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SYSTEM_ERROR: i32 = 5002;
    pub const UNAVAILABLE: i32 = 5003;
}

fn owned(code: i32, msg: impl Into<String>) -> ErrorObjectOwned {
    ErrorObjectOwned::owned(code, msg.into(), None::<()>)
}

/// Convert AppError to JSON-RPC ErrorObject
pub fn to_rpc_error(err: AppError) -> ErrorObjectOwned {
    match err {
        AppError::Validation(msg) => owned(code::VALIDATION_ERROR, msg),
        AppError::Domain(e) => owned(code::VALIDATION_ERROR, e.to_string()),
        AppError::Serialization(e) => owned(code::VALIDATION_ERROR, e.to_string()),
        AppError::NotFound(msg) => owned(code::NOT_FOUND, msg),
        AppError::Conflict(msg) => owned(code::CONFLICT, msg),
        AppError::InvalidState(msg) => owned(code::CONFLICT, msg),
        e @ AppError::UnsupportedSource { .. } => owned(code::UNSUPPORTED_SOURCE, e.to_string()),
        e @ (AppError::Extraction(_)
        | AppError::Navigation(_)
        | AppError::Timeout(_)
        | AppError::Cancelled
        | AppError::Persistence(_)) => owned(code::SYSTEM_ERROR, e.to_string()),
        AppError::Unavailable(msg) => owned(code::UNAVAILABLE, msg),
        AppError::Internal(msg) => owned(code::INTERNAL_ERROR, msg),
    }
}

/// Not-found error for an unknown job id
pub fn job_not_found(job_id: &str) -> ErrorObjectOwned {
    to_rpc_error(AppError::NotFound(format!("Job {} not found", job_id)))
}
