//! RPC Error Types
//!
//! Maps limiter, transport and application errors to JSON-RPC error codes.

use jsonrpsee::types::ErrorObjectOwned;
use ledger_rpc_core::error::AppError;
use std::time::Duration;
use thiserror::Error;

/// RPC Error Codes
pub mod code {
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
    pub const EXECUTION_DURATION_EXCEEDED: i32 = -32001;
    pub const BACKLOG_FULL: i32 = -32003;
    pub const VALIDATION_ERROR: i32 = 4000;
    pub const NOT_FOUND: i32 = 4001;
    pub const CONFLICT: i32 = 4002;
    pub const APP_INTERNAL_ERROR: i32 = 5000;
    pub const DB_ERROR: i32 = 5001;
}

/// Error returned by every handler, gate and governor
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("rpc queue for {resource} surpassed queue limit of {limit} requests")]
    BacklogFull { resource: String, limit: u64 },

    #[error("request for {resource} exceeded processing limit threshold of {limit:?}")]
    DurationExceeded { resource: String, limit: Duration },

    #[error("request for {resource} panicked: {message}")]
    Panicked { resource: String, message: String },

    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("method not found: {0}")]
    MethodNotFound(String),

    #[error(transparent)]
    App(#[from] AppError),
}

impl RpcError {
    /// Short label for metrics and logs
    pub fn category(&self) -> &'static str {
        match self {
            RpcError::BacklogFull { .. } => "backlog_full",
            RpcError::DurationExceeded { .. } => "execution_duration_exceeded",
            RpcError::Panicked { .. } => "internal_error",
            RpcError::InvalidParams(_) => "invalid_params",
            RpcError::MethodNotFound(_) => "method_not_found",
            RpcError::App(AppError::NotFound(_)) => "not_found",
            RpcError::App(AppError::Validation(_)) => "validation_error",
            RpcError::App(_) => "internal_error",
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            RpcError::BacklogFull { .. } => code::BACKLOG_FULL,
            RpcError::DurationExceeded { .. } => code::EXECUTION_DURATION_EXCEEDED,
            RpcError::Panicked { .. } => code::INTERNAL_ERROR,
            RpcError::InvalidParams(_) => code::INVALID_PARAMS,
            RpcError::MethodNotFound(_) => code::METHOD_NOT_FOUND,
            RpcError::App(err) => app_code(err),
        }
    }
}

fn app_code(err: &AppError) -> i32 {
    match err {
        AppError::Validation(_) | AppError::Serialization(_) => code::VALIDATION_ERROR,
        AppError::NotFound(_) => code::NOT_FOUND,
        AppError::InvalidState(_) => code::CONFLICT,
        AppError::Database(_) => code::DB_ERROR,
        AppError::Config(_) | AppError::FeeWindow(_) | AppError::Internal(_) => {
            code::APP_INTERNAL_ERROR
        }
    }
}

/// Convert RpcError to JSON-RPC ErrorObject
pub fn to_rpc_error(err: RpcError) -> ErrorObjectOwned {
    ErrorObjectOwned::owned(err.code(), err.to_string(), None::<()>)
}

impl From<RpcError> for ErrorObjectOwned {
    fn from(err: RpcError) -> Self {
        to_rpc_error(err)
    }
}

/// Failure while assembling or starting the server
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("metrics registration failed: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("method registration failed: {0}")]
    Register(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("invalid limits for {resource}: {reason}")]
    InvalidLimits { resource: String, reason: String },
}
