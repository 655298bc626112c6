use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ethers::types::TxHash;

#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("Chain unavailable: {0}")]
    Unavailable(String),
    #[error("RPC error: {0}")]
    Rpc(String),
    #[error("Call reverted: {0}")]
    Reverted(String),
    #[error("ABI error: {0}")]
    Abi(String),
    #[error("Failed to decode {what}: {reason}")]
    Decode { what: &'static str, reason: String },
    #[error("Identifier {0} does not fit in 64 bits")]
    IdOutOfRange(String),
}

impl ChainError {
    pub fn decode(what: &'static str, reason: impl Into<String>) -> Self {
        ChainError::Decode { what, reason: reason.into() }
    }

    /// Classifies a provider failure; reverts mean the token does not exist
    /// or was burned.
    pub fn from_rpc(err: impl std::fmt::Display) -> Self {
        let message = err.to_string();
        if message.to_lowercase().contains("revert") {
            ChainError::Reverted(message)
        } else {
            ChainError::Rpc(message)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Unsupported metadata URI: {0}")]
    UnsupportedUri(String),
    #[error("Gateway request failed: {0}")]
    Http(String),
    #[error("Gateway returned status {0}")]
    Status(u16),
    #[error("Metadata is not valid JSON: {0}")]
    Json(String),
    #[error("Gateway timed out")]
    Timeout,
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_decode() {
            FetchError::Json(err.to_string())
        } else {
            FetchError::Http(err.to_string())
        }
    }
}

/// Failure of a single item during enrichment; the item is dropped.
#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("{0}")]
    Precondition(&'static str),
    #[error("Invalid amount {0:?}: {1}")]
    InvalidAmount(String, String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Failed to encode call: {0}")]
    Encode(String),
    #[error("Failed to broadcast transaction: {0}")]
    Broadcast(String),
    #[error("Transaction {tx_hash:?} was not confirmed in time")]
    ConfirmationTimeout { tx_hash: TxHash },
    #[error("Transaction {tx_hash:?} was dropped from the mempool")]
    Dropped { tx_hash: TxHash },
    #[error("Transaction {tx_hash:?} reverted")]
    Reverted { tx_hash: TxHash },
    #[error("Failed to confirm transaction: {0}")]
    Confirmation(String),
}

/// HTTP-facing error for every route.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Chain(ChainError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Chain(ChainError::Reverted(_)) => StatusCode::NOT_FOUND,
            ApiError::Chain(_) => StatusCode::BAD_GATEWAY,
            ApiError::Write(WriteError::Precondition(_)) => StatusCode::PRECONDITION_FAILED,
            ApiError::Write(WriteError::InvalidAmount(..))
            | ApiError::Write(WriteError::InvalidArgument(_)) => StatusCode::BAD_REQUEST,
            ApiError::Write(WriteError::ConfirmationTimeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Write(WriteError::Reverted { .. }) => StatusCode::CONFLICT,
            ApiError::Write(_) => StatusCode::BAD_GATEWAY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("Request failed: {}", self);
        }
        let mut body = serde_json::json!({
            "success": false,
            "error": self.to_string(),
        });
        if let ApiError::Write(WriteError::ConfirmationTimeout { tx_hash }) = &self {
            body["tx_hash"] = serde_json::json!(tx_hash);
        }
        (status, Json(body)).into_response()
    }
}
