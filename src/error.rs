//! Unified error types for the delegation core
//!
//! Every fallible operation returns [`Eip7702Result`]. Errors are grouped
//! into coarse [`ErrorCode`] kinds so callers can decide whether a retry
//! makes sense (fetch failures) or not (everything else).

use serde::{Deserialize, Serialize};

use crate::codec::NEGATIVE_QUANTITY;
use crate::rlp::RlpError;

/// Main error type for all delegation operations
#[derive(Debug, thiserror::Error)]
pub enum Eip7702Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Signing error: {0}")]
    SigningError(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("RLP error: {0}")]
    Rlp(#[from] RlpError),

    #[error("Malformed transaction: {0}")]
    MalformedTransaction(String),

    #[error("Code fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Eip7702Result<T> = Result<T, Eip7702Error>;

impl Eip7702Error {
    /// Coarse error category, stable across message changes
    pub fn code(&self) -> ErrorCode {
        match self {
            Eip7702Error::InvalidInput(_) | Eip7702Error::InvalidAddress(_) => ErrorCode::Validation,
            Eip7702Error::InvalidPrivateKey(_)
            | Eip7702Error::SigningError(_)
            | Eip7702Error::InvalidSignature(_) => ErrorCode::Signing,
            Eip7702Error::EncodingError(_) => ErrorCode::Encoding,
            Eip7702Error::Rlp(_) | Eip7702Error::MalformedTransaction(_) => ErrorCode::Decoding,
            Eip7702Error::Fetch(_) => ErrorCode::Fetch,
            Eip7702Error::Config(_) => ErrorCode::Config,
        }
    }

    /// Whether repeating the same call could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Eip7702Error::Fetch(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Caller supplied a malformed or missing value
    Validation,
    /// Key material rejected or the signer refused the digest
    Signing,
    /// A value could not be represented in the required wire form
    Encoding,
    /// Wire bytes could not be parsed
    Decoding,
    /// The code-fetch capability failed
    Fetch,
    /// Configuration data is inconsistent
    Config,
}

/// Failure reported by a [`crate::delegation::CodeFetcher`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl FetchError {
    /// Transport hiccups and timeouts may clear up; RPC rejections and garbage responses will not
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transport(_) | FetchError::Timeout)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_decode() {
            FetchError::InvalidResponse(e.to_string())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

impl From<hex::FromHexError> for Eip7702Error {
    fn from(e: hex::FromHexError) -> Self {
        Eip7702Error::InvalidInput(format!("Invalid hex: {}", e))
    }
}

impl From<serde_json::Error> for Eip7702Error {
    fn from(e: serde_json::Error) -> Self {
        let message = e.to_string();
        if e.is_data() && message.contains(NEGATIVE_QUANTITY) {
            return Eip7702Error::EncodingError(message);
        }
        Eip7702Error::InvalidInput(format!("Invalid JSON: {}", message))
    }
}

impl From<secp256k1::Error> for Eip7702Error {
    fn from(e: secp256k1::Error) -> Self {
        Eip7702Error::InvalidSignature(format!("Secp256k1 error: {}", e))
    }
}
