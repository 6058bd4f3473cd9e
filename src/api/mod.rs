//! API Module
//!
//! JSON boundary for the delegation core. Requests arrive as JSON,
//! responses leave wrapped in [`ApiResponse`]. Shape differences between
//! external producers are absorbed here so the core only sees one form.

mod handlers;

pub use handlers::*;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Eip7702Error, Eip7702Result, ErrorCode};

/// Error payload carried by a failed [`ApiResponse`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    pub retryable: bool,
}

impl From<&Eip7702Error> for ErrorBody {
    fn from(error: &Eip7702Error) -> Self {
        Self {
            code: error.code(),
            message: error.to_string(),
            retryable: error.is_retryable(),
        }
    }
}

/// Uniform response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ErrorBody>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: &Eip7702Error) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorBody::from(error)),
        }
    }
}

impl<T> From<Eip7702Result<T>> for ApiResponse<T> {
    fn from(result: Eip7702Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::err(&e),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"success":false,"error":{"code":"encoding","message":"Serialization failed","retryable":false}}"#
                .to_string()
        })
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.to_json())
    }
}

/// A 32-byte transaction hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash(pub [u8; 32]);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Serialize for TxHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl std::str::FromStr for TxHash {
    type Err = Eip7702Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        if digits.len() != 64 {
            return Err(Eip7702Error::InvalidInput(format!(
                "transaction hash must be 64 hex characters, got {}",
                digits.len()
            )));
        }

        let mut hash = [0u8; 32];
        hex::decode_to_slice(digits, &mut hash)?;
        Ok(Self(hash))
    }
}

/// Field names under which external signers report the hash
const HASH_FIELDS: [&str; 3] = ["hash", "transactionHash", "txHash"];

/// Normalise a signer/broadcaster reply to one [`TxHash`]
///
/// Accepts a bare hash string, or an object carrying it under `hash`,
/// `transactionHash` or `txHash` (first match wins).
pub fn parse_transaction_hash(value: &serde_json::Value) -> Eip7702Result<TxHash> {
    if let Some(s) = value.as_str() {
        return s.parse();
    }

    let object = value
        .as_object()
        .ok_or_else(|| Eip7702Error::InvalidInput("expected a hash string or object".to_string()))?;

    HASH_FIELDS
        .iter()
        .find_map(|field| object.get(*field).and_then(|v| v.as_str()))
        .ok_or_else(|| Eip7702Error::InvalidInput("response carries no transaction hash".to_string()))?
        .parse()
}
