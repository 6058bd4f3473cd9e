//! Delegation Inspection
//!
//! Reports whether an account's code is an EIP-7702 delegation pointer:
//! `0xef0100 || delegate(20 bytes)`.
//!
//! [`inspect`] is stateless and does exactly one fetch. Retry and caching
//! are decorators around the [`CodeFetcher`] (see [`fetcher`]).

pub mod fetcher;

#[cfg(test)]
mod tests;

pub use fetcher::*;

use serde::{Deserialize, Serialize};

use crate::codec::{format_address, Address};
use crate::error::{Eip7702Result, FetchError};
use crate::serde_bytes::{hex20_option, hex32};
use crate::utils::crypto::{keccak256, KECCAK_EMPTY};
use crate::log_info;

/// Code prefix that marks a delegated EOA
pub const DELEGATION_PREFIX: [u8; 3] = [0xef, 0x01, 0x00];

/// Length of a delegation designator
pub const DELEGATION_CODE_LEN: usize = 23;

/// Capability to read an account's current code
pub trait CodeFetcher {
    fn get_code(&self, address: &Address) -> Result<Vec<u8>, FetchError>;
}

impl<F> CodeFetcher for F
where
    F: Fn(&Address) -> Result<Vec<u8>, FetchError>,
{
    fn get_code(&self, address: &Address) -> Result<Vec<u8>, FetchError> {
        self(address)
    }
}

/// What an account's code currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeKind {
    /// No code at all
    Empty,
    /// A delegation designator
    Delegated,
    /// Any other bytecode
    Contract,
}

/// Point-in-time view of an account's delegation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationStatus {
    pub is_delegated: bool,

    #[serde(with = "hex20_option")]
    pub delegate_address: Option<Address>,

    /// keccak256 of the raw code, for change detection
    #[serde(with = "hex32")]
    pub code_hash: [u8; 32],
}

impl DelegationStatus {
    /// Derive the status from raw code bytes
    pub fn from_code(code: &[u8]) -> Self {
        let delegate_address = parse_delegation(code);
        let code_hash = if code.is_empty() { KECCAK_EMPTY } else { keccak256(code) };

        Self {
            is_delegated: delegate_address.is_some(),
            delegate_address,
            code_hash,
        }
    }

    pub fn code_kind(&self) -> CodeKind {
        if self.is_delegated {
            CodeKind::Delegated
        } else if self.code_hash == KECCAK_EMPTY {
            CodeKind::Empty
        } else {
            CodeKind::Contract
        }
    }

    /// Whether the account currently delegates to `target`
    pub fn delegates_to(&self, target: &Address) -> bool {
        self.delegate_address.as_ref() == Some(target)
    }
}

/// Extract the delegate from a designator
///
/// Code must start with `0xef0100` and carry at least 20 more bytes;
/// anything shorter is treated as ordinary code.
pub fn parse_delegation(code: &[u8]) -> Option<Address> {
    if code.len() < DELEGATION_CODE_LEN || code[..3] != DELEGATION_PREFIX {
        return None;
    }

    let mut address = [0u8; 20];
    address.copy_from_slice(&code[3..DELEGATION_CODE_LEN]);
    Some(address)
}

/// Build the 23-byte designator for `delegate`
pub fn delegation_code(delegate: &Address) -> Vec<u8> {
    let mut code = Vec::with_capacity(DELEGATION_CODE_LEN);
    code.extend_from_slice(&DELEGATION_PREFIX);
    code.extend_from_slice(delegate);
    code
}

/// Read `address`'s code once and classify it
///
/// Fetch failures propagate as [`crate::error::Eip7702Error::Fetch`] unchanged.
pub fn inspect(address: &Address, fetcher: &dyn CodeFetcher) -> Eip7702Result<DelegationStatus> {
    let code = fetcher.get_code(address)?;
    let status = DelegationStatus::from_code(&code);

    log_info!(
        "delegation",
        "Inspected account code",
        address = format_address(address),
        kind = format!("{:?}", status.code_kind()),
        delegate = status.delegate_address.map(|d| format_address(&d)).unwrap_or_default(),
        code_len = code.len(),
    );

    Ok(status)
}
