//! Address Codec
//!
//! Addresses are always 20 bytes on the wire, including the zero
//! address (which an authorization uses to clear a delegation).

use crate::error::{Eip7702Error, Eip7702Result};
use crate::log_warn;
use crate::utils::crypto::to_checksum_address;

/// A 20-byte account address
pub type Address = [u8; 20];

/// The all-zero address
pub const ZERO_ADDRESS: Address = [0u8; 20];

/// Normalise raw bytes to exactly 20 bytes
///
/// Oversized input keeps the rightmost 20 bytes, undersized input is
/// right-aligned over zeros. Well-formed callers always pass 20 bytes.
pub fn to_address_bytes(input: &[u8]) -> Address {
    let mut address = ZERO_ADDRESS;

    if input.len() >= 20 {
        if input.len() > 20 {
            log_warn!("codec", "Truncating oversized address input", length = input.len());
        }
        address.copy_from_slice(&input[input.len() - 20..]);
    } else {
        log_warn!("codec", "Padding undersized address input", length = input.len());
        address[20 - input.len()..].copy_from_slice(input);
    }

    address
}

/// Parse a `0x`-prefixed (or bare) 40-character hex address
///
/// Mixed-case input must carry a valid EIP-55 checksum.
pub fn parse_address(input: &str) -> Eip7702Result<Address> {
    let trimmed = input.trim();
    let hex_part = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if hex_part.len() != 40 {
        return Err(Eip7702Error::InvalidAddress(format!(
            "expected 40 hex characters, got {}",
            hex_part.len()
        )));
    }

    let bytes = hex::decode(hex_part)
        .map_err(|e| Eip7702Error::InvalidAddress(format!("invalid hex: {}", e)))?;
    let address = to_address_bytes(&bytes);

    let has_lower = hex_part.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex_part.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        let expected = to_checksum_address(&address);
        if expected[2..] != *hex_part {
            return Err(Eip7702Error::InvalidAddress(format!(
                "checksum mismatch, expected {}",
                expected
            )));
        }
    }

    Ok(address)
}

/// EIP-55 checksummed form
pub fn format_address(address: &Address) -> String {
    to_checksum_address(address)
}
