//! Integer Codecs
//!
//! Two distinct big-endian representations are needed on the wire:
//! - minimal bytes (no leading zero, empty for zero) for RLP scalars
//! - fixed width, left-zero-padded, for signature components
//!
//! Mixing them up corrupts signatures, so each has its own function.

use ethers_core::types::U256;

use crate::error::{Eip7702Error, Eip7702Result};

/// Unsigned integers that can be rendered as big-endian bytes
pub trait Quantity: Copy {
    fn to_be_bytes_vec(self) -> Vec<u8>;
}

macro_rules! impl_quantity {
    ($($t:ty),*) => {
        $(
            impl Quantity for $t {
                fn to_be_bytes_vec(self) -> Vec<u8> {
                    self.to_be_bytes().to_vec()
                }
            }
        )*
    };
}

impl_quantity!(u8, u16, u32, u64, u128, usize);

impl Quantity for U256 {
    fn to_be_bytes_vec(self) -> Vec<u8> {
        let mut out = [0u8; 32];
        self.to_big_endian(&mut out);
        out.to_vec()
    }
}

/// Strip leading zero bytes
pub fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

/// Shortest big-endian representation; empty for zero
pub fn to_minimal_bytes<Q: Quantity>(value: Q) -> Vec<u8> {
    trim_leading_zeros(&value.to_be_bytes_vec()).to_vec()
}

/// Exactly `width` big-endian bytes, left-padded with zeros
pub fn to_fixed_bytes<Q: Quantity>(value: Q, width: usize) -> Eip7702Result<Vec<u8>> {
    left_pad(&value.to_be_bytes_vec(), width)
}

/// Left-pad a big-endian byte string to `width`
///
/// Leading zeros beyond `width` are dropped; significant bytes never are.
pub fn left_pad(bytes: &[u8], width: usize) -> Eip7702Result<Vec<u8>> {
    let significant = trim_leading_zeros(bytes);
    if significant.len() > width {
        return Err(Eip7702Error::EncodingError(format!(
            "value needs {} bytes, exceeds fixed width {}",
            significant.len(),
            width
        )));
    }

    let mut out = vec![0u8; width];
    out[width - significant.len()..].copy_from_slice(significant);
    Ok(out)
}

/// Left-pad into a 32-byte word
pub fn to_word(bytes: &[u8]) -> Eip7702Result<[u8; 32]> {
    let padded = left_pad(bytes, 32)?;
    let mut word = [0u8; 32];
    word.copy_from_slice(&padded);
    Ok(word)
}

/// Read a minimal big-endian integer back into a u64
pub fn u64_from_minimal(bytes: &[u8]) -> Eip7702Result<u64> {
    check_minimal(bytes, 8)?;
    Ok(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64))
}

/// Read a minimal big-endian integer back into a U256
pub fn u256_from_minimal(bytes: &[u8]) -> Eip7702Result<U256> {
    check_minimal(bytes, 32)?;
    Ok(U256::from_big_endian(bytes))
}

fn check_minimal(bytes: &[u8], max_len: usize) -> Eip7702Result<()> {
    if bytes.first() == Some(&0) {
        return Err(Eip7702Error::EncodingError("integer has a leading zero byte".to_string()));
    }
    if bytes.len() > max_len {
        return Err(Eip7702Error::EncodingError(format!(
            "integer of {} bytes exceeds {} bytes",
            bytes.len(),
            max_len
        )));
    }
    Ok(())
}

/// Message carried by every negative-quantity rejection
///
/// Also used to recognise the rejection after it has passed through serde.
pub const NEGATIVE_QUANTITY: &str = "negative quantity not representable";

/// Parse a quantity from text: decimal, or hex with a `0x` prefix
///
/// Negative values are rejected as encoding errors; nothing downstream
/// can represent them.
pub fn parse_quantity(input: &str) -> Eip7702Result<U256> {
    let s = input.trim();
    if s.is_empty() {
        return Err(Eip7702Error::InvalidInput("empty quantity".to_string()));
    }
    if s.starts_with('-') {
        return Err(Eip7702Error::EncodingError(format!("{}: {}", NEGATIVE_QUANTITY, s)));
    }

    if let Some(hex_digits) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if hex_digits.is_empty() {
            return Ok(U256::zero());
        }
        if hex_digits.len() > 64 {
            return Err(Eip7702Error::EncodingError(format!("quantity exceeds 256 bits: {}", s)));
        }
        return U256::from_str_radix(hex_digits, 16)
            .map_err(|e| Eip7702Error::InvalidInput(format!("invalid hex quantity {}: {:?}", s, e)));
    }

    U256::from_dec_str(s).map_err(|e| Eip7702Error::InvalidInput(format!("invalid quantity {}: {:?}", s, e)))
}

/// Parse a quantity that must fit in 64 bits
pub fn parse_u64(input: &str) -> Eip7702Result<u64> {
    let value = parse_quantity(input)?;
    if value > U256::from(u64::MAX) {
        return Err(Eip7702Error::EncodingError(format!("{} exceeds 64 bits", input.trim())));
    }
    Ok(value.low_u64())
}
