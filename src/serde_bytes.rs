//! Serde helpers for hex byte fields and quantities
//!
//! JSON carries addresses and byte strings as `0x` hex, and quantities
//! either as numbers or as decimal / `0x` hex strings.

use ethers_core::types::U256;
use serde::{Deserialize, Deserializer, Serializer};

fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s)
}

/// `[u8; 20]` as checksummed `0x` hex; parsing is strict (40 hex chars)
pub mod hex20 {
    use super::*;

    pub fn serialize<S>(bytes: &[u8; 20], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&crate::codec::format_address(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 20], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        crate::codec::parse_address(&s).map_err(serde::de::Error::custom)
    }
}

/// `Option<[u8; 20]>` as `0x` hex or null
pub mod hex20_option {
    use super::*;

    pub fn serialize<S>(bytes: &Option<[u8; 20]>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match bytes {
            Some(b) => serializer.serialize_some(&crate::codec::format_address(b)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<[u8; 20]>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt: Option<String> = Option::deserialize(deserializer)?;
        opt.map(|s| crate::codec::parse_address(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// `[u8; 32]` as `0x` hex; shorter input is left-padded, as signature components often arrive trimmed
pub mod hex32 {
    use super::*;

    pub fn serialize<S>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 32], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(strip_0x(&s)).map_err(serde::de::Error::custom)?;
        crate::codec::to_word(&bytes).map_err(serde::de::Error::custom)
    }
}

/// `Vec<[u8; 32]>` as a list of `0x` hex words
pub mod hex32_vec {
    use super::*;
    use serde::ser::SerializeSeq;

    pub fn serialize<S>(words: &[[u8; 32]], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(words.len()))?;
        for word in words {
            seq.serialize_element(&format!("0x{}", hex::encode(word)))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<[u8; 32]>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let items: Vec<String> = Vec::deserialize(deserializer)?;
        items
            .iter()
            .map(|s| {
                let bytes = hex::decode(strip_0x(s)).map_err(serde::de::Error::custom)?;
                crate::codec::to_word(&bytes).map_err(serde::de::Error::custom)
            })
            .collect()
    }
}

/// `Vec<u8>` as `0x` hex
pub mod hex_bytes {
    use super::*;

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        hex::decode(strip_0x(&s)).map_err(serde::de::Error::custom)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QuantityInput {
    Number(u64),
    Negative(i64),
    Text(String),
}

/// `U256` from a JSON number or string; written back as a decimal string
///
/// Negative input, as a number or as text, fails with the encoding error
/// from [`crate::codec::parse_quantity`].
pub mod quantity {
    use super::*;

    pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
    where
        D: Deserializer<'de>,
    {
        match QuantityInput::deserialize(deserializer)? {
            QuantityInput::Number(n) => Ok(U256::from(n)),
            QuantityInput::Negative(n) => crate::codec::parse_quantity(&n.to_string()).map_err(serde::de::Error::custom),
            QuantityInput::Text(s) => crate::codec::parse_quantity(&s).map_err(serde::de::Error::custom),
        }
    }
}

/// `u64` from a JSON number or string; written back as a number
pub mod quantity_u64 {
    use super::*;

    pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(*value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match QuantityInput::deserialize(deserializer)? {
            QuantityInput::Number(n) => Ok(n),
            QuantityInput::Negative(n) => crate::codec::parse_u64(&n.to_string()).map_err(serde::de::Error::custom),
            QuantityInput::Text(s) => crate::codec::parse_u64(&s).map_err(serde::de::Error::custom),
        }
    }
}

/// Signature parity: `0` or `1`, as a number or quantity string
pub mod parity {
    use super::*;

    pub fn serialize<S>(value: &u8, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(*value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u8, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = quantity_u64::deserialize(deserializer)?;
        match value {
            0 | 1 => Ok(value as u8),
            v => Err(serde::de::Error::custom(format!("y parity must be 0 or 1, got {}", v))),
        }
    }
}
