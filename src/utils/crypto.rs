//! Hashing and Address Helpers
//!
//! Keccak-256 plus the Ethereum address derivations used by the
//! signing and inspection code.

use secp256k1::PublicKey;
use tiny_keccak::{Hasher, Keccak};

/// keccak256 of the empty byte string
pub const KECCAK_EMPTY: [u8; 32] = [
    0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03, 0xc0,
    0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85, 0xa4, 0x70,
];

/// Keccak256 hash
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

/// keccak256 over a one-byte domain prefix followed by a payload
pub fn keccak256_prefixed(prefix: u8, payload: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(&[prefix]);
    hasher.update(payload);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

/// Ethereum address of a secp256k1 public key (last 20 bytes of the keccak of the uncompressed point)
pub fn address_from_public_key(public_key: &PublicKey) -> [u8; 20] {
    let uncompressed = public_key.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

/// Convert raw address bytes to checksummed Ethereum address
pub fn to_checksum_address(address: &[u8]) -> String {
    let lower = hex::encode(address);
    let hash = keccak256(lower.as_bytes());

    let mut result = String::from("0x");
    for (i, ch) in lower.chars().enumerate() {
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };

        if ch.is_ascii_digit() || nibble < 8 {
            result.push(ch);
        } else {
            result.push(ch.to_ascii_uppercase());
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use secp256k1::{Secp256k1, SecretKey};

    #[test]
    fn test_keccak_empty_constant() {
        assert_eq!(keccak256(&[]), KECCAK_EMPTY);
    }

    #[test]
    fn test_prefixed_matches_concatenation() {
        let payload = [0xc3, 0x01, 0x02, 0x03];
        let mut joined = vec![0x05];
        joined.extend_from_slice(&payload);
        assert_eq!(keccak256_prefixed(0x05, &payload), keccak256(&joined));
    }

    #[test]
    fn test_address_from_key_one() {
        // Private key 1 maps to the well-known generator-point address
        let mut key = [0u8; 32];
        key[31] = 1;
        let secp = Secp256k1::new();
        let secret = SecretKey::from_slice(&key).unwrap();
        let public = PublicKey::from_secret_key(&secp, &secret);

        assert_eq!(
            hex::encode(address_from_public_key(&public)),
            "7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn test_checksum_address() {
        let addr_bytes = hex::decode("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap();
        assert_eq!(
            to_checksum_address(&addr_bytes),
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );
    }
}
