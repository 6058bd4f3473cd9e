//! EIP-7702 Type Definitions
//!
//! Core types for EIP-7702 account delegation transactions.

use ethers_core::types::U256;
use secp256k1::ecdsa::{RecoverableSignature as SecpRecoverableSignature, RecoveryId};
use secp256k1::{Message, Secp256k1};
use serde::{Deserialize, Serialize};

use crate::codec::{Address, ZERO_ADDRESS};
use crate::error::{Eip7702Error, Eip7702Result};
use crate::serde_bytes::{hex20, hex32, hex32_vec, hex_bytes, parity, quantity, quantity_u64};
use crate::utils::crypto::address_from_public_key;

/// EIP-7702 Transaction type identifier
pub const EIP7702_TX_TYPE: u8 = 0x04;

/// Magic byte prefixed to the authorization signing payload
pub const AUTHORIZATION_MAGIC: u8 = 0x05;

/// Number of fields in the unsigned transaction list
pub const UNSIGNED_FIELD_COUNT: usize = 10;

/// Number of fields in the signed transaction list
pub const SIGNED_FIELD_COUNT: usize = 13;

/// A recoverable secp256k1 signature split into its wire components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoverableSignature {
    /// 0 or 1, never the legacy 27/28 offset
    #[serde(with = "parity")]
    pub y_parity: u8,

    #[serde(with = "hex32")]
    pub r: [u8; 32],

    #[serde(with = "hex32")]
    pub s: [u8; 32],
}

impl RecoverableSignature {
    /// Build from a parity bit and the 64-byte compact `r || s`
    pub fn from_compact(y_parity: u8, compact: &[u8; 64]) -> Eip7702Result<Self> {
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&compact[..32]);
        s.copy_from_slice(&compact[32..]);

        let signature = Self { y_parity, r, s };
        signature.validate()?;
        Ok(signature)
    }

    /// Reject a parity that has no one-byte wire form the decoder accepts
    ///
    /// The fields are public, so a signature built by hand can carry any `u8`.
    pub fn validate(&self) -> Eip7702Result<()> {
        if self.y_parity > 1 {
            return Err(Eip7702Error::InvalidSignature(format!(
                "y parity must be 0 or 1, got {}",
                self.y_parity
            )));
        }
        Ok(())
    }

    /// Parse a 65-byte `r || s || v` signature
    ///
    /// `v` may be the raw parity (0/1) or the legacy form (27/28).
    pub fn from_bytes(bytes: &[u8]) -> Eip7702Result<Self> {
        if bytes.len() != 65 {
            return Err(Eip7702Error::InvalidSignature(format!(
                "Expected 65 bytes, got {}",
                bytes.len()
            )));
        }

        let y_parity = match bytes[64] {
            0 | 1 => bytes[64],
            27 | 28 => bytes[64] - 27,
            v => {
                return Err(Eip7702Error::InvalidSignature(format!("unsupported v value {}", v)));
            }
        };

        let mut compact = [0u8; 64];
        compact.copy_from_slice(&bytes[..64]);
        Self::from_compact(y_parity, &compact)
    }

    /// Get the 65-byte signature (r || s || v) with `v = 27 + y_parity`
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut sig = [0u8; 65];
        sig[..32].copy_from_slice(&self.r);
        sig[32..64].copy_from_slice(&self.s);
        sig[64] = 27 + (self.y_parity & 1);
        sig
    }

    /// Recover the address that produced this signature over `digest`
    pub fn recover(&self, digest: &[u8; 32]) -> Eip7702Result<Address> {
        let recovery_id = RecoveryId::from_i32(self.y_parity as i32)
            .map_err(|e| Eip7702Error::InvalidSignature(format!("Invalid recovery ID: {}", e)))?;

        let mut compact = [0u8; 64];
        compact[..32].copy_from_slice(&self.r);
        compact[32..].copy_from_slice(&self.s);

        let sig = SecpRecoverableSignature::from_compact(&compact, recovery_id)
            .map_err(|e| Eip7702Error::InvalidSignature(e.to_string()))?;

        let secp = Secp256k1::verification_only();
        let msg = Message::from_digest(*digest);
        let public_key = secp
            .recover_ecdsa(&msg, &sig)
            .map_err(|e| Eip7702Error::InvalidSignature(format!("Recovery failed: {}", e)))?;

        Ok(address_from_public_key(&public_key))
    }
}

/// An unsigned EIP-7702 authorization tuple
///
/// Declares that the authority's code should point at `address` on
/// `chain_id` (0 = any chain) while its nonce equals `nonce`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authorization {
    /// Chain ID for replay protection
    #[serde(with = "quantity_u64")]
    pub chain_id: u64,

    /// Contract address to delegate to
    #[serde(with = "hex20")]
    pub address: Address,

    /// Nonce of the authorizing account (for replay protection)
    #[serde(with = "quantity_u64")]
    pub nonce: u64,
}

impl Authorization {
    /// Create a new unsigned authorization
    pub fn new(chain_id: u64, address: Address, nonce: u64) -> Self {
        Self { chain_id, address, nonce }
    }

    /// An authorization that clears any existing delegation
    pub fn revocation(chain_id: u64, nonce: u64) -> Self {
        Self::new(chain_id, ZERO_ADDRESS, nonce)
    }

    /// Delegate is the zero address
    pub fn is_revocation(&self) -> bool {
        self.address == ZERO_ADDRESS
    }

    /// Chain id 0 authorizes on every chain
    pub fn is_chain_agnostic(&self) -> bool {
        self.chain_id == 0
    }

    /// Whether clients on `chain_id` accept this tuple
    pub fn applies_to_chain(&self, chain_id: u64) -> bool {
        self.is_chain_agnostic() || self.chain_id == chain_id
    }
}

/// An authorization together with the authority's signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignedAuthorization {
    #[serde(flatten)]
    pub authorization: Authorization,

    #[serde(flatten)]
    pub signature: RecoverableSignature,
}

impl SignedAuthorization {
    pub fn new(authorization: Authorization, signature: RecoverableSignature) -> Self {
        Self { authorization, signature }
    }

    pub fn chain_id(&self) -> u64 {
        self.authorization.chain_id
    }

    pub fn address(&self) -> &Address {
        &self.authorization.address
    }

    pub fn nonce(&self) -> u64 {
        self.authorization.nonce
    }
}

/// Access list entry (address + storage keys)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessListEntry {
    #[serde(with = "hex20")]
    pub address: Address,

    #[serde(default, with = "hex32_vec")]
    pub storage_keys: Vec<[u8; 32]>,
}

/// EIP-7702 transaction body before signing
///
/// Built in memory from caller parameters and consumed immediately by
/// the signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedTransaction {
    #[serde(with = "quantity_u64")]
    pub chain_id: u64,

    #[serde(with = "quantity_u64")]
    pub nonce: u64,

    /// Max priority fee per gas (tip)
    #[serde(with = "quantity")]
    pub max_priority_fee_per_gas: U256,

    #[serde(with = "quantity")]
    pub max_fee_per_gas: U256,

    #[serde(with = "quantity_u64")]
    pub gas_limit: u64,

    /// Destination; type-4 transactions cannot create contracts
    #[serde(with = "hex20")]
    pub to: Address,

    /// Value in wei
    #[serde(with = "quantity")]
    pub value: U256,

    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,

    /// Access list (EIP-2930)
    pub access_list: Vec<AccessListEntry>,

    /// Authorization list (EIP-7702)
    pub authorization_list: Vec<SignedAuthorization>,
}

/// Unsigned body plus the sender's signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    #[serde(flatten)]
    pub transaction: UnsignedTransaction,

    #[serde(flatten)]
    pub signature: RecoverableSignature,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_bytes_use_legacy_v() {
        let sig = RecoverableSignature { y_parity: 1, r: [0x11; 32], s: [0x22; 32] };
        let bytes = sig.to_bytes();

        assert_eq!(bytes[64], 28);
        assert_eq!(RecoverableSignature::from_bytes(&bytes).unwrap(), sig);
    }

    #[test]
    fn test_signature_rejects_bad_v() {
        let mut bytes = [0u8; 65];
        bytes[64] = 29;
        assert!(RecoverableSignature::from_bytes(&bytes).is_err());
        assert!(RecoverableSignature::from_bytes(&bytes[..64]).is_err());
        assert!(RecoverableSignature::from_compact(2, &[0u8; 64]).is_err());
    }

    #[test]
    fn test_signature_bytes_never_overflow_v() {
        let sig = RecoverableSignature { y_parity: 255, r: [0x11; 32], s: [0x22; 32] };
        assert_eq!(sig.to_bytes()[64], 28);
        assert!(sig.validate().is_err());
    }

    #[test]
    fn test_signature_json_rejects_wide_parity() {
        let json = r#"{"yParity": 2, "r": "0x01", "s": "0x02"}"#;
        assert!(serde_json::from_str::<RecoverableSignature>(json).is_err());

        let json = r#"{"yParity": "0x1", "r": "0x01", "s": "0x02"}"#;
        assert_eq!(serde_json::from_str::<RecoverableSignature>(json).unwrap().y_parity, 1);
    }

    #[test]
    fn test_authorization_predicates() {
        let revoke = Authorization::revocation(1, 0);
        assert!(revoke.is_revocation());
        assert!(!revoke.is_chain_agnostic());
        assert!(revoke.applies_to_chain(1));
        assert!(!revoke.applies_to_chain(11155111));

        let any_chain = Authorization::new(0, [0xbb; 20], 3);
        assert!(!any_chain.is_revocation());
        assert!(any_chain.applies_to_chain(1));
        assert!(any_chain.applies_to_chain(11155111));
    }

    #[test]
    fn test_signed_authorization_json_is_flat() {
        let signed = SignedAuthorization::new(
            Authorization::new(1, [0xbb; 20], 0),
            RecoverableSignature { y_parity: 0, r: [0x01; 32], s: [0x02; 32] },
        );
        let json = serde_json::to_value(signed).unwrap();

        assert_eq!(json["chainId"], 1);
        assert_eq!(json["nonce"], 0);
        assert_eq!(json["yParity"], 0);
        assert_eq!(json["address"], "0xbBbBBBBbbBBBbbbBbbBbbbbBBbBbbbbBbBbbBBbB");

        let back: SignedAuthorization = serde_json::from_value(json).unwrap();
        assert_eq!(back, signed);
    }
}
