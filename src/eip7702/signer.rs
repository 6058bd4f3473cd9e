//! EIP-7702 Transaction Signing
//!
//! High-level signing interface for EIP-7702 transactions. Authorization
//! and transaction signing depend only on [`DigestSigner`]; a local key,
//! a hardware device and a remote quorum are all just implementations.

use std::fmt;

use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use zeroize::Zeroizing;

use super::authorization::{address_field, recover_authorization_signer, signature_from_items, signature_items};
use super::transaction::transaction_signing_hash;
use super::types::{
    AccessListEntry, RecoverableSignature, SignedAuthorization, SignedTransaction, UnsignedTransaction,
    EIP7702_TX_TYPE, SIGNED_FIELD_COUNT, UNSIGNED_FIELD_COUNT,
};
use crate::codec::{format_address, u256_from_minimal, u64_from_minimal, Address};
use crate::error::{Eip7702Error, Eip7702Result};
use crate::rlp::{decode_exact, RlpItem};
use crate::utils::crypto::{address_from_public_key, keccak256};
use crate::log_info;

/// Capability to sign a 32-byte digest with a recoverable secp256k1 signature
pub trait DigestSigner {
    /// Address the signatures recover to
    fn address(&self) -> Address;

    /// Sign `digest`, or refuse with a signing error
    fn sign_digest(&self, digest: &[u8; 32]) -> Eip7702Result<RecoverableSignature>;
}

/// Signer backed by an in-memory private key
pub struct LocalSigner {
    secret_key: SecretKey,
    address: Address,
}

impl LocalSigner {
    /// Create from 32 raw key bytes
    pub fn from_bytes(private_key: &[u8]) -> Eip7702Result<Self> {
        if private_key.len() != 32 {
            return Err(Eip7702Error::InvalidPrivateKey(format!(
                "Expected 32 bytes, got {}",
                private_key.len()
            )));
        }
        if private_key.iter().all(|&b| b == 0) {
            return Err(Eip7702Error::InvalidPrivateKey("Private key is all zeros".to_string()));
        }

        let secret_key = SecretKey::from_slice(private_key)
            .map_err(|e| Eip7702Error::InvalidPrivateKey(e.to_string()))?;

        let secp = Secp256k1::signing_only();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);

        Ok(Self {
            secret_key,
            address: address_from_public_key(&public_key),
        })
    }

    /// Create from a hex key, with or without `0x`
    pub fn from_hex(private_key_hex: &str) -> Eip7702Result<Self> {
        let trimmed = private_key_hex.trim();
        let hex_part = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = Zeroizing::new(
            hex::decode(hex_part)
                .map_err(|_| Eip7702Error::InvalidPrivateKey("key is not valid hex".to_string()))?,
        );
        Self::from_bytes(&bytes)
    }
}

impl DigestSigner for LocalSigner {
    fn address(&self) -> Address {
        self.address
    }

    fn sign_digest(&self, digest: &[u8; 32]) -> Eip7702Result<RecoverableSignature> {
        let secp = Secp256k1::signing_only();
        let msg = Message::from_digest(*digest);
        let (recovery_id, compact) = secp.sign_ecdsa_recoverable(&msg, &self.secret_key).serialize_compact();

        RecoverableSignature::from_compact(recovery_id.to_i32() as u8, &compact)
    }
}

impl Drop for LocalSigner {
    fn drop(&mut self) {
        self.secret_key.non_secure_erase();
    }
}

impl fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &format_address(&self.address))
            .finish_non_exhaustive()
    }
}

/// Outcome reported by an external signing device or service
pub type ExternalSignResult = Result<[u8; 65], String>;

/// Adapter for signers that live outside this process
///
/// The callback returns `r || s || v` (65 bytes) or a rejection reason.
/// Every signature is checked against the declared address before use.
pub struct ExternalSigner<F>
where
    F: Fn(&[u8; 32]) -> ExternalSignResult,
{
    address: Address,
    sign_fn: F,
}

impl<F> ExternalSigner<F>
where
    F: Fn(&[u8; 32]) -> ExternalSignResult,
{
    pub fn new(address: Address, sign_fn: F) -> Self {
        Self { address, sign_fn }
    }
}

impl<F> DigestSigner for ExternalSigner<F>
where
    F: Fn(&[u8; 32]) -> ExternalSignResult,
{
    fn address(&self) -> Address {
        self.address
    }

    fn sign_digest(&self, digest: &[u8; 32]) -> Eip7702Result<RecoverableSignature> {
        let raw = (self.sign_fn)(digest)
            .map_err(|reason| Eip7702Error::SigningError(format!("signer rejected digest: {}", reason)))?;
        let signature = RecoverableSignature::from_bytes(&raw)?;

        let recovered = signature.recover(digest)?;
        if recovered != self.address {
            return Err(Eip7702Error::SigningError(format!(
                "signature recovers to {}, expected {}",
                format_address(&recovered),
                format_address(&self.address)
            )));
        }

        Ok(signature)
    }
}

impl<F> fmt::Debug for ExternalSigner<F>
where
    F: Fn(&[u8; 32]) -> ExternalSignResult,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalSigner")
            .field("address", &format_address(&self.address))
            .finish_non_exhaustive()
    }
}

/// Sign an EIP-7702 transaction
///
/// Every authorization in the list must carry a parity of 0 or 1, so the
/// signed payload always decodes again.
pub fn sign_transaction(signer: &dyn DigestSigner, tx: &UnsignedTransaction) -> Eip7702Result<SignedTransaction> {
    for authorization in &tx.authorization_list {
        authorization.signature.validate()?;
    }

    let signing_hash = transaction_signing_hash(tx);
    let signature = signer.sign_digest(&signing_hash)?;

    let signed = SignedTransaction {
        transaction: tx.clone(),
        signature,
    };

    log_info!(
        "eip7702",
        "Transaction signed",
        chain_id = tx.chain_id,
        nonce = tx.nonce,
        authorizations = tx.authorization_count(),
        sender = format_address(&signer.address()),
        tx_hash = format!("0x{}", hex::encode(signed.hash())),
    );

    Ok(signed)
}

/// Sign and return the broadcastable `0x`-hex payload
pub fn sign_and_serialize(signer: &dyn DigestSigner, tx: &UnsignedTransaction) -> Eip7702Result<String> {
    Ok(sign_transaction(signer, tx)?.to_hex())
}

impl SignedTransaction {
    /// Wire bytes: `0x04 || rlp(13 fields)`
    pub fn encode(&self) -> Vec<u8> {
        let mut fields = self.transaction.rlp_fields();
        fields.extend(signature_items(&self.signature));

        let rlp = RlpItem::list(fields).encode();
        let mut encoded = Vec::with_capacity(1 + rlp.len());
        encoded.push(EIP7702_TX_TYPE);
        encoded.extend_from_slice(&rlp);
        encoded
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.encode()))
    }

    /// Transaction hash as it will appear on chain
    pub fn hash(&self) -> [u8; 32] {
        keccak256(&self.encode())
    }
}

/// Get the transaction hash (for tracking after broadcast)
pub fn transaction_hash(signed: &SignedTransaction) -> [u8; 32] {
    signed.hash()
}

/// Parse a signed wire payload back into its parts
///
/// Only the exact layout produced by [`SignedTransaction::encode`] is
/// accepted: type byte 0x04, 13 fields, 20-byte addresses, 32-byte `r`/`s`.
pub fn decode_signed_transaction(bytes: &[u8]) -> Eip7702Result<SignedTransaction> {
    let (type_byte, payload) = bytes
        .split_first()
        .ok_or_else(|| Eip7702Error::MalformedTransaction("empty payload".to_string()))?;
    if *type_byte != EIP7702_TX_TYPE {
        return Err(Eip7702Error::MalformedTransaction(format!(
            "expected type 0x04, got 0x{:02x}",
            type_byte
        )));
    }

    let item = decode_exact(payload)?;
    let fields = item.as_list()?;
    if fields.len() != SIGNED_FIELD_COUNT {
        return Err(Eip7702Error::MalformedTransaction(format!(
            "expected {} fields, got {}",
            SIGNED_FIELD_COUNT,
            fields.len()
        )));
    }

    let transaction = UnsignedTransaction {
        chain_id: u64_from_minimal(fields[0].as_bytes()?)?,
        nonce: u64_from_minimal(fields[1].as_bytes()?)?,
        max_priority_fee_per_gas: u256_from_minimal(fields[2].as_bytes()?)?,
        max_fee_per_gas: u256_from_minimal(fields[3].as_bytes()?)?,
        gas_limit: u64_from_minimal(fields[4].as_bytes()?)?,
        to: address_field(&fields[5], "to")?,
        value: u256_from_minimal(fields[6].as_bytes()?)?,
        data: fields[7].as_bytes()?.to_vec(),
        access_list: fields[8]
            .as_list()?
            .iter()
            .map(access_list_entry_from_rlp)
            .collect::<Eip7702Result<Vec<_>>>()?,
        authorization_list: fields[9]
            .as_list()?
            .iter()
            .map(SignedAuthorization::from_rlp)
            .collect::<Eip7702Result<Vec<_>>>()?,
    };
    let signature = signature_from_items(&fields[UNSIGNED_FIELD_COUNT..])?;

    Ok(SignedTransaction { transaction, signature })
}

fn access_list_entry_from_rlp(item: &RlpItem) -> Eip7702Result<AccessListEntry> {
    let fields = item.as_list()?;
    if fields.len() != 2 {
        return Err(Eip7702Error::MalformedTransaction(format!(
            "access list entry needs 2 fields, got {}",
            fields.len()
        )));
    }

    let storage_keys = fields[1]
        .as_list()?
        .iter()
        .map(|key| {
            let bytes = key.as_bytes()?;
            <[u8; 32]>::try_from(bytes).map_err(|_| {
                Eip7702Error::MalformedTransaction(format!("storage key must be 32 bytes, got {}", bytes.len()))
            })
        })
        .collect::<Eip7702Result<Vec<_>>>()?;

    Ok(AccessListEntry {
        address: address_field(&fields[0], "access list address")?,
        storage_keys,
    })
}

/// Recover the signer of a signed transaction
pub fn recover_transaction_signer(signed: &SignedTransaction) -> Eip7702Result<Address> {
    let signing_hash = transaction_signing_hash(&signed.transaction);
    signed.signature.recover(&signing_hash)
}

/// Recover the authority of every authorization, in list order
pub fn verify_transaction_authorizations(tx: &UnsignedTransaction) -> Eip7702Result<Vec<Address>> {
    tx.authorization_list.iter().map(recover_authorization_signer).collect()
}
