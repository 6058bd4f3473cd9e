//! EIP-7702 Authorization Handling
//!
//! Implements authorization signing and verification for EIP-7702.
//!
//! Signing digest: `keccak256(0x05 || rlp([chain_id, address, nonce]))`.
//! List entry on the wire: `rlp([chain_id, address, nonce, y_parity, r, s])`
//! with `y_parity` as one raw byte and `r`/`s` as 32 fixed bytes.

use super::signer::{DigestSigner, LocalSigner};
use super::types::{Authorization, RecoverableSignature, SignedAuthorization, AUTHORIZATION_MAGIC};
use crate::codec::{format_address, to_address_bytes, to_minimal_bytes, u64_from_minimal, Address};
use crate::error::{Eip7702Error, Eip7702Result};
use crate::log_info;
use crate::rlp::{RlpItem, ToRlp};
use crate::utils::crypto::keccak256_prefixed;

impl ToRlp for Authorization {
    fn to_rlp(&self) -> RlpItem {
        RlpItem::list(vec![
            RlpItem::bytes(to_minimal_bytes(self.chain_id)),
            RlpItem::bytes(self.address.to_vec()),
            RlpItem::bytes(to_minimal_bytes(self.nonce)),
        ])
    }
}

/// `[y_parity, r, s]` in wire order, spliced into the enclosing list
pub(crate) fn signature_items(signature: &RecoverableSignature) -> Vec<RlpItem> {
    vec![
        RlpItem::bytes(vec![signature.y_parity]),
        RlpItem::bytes(signature.r.to_vec()),
        RlpItem::bytes(signature.s.to_vec()),
    ]
}

/// Read `[y_parity, r, s]` back, enforcing the fixed widths
pub(crate) fn signature_from_items(items: &[RlpItem]) -> Eip7702Result<RecoverableSignature> {
    let [y_parity, r, s] = items else {
        return Err(Eip7702Error::MalformedTransaction(format!(
            "expected 3 signature fields, got {}",
            items.len()
        )));
    };

    let y_parity = match y_parity.as_bytes()? {
        [y] if *y <= 1 => *y,
        other => {
            return Err(Eip7702Error::MalformedTransaction(format!(
                "y parity must be a single 0/1 byte, got {}",
                hex::encode(other)
            )));
        }
    };

    Ok(RecoverableSignature {
        y_parity,
        r: fixed_word(r.as_bytes()?, "r")?,
        s: fixed_word(s.as_bytes()?, "s")?,
    })
}

fn fixed_word(bytes: &[u8], name: &str) -> Eip7702Result<[u8; 32]> {
    <[u8; 32]>::try_from(bytes).map_err(|_| {
        Eip7702Error::MalformedTransaction(format!("{} must be 32 bytes, got {}", name, bytes.len()))
    })
}

/// Read a 20-byte address field
pub(crate) fn address_field(item: &RlpItem, name: &str) -> Eip7702Result<Address> {
    let bytes = item.as_bytes()?;
    if bytes.len() != 20 {
        return Err(Eip7702Error::MalformedTransaction(format!(
            "{} must be 20 bytes, got {}",
            name,
            bytes.len()
        )));
    }
    Ok(to_address_bytes(bytes))
}

impl ToRlp for SignedAuthorization {
    fn to_rlp(&self) -> RlpItem {
        let mut items = match self.authorization.to_rlp() {
            RlpItem::List(items) => items,
            item => vec![item],
        };
        items.extend(signature_items(&self.signature));
        RlpItem::list(items)
    }
}

impl SignedAuthorization {
    /// Parse one authorization-list entry
    pub fn from_rlp(item: &RlpItem) -> Eip7702Result<Self> {
        let fields = item.as_list()?;
        if fields.len() != 6 {
            return Err(Eip7702Error::MalformedTransaction(format!(
                "authorization tuple needs 6 fields, got {}",
                fields.len()
            )));
        }

        let authorization = Authorization {
            chain_id: u64_from_minimal(fields[0].as_bytes()?)?,
            address: address_field(&fields[1], "authorization address")?,
            nonce: u64_from_minimal(fields[2].as_bytes()?)?,
        };
        let signature = signature_from_items(&fields[3..])?;

        Ok(Self { authorization, signature })
    }
}

/// Get the hash to sign for an authorization
///
/// Per EIP-7702: `keccak256(0x05 || rlp([chain_id, address, nonce]))`
pub fn authorization_signing_hash(authorization: &Authorization) -> [u8; 32] {
    keccak256_prefixed(AUTHORIZATION_MAGIC, &authorization.rlp_bytes())
}

/// Sign an authorization with any digest signer
///
/// The signer is the authority: the account whose code will point at
/// `authorization.address`.
pub fn sign_authorization(
    signer: &dyn DigestSigner,
    authorization: Authorization,
) -> Eip7702Result<SignedAuthorization> {
    let digest = authorization_signing_hash(&authorization);
    let signature = signer.sign_digest(&digest)?;

    log_info!(
        "eip7702",
        "Authorization signed",
        chain_id = authorization.chain_id,
        delegate = format_address(&authorization.address),
        authority = format_address(&signer.address()),
        nonce = authorization.nonce,
    );

    Ok(SignedAuthorization::new(authorization, signature))
}

/// Sign an authorization with a raw 32-byte private key
pub fn sign_authorization_with_key(
    private_key: &[u8],
    authorization: Authorization,
) -> Eip7702Result<SignedAuthorization> {
    let signer = LocalSigner::from_bytes(private_key)?;
    sign_authorization(&signer, authorization)
}

/// Recover the signer address from a signed authorization
pub fn recover_authorization_signer(signed: &SignedAuthorization) -> Eip7702Result<Address> {
    let digest = authorization_signing_hash(&signed.authorization);
    signed.signature.recover(&digest)
}

/// Verify an authorization was signed by the expected authority
///
/// Unrecoverable signatures count as a mismatch.
pub fn verify_authorization(signed: &SignedAuthorization, expected_signer: &Address) -> bool {
    match recover_authorization_signer(signed) {
        Ok(recovered) => &recovered == expected_signer,
        Err(_) => false,
    }
}
