//! EIP-7702 Transaction Encoding
//!
//! RLP encoding for EIP-7702 (type 0x04) transactions.
//!
//! Transaction format:
//! ```text
//! 0x04 || rlp([chain_id, nonce, max_priority_fee_per_gas, max_fee_per_gas,
//!              gas_limit, to, value, data, access_list, authorization_list,
//!              y_parity, r, s])
//! ```
//! The signing digest covers the first ten fields under the same type byte.

use ethers_core::types::U256;
use serde::{Deserialize, Serialize};

use super::types::{
    AccessListEntry, SignedAuthorization, UnsignedTransaction, EIP7702_TX_TYPE,
};
use crate::codec::{to_minimal_bytes, Address};
use crate::error::{Eip7702Error, Eip7702Result};
use crate::rlp::{RlpItem, ToRlp};
use crate::serde_bytes::{hex20, hex_bytes, quantity, quantity_u64};
use crate::utils::crypto::keccak256_prefixed;
use crate::log_warn;

/// Caller-supplied parameters for a type-4 transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionParams {
    #[serde(with = "quantity_u64")]
    pub chain_id: u64,

    #[serde(with = "quantity_u64")]
    pub nonce: u64,

    #[serde(with = "quantity")]
    pub max_priority_fee_per_gas: U256,

    #[serde(with = "quantity")]
    pub max_fee_per_gas: U256,

    #[serde(with = "quantity_u64")]
    pub gas_limit: u64,

    #[serde(with = "hex20")]
    pub to: Address,

    #[serde(default, with = "quantity")]
    pub value: U256,

    #[serde(default, with = "hex_bytes")]
    pub data: Vec<u8>,

    #[serde(default)]
    pub access_list: Vec<AccessListEntry>,

    #[serde(default)]
    pub authorization_list: Vec<SignedAuthorization>,
}

/// Assemble an unsigned transaction; pure data, no cryptography
///
/// An empty authorization list still encodes. It is logged because it
/// cannot change any account's delegation.
pub fn build_unsigned(params: TransactionParams) -> UnsignedTransaction {
    if params.authorization_list.is_empty() {
        log_warn!(
            "eip7702",
            "Building type-4 transaction with empty authorization list",
            chain_id = params.chain_id,
            nonce = params.nonce,
        );
    }

    UnsignedTransaction {
        chain_id: params.chain_id,
        nonce: params.nonce,
        max_priority_fee_per_gas: params.max_priority_fee_per_gas,
        max_fee_per_gas: params.max_fee_per_gas,
        gas_limit: params.gas_limit,
        to: params.to,
        value: params.value,
        data: params.data,
        access_list: params.access_list,
        authorization_list: params.authorization_list,
    }
}

impl ToRlp for AccessListEntry {
    fn to_rlp(&self) -> RlpItem {
        RlpItem::list(vec![
            RlpItem::bytes(self.address.to_vec()),
            RlpItem::list(self.storage_keys.iter().map(|k| RlpItem::bytes(k.to_vec())).collect()),
        ])
    }
}

impl UnsignedTransaction {
    /// The ten unsigned fields in wire order
    pub(crate) fn rlp_fields(&self) -> Vec<RlpItem> {
        vec![
            RlpItem::bytes(to_minimal_bytes(self.chain_id)),
            RlpItem::bytes(to_minimal_bytes(self.nonce)),
            RlpItem::bytes(to_minimal_bytes(self.max_priority_fee_per_gas)),
            RlpItem::bytes(to_minimal_bytes(self.max_fee_per_gas)),
            RlpItem::bytes(to_minimal_bytes(self.gas_limit)),
            RlpItem::bytes(self.to.to_vec()),
            RlpItem::bytes(to_minimal_bytes(self.value)),
            RlpItem::bytes(self.data.clone()),
            RlpItem::list(self.access_list.iter().map(ToRlp::to_rlp).collect()),
            RlpItem::list(self.authorization_list.iter().map(ToRlp::to_rlp).collect()),
        ]
    }

    /// `0x04 || rlp(unsigned fields)`
    pub fn encode_for_signing(&self) -> Vec<u8> {
        let rlp = RlpItem::list(self.rlp_fields()).encode();
        let mut encoded = Vec::with_capacity(1 + rlp.len());
        encoded.push(EIP7702_TX_TYPE);
        encoded.extend_from_slice(&rlp);
        encoded
    }

    pub fn authorization_count(&self) -> usize {
        self.authorization_list.len()
    }

    /// True when the transaction carries at least one authorization
    pub fn is_delegation(&self) -> bool {
        !self.authorization_list.is_empty()
    }

    /// Fail unless the transaction carries at least one authorization
    ///
    /// For orchestration code that builds delegation-intent transactions.
    pub fn require_authorizations(&self) -> Eip7702Result<()> {
        if self.is_delegation() {
            Ok(())
        } else {
            Err(Eip7702Error::InvalidInput("authorization list is empty".to_string()))
        }
    }
}

impl ToRlp for UnsignedTransaction {
    fn to_rlp(&self) -> RlpItem {
        RlpItem::list(self.rlp_fields())
    }
}

/// Get the transaction hash for signing
///
/// `keccak256(0x04 || rlp([chain_id, ..., authorization_list]))`
pub fn transaction_signing_hash(tx: &UnsignedTransaction) -> [u8; 32] {
    keccak256_prefixed(EIP7702_TX_TYPE, &tx.rlp_bytes())
}

/// Fluent builder for EIP-7702 transactions
#[derive(Debug, Clone)]
pub struct Eip7702TransactionBuilder {
    chain_id: u64,
    nonce: u64,
    max_priority_fee_per_gas: U256,
    max_fee_per_gas: U256,
    gas_limit: Option<u64>,
    to: Option<Address>,
    value: U256,
    data: Vec<u8>,
    access_list: Vec<AccessListEntry>,
    authorization_list: Vec<SignedAuthorization>,
}

impl Eip7702TransactionBuilder {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            nonce: 0,
            max_priority_fee_per_gas: U256::zero(),
            max_fee_per_gas: U256::zero(),
            gas_limit: None,
            to: None,
            value: U256::zero(),
            data: Vec::new(),
            access_list: Vec::new(),
            authorization_list: Vec::new(),
        }
    }

    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn max_priority_fee(mut self, fee: impl Into<U256>) -> Self {
        self.max_priority_fee_per_gas = fee.into();
        self
    }

    pub fn max_fee(mut self, fee: impl Into<U256>) -> Self {
        self.max_fee_per_gas = fee.into();
        self
    }

    pub fn gas_limit(mut self, limit: u64) -> Self {
        self.gas_limit = Some(limit);
        self
    }

    pub fn to(mut self, to: Address) -> Self {
        self.to = Some(to);
        self
    }

    pub fn value(mut self, value: impl Into<U256>) -> Self {
        self.value = value.into();
        self
    }

    pub fn data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    pub fn access_list_entry(mut self, entry: AccessListEntry) -> Self {
        self.access_list.push(entry);
        self
    }

    pub fn authorization(mut self, auth: SignedAuthorization) -> Self {
        self.authorization_list.push(auth);
        self
    }

    pub fn authorizations(mut self, auths: Vec<SignedAuthorization>) -> Self {
        self.authorization_list = auths;
        self
    }

    /// Collect into [`TransactionParams`]; `to` and `gas_limit` are required
    pub fn params(self) -> Eip7702Result<TransactionParams> {
        let to = self
            .to
            .ok_or_else(|| Eip7702Error::InvalidInput("missing destination address".to_string()))?;
        let gas_limit = self
            .gas_limit
            .ok_or_else(|| Eip7702Error::InvalidInput("missing gas limit".to_string()))?;

        Ok(TransactionParams {
            chain_id: self.chain_id,
            nonce: self.nonce,
            max_priority_fee_per_gas: self.max_priority_fee_per_gas,
            max_fee_per_gas: self.max_fee_per_gas,
            gas_limit,
            to,
            value: self.value,
            data: self.data,
            access_list: self.access_list,
            authorization_list: self.authorization_list,
        })
    }

    pub fn build(self) -> Eip7702Result<UnsignedTransaction> {
        Ok(build_unsigned(self.params()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eip7702::types::{Authorization, RecoverableSignature};

    fn sample_auth() -> SignedAuthorization {
        SignedAuthorization::new(
            Authorization::new(1, [0xbb; 20], 0),
            RecoverableSignature { y_parity: 1, r: [0x11; 32], s: [0x22; 32] },
        )
    }

    fn sample_tx() -> UnsignedTransaction {
        Eip7702TransactionBuilder::new(1)
            .nonce(5)
            .max_priority_fee(1_000_000_000u64)
            .max_fee(2_000_000_000u64)
            .gas_limit(100_000)
            .to([0xaa; 20])
            .authorization(sample_auth())
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let tx = sample_tx();
        assert_eq!(tx.value, U256::zero());
        assert!(tx.data.is_empty());
        assert!(tx.access_list.is_empty());
        assert_eq!(tx.authorization_count(), 1);
        assert!(tx.is_delegation());
    }

    #[test]
    fn test_builder_requires_destination_and_gas() {
        let missing_to = Eip7702TransactionBuilder::new(1).gas_limit(100_000).build();
        assert!(matches!(missing_to, Err(Eip7702Error::InvalidInput(_))));

        let missing_gas = Eip7702TransactionBuilder::new(1).to([0xaa; 20]).build();
        assert!(matches!(missing_gas, Err(Eip7702Error::InvalidInput(_))));
    }

    #[test]
    fn test_unsigned_field_order() {
        let tx = sample_tx();
        let fields = tx.rlp_fields();

        assert_eq!(fields.len(), 10);
        assert_eq!(fields[0].as_bytes().unwrap(), &[0x01]);
        assert_eq!(fields[1].as_bytes().unwrap(), &[0x05]);
        assert_eq!(fields[2].as_bytes().unwrap(), &[0x3b, 0x9a, 0xca, 0x00]);
        assert_eq!(fields[3].as_bytes().unwrap(), &[0x77, 0x35, 0x94, 0x00]);
        assert_eq!(fields[4].as_bytes().unwrap(), &[0x01, 0x86, 0xa0]);
        assert_eq!(fields[5].as_bytes().unwrap(), &[0xaa; 20]);
        assert!(fields[6].as_bytes().unwrap().is_empty());
        assert!(fields[7].as_bytes().unwrap().is_empty());
        assert!(fields[8].as_list().unwrap().is_empty());
        assert_eq!(fields[9].as_list().unwrap().len(), 1);
    }

    #[test]
    fn test_encode_for_signing_prefix() {
        let encoded = sample_tx().encode_for_signing();
        assert_eq!(encoded[0], EIP7702_TX_TYPE);
        assert!(encoded[1] >= 0xf7);
        assert_eq!(
            transaction_signing_hash(&sample_tx()),
            crate::utils::crypto::keccak256(&encoded)
        );
    }

    #[test]
    fn test_empty_authorization_list_still_encodes() {
        let tx = Eip7702TransactionBuilder::new(1)
            .gas_limit(21_000)
            .to([0xaa; 20])
            .build()
            .unwrap();

        assert!(!tx.is_delegation());
        assert!(tx.require_authorizations().is_err());
        assert_eq!(tx.rlp_fields()[9], RlpItem::list(vec![]));
        assert!(!tx.encode_for_signing().is_empty());
    }

    #[test]
    fn test_access_list_encoding() {
        let entry = AccessListEntry { address: [0x01; 20], storage_keys: vec![[0u8; 32]] };
        let item = entry.to_rlp();
        let fields = item.as_list().unwrap();

        assert_eq!(fields[0].as_bytes().unwrap().len(), 20);
        assert_eq!(fields[1].as_list().unwrap()[0].as_bytes().unwrap(), &[0u8; 32]);
    }

    #[test]
    fn test_params_from_json() {
        let json = r#"{
            "chainId": 1,
            "nonce": "5",
            "maxPriorityFeePerGas": "1000000000",
            "maxFeePerGas": "0x77359400",
            "gasLimit": 100000,
            "to": "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
        }"#;
        let params: TransactionParams = serde_json::from_str(json).unwrap();
        let tx = build_unsigned(params);

        assert_eq!(tx.nonce, 5);
        assert_eq!(tx.max_fee_per_gas, U256::from(2_000_000_000u64));
        assert_eq!(tx.value, U256::zero());
        assert!(tx.authorization_list.is_empty());
    }

    #[test]
    fn test_params_reject_negative_fee() {
        let json = r#"{
            "chainId": 1, "nonce": 0, "maxPriorityFeePerGas": "-1",
            "maxFeePerGas": "1", "gasLimit": 1,
            "to": "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
        }"#;
        assert!(serde_json::from_str::<TransactionParams>(json).is_err());
    }
}
