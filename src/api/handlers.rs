//! JSON Request Handlers
//!
//! Each operation has a typed entry point and a `handle_*` wrapper that
//! takes the raw JSON text and returns an [`ApiResponse`].

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{ApiResponse, TxHash};
use crate::codec::{format_address, parse_address, Address};
use crate::config::DelegationConfig;
use crate::delegation::{inspect, CodeFetcher, CodeKind, DelegationStatus};
use crate::eip7702::{
    authorization_signing_hash, build_unsigned, decode_signed_transaction, recover_authorization_signer,
    recover_transaction_signer, sign_authorization as sign_authorization_with, sign_transaction as sign_transaction_with,
    verify_transaction_authorizations, Authorization, DigestSigner, LocalSigner, SignedAuthorization,
    SignedTransaction, TransactionParams, UnsignedTransaction,
};
use crate::error::{Eip7702Error, Eip7702Result};

/// Sign one authorization with a local key
#[derive(Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct SignAuthorizationRequest {
    #[serde(flatten)]
    #[zeroize(skip)]
    pub authorization: Authorization,

    pub private_key: String,
}

/// Build and sign a type-4 transaction with a local key
#[derive(Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct SignTransactionRequest {
    #[serde(flatten)]
    #[zeroize(skip)]
    pub params: TransactionParams,

    /// Unsigned tuples the sender signs as its own authority, appended after `authorizationList`
    #[serde(default)]
    #[zeroize(skip)]
    pub self_authorizations: Vec<Authorization>,

    /// Refuse to sign when the final authorization list is empty
    #[serde(default)]
    #[zeroize(skip)]
    pub require_authorizations: bool,

    pub private_key: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignTransactionResponse {
    pub raw_transaction: String,
    pub transaction_hash: TxHash,
    pub sender: String,
    pub authorization_count: usize,
    /// Recovered authority of each authorization, in list order
    pub authorities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveredSigner {
    pub signer: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeTransactionRequest {
    pub raw_transaction: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedTransaction {
    #[serde(flatten)]
    pub transaction: SignedTransaction,
    pub sender: String,
    pub transaction_hash: TxHash,
    pub authorities: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectResponse {
    pub address: String,
    #[serde(flatten)]
    pub status: DelegationStatus,
    pub kind: CodeKind,
    /// Name of the delegate if it is a configured delegator contract
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delegator_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationDigest {
    #[serde(flatten)]
    pub authorization: Authorization,
    pub digest: String,
}

fn format_addresses(addresses: &[Address]) -> Vec<String> {
    addresses.iter().map(format_address).collect()
}

fn parse_request<T: for<'de> Deserialize<'de>>(input: &str) -> Eip7702Result<T> {
    Ok(serde_json::from_str(input)?)
}

pub fn sign_authorization(request: &SignAuthorizationRequest) -> Eip7702Result<SignedAuthorization> {
    let signer = LocalSigner::from_hex(&request.private_key)?;
    sign_authorization_with(&signer, request.authorization)
}

pub fn sign_transaction(
    request: &SignTransactionRequest,
    config: Option<&DelegationConfig>,
) -> Eip7702Result<SignTransactionResponse> {
    let signer = LocalSigner::from_hex(&request.private_key)?;

    let mut params = request.params.clone();
    for authorization in &request.self_authorizations {
        params.authorization_list.push(sign_authorization_with(&signer, *authorization)?);
    }

    let tx = build_unsigned(params);
    if request.require_authorizations {
        tx.require_authorizations()?;
    }

    signed_transaction_response(&signer, &tx, config)
}

fn signed_transaction_response(
    signer: &dyn DigestSigner,
    tx: &UnsignedTransaction,
    config: Option<&DelegationConfig>,
) -> Eip7702Result<SignTransactionResponse> {
    let authorities = verify_transaction_authorizations(tx)?;
    let signed = sign_transaction_with(signer, tx)?;
    let transaction_hash = TxHash(signed.hash());

    Ok(SignTransactionResponse {
        raw_transaction: signed.to_hex(),
        transaction_hash,
        sender: format_address(&signer.address()),
        authorization_count: tx.authorization_count(),
        authorities: format_addresses(&authorities),
        explorer_url: config.and_then(|c| c.explorer_tx_url(tx.chain_id, &transaction_hash.0)),
    })
}

pub fn recover_authorization(signed: &SignedAuthorization) -> Eip7702Result<RecoveredSigner> {
    let signer = recover_authorization_signer(signed)?;
    Ok(RecoveredSigner {
        signer: format_address(&signer),
    })
}

pub fn decode_transaction(request: &DecodeTransactionRequest) -> Eip7702Result<DecodedTransaction> {
    let trimmed = request.raw_transaction.trim();
    let bytes = hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))?;
    let transaction = decode_signed_transaction(&bytes)?;

    let sender = recover_transaction_signer(&transaction)?;
    let authorities = verify_transaction_authorizations(&transaction.transaction)?;

    Ok(DecodedTransaction {
        sender: format_address(&sender),
        transaction_hash: TxHash(transaction.hash()),
        authorities: format_addresses(&authorities),
        transaction,
    })
}

pub fn authorization_digest(authorization: &Authorization) -> AuthorizationDigest {
    AuthorizationDigest {
        authorization: *authorization,
        digest: format!("0x{}", hex::encode(authorization_signing_hash(authorization))),
    }
}

/// Inspect an account and label its delegate from the configured delegators
pub fn inspect_account(
    address: &str,
    fetcher: &dyn CodeFetcher,
    config: Option<&DelegationConfig>,
) -> Eip7702Result<InspectResponse> {
    let address = parse_address(address)?;
    let status = inspect(&address, fetcher)?;

    let delegator_name = match (config, status.delegate_address) {
        (Some(config), Some(delegate)) => config.delegator_by_address(&delegate).map(|d| d.name.clone()),
        _ => None,
    };

    Ok(InspectResponse {
        address: format_address(&address),
        kind: status.code_kind(),
        status,
        delegator_name,
    })
}

pub fn handle_sign_authorization(input: &str) -> ApiResponse<SignedAuthorization> {
    parse_request::<SignAuthorizationRequest>(input)
        .and_then(|request| sign_authorization(&request))
        .into()
}

pub fn handle_sign_transaction(input: &str, config: Option<&DelegationConfig>) -> ApiResponse<SignTransactionResponse> {
    parse_request::<SignTransactionRequest>(input)
        .and_then(|request| sign_transaction(&request, config))
        .into()
}

pub fn handle_recover_authorization(input: &str) -> ApiResponse<RecoveredSigner> {
    parse_request::<SignedAuthorization>(input)
        .and_then(|signed| recover_authorization(&signed))
        .into()
}

pub fn handle_decode_transaction(input: &str) -> ApiResponse<DecodedTransaction> {
    parse_request::<DecodeTransactionRequest>(input)
        .and_then(|request| decode_transaction(&request))
        .into()
}

/// Reject JSON that is obviously not a request object before parsing it
pub fn ensure_object(input: &str) -> Eip7702Result<()> {
    match serde_json::from_str::<serde_json::Value>(input)? {
        serde_json::Value::Object(_) => Ok(()),
        _ => Err(Eip7702Error::InvalidInput("request must be a JSON object".to_string())),
    }
}
