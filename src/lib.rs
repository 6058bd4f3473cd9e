//! Hawala Delegation Core
//!
//! EIP-7702 account delegation for the Hawala wallet.
//!
//! # Architecture
//!
//! This crate provides:
//! - **codec**: Minimal/fixed-width integer and 20-byte address codecs
//! - **rlp**: Canonical RLP encoding and decoding
//! - **eip7702**: Authorization signing, type-4 transaction building, signing and serialization
//! - **delegation**: Delegation inspection over an injected code fetcher
//! - **config**: Chains, RPC endpoints and known delegator contracts
//! - **api**: JSON request/response boundary used by the CLI
//!
//! # Security
//!
//! Private keys are held by [`eip7702::LocalSigner`], which erases its secret
//! on drop. Hex key material passed through the API is zeroized after use.
//!
//! # Example
//!
//! ```rust,ignore
//! use hawala_delegation::eip7702::{sign_authorization, Authorization, Eip7702TransactionBuilder, LocalSigner};
//!
//! let signer = LocalSigner::from_hex(private_key_hex)?;
//! let auth = sign_authorization(&signer, Authorization::new(1, delegate, nonce + 1))?;
//! let tx = Eip7702TransactionBuilder::new(1)
//!     .nonce(nonce)
//!     .max_priority_fee(1_000_000_000u64)
//!     .max_fee(2_000_000_000u64)
//!     .gas_limit(100_000)
//!     .to(signer.address())
//!     .authorization(auth)
//!     .build()?;
//! let raw = sign_and_serialize(&signer, &tx)?;
//! ```

pub mod api;
pub mod codec;
pub mod config;
pub mod delegation;
pub mod eip7702;
pub mod error;
pub mod rlp;
pub mod serde_bytes;
pub mod utils;

// Re-export key types for convenience
pub use error::{Eip7702Error, Eip7702Result, ErrorCode, FetchError};

pub use codec::{format_address, parse_address, Address};
pub use config::DelegationConfig;
pub use delegation::{inspect, CodeFetcher, DelegationStatus};
pub use eip7702::{
    build_unsigned, sign_and_serialize, sign_authorization, sign_transaction, Authorization, DigestSigner,
    Eip7702TransactionBuilder, LocalSigner, SignedAuthorization, SignedTransaction, TransactionParams,
    UnsignedTransaction,
};

// Re-export crypto utilities for binaries
pub use utils::crypto::{keccak256, to_checksum_address};
