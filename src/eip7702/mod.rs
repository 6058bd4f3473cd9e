//! EIP-7702 Account Delegation
//!
//! Implements EIP-7702 transaction type (0x04) for EOA delegation.
//! Reference: https://eips.ethereum.org/EIPS/eip-7702
//!
//! Flow: sign one or more [`Authorization`]s as the authority, assemble an
//! [`UnsignedTransaction`] around them, then sign and serialize it as the
//! sender. The authority and the sender may be the same account.

pub mod types;
pub mod authorization;
pub mod transaction;
pub mod signer;


pub use types::*;
pub use authorization::*;
pub use transaction::*;
pub use signer::*;
