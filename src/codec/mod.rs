//! Byte-Level Codecs
//!
//! Leaf helpers shared by the authorization and transaction encoders:
//! minimal and fixed-width integers, 20-byte addresses.

pub mod address;
pub mod quantity;

pub use address::*;
pub use quantity::*;
