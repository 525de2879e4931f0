//! Cryptographic utilities for the wallet
//!
//! This module provides:
//! - SHA-256 hashing
//! - ECDSA key management (secp256k1)
//! - 20-byte addresses derived from public keys

pub mod address;
pub mod hash;
pub mod keys;

pub use address::{Address, ADDRESS_LEN};
pub use hash::sha256;
pub use keys::{KeyError, KeyPair};
