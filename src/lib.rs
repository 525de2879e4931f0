//! Quorum Vault: a multi-owner wallet gated by a confirmation quorum
//!
//! This crate provides:
//! - An owner registry with a bounded owner set and a quorum threshold
//! - A transaction ledger where owners submit, confirm, revoke and execute proposals
//! - Self-authorized owner and quorum changes that travel through the same ledger
//! - Pluggable execution of outgoing calls and event delivery
//! - JSON persistence with rotating backups and a `vault` command-line tool
//!
//! # Example
//!
//! ```rust
//! use quorum_vault::crypto::Address;
//! use quorum_vault::multisig::{MultisigWallet, NullSink, TransferExecutor};
//!
//! let alice = Address::from_seed(b"alice");
//! let bob = Address::from_seed(b"bob");
//! let shop = Address::from_seed(b"shop");
//!
//! let mut wallet =
//!     MultisigWallet::new(vec![alice, bob], 2, 10, TransferExecutor::new(), NullSink).unwrap();
//! wallet.deposit(alice, 50);
//!
//! let tx = wallet.submit(alice, shop, 20, vec![]).unwrap();
//! wallet.confirm(alice, tx).unwrap();
//! assert!(!wallet.is_confirmed(tx, &bob));
//! wallet.confirm(bob, tx).unwrap();
//! wallet.execute(bob, tx).unwrap();
//!
//! assert_eq!(wallet.executor().balance_of(&shop), 20);
//! ```

pub mod cli;
pub mod config;
pub mod crypto;
pub mod multisig;
pub mod storage;

// Re-export commonly used types
pub use config::{ConfigError, WalletConfig};
pub use crypto::{Address, KeyPair};
pub use multisig::{
    EventSink, Executor, MultisigWallet, OwnerRegistry, Proposal, RegistryCall, SharedWallet,
    WalletError, WalletEvent, WalletState,
};
pub use storage::{Storage, StorageConfig, WalletSnapshot};
