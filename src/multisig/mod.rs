//! Quorum-gated multi-owner wallet
//!
//! A fixed set of owners jointly controls a pool of value. Any outgoing
//! call is first submitted as a proposal and may only be executed once
//! enough owners have confirmed it. Changes to the owner set are proposals
//! addressed to the wallet itself.
//!
//! # Example
//!
//! ```rust
//! use quorum_vault::crypto::Address;
//! use quorum_vault::multisig::{EventLog, MultisigWallet, RecordingExecutor, RegistryCall};
//!
//! let alice = Address::from_seed(b"alice");
//! let bob = Address::from_seed(b"bob");
//! let carol = Address::from_seed(b"carol");
//! let shop = Address::from_seed(b"shop");
//!
//! // 2-of-3 wallet
//! let mut wallet = MultisigWallet::new(
//!     vec![alice, bob, carol],
//!     2,
//!     10,
//!     RecordingExecutor::succeeding(),
//!     EventLog::new(),
//! )
//! .unwrap();
//! wallet.deposit(alice, 100);
//!
//! // Propose, confirm twice, execute
//! let tx = wallet.submit(alice, shop, 10, vec![]).unwrap();
//! wallet.confirm(alice, tx).unwrap();
//! wallet.confirm(bob, tx).unwrap();
//! wallet.execute(carol, tx).unwrap();
//! assert_eq!(wallet.balance(), 90);
//!
//! // Owner changes go through the same pipeline
//! let dave = Address::from_seed(b"dave");
//! let tx = wallet
//!     .submit_registry_call(alice, &RegistryCall::AddOwner { owner: dave })
//!     .unwrap();
//! wallet.confirm(alice, tx).unwrap();
//! wallet.confirm(carol, tx).unwrap();
//! wallet.execute(bob, tx).unwrap();
//! assert!(wallet.is_owner(&dave));
//! ```

pub mod call;
pub mod error;
pub mod events;
pub mod executor;
pub mod proposal;
pub mod registry;
pub mod shared;
pub mod wallet;

pub use call::{CallError, RegistryCall};
pub use error::{ErrorKind, WalletError};
pub use events::{BroadcastSink, EventLog, EventSink, LogSink, NullSink, Tee, WalletEvent};
pub use executor::{Executor, OutgoingCall, RecordingExecutor, TransferExecutor};
pub use proposal::{ConfirmationLedger, Proposal, ProposalStatus};
pub use registry::{OwnerRegistry, DEFAULT_MAX_OWNERS};
pub use shared::SharedWallet;
pub use wallet::{MultisigWallet, WalletState};
