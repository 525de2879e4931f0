//! Execution primitive boundary
//!
//! The wallet never interprets an outgoing payload. It hands the call to an
//! [`Executor`], which reports success or failure.

use crate::crypto::Address;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// A call made by the wallet when a proposal executes
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingCall {
    /// Wallet performing the call
    pub wallet: Address,
    /// Proposal being executed
    pub index: u64,
    /// Call destination
    pub destination: Address,
    /// Value sent with the call
    pub value: u128,
    /// Opaque payload, forwarded verbatim
    #[serde(with = "crate::multisig::proposal::hex_bytes")]
    pub data: Vec<u8>,
}

/// Performs outgoing calls
pub trait Executor {
    /// Perform `call`. Returns `false` if the call failed.
    fn invoke(&mut self, call: &OutgoingCall) -> bool;
}

impl<E: Executor + ?Sized> Executor for Box<E> {
    fn invoke(&mut self, call: &OutgoingCall) -> bool {
        (**self).invoke(call)
    }
}

impl<E: Executor + ?Sized> Executor for &mut E {
    fn invoke(&mut self, call: &OutgoingCall) -> bool {
        (**self).invoke(call)
    }
}

/// Records every call and returns a fixed outcome
#[derive(Debug, Clone)]
pub struct RecordingExecutor {
    calls: Vec<OutgoingCall>,
    succeed: bool,
}

impl RecordingExecutor {
    /// An executor whose calls always succeed
    pub fn succeeding() -> Self {
        Self {
            calls: Vec::new(),
            succeed: true,
        }
    }

    /// An executor whose calls always fail
    pub fn failing() -> Self {
        Self {
            calls: Vec::new(),
            succeed: false,
        }
    }

    /// Change the outcome of subsequent calls
    pub fn set_outcome(&mut self, succeed: bool) {
        self.succeed = succeed;
    }

    /// Calls received so far, including failed ones
    pub fn calls(&self) -> &[OutgoingCall] {
        &self.calls
    }
}

impl Default for RecordingExecutor {
    fn default() -> Self {
        Self::succeeding()
    }
}

impl Executor for RecordingExecutor {
    fn invoke(&mut self, call: &OutgoingCall) -> bool {
        self.calls.push(call.clone());
        self.succeed
    }
}

/// Credits the value of each call to the destination's account.
///
/// Destinations can be blocked, in which case calls to them fail.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransferExecutor {
    accounts: BTreeMap<Address, u128>,
    #[serde(default)]
    blocked: HashSet<Address>,
}

impl TransferExecutor {
    /// Create an empty account book
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance credited to `address`
    pub fn balance_of(&self, address: &Address) -> u128 {
        self.accounts.get(address).copied().unwrap_or(0)
    }

    /// All credited accounts
    pub fn accounts(&self) -> &BTreeMap<Address, u128> {
        &self.accounts
    }

    /// Make calls to `address` fail
    pub fn block(&mut self, address: Address) {
        self.blocked.insert(address);
    }

    /// Allow calls to `address` again
    pub fn unblock(&mut self, address: &Address) {
        self.blocked.remove(address);
    }
}

impl Executor for TransferExecutor {
    fn invoke(&mut self, call: &OutgoingCall) -> bool {
        if self.blocked.contains(&call.destination) {
            log::warn!("Call to blocked destination {} rejected", call.destination);
            return false;
        }

        let balance = self.accounts.entry(call.destination).or_insert(0);
        match balance.checked_add(call.value) {
            Some(new_balance) => {
                *balance = new_balance;
                log::debug!(
                    "Credited {} to {} ({} payload bytes)",
                    call.value,
                    call.destination,
                    call.data.len()
                );
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(destination: Address, value: u128) -> OutgoingCall {
        OutgoingCall {
            wallet: Address::from_seed(b"wallet"),
            index: 0,
            destination,
            value,
            data: b"memo".to_vec(),
        }
    }

    #[test]
    fn test_recording_executor() {
        let mut exec = RecordingExecutor::succeeding();
        let dest = Address::from_seed(b"dest");
        assert!(exec.invoke(&call(dest, 10)));

        exec.set_outcome(false);
        assert!(!exec.invoke(&call(dest, 20)));

        assert_eq!(exec.calls().len(), 2);
        assert_eq!(exec.calls()[0].value, 10);
        assert_eq!(exec.calls()[0].data, b"memo".to_vec());
    }

    #[test]
    fn test_transfer_executor_credits() {
        let mut exec = TransferExecutor::new();
        let dest = Address::from_seed(b"dest");

        assert!(exec.invoke(&call(dest, 10)));
        assert!(exec.invoke(&call(dest, 5)));
        assert_eq!(exec.balance_of(&dest), 15);
        assert_eq!(exec.accounts().len(), 1);
    }

    #[test]
    fn test_transfer_executor_blocked_destination() {
        let mut exec = TransferExecutor::new();
        let dest = Address::from_seed(b"dest");

        exec.block(dest);
        assert!(!exec.invoke(&call(dest, 10)));
        assert_eq!(exec.balance_of(&dest), 0);

        exec.unblock(&dest);
        assert!(exec.invoke(&call(dest, 10)));
    }

    #[test]
    fn test_transfer_executor_overflow_fails() {
        let mut exec = TransferExecutor::new();
        let dest = Address::from_seed(b"dest");
        assert!(exec.invoke(&call(dest, u128::MAX)));
        assert!(!exec.invoke(&call(dest, 1)));
        assert_eq!(exec.balance_of(&dest), u128::MAX);
    }
}
