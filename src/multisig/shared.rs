//! Thread-safe wallet handle
//!
//! Each operation runs under a single lock that also covers the outgoing
//! call made during execution, so no other thread can observe a proposal
//! between its execution mark and the result of the call.

use crate::crypto::Address;
use crate::multisig::call::RegistryCall;
use crate::multisig::error::WalletError;
use crate::multisig::events::EventSink;
use crate::multisig::executor::Executor;
use crate::multisig::wallet::MultisigWallet;
use parking_lot::Mutex;
use std::sync::Arc;

/// Cloneable, lock-protected wallet
pub struct SharedWallet<E: Executor, S: EventSink> {
    inner: Arc<Mutex<MultisigWallet<E, S>>>,
}

impl<E: Executor, S: EventSink> Clone for SharedWallet<E, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: Executor, S: EventSink> SharedWallet<E, S> {
    /// Wrap a wallet
    pub fn new(wallet: MultisigWallet<E, S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(wallet)),
        }
    }

    /// Run a read-only query under the lock
    pub fn read<T>(&self, f: impl FnOnce(&MultisigWallet<E, S>) -> T) -> T {
        f(&*self.inner.lock())
    }

    /// Run several operations as one exclusive step
    pub fn with<T>(&self, f: impl FnOnce(&mut MultisigWallet<E, S>) -> T) -> T {
        f(&mut *self.inner.lock())
    }

    pub fn deposit(&self, sender: Address, amount: u128) -> u128 {
        self.inner.lock().deposit(sender, amount)
    }

    pub fn submit(
        &self,
        caller: Address,
        destination: Address,
        value: u128,
        data: Vec<u8>,
    ) -> Result<u64, WalletError> {
        self.inner.lock().submit(caller, destination, value, data)
    }

    pub fn submit_registry_call(
        &self,
        caller: Address,
        call: &RegistryCall,
    ) -> Result<u64, WalletError> {
        self.inner.lock().submit_registry_call(caller, call)
    }

    pub fn confirm(&self, caller: Address, index: u64) -> Result<(), WalletError> {
        self.inner.lock().confirm(caller, index)
    }

    pub fn revoke(&self, caller: Address, index: u64) -> Result<(), WalletError> {
        self.inner.lock().revoke(caller, index)
    }

    pub fn execute(&self, caller: Address, index: u64) -> Result<(), WalletError> {
        self.inner.lock().execute(caller, index)
    }

    /// Unwrap if this is the last handle
    pub fn try_unwrap(self) -> Result<MultisigWallet<E, S>, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multisig::events::EventLog;
    use crate::multisig::executor::RecordingExecutor;
    use crate::multisig::registry::DEFAULT_MAX_OWNERS;
    use std::thread;

    fn addr(seed: &str) -> Address {
        Address::from_seed(seed.as_bytes())
    }

    fn owners() -> Vec<Address> {
        (0..5).map(|i| addr(&format!("owner{}", i))).collect()
    }

    fn shared(quorum: u32) -> SharedWallet<RecordingExecutor, Arc<EventLog>> {
        let wallet = MultisigWallet::new(
            owners(),
            quorum,
            DEFAULT_MAX_OWNERS,
            RecordingExecutor::succeeding(),
            Arc::new(EventLog::new()),
        )
        .unwrap();
        let shared = SharedWallet::new(wallet);
        shared.deposit(addr("funder"), 1_000);
        shared
    }

    #[test]
    fn test_concurrent_confirmations() {
        let wallet = shared(5);
        let index = wallet.submit(owners()[0], addr("dest"), 10, vec![]).unwrap();

        let handles: Vec<_> = owners()
            .into_iter()
            .map(|owner| {
                let wallet = wallet.clone();
                thread::spawn(move || wallet.confirm(owner, index))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        let count = wallet.read(|w| w.transaction(index).unwrap().confirmations);
        assert_eq!(count, 5);
    }

    #[test]
    fn test_concurrent_execute_runs_once() {
        let wallet = shared(2);
        let index = wallet.submit(owners()[0], addr("dest"), 10, vec![]).unwrap();
        wallet.confirm(owners()[0], index).unwrap();
        wallet.confirm(owners()[1], index).unwrap();

        let handles: Vec<_> = owners()
            .into_iter()
            .map(|owner| {
                let wallet = wallet.clone();
                thread::spawn(move || wallet.execute(owner, index))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, WalletError::AlreadyExecuted(_))));

        let wallet = wallet.try_unwrap().ok().unwrap();
        assert_eq!(wallet.executor().calls().len(), 1);
        assert_eq!(wallet.balance(), 990);
    }

    #[test]
    fn test_concurrent_submissions_get_sequential_indices() {
        let wallet = shared(1);
        let handles: Vec<_> = (0..20)
            .map(|i| {
                let wallet = wallet.clone();
                let owner = owners()[i % 5];
                thread::spawn(move || wallet.submit(owner, addr("dest"), i as u128, vec![]).unwrap())
            })
            .collect();

        let mut indices: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        indices.sort();
        assert_eq!(indices, (0..20).collect::<Vec<u64>>());
    }
}
