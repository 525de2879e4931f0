//! Owner registry
//!
//! Holds the set of owners and the quorum threshold. The registry only
//! accepts mutations from its `authority`, which is the wallet's own
//! address: the wallet assumes that identity solely while executing an
//! already approved proposal addressed to itself.

use crate::crypto::Address;
use crate::multisig::error::WalletError;
use crate::multisig::events::WalletEvent;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default upper bound on the number of owners
pub const DEFAULT_MAX_OWNERS: usize = 10;

/// Serialized form of the registry
#[derive(Clone, Debug, Serialize, Deserialize)]
struct RegistryData {
    authority: Address,
    owners: Vec<Address>,
    quorum: u32,
    max_owners: usize,
}

/// Authoritative owner set plus quorum
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "RegistryData", into = "RegistryData")]
pub struct OwnerRegistry {
    /// The only identity allowed to mutate the registry
    authority: Address,
    /// Owners in enumeration order
    owners: Vec<Address>,
    /// Owner -> slot in `owners`
    positions: HashMap<Address, usize>,
    /// Confirmations required to execute
    quorum: u32,
    /// Maximum number of owners
    max_owners: usize,
}

impl OwnerRegistry {
    /// Create a registry from an initial owner list.
    ///
    /// # Errors
    /// - `QuorumInvariantViolated` if the list is empty, longer than
    ///   `max_owners`, or `quorum` is outside `1..=owners.len()`
    /// - `InvalidAddress` if any owner is the null identity or `authority`
    /// - `DuplicateOwner` if an owner appears twice
    pub fn new(
        authority: Address,
        owners: Vec<Address>,
        quorum: u32,
        max_owners: usize,
    ) -> Result<Self, WalletError> {
        check_bounds(quorum, owners.len(), max_owners)?;

        let mut positions = HashMap::with_capacity(owners.len());
        for (slot, owner) in owners.iter().enumerate() {
            if owner.is_zero() || *owner == authority {
                return Err(WalletError::InvalidAddress);
            }
            if positions.insert(*owner, slot).is_some() {
                return Err(WalletError::DuplicateOwner(*owner));
            }
        }

        Ok(Self {
            authority,
            owners,
            positions,
            quorum,
            max_owners,
        })
    }

    /// Identity allowed to mutate the registry
    pub fn authority(&self) -> Address {
        self.authority
    }

    /// O(1) membership test
    pub fn is_owner(&self, address: &Address) -> bool {
        self.positions.contains_key(address)
    }

    /// Number of owners
    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }

    /// Owners in enumeration order.
    ///
    /// The order is not stable across removals.
    pub fn owners(&self) -> &[Address] {
        &self.owners
    }

    /// Current quorum
    pub fn quorum(&self) -> u32 {
        self.quorum
    }

    /// Maximum number of owners
    pub fn max_owners(&self) -> usize {
        self.max_owners
    }

    /// Human readable policy, e.g. "2-of-3"
    pub fn description(&self) -> String {
        format!("{}-of-{}", self.quorum, self.owners.len())
    }

    /// Add a new owner
    pub fn add_owner(
        &mut self,
        caller: &Address,
        owner: Address,
    ) -> Result<Vec<WalletEvent>, WalletError> {
        self.authorize(caller)?;
        self.check_candidate(&owner)?;
        check_bounds(self.quorum, self.owners.len() + 1, self.max_owners)?;

        self.positions.insert(owner, self.owners.len());
        self.owners.push(owner);

        log::debug!("Owner {} added ({})", owner, self.description());
        Ok(vec![WalletEvent::OwnerAdded { owner }])
    }

    /// Remove an owner.
    ///
    /// The last owner in enumeration order takes the removed owner's slot.
    /// If fewer owners than the quorum remain, the quorum drops to the new
    /// owner count.
    pub fn remove_owner(
        &mut self,
        caller: &Address,
        owner: Address,
    ) -> Result<Vec<WalletEvent>, WalletError> {
        self.authorize(caller)?;
        let slot = *self
            .positions
            .get(&owner)
            .ok_or(WalletError::UnknownOwner(owner))?;

        let remaining = self.owners.len() - 1;
        let new_quorum = self.quorum.min(remaining as u32);
        check_bounds(new_quorum, remaining, self.max_owners)?;

        self.positions.remove(&owner);
        self.owners.swap_remove(slot);
        if let Some(moved) = self.owners.get(slot) {
            self.positions.insert(*moved, slot);
        }

        let mut events = vec![WalletEvent::OwnerRemoved { owner }];
        if new_quorum != self.quorum {
            self.quorum = new_quorum;
            events.push(WalletEvent::QuorumChanged { quorum: new_quorum });
        }

        log::debug!("Owner {} removed ({})", owner, self.description());
        Ok(events)
    }

    /// Swap an existing owner for a new one, keeping its slot
    pub fn replace_owner(
        &mut self,
        caller: &Address,
        old: Address,
        new: Address,
    ) -> Result<Vec<WalletEvent>, WalletError> {
        self.authorize(caller)?;
        let slot = *self
            .positions
            .get(&old)
            .ok_or(WalletError::UnknownOwner(old))?;
        self.check_candidate(&new)?;

        self.positions.remove(&old);
        self.positions.insert(new, slot);
        self.owners[slot] = new;

        log::debug!("Owner {} replaced by {}", old, new);
        Ok(vec![
            WalletEvent::OwnerRemoved { owner: old },
            WalletEvent::OwnerAdded { owner: new },
        ])
    }

    /// Change the number of confirmations required
    pub fn change_quorum(
        &mut self,
        caller: &Address,
        quorum: u32,
    ) -> Result<Vec<WalletEvent>, WalletError> {
        self.authorize(caller)?;
        check_bounds(quorum, self.owners.len(), self.max_owners)?;

        self.quorum = quorum;

        log::debug!("Quorum changed ({})", self.description());
        Ok(vec![WalletEvent::QuorumChanged { quorum }])
    }

    /// Checks an address about to join the owner set
    fn check_candidate(&self, owner: &Address) -> Result<(), WalletError> {
        if owner.is_zero() || *owner == self.authority {
            return Err(WalletError::InvalidAddress);
        }
        if self.is_owner(owner) {
            return Err(WalletError::DuplicateOwner(*owner));
        }
        Ok(())
    }

    fn authorize(&self, caller: &Address) -> Result<(), WalletError> {
        if *caller != self.authority {
            return Err(WalletError::NotSelfAuthorized(*caller));
        }
        Ok(())
    }
}

/// Check quorum and owner-count bounds together
fn check_bounds(quorum: u32, owners: usize, max_owners: usize) -> Result<(), WalletError> {
    if owners == 0 || owners > max_owners || quorum == 0 || quorum as usize > owners {
        return Err(WalletError::QuorumInvariantViolated {
            quorum,
            owners,
            max: max_owners,
        });
    }
    Ok(())
}

impl TryFrom<RegistryData> for OwnerRegistry {
    type Error = WalletError;

    fn try_from(data: RegistryData) -> Result<Self, Self::Error> {
        Self::new(data.authority, data.owners, data.quorum, data.max_owners)
    }
}

impl From<OwnerRegistry> for RegistryData {
    fn from(registry: OwnerRegistry) -> Self {
        Self {
            authority: registry.authority,
            owners: registry.owners,
            quorum: registry.quorum,
            max_owners: registry.max_owners,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(seed: &str) -> Address {
        Address::from_seed(seed.as_bytes())
    }

    fn wallet() -> Address {
        addr("wallet")
    }

    fn registry(n: usize, quorum: u32) -> OwnerRegistry {
        let owners = (0..n).map(|i| addr(&format!("owner{}", i))).collect();
        OwnerRegistry::new(wallet(), owners, quorum, DEFAULT_MAX_OWNERS).unwrap()
    }

    #[test]
    fn test_registry_creation() {
        let reg = registry(3, 2);
        assert_eq!(reg.owner_count(), 3);
        assert_eq!(reg.quorum(), 2);
        assert_eq!(reg.description(), "2-of-3");
        assert!(reg.is_owner(&addr("owner1")));
        assert!(!reg.is_owner(&addr("stranger")));
    }

    #[test]
    fn test_registry_validation() {
        let two = vec![addr("a"), addr("b")];

        // Empty owner list
        assert!(matches!(
            OwnerRegistry::new(wallet(), vec![], 1, 10),
            Err(WalletError::QuorumInvariantViolated { .. })
        ));
        // Zero quorum
        assert!(matches!(
            OwnerRegistry::new(wallet(), two.clone(), 0, 10),
            Err(WalletError::QuorumInvariantViolated { .. })
        ));
        // Quorum > owners
        assert!(matches!(
            OwnerRegistry::new(wallet(), two.clone(), 3, 10),
            Err(WalletError::QuorumInvariantViolated { .. })
        ));
        // Too many owners
        assert!(matches!(
            OwnerRegistry::new(wallet(), two, 1, 1),
            Err(WalletError::QuorumInvariantViolated { .. })
        ));
        // Null owner
        assert!(matches!(
            OwnerRegistry::new(wallet(), vec![addr("a"), Address::ZERO], 1, 10),
            Err(WalletError::InvalidAddress)
        ));
        // Duplicate
        assert!(matches!(
            OwnerRegistry::new(wallet(), vec![addr("a"), addr("a")], 1, 10),
            Err(WalletError::DuplicateOwner(_))
        ));
    }

    #[test]
    fn test_mutators_require_self_authorization() {
        let mut reg = registry(3, 2);
        let outsider = addr("owner0");

        assert!(matches!(
            reg.add_owner(&outsider, addr("new")),
            Err(WalletError::NotSelfAuthorized(_))
        ));
        assert!(matches!(
            reg.remove_owner(&outsider, addr("owner1")),
            Err(WalletError::NotSelfAuthorized(_))
        ));
        assert!(matches!(
            reg.replace_owner(&outsider, addr("owner1"), addr("new")),
            Err(WalletError::NotSelfAuthorized(_))
        ));
        assert!(matches!(
            reg.change_quorum(&outsider, 1),
            Err(WalletError::NotSelfAuthorized(_))
        ));

        assert_eq!(reg.owner_count(), 3);
        assert_eq!(reg.quorum(), 2);
    }

    #[test]
    fn test_add_owner() {
        let mut reg = registry(2, 2);
        let events = reg.add_owner(&wallet(), addr("carol")).unwrap();

        assert_eq!(events, vec![WalletEvent::OwnerAdded { owner: addr("carol") }]);
        assert!(reg.is_owner(&addr("carol")));
        assert_eq!(reg.owners()[2], addr("carol"));

        assert!(matches!(
            reg.add_owner(&wallet(), addr("carol")),
            Err(WalletError::DuplicateOwner(_))
        ));
        assert!(matches!(
            reg.add_owner(&wallet(), Address::ZERO),
            Err(WalletError::InvalidAddress)
        ));
    }

    #[test]
    fn test_add_owner_respects_max() {
        let mut reg = registry(DEFAULT_MAX_OWNERS, 1);
        assert!(matches!(
            reg.add_owner(&wallet(), addr("one-too-many")),
            Err(WalletError::QuorumInvariantViolated { .. })
        ));
        assert_eq!(reg.owner_count(), DEFAULT_MAX_OWNERS);
    }

    #[test]
    fn test_remove_owner_swaps_with_last() {
        let mut reg = registry(4, 2);
        reg.remove_owner(&wallet(), addr("owner1")).unwrap();

        assert_eq!(
            reg.owners(),
            &[addr("owner0"), addr("owner3"), addr("owner2")]
        );
        assert!(!reg.is_owner(&addr("owner1")));
        // Moved owner is still found in its new slot
        reg.remove_owner(&wallet(), addr("owner3")).unwrap();
        assert_eq!(reg.owners(), &[addr("owner0"), addr("owner2")]);
    }

    #[test]
    fn test_remove_owner_lowers_quorum() {
        let mut reg = registry(3, 3);
        let events = reg.remove_owner(&wallet(), addr("owner2")).unwrap();

        assert_eq!(reg.quorum(), 2);
        assert_eq!(
            events,
            vec![
                WalletEvent::OwnerRemoved { owner: addr("owner2") },
                WalletEvent::QuorumChanged { quorum: 2 },
            ]
        );
    }

    #[test]
    fn test_remove_owner_keeps_quorum_when_possible() {
        let mut reg = registry(3, 1);
        let events = reg.remove_owner(&wallet(), addr("owner0")).unwrap();
        assert_eq!(reg.quorum(), 1);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_remove_unknown_and_last_owner() {
        let mut reg = registry(1, 1);
        assert!(matches!(
            reg.remove_owner(&wallet(), addr("ghost")),
            Err(WalletError::UnknownOwner(_))
        ));
        assert!(matches!(
            reg.remove_owner(&wallet(), addr("owner0")),
            Err(WalletError::QuorumInvariantViolated { .. })
        ));
        assert_eq!(reg.owner_count(), 1);
    }

    #[test]
    fn test_replace_owner() {
        let mut reg = registry(3, 2);
        let events = reg
            .replace_owner(&wallet(), addr("owner1"), addr("dave"))
            .unwrap();

        assert_eq!(
            events,
            vec![
                WalletEvent::OwnerRemoved { owner: addr("owner1") },
                WalletEvent::OwnerAdded { owner: addr("dave") },
            ]
        );
        assert_eq!(reg.owners()[1], addr("dave"));
        assert!(!reg.is_owner(&addr("owner1")));

        assert!(matches!(
            reg.replace_owner(&wallet(), addr("ghost"), addr("erin")),
            Err(WalletError::UnknownOwner(_))
        ));
        assert!(matches!(
            reg.replace_owner(&wallet(), addr("owner0"), addr("dave")),
            Err(WalletError::DuplicateOwner(_))
        ));
        assert!(matches!(
            reg.replace_owner(&wallet(), addr("owner0"), addr("owner0")),
            Err(WalletError::DuplicateOwner(_))
        ));
    }

    #[test]
    fn test_change_quorum() {
        let mut reg = registry(3, 2);
        assert_eq!(
            reg.change_quorum(&wallet(), 3).unwrap(),
            vec![WalletEvent::QuorumChanged { quorum: 3 }]
        );
        assert_eq!(reg.quorum(), 3);

        assert!(reg.change_quorum(&wallet(), 0).is_err());
        assert!(reg.change_quorum(&wallet(), 4).is_err());
        assert_eq!(reg.quorum(), 3);
    }

    #[test]
    fn test_change_quorum_to_same_value_emits() {
        let mut reg = registry(3, 2);
        assert_eq!(
            reg.change_quorum(&wallet(), 2).unwrap(),
            vec![WalletEvent::QuorumChanged { quorum: 2 }]
        );
        assert_eq!(reg.quorum(), 2);
    }

    #[test]
    fn test_wallet_address_cannot_be_owner() {
        assert!(matches!(
            OwnerRegistry::new(wallet(), vec![addr("a"), wallet()], 1, 10),
            Err(WalletError::InvalidAddress)
        ));

        let mut reg = registry(3, 2);
        assert!(matches!(
            reg.add_owner(&wallet(), wallet()),
            Err(WalletError::InvalidAddress)
        ));
        assert!(matches!(
            reg.replace_owner(&wallet(), addr("owner0"), wallet()),
            Err(WalletError::InvalidAddress)
        ));
        assert!(!reg.is_owner(&wallet()));
        assert_eq!(reg.owners()[0], addr("owner0"));
    }

    #[test]
    fn test_serde_round_trip_revalidates() {
        let reg = registry(3, 2);
        let json = serde_json::to_string(&reg).unwrap();
        let back: OwnerRegistry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.owners(), reg.owners());
        assert!(back.is_owner(&addr("owner2")));

        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["quorum"] = serde_json::json!(9);
        assert!(serde_json::from_value::<OwnerRegistry>(value).is_err());
    }
}
