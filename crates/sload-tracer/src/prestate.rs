use alloy_primitives::{
    map::{AddressHashMap, B256HashMap},
    Address, B256,
};
use serde::{Deserialize, Serialize};

/// The storage observed for one account during a trace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageAccount {
    /// Slot to the value it held when the slot was first read.
    pub storage: B256HashMap<B256>,
}

/// Accounts and storage slots touched by a trace.
///
/// The store only grows while a trace runs: an entry, once recorded, is never overwritten. The
/// one exception is [`remove_account`](Self::remove_account), which the tracer uses to drop a
/// contract created by the traced transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, derive_more::Deref)]
#[serde(transparent)]
pub struct PrestateStore(AddressHashMap<StorageAccount>);

impl PrestateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `address` with empty storage unless it is already present.
    pub fn ensure_account(&mut self, address: Address) {
        self.0.entry(address).or_default();
    }

    /// Record `value` for `slot` of `address` unless the slot is already present.
    ///
    /// `address` must have been added with [`ensure_account`](Self::ensure_account) first. If it
    /// was not, nothing is recorded. Returns whether a new entry was inserted.
    pub fn ensure_slot(&mut self, address: Address, slot: B256, value: B256) -> bool {
        let Some(account) = self.0.get_mut(&address) else {
            return false;
        };
        if account.storage.contains_key(&slot) {
            return false;
        }
        account.storage.insert(slot, value);
        true
    }

    /// Returns `true` if `slot` of `address` has already been recorded.
    pub fn contains_slot(&self, address: Address, slot: B256) -> bool {
        self.0.get(&address).is_some_and(|account| account.storage.contains_key(&slot))
    }

    /// Remove `address` and everything recorded for it.
    pub fn remove_account(&mut self, address: Address) -> Option<StorageAccount> {
        self.0.remove(&address)
    }

    /// Total number of recorded slots across all accounts.
    pub fn slot_count(&self) -> usize {
        self.0.values().map(|account| account.storage.len()).sum()
    }

    /// Consume the store and return the underlying map.
    pub fn into_inner(self) -> AddressHashMap<StorageAccount> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, b256};

    use super::*;

    const CONTRACT: Address = address!("00000000000000000000000000000000000000bb");
    const SLOT: B256 = b256!("0000000000000000000000000000000000000000000000000000000000000001");

    #[test]
    fn test_ensure_account_is_idempotent() {
        let mut store = PrestateStore::new();
        store.ensure_account(CONTRACT);
        assert!(store.ensure_slot(CONTRACT, SLOT, B256::with_last_byte(7)));
        let before = store.clone();

        store.ensure_account(CONTRACT);
        assert_eq!(store, before);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_first_observation_wins() {
        let mut store = PrestateStore::new();
        store.ensure_account(CONTRACT);
        assert!(store.ensure_slot(CONTRACT, SLOT, B256::with_last_byte(7)));
        assert!(!store.ensure_slot(CONTRACT, SLOT, B256::with_last_byte(9)));
        assert_eq!(store[&CONTRACT].storage[&SLOT], B256::with_last_byte(7));
    }

    #[test]
    fn test_slot_without_account_is_ignored() {
        let mut store = PrestateStore::new();
        assert!(!store.ensure_slot(CONTRACT, SLOT, B256::ZERO));
        assert!(store.is_empty());
        assert!(!store.contains_slot(CONTRACT, SLOT));
    }

    #[test]
    fn test_remove_account() {
        let mut store = PrestateStore::new();
        store.ensure_account(CONTRACT);
        store.ensure_slot(CONTRACT, SLOT, B256::ZERO);
        assert_eq!(store.slot_count(), 1);

        let removed = store.remove_account(CONTRACT).unwrap();
        assert_eq!(removed.storage.len(), 1);
        assert!(!store.contains_key(&CONTRACT));
        assert_eq!(store.remove_account(CONTRACT), None);
    }
}
