use alloy_primitives::{map::HashMap, Address, B256};

use crate::StateReader;

/// An in-memory [`StateReader`] that counts how often it is read.
#[derive(Debug, Default)]
pub struct MockState {
    storage: HashMap<(Address, B256), B256>,
    reads: usize,
    failing: bool,
}

impl MockState {
    /// Set `slot` of `address` to `value`.
    pub fn with_slot(mut self, address: Address, slot: B256, value: B256) -> Self {
        self.set(address, slot, value);
        self
    }

    /// Make every read fail, as a broken database would.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Set `slot` of `address` to `value`.
    pub fn set(&mut self, address: Address, slot: B256, value: B256) {
        self.storage.insert((address, slot), value);
    }

    /// Number of reads served so far, failed ones included.
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl StateReader for MockState {
    fn storage(&mut self, address: Address, slot: B256) -> Option<B256> {
        self.reads += 1;
        if self.failing {
            return None;
        }
        Some(self.storage.get(&(address, slot)).copied().unwrap_or_default())
    }
}
