//! In-process session storage

use std::collections::HashMap;

use super::{SessionStorage, Slot};

/// Session slots held in a plain map
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: HashMap<Slot, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a slot holds nothing
    pub fn is_empty_slot(&self, slot: Slot) -> bool {
        !self.slots.contains_key(&slot)
    }
}

impl SessionStorage for MemoryStorage {
    fn read(&self, slot: Slot) -> Option<String> {
        self.slots.get(&slot).cloned()
    }

    fn write(&mut self, slot: Slot, value: String) {
        self.slots.insert(slot, value);
    }

    fn remove(&mut self, slot: Slot) {
        self.slots.remove(&slot);
    }
}
