use dashmap::DashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Per-name mutual exclusion.
///
/// Callers working on the same name run one at a time; callers on different
/// names never touch the same mutex. Slots are dropped from the map once the
/// last interested caller is done with them.
#[derive(Default)]
pub struct NameLocks {
    slots: DashMap<String, Arc<Mutex<()>>>,
}

impl NameLocks {
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }

    /// Run `f` while holding the lock for `name`.
    pub fn with_lock<T>(&self, name: &str, f: impl FnOnce() -> T) -> T {
        // Cloned under the shard lock, so the count check in `release` is exact
        let slot = Arc::clone(self.slots.entry(name.to_string()).or_default().value());

        let result = {
            let _held = slot.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };

        self.release(name, slot);
        result
    }

    fn release(&self, name: &str, slot: Arc<Mutex<()>>) {
        drop(slot);
        // One reference left means only the map still knows about it
        self.slots.remove_if(name, |_, slot| Arc::strong_count(slot) == 1);
    }

    /// Number of names currently locked or waited on
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
