//! In-process [`KeyValueStore`].

use crate::traits::KeyValueStore;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::convert::Infallible;

/// A [`KeyValueStore`] backed by a `HashMap`.
///
/// Counts every write (`set` and `remove`) so tests can assert how often
/// a component persisted.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
    writes: Cell<usize>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `(key, value)` pairs.  Seeding does not
    /// count as a write.
    pub fn with_entries<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: RefCell::new(
                pairs
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
            writes: Cell::new(0),
        }
    }

    /// Number of `set` / `remove` calls so far.
    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    /// Whether `key` currently has a value.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    type Error = Infallible;

    fn get(&self, key: &str) -> Result<Option<String>, Infallible> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Infallible> {
        self.writes.set(self.writes.get() + 1);
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Infallible> {
        self.writes.set(self.writes.get() + 1);
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}
