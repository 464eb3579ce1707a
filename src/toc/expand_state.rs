use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use chrono::{Datelike, Local, NaiveDate};

use crate::toc::grouping::month_name;

const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// A collapsible node in the sidebar tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKey {
    Year(i32),
    /// Year and 1-based month.
    Month(i32, u32),
}

impl NodeKey {
    /// Persisted key, namespaced by level: `toc-year-2024`, `toc-month-2024-March`.
    pub fn storage_key(&self) -> String {
        match self {
            NodeKey::Year(year) => format!("toc-year-{year}"),
            NodeKey::Month(year, month) => format!("toc-month-{year}-{}", month_name(*month)),
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage_key())
    }
}

/// Durable key/value capability backing the expand state.
pub trait StateStorage {
    fn get(&self, key: &str) -> Result<Option<bool>>;
    fn set(&self, key: &str, value: bool) -> Result<()>;
}

impl<T: StateStorage + ?Sized> StateStorage for &T {
    fn get(&self, key: &str) -> Result<Option<bool>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: bool) -> Result<()> {
        (**self).set(key, value)
    }
}

/// In-process storage, used when no durable store is wanted and in tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: RwLock<HashMap<String, bool>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<bool>> {
        let guard = self
            .values
            .read()
            .map_err(|_| anyhow!("expand state lock poisoned"))?;
        Ok(guard.get(key).copied())
    }

    fn set(&self, key: &str, value: bool) -> Result<()> {
        let mut guard = self
            .values
            .write()
            .map_err(|_| anyhow!("expand state lock poisoned"))?;
        guard.insert(key.to_string(), value);
        Ok(())
    }
}

/// Expanded/collapsed flags for tree nodes.
///
/// Without a stored value, the current year and the current year+month are
/// expanded and everything else is collapsed.
pub struct ExpandStateStore<S> {
    storage: S,
    today: NaiveDate,
}

impl<S: StateStorage> ExpandStateStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_today(storage, Local::now().date_naive())
    }

    pub fn with_today(storage: S, today: NaiveDate) -> Self {
        Self { storage, today }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn default_expanded(&self, key: NodeKey) -> bool {
        match key {
            NodeKey::Year(year) => year == self.today.year(),
            NodeKey::Month(year, month) => year == self.today.year() && month == self.today.month(),
        }
    }

    pub fn is_expanded(&self, key: NodeKey) -> bool {
        match self.storage.get(&key.storage_key()) {
            Ok(Some(value)) => value,
            Ok(None) => self.default_expanded(key),
            Err(err) => {
                log_warn!("Could not read expand state for {key}: {err:#}");
                self.default_expanded(key)
            }
        }
    }

    /// Overwrites the stored flag; last write wins.
    pub fn set_expanded(&self, key: NodeKey, expanded: bool) -> Result<()> {
        self.storage.set(&key.storage_key(), expanded)
    }

    /// Flips the effective state and returns the new value.
    pub fn toggle(&self, key: NodeKey) -> Result<bool> {
        let expanded = !self.is_expanded(key);
        self.set_expanded(key, expanded)?;
        Ok(expanded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenStorage;

    impl StateStorage for BrokenStorage {
        fn get(&self, _key: &str) -> Result<Option<bool>> {
            Err(anyhow!("storage unavailable"))
        }

        fn set(&self, _key: &str, _value: bool) -> Result<()> {
            Err(anyhow!("storage unavailable"))
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn keys_are_namespaced_by_level() {
        assert_eq!(NodeKey::Year(2024).storage_key(), "toc-year-2024");
        assert_eq!(NodeKey::Month(2024, 3).storage_key(), "toc-month-2024-March");
        assert_ne!(
            NodeKey::Year(2024).storage_key(),
            NodeKey::Month(2024, 1).storage_key()
        );
    }

    #[test]
    fn default_policy_expands_current_year_and_month() {
        let store = ExpandStateStore::with_today(MemoryStorage::new(), today());
        assert!(store.is_expanded(NodeKey::Year(2024)));
        assert!(store.is_expanded(NodeKey::Month(2024, 3)));
        assert!(!store.is_expanded(NodeKey::Month(2024, 2)));
        assert!(!store.is_expanded(NodeKey::Year(2023)));
        assert!(!store.is_expanded(NodeKey::Month(2023, 3)));
    }

    #[test]
    fn stored_value_overrides_default() {
        let store = ExpandStateStore::with_today(MemoryStorage::new(), today());
        store.set_expanded(NodeKey::Year(2023), true).unwrap();
        store.set_expanded(NodeKey::Year(2024), false).unwrap();

        assert!(store.is_expanded(NodeKey::Year(2023)));
        assert!(!store.is_expanded(NodeKey::Year(2024)));
    }

    #[test]
    fn toggle_flips_effective_state() {
        let store = ExpandStateStore::with_today(MemoryStorage::new(), today());
        assert!(!store.toggle(NodeKey::Month(2024, 3)).unwrap());
        assert!(store.toggle(NodeKey::Month(2024, 3)).unwrap());
        assert!(store.toggle(NodeKey::Month(2022, 1)).unwrap());
        assert_eq!(
            store.storage().get("toc-month-2022-January").unwrap(),
            Some(true)
        );
    }

    #[test]
    fn state_survives_a_new_store_over_the_same_storage() {
        let storage = MemoryStorage::new();
        ExpandStateStore::with_today(&storage, today())
            .set_expanded(NodeKey::Year(2020), true)
            .unwrap();

        let reopened = ExpandStateStore::with_today(&storage, today());
        assert!(reopened.is_expanded(NodeKey::Year(2020)));
    }

    #[test]
    fn unreadable_storage_falls_back_to_defaults() {
        let store = ExpandStateStore::with_today(BrokenStorage, today());
        assert!(store.is_expanded(NodeKey::Year(2024)));
        assert!(!store.is_expanded(NodeKey::Year(2021)));
        assert!(store.set_expanded(NodeKey::Year(2021), true).is_err());
    }
}
