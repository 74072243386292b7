//! In-process package settings store.
//!
//! Stands in for MongoDB in tests and in callers that want an isolated
//! cache. Supports failure injection and holding `list_all` open so load
//! races can be exercised deterministically.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::database::models::PackageSetting;
use crate::database::store::{PreferenceStore, StoreError};

/// [`PreferenceStore`] kept in a `DashMap`.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    records: DashMap<String, i32>,
    /// Number of upcoming calls that will fail.
    fail_next: AtomicUsize,
    /// Writes for this package always fail.
    failing_package: Mutex<Option<String>>,
    /// When set, `list_all` waits for a release before reading.
    list_gate: Mutex<Option<Arc<Notify>>>,
    writes: AtomicUsize,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with raw `(package, code)` pairs.
    ///
    /// Codes aren't validated, so unknown codes can be seeded.
    pub fn with_records<'a>(records: impl IntoIterator<Item = (&'a str, i32)>) -> Self {
        let store = Self::new();
        for (package_name, code) in records {
            store.records.insert(package_name.to_string(), code);
        }
        store
    }

    /// Sorted copy of every stored `(package, code)` pair.
    pub fn records(&self) -> BTreeMap<String, i32> {
        self.records
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    /// Raw code stored for a package.
    pub fn code(&self, package_name: &str) -> Option<i32> {
        self.records.get(package_name).map(|code| *code)
    }

    /// Number of successful mutating calls.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make the next `count` calls fail.
    pub fn fail_next(&self, count: usize) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    /// Make every write touching `package_name` fail (`None` clears it).
    pub fn fail_package(&self, package_name: Option<&str>) {
        *self.failing_package.lock() = package_name.map(str::to_string);
    }

    /// Hold `list_all` until the returned handle is notified.
    pub fn hold_list(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.list_gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    fn check(&self, package_name: Option<&str>) -> Result<(), StoreError> {
        let injected = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }

        if let Some(package_name) = package_name
            && self.failing_package.lock().as_deref() == Some(package_name)
        {
            return Err(StoreError::Unavailable(format!("writes to {} rejected", package_name)));
        }

        Ok(())
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    async fn insert_or_replace(&self, setting: &PackageSetting) -> Result<(), StoreError> {
        self.check(Some(&setting.package_name))?;
        self.records
            .insert(setting.package_name.clone(), setting.orientation);
        self.record_write();
        Ok(())
    }

    async fn delete(&self, package_name: &str) -> Result<(), StoreError> {
        self.check(Some(package_name))?;
        self.records.remove(package_name);
        self.record_write();
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        self.check(None)?;
        self.records.clear();
        self.record_write();
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<PackageSetting>, StoreError> {
        let gate = self.list_gate.lock().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        self.check(None)?;
        Ok(self
            .records()
            .into_iter()
            .map(|(package_name, orientation)| PackageSetting {
                package_name,
                orientation,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::Orientation;

    #[tokio::test]
    async fn test_insert_delete_list() {
        let store = MemoryPreferenceStore::new();
        store
            .insert_or_replace(&PackageSetting::new("a", Orientation::Portrait))
            .await
            .unwrap();
        store
            .insert_or_replace(&PackageSetting::new("a", Orientation::Landscape))
            .await
            .unwrap();
        store
            .insert_or_replace(&PackageSetting::new("b", Orientation::Sensor))
            .await
            .unwrap();
        store.delete("b").await.unwrap();
        store.delete("missing").await.unwrap();

        let listed = store.list_all().await.unwrap();
        assert_eq!(listed, vec![PackageSetting::new("a", Orientation::Landscape)]);
        assert_eq!(store.write_count(), 5);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = MemoryPreferenceStore::new();
        store.fail_next(1);
        assert!(store.delete_all().await.is_err());
        assert!(store.delete_all().await.is_ok());

        store.fail_package(Some("bad"));
        assert!(
            store
                .insert_or_replace(&PackageSetting::new("bad", Orientation::Portrait))
                .await
                .is_err()
        );
        assert!(store.code("bad").is_none());
        store.fail_package(None);
        assert!(store.delete("bad").await.is_ok());
    }
}
