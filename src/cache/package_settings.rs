//! Per-package orientation overrides.
//!
//! Reads are served from memory only. Writes update memory immediately and
//! queue the matching store write for the background writer, so no public
//! call ever waits on the store (except `flush` and `shutdown`, which exist
//! to wait).

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::observer::{StoreObserver, TracingObserver};
use super::state::{LoadState, Shared};
use super::writer::{WriteOp, Writer};
use crate::config::OverrideSwitch;
use crate::database::{PackageSetting, PreferenceStore};
use crate::orientation::Orientation;

/// Errors returned by [`PackageSettings::initialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("package settings cache already initialized")]
    AlreadyInitialized,

    #[error("package settings cache must be initialized inside a Tokio runtime")]
    NoRuntime,
}

/// Write-through cache of per-package orientation overrides.
///
/// Share it as `Arc<PackageSettings>`.
pub struct PackageSettings {
    shared: Arc<Shared>,
    store: Arc<dyn PreferenceStore>,
    observer: Arc<dyn StoreObserver>,
    switch: OverrideSwitch,
    /// Queue receiver, handed to the writer by `initialize`.
    startup: Mutex<Option<UnboundedReceiver<WriteOp>>>,
    writer: Mutex<Option<JoinHandle<()>>>,
}

impl PackageSettings {
    /// Create an empty cache over `store`, logging store failures.
    pub fn new(store: Arc<dyn PreferenceStore>, switch: OverrideSwitch) -> Self {
        Self::with_observer(store, switch, Arc::new(TracingObserver))
    }

    /// Create an empty cache reporting store failures to `observer`.
    pub fn with_observer(
        store: Arc<dyn PreferenceStore>,
        switch: OverrideSwitch,
        observer: Arc<dyn StoreObserver>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            shared: Arc::new(Shared::new(tx)),
            store,
            observer,
            switch,
            startup: Mutex::new(Some(rx)),
            writer: Mutex::new(None),
        }
    }

    /// Start the background writer, which loads stored overrides and then
    /// persists queued writes.
    ///
    /// Writes made before this call are kept and persisted once the writer
    /// starts. The load never overwrites a package written, removed or pruned
    /// since construction, and a `reset` before the load finishes discards
    /// the stored snapshot entirely.
    ///
    /// # Errors
    /// Returns `AlreadyInitialized` on a second call (which is otherwise a
    /// no-op) and `NoRuntime` outside a Tokio runtime.
    pub fn initialize(&self) -> Result<(), CacheError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| CacheError::NoRuntime)?;

        let Some(rx) = self.startup.lock().take() else {
            warn!("Package settings cache initialized twice, ignoring");
            return Err(CacheError::AlreadyInitialized);
        };

        let writer = Writer::new(
            rx,
            Arc::clone(&self.store),
            Arc::clone(&self.observer),
            Arc::downgrade(&self.shared),
        );
        *self.writer.lock() = Some(runtime.spawn(writer.run()));

        info!("Package settings cache initialized");
        Ok(())
    }

    /// Override for `package_name`, or `Orientation::Invalid` if none.
    pub fn get(&self, package_name: &str) -> Orientation {
        self.shared
            .state
            .read()
            .overrides
            .get(package_name)
            .copied()
            .unwrap_or(Orientation::Invalid)
    }

    /// Set the override for `package_name`. `Orientation::Invalid` removes it.
    pub fn put(&self, package_name: &str, orientation: Orientation) {
        if package_name.is_empty() {
            debug!("Ignoring override for empty package name");
            return;
        }

        let mut state = self.shared.state.write();
        state.touch(package_name);

        if orientation.is_valid() {
            state
                .overrides
                .insert(package_name.to_string(), orientation);
            state.enqueue(WriteOp::Upsert(PackageSetting::new(package_name, orientation)));
        } else {
            state.overrides.remove(package_name);
            state.enqueue(WriteOp::Delete(package_name.to_string()));
        }

        debug!("Override for {} set to {}", package_name, orientation);
    }

    /// Remove the override for `package_name`.
    pub fn remove(&self, package_name: &str) {
        self.put(package_name, Orientation::Invalid);
    }

    /// Whether per-package checks can be skipped: no overrides exist, or
    /// the override switch is off.
    pub fn disabled(&self) -> bool {
        self.is_empty() || !self.switch.enabled()
    }

    /// Drop overrides for packages not in `installed`.
    ///
    /// Returns the pruned package names, sorted.
    pub fn reconcile<I, S>(&self, installed: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let installed: HashSet<String> = installed
            .into_iter()
            .map(|package_name| package_name.as_ref().to_string())
            .collect();

        let mut state = self.shared.state.write();

        // Snapshot keys before removing anything.
        let mut stale: Vec<String> = state
            .overrides
            .keys()
            .filter(|package_name| !installed.contains(*package_name))
            .cloned()
            .collect();
        stale.sort_unstable();

        for package_name in &stale {
            state.overrides.remove(package_name);
            state.touch(package_name);
            state.enqueue(WriteOp::Delete(package_name.clone()));
        }

        if let LoadState::Pending {
            installed: pending, ..
        } = &mut state.load
        {
            *pending = Some(installed);
        }

        if !stale.is_empty() {
            info!("Pruned overrides for {} uninstalled packages", stale.len());
        }
        stale
    }

    /// Drop every override.
    pub fn reset(&self) {
        let mut state = self.shared.state.write();
        state.overrides.clear();

        if let LoadState::Pending { discard, .. } = &mut state.load {
            *discard = true;
        }

        state.enqueue(WriteOp::DeleteAll);
        info!("Package overrides reset");
    }

    /// Number of overrides in memory.
    pub fn len(&self) -> usize {
        self.shared.state.read().overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.state.read().overrides.is_empty()
    }

    /// Sorted copy of every override.
    pub fn snapshot(&self) -> BTreeMap<String, Orientation> {
        self.shared
            .state
            .read()
            .overrides
            .iter()
            .map(|(package_name, orientation)| (package_name.clone(), *orientation))
            .collect()
    }

    /// The switch consulted by [`disabled`](Self::disabled).
    pub fn switch(&self) -> &OverrideSwitch {
        &self.switch
    }

    /// Whether the startup load has finished (or failed).
    pub fn is_loaded(&self) -> bool {
        *self.shared.loaded.borrow()
    }

    /// Wait for the startup load to finish. Returns immediately if
    /// [`initialize`](Self::initialize) hasn't been called, since no load
    /// will ever run.
    pub async fn wait_until_loaded(&self) {
        if self.startup.lock().is_some() {
            debug!("Not initialized, no load to wait for");
            return;
        }

        let mut loaded = self.shared.loaded.subscribe();
        let _ = loaded.wait_for(|done| *done).await;
    }

    /// Wait until every write issued before this call has reached the store
    /// (or failed). Returns immediately if the writer isn't running.
    pub async fn flush(&self) {
        if self.startup.lock().is_some() {
            debug!("Flush before initialize, nothing to wait for");
            return;
        }

        let (tx, rx) = oneshot::channel();
        let queued = self.shared.state.read().enqueue(WriteOp::Flush(tx));
        if queued {
            let _ = rx.await;
        }
    }

    /// Flush pending writes and stop the writer.
    ///
    /// Later mutations only update memory.
    pub async fn shutdown(&self) {
        self.flush().await;
        self.shared.state.write().tx = None;

        let writer = self.writer.lock().take();
        if let Some(writer) = writer
            && let Err(e) = writer.await
        {
            warn!("Package settings writer ended abnormally: {}", e);
        }

        info!("Package settings cache shut down");
    }
}

impl std::fmt::Debug for PackageSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageSettings")
            .field("overrides", &self.len())
            .field("loaded", &self.is_loaded())
            .field("switch", &self.switch.enabled())
            .finish()
    }
}
