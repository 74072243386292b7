//! In-memory override state shared between callers and the writer.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::writer::WriteOp;
use crate::database::PackageSetting;
use crate::orientation::Orientation;

/// Startup load bookkeeping.
///
/// While the load is pending, every mutation is recorded so the loaded
/// snapshot can't clobber it.
#[derive(Debug)]
pub(crate) enum LoadState {
    Pending {
        /// Packages written, removed or pruned since construction.
        touched: HashSet<String>,
        /// A reset happened; the whole snapshot is stale.
        discard: bool,
        /// Latest installed set passed to reconcile, applied to the snapshot.
        installed: Option<HashSet<String>>,
    },
    Done,
}

#[derive(Debug)]
pub(crate) struct State {
    pub(crate) overrides: HashMap<String, Orientation>,
    pub(crate) load: LoadState,
    /// Write queue. `None` once the cache has shut down.
    pub(crate) tx: Option<UnboundedSender<WriteOp>>,
}

impl State {
    /// Queue a store write. Must be called with the lock held so queue order
    /// matches memory order.
    pub(crate) fn enqueue(&self, op: WriteOp) -> bool {
        match &self.tx {
            Some(tx) => {
                if tx.send(op).is_err() {
                    warn!("Package settings writer stopped, write dropped");
                    return false;
                }
                true
            }
            None => {
                debug!("Package settings cache shut down, write not persisted");
                false
            }
        }
    }

    pub(crate) fn touch(&mut self, package_name: &str) {
        if let LoadState::Pending { touched, .. } = &mut self.load {
            touched.insert(package_name.to_string());
        }
    }
}

/// State plus the load-completion signal.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) state: RwLock<State>,
    pub(crate) loaded: watch::Sender<bool>,
}

impl Shared {
    pub(crate) fn new(tx: UnboundedSender<WriteOp>) -> Self {
        let (loaded, _) = watch::channel(false);
        Self {
            state: RwLock::new(State {
                overrides: HashMap::new(),
                load: LoadState::Pending {
                    touched: HashSet::new(),
                    discard: false,
                    installed: None,
                },
                tx: Some(tx),
            }),
            loaded,
        }
    }

    /// Merge the loaded records into memory and mark the load done.
    ///
    /// Returns the records skipped for carrying an invalid code. Those are
    /// queued for deletion too, unless the package was written since.
    pub(crate) fn apply_snapshot(&self, settings: Vec<PackageSetting>) -> Vec<PackageSetting> {
        let mut skipped = Vec::new();
        let mut state = self.state.write();

        let LoadState::Pending {
            touched,
            discard,
            installed,
        } = std::mem::replace(&mut state.load, LoadState::Done)
        else {
            return skipped;
        };

        if discard {
            info!("Reset during startup, discarding {} stored overrides", settings.len());
            drop(state);
            self.loaded.send_replace(true);
            return skipped;
        }

        let mut applied = 0;
        let mut stale = Vec::new();

        for setting in settings {
            let orientation = match setting.orientation() {
                Ok(orientation) if orientation.is_valid() => orientation,
                _ => {
                    skipped.push(setting);
                    continue;
                }
            };

            if touched.contains(&setting.package_name) {
                continue;
            }

            if let Some(installed) = &installed
                && !installed.contains(&setting.package_name)
            {
                stale.push(setting.package_name);
                continue;
            }

            state.overrides.insert(setting.package_name, orientation);
            applied += 1;
        }

        for package_name in &stale {
            state.enqueue(WriteOp::Delete(package_name.clone()));
        }
        for setting in &skipped {
            if !touched.contains(&setting.package_name) {
                state.enqueue(WriteOp::Delete(setting.package_name.clone()));
            }
        }

        drop(state);
        self.loaded.send_replace(true);

        info!(
            "Loaded {} package overrides ({} skipped, {} pruned)",
            applied,
            skipped.len(),
            stale.len()
        );
        skipped
    }

    /// Mark the load done without applying anything.
    pub(crate) fn abandon_load(&self) {
        self.state.write().load = LoadState::Done;
        self.loaded.send_replace(true);
    }
}
