//! Single-writer queue between the cache and the durable store.
//!
//! All store traffic goes through one task, so writes land in the order the
//! cache issued them. The task loads the stored snapshot before touching the
//! queue, then drains it in batches. Within a batch, ops that a later op
//! makes redundant are dropped before any store call is made.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::oneshot;
use tracing::debug;

use super::observer::{StoreObserver, StoreOperation};
use super::state::Shared;
use crate::database::{PackageSetting, PreferenceStore, StoreError};

/// Maximum ops pulled from the queue per batch.
const BATCH_SIZE: usize = 64;

/// Upper bound on a single store call, the load included.
pub(crate) const STORE_TIMEOUT: Duration = Duration::from_secs(30);

/// A queued store operation.
#[derive(Debug)]
pub(crate) enum WriteOp {
    Upsert(PackageSetting),
    Delete(String),
    DeleteAll,
    /// Answered once every op queued before it has been applied.
    Flush(oneshot::Sender<()>),
}

impl WriteOp {
    /// What gets reported if this op fails. `None` for flush barriers.
    fn operation(&self) -> Option<StoreOperation> {
        match self {
            Self::Upsert(setting) => Some(StoreOperation::Upsert {
                package_name: setting.package_name.clone(),
            }),
            Self::Delete(package_name) => Some(StoreOperation::Delete {
                package_name: package_name.clone(),
            }),
            Self::DeleteAll => Some(StoreOperation::DeleteAll),
            Self::Flush(_) => None,
        }
    }

    fn package_name(&self) -> Option<&str> {
        match self {
            Self::Upsert(setting) => Some(&setting.package_name),
            Self::Delete(package_name) => Some(package_name),
            Self::DeleteAll | Self::Flush(_) => None,
        }
    }
}

/// Drop ops superseded by a later op in the same batch.
///
/// A later op on the same package replaces an earlier one, and `DeleteAll`
/// replaces everything before it. Neither rule reaches across a `Flush`,
/// so a flush is never answered before the state it covers is written.
pub(crate) fn coalesce(batch: Vec<WriteOp>) -> Vec<WriteOp> {
    let mut pending: Vec<Option<WriteOp>> = Vec::with_capacity(batch.len());
    let mut by_package: HashMap<String, usize> = HashMap::new();
    let mut barrier = 0;

    for op in batch {
        match &op {
            WriteOp::Flush(_) => {
                by_package.clear();
                barrier = pending.len() + 1;
            }
            WriteOp::DeleteAll => {
                for slot in &mut pending[barrier..] {
                    *slot = None;
                }
                by_package.clear();
            }
            WriteOp::Upsert(_) | WriteOp::Delete(_) => {
                if let Some(package_name) = op.package_name()
                    && let Some(previous) = by_package.insert(package_name.to_string(), pending.len())
                {
                    pending[previous] = None;
                }
            }
        }
        pending.push(Some(op));
    }

    pending.into_iter().flatten().collect()
}

/// Background task owning the store side of the cache.
pub(crate) struct Writer {
    rx: UnboundedReceiver<WriteOp>,
    store: Arc<dyn PreferenceStore>,
    observer: Arc<dyn StoreObserver>,
    shared: Weak<Shared>,
}

impl Writer {
    pub(crate) fn new(
        rx: UnboundedReceiver<WriteOp>,
        store: Arc<dyn PreferenceStore>,
        observer: Arc<dyn StoreObserver>,
        shared: Weak<Shared>,
    ) -> Self {
        Self {
            rx,
            store,
            observer,
            shared,
        }
    }

    /// Load, then drain the queue until every sender is gone.
    pub(crate) async fn run(mut self) {
        self.load().await;

        let mut batch = Vec::with_capacity(BATCH_SIZE);
        while self.rx.recv_many(&mut batch, BATCH_SIZE).await > 0 {
            let received = batch.len();
            let ops = coalesce(std::mem::take(&mut batch));
            if ops.len() < received {
                debug!("Coalesced {} queued writes into {}", received, ops.len());
            }

            for op in ops {
                self.apply(op).await;
            }
        }

        debug!("Package settings writer stopped");
    }

    async fn load(&self) {
        let result = match tokio::time::timeout(STORE_TIMEOUT, self.store.list_all()).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(STORE_TIMEOUT)),
        };

        // Cache dropped before the writer got going.
        let Some(shared) = self.shared.upgrade() else {
            return;
        };

        match result {
            Ok(settings) => {
                for setting in shared.apply_snapshot(settings) {
                    self.observer.on_skipped_record(&setting);
                }
            }
            Err(e) => {
                self.observer.on_failure(&StoreOperation::Load, &e);
                shared.abandon_load();
            }
        }
    }

    async fn apply(&self, op: WriteOp) {
        let op = match op {
            WriteOp::Flush(done) => {
                let _ = done.send(());
                return;
            }
            op => op,
        };
        let Some(operation) = op.operation() else {
            return;
        };

        // Each call runs in its own task so a panicking store can't take the
        // writer down with it.
        let store = Arc::clone(&self.store);
        let mut task = tokio::spawn(async move {
            match op {
                WriteOp::Upsert(setting) => store.insert_or_replace(&setting).await,
                WriteOp::Delete(package_name) => store.delete(&package_name).await,
                WriteOp::DeleteAll => store.delete_all().await,
                WriteOp::Flush(_) => Ok(()),
            }
        });

        let result = match tokio::time::timeout(STORE_TIMEOUT, &mut task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(StoreError::Panicked(e.to_string())),
            Err(_) => {
                task.abort();
                Err(StoreError::Timeout(STORE_TIMEOUT))
            }
        };

        match result {
            Ok(()) => debug!("Applied {}", operation),
            Err(e) => self.observer.on_failure(&operation, &e),
        }
    }
}
