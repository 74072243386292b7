//! Store failure reporting.
//!
//! Store errors never reach callers of the cache. They are handed to a
//! [`StoreObserver`] instead, which runs on the writer task and must return
//! quickly.

use std::fmt;

use tracing::warn;

use crate::database::{PackageSetting, StoreError};

/// The store call that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOperation {
    Load,
    Upsert { package_name: String },
    Delete { package_name: String },
    DeleteAll,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load => f.write_str("load"),
            Self::Upsert { package_name } => write!(f, "upsert {}", package_name),
            Self::Delete { package_name } => write!(f, "delete {}", package_name),
            Self::DeleteAll => f.write_str("delete all"),
        }
    }
}

/// Receives store failures and skipped records.
pub trait StoreObserver: Send + Sync {
    /// A store call failed. It will not be retried.
    fn on_failure(&self, operation: &StoreOperation, error: &StoreError);

    /// A loaded record carried a code that isn't a valid override.
    fn on_skipped_record(&self, _setting: &PackageSetting) {}
}

/// Default observer, logs through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl StoreObserver for TracingObserver {
    fn on_failure(&self, operation: &StoreOperation, error: &StoreError) {
        warn!("Package settings store {} failed: {}", operation, error);
    }

    fn on_skipped_record(&self, setting: &PackageSetting) {
        warn!(
            "Skipping stored override for {} with invalid orientation code {}",
            setting.package_name, setting.orientation
        );
    }
}
