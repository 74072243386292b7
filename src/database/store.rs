//! Durable store contract for package settings.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use super::models::PackageSetting;

/// Errors raised by a [`PreferenceStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store task panicked: {0}")]
    Panicked(String),

    #[error("store call timed out after {0:?}")]
    Timeout(Duration),
}

/// Durable keyed table of package settings.
///
/// Implementations may be slow; callers must keep them off latency-sensitive
/// paths. Each call touches at most one record, except `delete_all`.
///
/// Used as `Arc<dyn PreferenceStore>`.
#[async_trait]
pub trait PreferenceStore: Send + Sync + 'static {
    /// Insert the record, replacing any existing one for the same package.
    async fn insert_or_replace(&self, setting: &PackageSetting) -> Result<(), StoreError>;

    /// Delete the record for a package. Deleting a missing record is not an error.
    async fn delete(&self, package_name: &str) -> Result<(), StoreError>;

    /// Delete every record.
    async fn delete_all(&self) -> Result<(), StoreError>;

    /// List every record, with raw orientation codes.
    async fn list_all(&self) -> Result<Vec<PackageSetting>, StoreError>;
}
