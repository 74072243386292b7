//! Database module exports.

mod models;
mod mongo;
mod repository;
mod store;

pub use models::*;
pub use mongo::Database;
pub use repository::{MemoryPreferenceStore, PackageSettingsRepository};
pub use store::{PreferenceStore, StoreError};
