//! Per-package orientation overrides.
//!
//! Keeps the orientation each package asked for in memory for lock-light
//! lookups on the hot path, and mirrors it to MongoDB in the background so
//! it survives restarts.
//!
//! ## Architecture
//!
//! - `orientation` - Orientation values and their persisted codes
//! - `database` - Durable store contract, MongoDB and in-memory stores
//! - `cache` - The write-through cache and its background writer
//! - `config` - Environment configuration and the override switch
//! - `shell` - Line-oriented operator commands used by the binary

pub mod cache;
pub mod config;
pub mod database;
pub mod orientation;
pub mod shell;

pub use cache::{CacheError, PackageSettings, StoreObserver, StoreOperation, TracingObserver};
pub use config::{Config, OverrideSwitch};
pub use database::{
    Database, MemoryPreferenceStore, PackageSetting, PackageSettingsRepository, PreferenceStore,
    StoreError,
};
pub use orientation::Orientation;
