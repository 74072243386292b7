//! Cache module - write-through cache of per-package orientation overrides.
//!
//! ## Architecture
//!
//! - `PackageSettings` - In-memory overrides, the only thing callers touch
//! - `Writer` - Background task that loads the stored snapshot, then applies
//!   queued writes to the store in issue order
//! - `StoreObserver` - Hook receiving store failures (callers never see them)
//!
//! ## Usage
//!
//! ```rust,ignore
//! let settings = Arc::new(PackageSettings::new(store, switch));
//! settings.initialize()?;
//!
//! settings.put("com.example.maps", Orientation::Portrait);
//! let orientation = settings.get("com.example.maps");
//!
//! // Installed packages changed
//! settings.reconcile(installed_packages);
//! ```

mod observer;
mod package_settings;
mod state;
mod writer;

pub use observer::{StoreObserver, StoreOperation, TracingObserver};
pub use package_settings::{CacheError, PackageSettings};
