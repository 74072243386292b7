//! Override switch - the feature flag gating per-package checks.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared boolean flag, read synchronously on the hot path.
///
/// Clones share the same underlying flag, so a settings screen can flip it
/// while the cache reads it.
#[derive(Debug, Clone, Default)]
pub struct OverrideSwitch {
    enabled: Arc<AtomicBool>,
}

impl OverrideSwitch {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(enabled)),
        }
    }

    /// Whether per-package overrides should be checked.
    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }
}
