//! Repository module - store implementations.

mod memory_repository;
mod package_settings_repository;

pub use memory_repository::MemoryPreferenceStore;
pub use package_settings_repository::PackageSettingsRepository;
