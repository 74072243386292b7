//! Database models.

pub mod package_setting;

pub use package_setting::PackageSetting;
