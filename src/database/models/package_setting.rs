//! Persisted per-package orientation record.

use serde::{Deserialize, Serialize};

use crate::orientation::{Orientation, UnknownOrientation};

/// One row of the `package_settings` collection.
///
/// The orientation is kept as its raw code so records written by other
/// builds can be loaded and checked instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSetting {
    /// Package name (unique key).
    pub package_name: String,

    /// Orientation code, see [`Orientation::code`].
    pub orientation: i32,
}

impl PackageSetting {
    pub fn new(package_name: impl Into<String>, orientation: Orientation) -> Self {
        Self {
            package_name: package_name.into(),
            orientation: orientation.code(),
        }
    }

    /// Decode the stored orientation.
    pub fn orientation(&self) -> Result<Orientation, UnknownOrientation> {
        Orientation::from_code(self.orientation)
    }
}
