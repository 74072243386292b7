//! Configuration module.
//!
//! Loads configuration from environment variables and holds the
//! runtime-toggleable override switch.

mod switch;

use std::env;

pub use switch::OverrideSwitch;

/// Default database name when `MONGODB_DATABASE` is not set.
const DEFAULT_DATABASE: &str = "package_orientation";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    // MongoDB
    pub mongodb_uri: String,
    pub mongodb_database: String,

    /// Initial state of the per-package override check.
    pub foreground_package_check: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    /// Returns error if `MONGODB_URI` is not set.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let mongodb_uri = env::var("MONGODB_URI")
            .map_err(|_| anyhow::anyhow!("MONGODB_URI must be set"))?;

        let mongodb_database = env::var("MONGODB_DATABASE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        let foreground_package_check = env::var("FOREGROUND_PACKAGE_CHECK")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        Ok(Self {
            mongodb_uri,
            mongodb_database,
            foreground_package_check,
        })
    }

    /// Build the override switch seeded from this config.
    pub fn override_switch(&self) -> OverrideSwitch {
        OverrideSwitch::new(self.foreground_package_check)
    }
}

/// Parse a boolean-ish env value.
pub(crate) fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag(" TRUE "));
        assert!(parse_flag("on"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("off"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn test_override_switch_seeded() {
        let config = Config {
            mongodb_uri: "mongodb://localhost".to_string(),
            mongodb_database: DEFAULT_DATABASE.to_string(),
            foreground_package_check: true,
        };
        assert!(config.override_switch().enabled());
    }
}
