//! Orientation values and their persisted codes.
//!
//! Codes follow the platform screen-orientation constants so records written
//! by older builds keep decoding. `Invalid` is the "no override" sentinel and
//! is never written to the store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A requested display orientation for a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// No override recorded.
    Invalid,
    Unspecified,
    Landscape,
    Portrait,
    User,
    Behind,
    Sensor,
    NoSensor,
    SensorLandscape,
    SensorPortrait,
    ReverseLandscape,
    ReversePortrait,
    FullSensor,
    UserLandscape,
    UserPortrait,
    FullUser,
    Locked,
}

/// Returned when a persisted code has no matching orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown orientation code {0}")]
pub struct UnknownOrientation(pub i32);

/// Returned when a textual orientation can't be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown orientation name '{0}'")]
pub struct ParseOrientationError(pub String);

impl Orientation {
    /// Every value, sentinel first, in code order.
    pub const ALL: [Orientation; 17] = [
        Self::Invalid,
        Self::Unspecified,
        Self::Landscape,
        Self::Portrait,
        Self::User,
        Self::Behind,
        Self::Sensor,
        Self::NoSensor,
        Self::SensorLandscape,
        Self::SensorPortrait,
        Self::ReverseLandscape,
        Self::ReversePortrait,
        Self::FullSensor,
        Self::UserLandscape,
        Self::UserPortrait,
        Self::FullUser,
        Self::Locked,
    ];

    /// Stable persisted code.
    pub const fn code(self) -> i32 {
        match self {
            Self::Invalid => -2,
            Self::Unspecified => -1,
            Self::Landscape => 0,
            Self::Portrait => 1,
            Self::User => 2,
            Self::Behind => 3,
            Self::Sensor => 4,
            Self::NoSensor => 5,
            Self::SensorLandscape => 6,
            Self::SensorPortrait => 7,
            Self::ReverseLandscape => 8,
            Self::ReversePortrait => 9,
            Self::FullSensor => 10,
            Self::UserLandscape => 11,
            Self::UserPortrait => 12,
            Self::FullUser => 13,
            Self::Locked => 14,
        }
    }

    /// Decode a persisted code.
    pub fn from_code(code: i32) -> Result<Self, UnknownOrientation> {
        Self::ALL
            .into_iter()
            .find(|o| o.code() == code)
            .ok_or(UnknownOrientation(code))
    }

    /// Whether this is a real override rather than the sentinel.
    pub fn is_valid(self) -> bool {
        self != Self::Invalid
    }

    /// snake_case name, matching the serde representation.
    pub fn name(self) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::Unspecified => "unspecified",
            Self::Landscape => "landscape",
            Self::Portrait => "portrait",
            Self::User => "user",
            Self::Behind => "behind",
            Self::Sensor => "sensor",
            Self::NoSensor => "no_sensor",
            Self::SensorLandscape => "sensor_landscape",
            Self::SensorPortrait => "sensor_portrait",
            Self::ReverseLandscape => "reverse_landscape",
            Self::ReversePortrait => "reverse_portrait",
            Self::FullSensor => "full_sensor",
            Self::UserLandscape => "user_landscape",
            Self::UserPortrait => "user_portrait",
            Self::FullUser => "full_user",
            Self::Locked => "locked",
        }
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Self::Invalid
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Orientation {
    type Err = ParseOrientationError;

    /// Accepts the snake_case name (case-insensitive, `-` allowed for `_`)
    /// or a numeric code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");

        if let Ok(code) = normalized.parse::<i32>() {
            return Self::from_code(code).map_err(|_| ParseOrientationError(s.to_string()));
        }

        Self::ALL
            .into_iter()
            .find(|o| o.name() == normalized)
            .ok_or_else(|| ParseOrientationError(s.to_string()))
    }
}

impl TryFrom<i32> for Orientation {
    type Error = UnknownOrientation;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

impl From<Orientation> for i32 {
    fn from(orientation: Orientation) -> Self {
        orientation.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique_and_decode() {
        let mut codes: Vec<i32> = Orientation::ALL.iter().map(|o| o.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), Orientation::ALL.len());

        for o in Orientation::ALL {
            assert_eq!(Orientation::from_code(o.code()), Ok(o));
        }
    }

    #[test]
    fn test_codes_are_stable() {
        // Persisted values, must never change.
        assert_eq!(Orientation::Invalid.code(), -2);
        assert_eq!(Orientation::Unspecified.code(), -1);
        assert_eq!(Orientation::Landscape.code(), 0);
        assert_eq!(Orientation::Portrait.code(), 1);
        assert_eq!(Orientation::ReversePortrait.code(), 9);
        assert_eq!(Orientation::Locked.code(), 14);
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(Orientation::from_code(99), Err(UnknownOrientation(99)));
        assert_eq!(Orientation::try_from(-3), Err(UnknownOrientation(-3)));
    }

    #[test]
    fn test_all_is_sorted() {
        let mut sorted = Orientation::ALL;
        sorted.sort();
        assert_eq!(sorted, Orientation::ALL);
        assert!(Orientation::Invalid < Orientation::Portrait);
    }

    #[test]
    fn test_parse_names_and_codes() {
        assert_eq!("portrait".parse::<Orientation>(), Ok(Orientation::Portrait));
        assert_eq!("Reverse-Landscape".parse::<Orientation>(), Ok(Orientation::ReverseLandscape));
        assert_eq!("7".parse::<Orientation>(), Ok(Orientation::SensorPortrait));
        assert!("sideways".parse::<Orientation>().is_err());
        assert!("42".parse::<Orientation>().is_err());
    }

    #[test]
    fn test_serde_name_matches_display() {
        for o in Orientation::ALL {
            let json = serde_json::to_string(&o).unwrap();
            assert_eq!(json, format!("\"{}\"", o));
        }
    }
}
