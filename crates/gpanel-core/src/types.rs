//! Core domain types

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

// ─────────────────────────────────────────────────────────
// Channel
// ─────────────────────────────────────────────────────────

/// A tunable broadcast channel.
///
/// Identity is the frequency token: two channels with the same frequency are
/// the same channel regardless of number or name. A channel with an empty
/// frequency is "null" and can never be tuned.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Channel {
    pub frequency: String,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub name: String,
}

impl Channel {
    pub fn new(
        frequency: impl Into<String>,
        number: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            frequency: frequency.into(),
            number: number.into(),
            name: name.into(),
        }
    }

    /// The null channel (empty frequency)
    pub fn null() -> Self {
        Self::default()
    }

    pub fn is_null(&self) -> bool {
        self.frequency.is_empty()
    }

    /// Display label, e.g. `"5 - TV Brasil"`
    pub fn label(&self) -> String {
        match (self.number.is_empty(), self.name.is_empty()) {
            (false, false) => format!("{} - {}", self.number, self.name),
            (true, false) => self.name.clone(),
            (false, true) => self.number.clone(),
            (true, true) => self.frequency.clone(),
        }
    }
}

impl PartialEq for Channel {
    fn eq(&self, other: &Self) -> bool {
        self.frequency == other.frequency
    }
}

impl Eq for Channel {}

impl Hash for Channel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.frequency.hash(state);
    }
}

// ─────────────────────────────────────────────────────────
// Geometry
// ─────────────────────────────────────────────────────────

/// Screen geometry passed to the engine as `--vmode WxH`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new(640, 480)
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Geometry {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidGeometry {
            value: s.to_string(),
        };
        let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
        let width = w.trim().parse::<u32>().map_err(|_| invalid())?;
        let height = h.trim().parse::<u32>().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(Self { width, height })
    }
}

impl TryFrom<String> for Geometry {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Geometry> for String {
    fn from(value: Geometry) -> Self {
        value.to_string()
    }
}

// ─────────────────────────────────────────────────────────
// Device Role
// ─────────────────────────────────────────────────────────

/// How the engine participates in a multi-device session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceRole {
    /// Standalone receiver
    #[default]
    Base,
    /// Secondary device, one per host
    Passive,
    /// Network-addressable primary device
    Active,
}

impl DeviceRole {
    /// Value for `--device-class`, `None` for the base role
    pub fn device_class(&self) -> Option<&'static str> {
        match self {
            DeviceRole::Base => None,
            DeviceRole::Passive => Some("1"),
            DeviceRole::Active => Some("2"),
        }
    }
}

impl fmt::Display for DeviceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceRole::Base => write!(f, "base"),
            DeviceRole::Passive => write!(f, "passive"),
            DeviceRole::Active => write!(f, "active"),
        }
    }
}

impl FromStr for DeviceRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "base" => Ok(DeviceRole::Base),
            "passive" => Ok(DeviceRole::Passive),
            "active" => Ok(DeviceRole::Active),
            other => Err(Error::config_invalid(format!("unknown device role: {other}"))),
        }
    }
}

/// Which engine output stream a line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStream {
    Stdout,
    Stderr,
}
