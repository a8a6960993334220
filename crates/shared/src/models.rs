use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::MarkerError;

pub const DEFAULT_PRIMARY: &str = "#ff1493";
pub const DEFAULT_SECONDARY: &str = "#ffff00";

static NEXT_MARKER_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque marker identity. Fresh ids are never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(u64);

impl MarkerId {
    pub fn fresh() -> Self {
        MarkerId(NEXT_MARKER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for MarkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// Geographic coordinate, always finite. Serialized as `[lon, lat]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct Location {
    lon: f64,
    lat: f64,
}

impl Location {
    pub const ORIGIN: Location = Location { lon: 0.0, lat: 0.0 };

    pub fn new(lon: f64, lat: f64) -> Result<Self, MarkerError> {
        if lon.is_finite() && lat.is_finite() {
            Ok(Location { lon, lat })
        } else {
            Err(MarkerError::NonFiniteLocation { lon, lat })
        }
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Parse the `lon`/`lat` form inputs.
    pub fn parse(lon: &str, lat: &str) -> Result<Self, MarkerError> {
        let parse = |s: &str| s.trim().parse::<f64>().ok();
        match (parse(lon), parse(lat)) {
            (Some(lon), Some(lat)) => Location::new(lon, lat),
            _ => Err(MarkerError::InvalidLocation {
                lon: lon.to_string(),
                lat: lat.to_string(),
            }),
        }
    }
}

impl TryFrom<[f64; 2]> for Location {
    type Error = MarkerError;

    fn try_from([lon, lat]: [f64; 2]) -> Result<Self, Self::Error> {
        Location::new(lon, lat)
    }
}

impl From<Location> for [f64; 2] {
    fn from(l: Location) -> Self {
        [l.lon, l.lat]
    }
}

/// Two-tone glyph color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorPair {
    pub primary: String,
    pub secondary: String,
}

impl Default for ColorPair {
    fn default() -> Self {
        ColorPair {
            primary: DEFAULT_PRIMARY.to_string(),
            secondary: DEFAULT_SECONDARY.to_string(),
        }
    }
}

impl ColorPair {
    /// Override only the channels `partial` sets.
    pub fn merge(&mut self, partial: PartialColor) {
        if let Some(primary) = partial.primary {
            self.primary = primary;
        }
        if let Some(secondary) = partial.secondary {
            self.secondary = secondary;
        }
    }

    /// Channels that differ from their default (case-insensitive).
    pub fn non_default(&self) -> PartialColor {
        let keep = |value: &str, default: &str| {
            (!value.eq_ignore_ascii_case(default)).then(|| value.to_string())
        };
        PartialColor {
            primary: keep(&self.primary, DEFAULT_PRIMARY),
            secondary: keep(&self.secondary, DEFAULT_SECONDARY),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialColor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
}

impl PartialColor {
    pub fn is_empty(&self) -> bool {
        self.primary.is_none() && self.secondary.is_none()
    }
}

/// Serialized marker as carried by the share link and the initial document.
///
/// The initial document names the note `info`; links use `infoHTML`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerRecord {
    #[serde(default)]
    pub name: String,
    pub location: Location,
    #[serde(rename = "infoHTML", alias = "info", default)]
    pub info_html: String,
    #[serde(default, skip_serializing_if = "PartialColor::is_empty")]
    pub color: PartialColor,
}
