use serde::{Deserialize, Serialize};

/// Tag stored with every record for the default location.
pub const KARACHI_TAG: &str = "karachi";

/// The fixed geographic point the pipeline forecasts for.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Location {
    /// Human-readable name, e.g. "Karachi"
    pub name: String,
    /// Constant tag written into every Observation Record
    pub tag: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Location {
    pub fn karachi() -> Self {
        Location {
            name: String::from("Karachi"),
            tag: String::from(KARACHI_TAG),
            latitude: 24.8608,
            longitude: 67.0104,
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Location::karachi()
    }
}
