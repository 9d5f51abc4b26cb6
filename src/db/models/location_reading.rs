//! Location reading data model.
//!
//! One raw observation of the device at an instant. Readings are produced by
//! ingestion and never mutated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationReading {
    /// Assigned by the store on insert; reflects arrival order.
    pub id: Option<i64>,
    pub timestamp: DateTime<Utc>,
    /// Location text as reported, e.g. `"Jersey City, NJ"`.
    pub location: String,
    /// Region label derived from `location`, compared with exact string equality.
    pub region: String,
    pub activity: Option<String>,
    /// Horizontal accuracy in metres.
    pub accuracy: Option<f64>,
    pub coordinates: Coordinates,
    /// Secondary accuracy indicator as reported by the device.
    pub accuracy_level: Option<f64>,
    /// 0-100 signal estimate derived from `accuracy_level` at ingestion.
    pub signal_strength: Option<f64>,
}

impl LocationReading {
    /// A reading whose location text is the region label itself.
    pub fn new(timestamp: DateTime<Utc>, region: impl Into<String>) -> Self {
        let region = region.into();
        Self {
            id: None,
            timestamp,
            location: region.clone(),
            region,
            activity: None,
            accuracy: None,
            coordinates: Coordinates {
                latitude: 0.0,
                longitude: 0.0,
            },
            accuracy_level: None,
            signal_strength: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_activity(mut self, activity: impl Into<String>) -> Self {
        self.activity = Some(activity.into());
        self
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.coordinates = Coordinates {
            latitude,
            longitude,
        };
        self
    }
}
