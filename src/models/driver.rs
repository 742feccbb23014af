use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Presence record, one per driver uid. `last_location` stays `None`
/// until the first location ping arrives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverRecord {
    pub uid: String,
    pub is_online: bool,
    pub last_location: Option<GeoPoint>,
    pub last_speed_mps: f64,
    pub last_heading: f64,
    pub updated_at: DateTime<Utc>,
}

impl DriverRecord {
    pub fn offline(uid: String, now: DateTime<Utc>) -> Self {
        Self {
            uid,
            is_online: false,
            last_location: None,
            last_speed_mps: 0.0,
            last_heading: 0.0,
            updated_at: now,
        }
    }
}
