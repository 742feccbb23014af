use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    Draft,
    Assigned,
    InProgress,
    Completed,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Draft => "draft",
            TripStatus::Assigned => "assigned",
            TripStatus::InProgress => "in_progress",
            TripStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripStop {
    pub stop_id: Uuid,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub sequence: u32,
    pub notes: String,
}

/// Aggregated directions result: overview polyline plus totals summed
/// across every leg of the chosen route.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRoute {
    pub polyline: String,
    pub distance_meters: u64,
    pub duration_seconds: u64,
}

/// A multi-stop delivery job. Stops are stored as supplied; consumers
/// must order by `sequence`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: Uuid,
    pub driver_id: Option<String>,
    pub created_by: String,
    pub status: TripStatus,
    pub stops: Vec<TripStop>,
    pub route: Option<TripRoute>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
