//! Driver presence: online flag plus last reported location, fed by
//! periodic pings. Staleness is derived at read time; nothing in the
//! background ever flips a driver offline.

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use tracing::info;

use crate::engine::append_event;
use crate::models::driver::{DriverRecord, GeoPoint};
use crate::models::event::{DriverEvent, EventKind};
use crate::schema::LocationPing;
use crate::state::AppState;

const STALE_AFTER_SECS: i64 = 5 * 60;

/// A driver is stale when their last update is older than the 5-minute
/// threshold. Purely presentational; `is_online` is untouched.
pub fn is_stale(record: &DriverRecord, now: DateTime<Utc>) -> bool {
    now - record.updated_at > Duration::seconds(STALE_AFTER_SECS)
}

/// Field-level merge of a location ping: online flag, location, speed,
/// heading and the update timestamp. Everything else on the record is
/// left as-is; the record is created on first ping if absent.
pub fn record_ping(state: &AppState, uid: &str, ping: &LocationPing) -> DateTime<Utc> {
    let now = Utc::now();

    let mut record = state
        .drivers
        .entry(uid.to_string())
        .or_insert_with(|| DriverRecord::offline(uid.to_string(), now));

    if !record.is_online {
        state.metrics.drivers_online.inc();
    }
    record.is_online = true;
    record.last_location = Some(GeoPoint {
        lat: ping.lat,
        lng: ping.lng,
    });
    record.last_speed_mps = ping.speed_mps;
    record.last_heading = ping.heading;
    record.updated_at = now;
    drop(record);

    state.metrics.location_pings_total.inc();

    let mut payload = json!({
        "lat": ping.lat,
        "lng": ping.lng,
        "speedMps": ping.speed_mps,
        "heading": ping.heading,
    });
    if let Some(timestamp) = ping.timestamp {
        payload["timestamp"] = json!(timestamp);
    }
    append_event(state, DriverEvent::new(EventKind::LocationPing, uid, payload));

    now
}

/// Clears only the online flag and bumps the update timestamp; the last
/// known location, speed and heading survive for the dashboard.
pub fn go_offline(state: &AppState, uid: &str) -> DateTime<Utc> {
    let now = Utc::now();

    let mut record = state
        .drivers
        .entry(uid.to_string())
        .or_insert_with(|| DriverRecord::offline(uid.to_string(), now));

    if record.is_online {
        state.metrics.drivers_online.dec();
    }
    record.is_online = false;
    record.updated_at = now;
    drop(record);

    append_event(
        state,
        DriverEvent::new(EventKind::StatusChange, uid, json!({ "status": "offline" })),
    );
    info!(driver_id = %uid, "driver went offline");

    now
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staleness_threshold_is_five_minutes() {
        let now = Utc::now();
        let mut record = DriverRecord::offline("drv-1".to_string(), now);

        record.updated_at = now - Duration::seconds(STALE_AFTER_SECS - 1);
        assert!(!is_stale(&record, now));

        record.updated_at = now - Duration::seconds(STALE_AFTER_SECS + 1);
        assert!(is_stale(&record, now));
    }
}
