//! Trip lifecycle: `draft` → `assigned` → `in_progress` → `completed`.
//! Drivers may only move their own trip forward through the validated
//! status set; dispatchers and admins set status directly.

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::Caller;
use crate::engine::append_event;
use crate::error::AppError;
use crate::geo::polyline;
use crate::models::event::{DriverEvent, EventKind};
use crate::models::trip::{Trip, TripRoute, TripStatus, TripStop};
use crate::routing;
use crate::schema::CreateTrip;
use crate::state::AppState;

/// Create a trip in `draft`, geocoding any stop that lacks coordinates.
/// A geocoding failure for any stop aborts the whole operation; no
/// partial trip is persisted.
pub async fn create_trip(
    state: &AppState,
    created_by: &str,
    input: CreateTrip,
) -> Result<Trip, AppError> {
    let mut stops = Vec::with_capacity(input.stops.len());
    for stop in input.stops {
        let (lat, lng) = match (stop.lat, stop.lng) {
            (Some(lat), Some(lng)) => (lat, lng),
            _ => {
                let point = state.routes.geocode(&stop.address).await?;
                (point.lat, point.lng)
            }
        };

        stops.push(TripStop {
            stop_id: Uuid::new_v4(),
            address: stop.address,
            lat,
            lng,
            sequence: stop.sequence,
            notes: stop.notes,
        });
    }

    let now = Utc::now();
    let trip = Trip {
        id: Uuid::new_v4(),
        driver_id: None,
        created_by: created_by.to_string(),
        status: TripStatus::Draft,
        stops,
        route: None,
        created_at: now,
        updated_at: now,
    };

    state.trips.insert(trip.id, trip.clone());
    state.metrics.trips_created_total.inc();
    info!(trip_id = %trip.id, stops = trip.stops.len(), "trip created");

    Ok(trip)
}

/// Assign a driver to a draft trip. Assigning a non-draft trip is a
/// conflict; the record is left untouched.
pub fn assign_trip(state: &AppState, trip_id: Uuid, driver_id: &str) -> Result<Trip, AppError> {
    let mut trip = state
        .trips
        .get_mut(&trip_id)
        .ok_or_else(|| AppError::NotFound(format!("trip {trip_id} not found")))?;

    if trip.status != TripStatus::Draft {
        return Err(AppError::Conflict(
            "trip can only be assigned from draft status".to_string(),
        ));
    }

    trip.driver_id = Some(driver_id.to_string());
    trip.status = TripStatus::Assigned;
    trip.updated_at = Utc::now();
    let snapshot = trip.clone();
    drop(trip);

    record_status_change(state, driver_id, trip_id, TripStatus::Draft, TripStatus::Assigned);
    info!(trip_id = %trip_id, driver_id = %driver_id, "trip assigned");

    Ok(snapshot)
}

/// Apply a validated status update. Drivers must be the assigned driver
/// and the trip must have left `draft`; dispatchers and admins set the
/// requested status unconditionally.
pub fn update_status(
    state: &AppState,
    caller: &Caller,
    trip_id: Uuid,
    requested: TripStatus,
) -> Result<Trip, AppError> {
    let mut trip = state
        .trips
        .get_mut(&trip_id)
        .ok_or_else(|| AppError::NotFound(format!("trip {trip_id} not found")))?;

    if caller.is_driver() {
        if trip.driver_id.as_deref() != Some(caller.uid.as_str()) {
            return Err(AppError::Forbidden("not your trip".to_string()));
        }
        if trip.status == TripStatus::Draft {
            return Err(AppError::Conflict("trip must be assigned first".to_string()));
        }
    }

    let from = trip.status;
    trip.status = requested;
    trip.updated_at = Utc::now();
    let snapshot = trip.clone();
    drop(trip);

    let actor = snapshot
        .driver_id
        .clone()
        .unwrap_or_else(|| caller.uid.clone());
    record_status_change(state, &actor, trip_id, from, requested);
    info!(
        trip_id = %trip_id,
        from = from.as_str(),
        to = requested.as_str(),
        "trip status updated"
    );

    Ok(snapshot)
}

/// Resolve and persist the aggregated route for a trip with at least
/// two stops. Recomputation overwrites the stored route wholesale.
pub async fn compute_route(state: &AppState, trip_id: Uuid) -> Result<TripRoute, AppError> {
    let stops = {
        let trip = state
            .trips
            .get(&trip_id)
            .ok_or_else(|| AppError::NotFound(format!("trip {trip_id} not found")))?;

        if trip.stops.len() < 2 {
            return Err(AppError::Conflict(
                "at least 2 stops are required to compute a route".to_string(),
            ));
        }
        trip.stops.clone()
    };

    let route = routing::resolve_route(state.routes.as_ref(), &stops).await?;

    match polyline::decode(&route.polyline) {
        Ok(points) => info!(
            trip_id = %trip_id,
            points = points.len(),
            distance_meters = route.distance_meters,
            "route computed"
        ),
        Err(err) => warn!(trip_id = %trip_id, error = %err, "route polyline failed to decode"),
    }

    let mut trip = state
        .trips
        .get_mut(&trip_id)
        .ok_or_else(|| AppError::NotFound(format!("trip {trip_id} not found")))?;
    trip.route = Some(route.clone());
    trip.updated_at = Utc::now();

    Ok(route)
}

fn record_status_change(
    state: &AppState,
    driver_id: &str,
    trip_id: Uuid,
    from: TripStatus,
    to: TripStatus,
) {
    state
        .metrics
        .trip_status_transitions_total
        .with_label_values(&[to.as_str()])
        .inc();

    append_event(
        state,
        DriverEvent::new(
            EventKind::StatusChange,
            driver_id,
            json!({
                "tripId": trip_id,
                "from": from.as_str(),
                "to": to.as_str(),
            }),
        ),
    );
}
