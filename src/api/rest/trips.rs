use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::api::rest::extract::{JsonBody, QueryParams, TripId};
use crate::auth::Caller;
use crate::engine::lifecycle;
use crate::error::AppError;
use crate::models::trip::{Trip, TripStatus};
use crate::models::user::Role;
use crate::schema;
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 100;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/trips", post(create_trip).get(list_trips))
        .route("/trips/:id", get(get_trip))
        .route("/trips/:id/assign", post(assign_trip))
        .route("/trips/:id/route", post(compute_route))
        .route("/trips/:id/status", post(update_status))
}

async fn create_trip(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    JsonBody(body): JsonBody,
) -> Result<(StatusCode, Json<Trip>), AppError> {
    caller.require_role(&[Role::Dispatcher, Role::Admin])?;
    let input = schema::create_trip(&body)?;

    let trip = lifecycle::create_trip(&state, &caller.uid, input).await?;
    Ok((StatusCode::CREATED, Json(trip)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListTripsQuery {
    status: Option<TripStatus>,
    driver_id: Option<String>,
    limit: Option<usize>,
}

async fn list_trips(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    QueryParams(query): QueryParams<ListTripsQuery>,
) -> Result<Json<Vec<Trip>>, AppError> {
    let role = caller.require_role(&[Role::Driver, Role::Dispatcher, Role::Admin])?;

    // Drivers are always scoped to their own trips; any driverId filter
    // they pass is overridden.
    let driver_filter = if role == Role::Driver {
        Some(caller.uid.as_str())
    } else {
        query.driver_id.as_deref()
    };

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);

    let mut trips: Vec<Trip> = state
        .trips
        .iter()
        .filter(|entry| {
            let trip = entry.value();
            let status_ok = query.status.is_none_or(|status| trip.status == status);
            let driver_ok =
                driver_filter.is_none_or(|driver| trip.driver_id.as_deref() == Some(driver));
            status_ok && driver_ok
        })
        .map(|entry| entry.value().clone())
        .collect();

    trips.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    trips.truncate(limit);

    Ok(Json(trips))
}

async fn get_trip(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    TripId(id): TripId,
) -> Result<Json<Trip>, AppError> {
    let trip = state
        .trips
        .get(&id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("trip {id} not found")))?;

    if caller.is_driver() && trip.driver_id.as_deref() != Some(caller.uid.as_str()) {
        return Err(AppError::Forbidden("not your trip".to_string()));
    }

    Ok(Json(trip))
}

async fn assign_trip(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    TripId(id): TripId,
    JsonBody(body): JsonBody,
) -> Result<Json<Value>, AppError> {
    caller.require_role(&[Role::Dispatcher, Role::Admin])?;
    let input = schema::assign_trip(&body)?;

    let trip = lifecycle::assign_trip(&state, id, &input.driver_id)?;
    Ok(Json(json!({
        "ok": true,
        "status": trip.status.as_str(),
        "driverId": input.driver_id,
    })))
}

async fn compute_route(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    TripId(id): TripId,
) -> Result<Json<Value>, AppError> {
    caller.require_role(&[Role::Dispatcher, Role::Admin])?;

    let route = lifecycle::compute_route(&state, id).await?;
    Ok(Json(json!({ "ok": true, "route": route })))
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    TripId(id): TripId,
    JsonBody(body): JsonBody,
) -> Result<Json<Value>, AppError> {
    caller.require_role(&[Role::Driver, Role::Dispatcher, Role::Admin])?;
    let input = schema::update_trip_status(&body)?;

    let trip = lifecycle::update_status(&state, &caller, id, input.status)?;
    Ok(Json(json!({ "ok": true, "status": trip.status.as_str() })))
}
