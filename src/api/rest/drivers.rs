use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::{get, post};
use chrono::Utc;
use serde::Serialize;
use serde_json::{Value, json};

use crate::api::rest::extract::JsonBody;
use crate::auth::Caller;
use crate::engine::presence;
use crate::error::AppError;
use crate::models::driver::DriverRecord;
use crate::models::user::Role;
use crate::schema;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers", get(list_drivers))
        .route("/drivers/active", get(active_drivers))
        .route("/drivers/location", post(post_location))
        .route("/drivers/offline", post(go_offline))
}

#[derive(Serialize)]
struct DriverView {
    #[serde(flatten)]
    record: DriverRecord,
    stale: bool,
}

#[derive(Serialize)]
struct DriverDirectoryEntry {
    name: String,
    email: String,
    #[serde(flatten)]
    record: DriverRecord,
    stale: bool,
}

async fn post_location(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    JsonBody(body): JsonBody,
) -> Result<Json<Value>, AppError> {
    caller.require_role(&[Role::Driver])?;
    let ping = schema::location_ping(&body)?;

    let updated_at = presence::record_ping(&state, &caller.uid, &ping);
    Ok(Json(json!({ "ok": true, "updatedAt": updated_at })))
}

async fn go_offline(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<Value>, AppError> {
    caller.require_role(&[Role::Driver])?;

    presence::go_offline(&state, &caller.uid);
    Ok(Json(json!({ "ok": true, "isOnline": false })))
}

async fn active_drivers(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<Vec<DriverView>>, AppError> {
    caller.require_role(&[Role::Dispatcher, Role::Admin])?;

    let now = Utc::now();
    let drivers = state
        .drivers
        .iter()
        .filter(|entry| entry.value().is_online)
        .map(|entry| DriverView {
            stale: presence::is_stale(entry.value(), now),
            record: entry.value().clone(),
        })
        .collect();

    Ok(Json(drivers))
}

/// All driver records joined with profile name/email, for assignment
/// dropdowns and the dashboard roster.
async fn list_drivers(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<Vec<DriverDirectoryEntry>>, AppError> {
    caller.require_role(&[Role::Dispatcher, Role::Admin])?;

    let now = Utc::now();
    let drivers = state
        .drivers
        .iter()
        .map(|entry| {
            let record = entry.value().clone();
            let (name, email) = match state.users.get(&record.uid) {
                Some(profile) => (profile.name.clone(), profile.email.clone()),
                None => ("Unknown".to_string(), String::new()),
            };
            DriverDirectoryEntry {
                name,
                email,
                stale: presence::is_stale(&record, now),
                record,
            }
        })
        .collect();

    Ok(Json(drivers))
}
