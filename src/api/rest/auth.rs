use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use chrono::Utc;
use tracing::info;

use crate::api::rest::extract::JsonBody;
use crate::auth::Caller;
use crate::error::AppError;
use crate::models::driver::DriverRecord;
use crate::models::user::{Role, UserProfile};
use crate::schema;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/setup", post(setup_profile))
        .route("/me", get(me))
}

/// Idempotent first-login profile creation. An existing profile is
/// returned unchanged; a new driver also gets an offline driver record.
async fn setup_profile(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    JsonBody(body): JsonBody,
) -> Result<(StatusCode, Json<UserProfile>), AppError> {
    let input = schema::create_user_profile(&body)?;

    if let Some(existing) = state.users.get(&caller.uid) {
        return Ok((StatusCode::OK, Json(existing.clone())));
    }

    let now = Utc::now();
    let profile = UserProfile {
        uid: caller.uid.clone(),
        email: caller.email.clone(),
        name: input.name,
        role: input.role,
        created_at: now,
    };
    state.users.insert(caller.uid.clone(), profile.clone());

    if profile.role == Role::Driver {
        state
            .drivers
            .entry(caller.uid.clone())
            .or_insert_with(|| DriverRecord::offline(caller.uid.clone(), now));
    }

    info!(uid = %caller.uid, role = profile.role.as_str(), "profile created");
    Ok((StatusCode::CREATED, Json(profile)))
}

async fn me(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<UserProfile>, AppError> {
    state
        .users
        .get(&caller.uid)
        .map(|profile| Json(profile.clone()))
        .ok_or_else(|| AppError::NotFound("user profile not found".to_string()))
}
