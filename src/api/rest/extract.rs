//! Request extractors whose rejections use the standard error envelope.
//!
//! The stock axum extractors answer malformed input with plain-text
//! bodies, which dashboard clients cannot parse. These wrappers route
//! every rejection through [`AppError`] so handlers never leak a
//! non-JSON error response.

use async_trait::async_trait;
use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::error::AppError;
use crate::schema::FieldError;

/// A JSON request body. Unreadable or syntactically invalid bodies
/// become a `validation_error` envelope instead of a plain-text 400.
pub struct JsonBody(pub Value);

#[async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<Value>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(AppError::Validation(vec![FieldError::new(
                "body",
                rejection.body_text(),
            )])),
        }
    }
}

/// A trip id from the request path. Clients address trips by opaque
/// string ids, so anything that is not one of ours is simply a trip
/// that does not exist: 404, never a parse error.
pub struct TripId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for TripId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::NotFound("trip not found".to_string()))?;
        Uuid::parse_str(&raw)
            .map(TripId)
            .map_err(|_| AppError::NotFound(format!("trip {raw} not found")))
    }
}

/// Query-string filters. Undeserializable values (an unknown status,
/// a non-numeric limit) report as a `validation_error` envelope.
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(QueryParams(value)),
            Err(rejection) => Err(AppError::Validation(vec![FieldError::new(
                "query",
                rejection.body_text(),
            )])),
        }
    }
}
