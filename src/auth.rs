//! Access control: bearer-token verification through the external
//! identity service, plus the per-request `Caller` context threaded
//! into every lifecycle and presence operation.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use serde::Deserialize;
use serde_json::json;

use crate::error::AppError;
use crate::models::user::Role;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct Identity {
    pub uid: String,
    pub email: String,
}

/// Seam to the external identity service. Verifies a bearer token and
/// resolves it to a stable uid + email.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Identity, AppError>;
}

pub const DEFAULT_IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Verifies ID tokens against the Google identity-toolkit
/// `accounts:lookup` endpoint.
pub struct GoogleIdentityVerifier {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GoogleIdentityVerifier {
    pub fn new(http: reqwest::Client, api_key: String, base_url: String) -> Self {
        Self {
            http,
            api_key,
            base_url,
        }
    }
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    email: Option<String>,
}

#[async_trait]
impl TokenVerifier for GoogleIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, AppError> {
        let url = format!("{}/accounts:lookup?key={}", self.base_url, self.api_key);
        let rejected = || AppError::Unauthenticated("invalid or expired token".to_string());

        let response: LookupResponse = self
            .http
            .post(&url)
            .json(&json!({ "idToken": token }))
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|_| rejected())?
            .json()
            .await
            .map_err(|_| rejected())?;

        let user = response.users.into_iter().next().ok_or_else(rejected)?;
        Ok(Identity {
            uid: user.local_id,
            email: user.email.unwrap_or_default(),
        })
    }
}

/// Authenticated caller context. `role` is `None` until the caller has
/// run `/auth/setup`; role-gated routes reject such callers with 403.
#[derive(Debug, Clone)]
pub struct Caller {
    pub uid: String,
    pub email: String,
    pub role: Option<Role>,
}

impl Caller {
    /// Flat role check: dispatcher and admin are equals wherever both
    /// appear; nothing inherits.
    pub fn require_role(&self, allowed: &[Role]) -> Result<Role, AppError> {
        match self.role {
            Some(role) if allowed.contains(&role) => Ok(role),
            _ => Err(AppError::Forbidden(format!(
                "requires one of: {}",
                allowed
                    .iter()
                    .map(Role::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }

    pub fn is_driver(&self) -> bool {
        self.role == Some(Role::Driver)
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| {
                AppError::Unauthenticated("missing or invalid bearer token".to_string())
            })?;

        let identity = state.verifier.verify(token).await?;
        let role = state.users.get(&identity.uid).map(|profile| profile.role);

        Ok(Caller {
            uid: identity.uid,
            email: identity.email,
            role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: Option<Role>) -> Caller {
        Caller {
            uid: "u-1".to_string(),
            email: "u@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn dispatcher_and_admin_pass_the_same_gate() {
        let gate = [Role::Dispatcher, Role::Admin];
        assert!(caller(Some(Role::Dispatcher)).require_role(&gate).is_ok());
        assert!(caller(Some(Role::Admin)).require_role(&gate).is_ok());
        assert!(caller(Some(Role::Driver)).require_role(&gate).is_err());
    }

    #[test]
    fn missing_profile_fails_every_role_gate() {
        let result = caller(None).require_role(&[Role::Driver]);
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
