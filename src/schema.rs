//! Validation layer: turns untyped JSON bodies into normalized, typed
//! inputs. Every violated field is reported at once with a dotted path,
//! and defaults are applied explicitly per input type.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::models::trip::TripStatus;
use crate::models::user::Role;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationPing {
    pub lat: f64,
    pub lng: f64,
    pub speed_mps: f64,
    pub heading: f64,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StopInput {
    pub address: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub sequence: u32,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTrip {
    pub stops: Vec<StopInput>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignTrip {
    pub driver_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub status: TripStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateProfile {
    pub name: String,
    pub role: Role,
}

pub fn location_ping(input: &Value) -> Result<LocationPing, Vec<FieldError>> {
    let mut errors = Vec::new();
    if !ensure_object(input, &mut errors) {
        return Err(errors);
    }

    let lat = required_number(input, "lat", -90.0, 90.0, &mut errors);
    let lng = required_number(input, "lng", -180.0, 180.0, &mut errors);
    let speed_mps = optional_number(input, "speedMps", 0.0, f64::INFINITY, &mut errors).unwrap_or(0.0);
    let heading = optional_number(input, "heading", 0.0, 360.0, &mut errors).unwrap_or(0.0);

    let timestamp = match field(input, "timestamp") {
        None => None,
        Some(raw) => match raw.as_str().map(DateTime::parse_from_rfc3339) {
            Some(Ok(parsed)) => Some(parsed.with_timezone(&Utc)),
            _ => {
                errors.push(FieldError::new(
                    "timestamp",
                    "must be an ISO-8601 datetime string",
                ));
                None
            }
        },
    };

    match (lat, lng) {
        (Some(lat), Some(lng)) if errors.is_empty() => Ok(LocationPing {
            lat,
            lng,
            speed_mps,
            heading,
            timestamp,
        }),
        _ => Err(errors),
    }
}

pub fn create_trip(input: &Value) -> Result<CreateTrip, Vec<FieldError>> {
    let mut errors = Vec::new();
    if !ensure_object(input, &mut errors) {
        return Err(errors);
    }

    let mut stops = Vec::new();
    match field(input, "stops").and_then(Value::as_array) {
        None => errors.push(FieldError::new("stops", "at least one stop is required")),
        Some(raw_stops) if raw_stops.is_empty() => {
            errors.push(FieldError::new("stops", "at least one stop is required"));
        }
        Some(raw_stops) => {
            for (index, raw) in raw_stops.iter().enumerate() {
                match trip_stop(raw, &format!("stops.{index}")) {
                    Ok(stop) => stops.push(stop),
                    Err(stop_errors) => errors.extend(stop_errors),
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(CreateTrip { stops })
    } else {
        Err(errors)
    }
}

pub fn trip_stop(input: &Value, prefix: &str) -> Result<StopInput, Vec<FieldError>> {
    let mut errors = Vec::new();
    if !input.is_object() {
        errors.push(FieldError::new(prefix, "must be an object"));
        return Err(errors);
    }

    let address = required_string(input, "address", prefix, &mut errors);
    let lat = optional_number_at(input, "lat", prefix, -90.0, 90.0, &mut errors);
    let lng = optional_number_at(input, "lng", prefix, -180.0, 180.0, &mut errors);

    let sequence = match field(input, "sequence") {
        None => {
            errors.push(FieldError::new(joined(prefix, "sequence"), "sequence is required"));
            None
        }
        Some(raw) => match raw.as_u64() {
            Some(value) if value <= u64::from(u32::MAX) => Some(value as u32),
            _ => {
                errors.push(FieldError::new(
                    joined(prefix, "sequence"),
                    "must be a non-negative integer",
                ));
                None
            }
        },
    };

    let notes = match field(input, "notes") {
        None => String::new(),
        Some(raw) => match raw.as_str() {
            Some(value) => value.to_string(),
            None => {
                errors.push(FieldError::new(joined(prefix, "notes"), "must be a string"));
                String::new()
            }
        },
    };

    match (address, sequence) {
        (Some(address), Some(sequence)) if errors.is_empty() => Ok(StopInput {
            address,
            lat,
            lng,
            sequence,
            notes,
        }),
        _ => Err(errors),
    }
}

pub fn assign_trip(input: &Value) -> Result<AssignTrip, Vec<FieldError>> {
    let mut errors = Vec::new();
    if !ensure_object(input, &mut errors) {
        return Err(errors);
    }

    match required_string(input, "driverId", "", &mut errors) {
        Some(driver_id) if errors.is_empty() => Ok(AssignTrip { driver_id }),
        _ => Err(errors),
    }
}

/// Intentionally narrower than the full status enum: drivers may only
/// move a trip forward, never back to `draft` or sideways to `assigned`.
pub fn update_trip_status(input: &Value) -> Result<StatusUpdate, Vec<FieldError>> {
    let mut errors = Vec::new();
    if !ensure_object(input, &mut errors) {
        return Err(errors);
    }

    let status = match field(input, "status").and_then(Value::as_str) {
        Some("in_progress") => Some(TripStatus::InProgress),
        Some("completed") => Some(TripStatus::Completed),
        _ => {
            errors.push(FieldError::new(
                "status",
                "must be one of: in_progress, completed",
            ));
            None
        }
    };

    match status {
        Some(status) if errors.is_empty() => Ok(StatusUpdate { status }),
        _ => Err(errors),
    }
}

pub fn create_user_profile(input: &Value) -> Result<CreateProfile, Vec<FieldError>> {
    let mut errors = Vec::new();
    if !ensure_object(input, &mut errors) {
        return Err(errors);
    }

    let name = match required_string(input, "name", "", &mut errors) {
        Some(name) if name.chars().count() > 100 => {
            errors.push(FieldError::new("name", "must be at most 100 characters"));
            None
        }
        other => other,
    };

    let role = match field(input, "role") {
        None => Some(Role::Driver),
        Some(raw) => match raw.as_str() {
            Some("driver") => Some(Role::Driver),
            Some("dispatcher") => Some(Role::Dispatcher),
            Some("admin") => Some(Role::Admin),
            _ => {
                errors.push(FieldError::new(
                    "role",
                    "must be one of: driver, dispatcher, admin",
                ));
                None
            }
        },
    };

    match (name, role) {
        (Some(name), Some(role)) if errors.is_empty() => Ok(CreateProfile { name, role }),
        _ => Err(errors),
    }
}

// JSON null is treated the same as an absent field.
fn field<'a>(parent: &'a Value, key: &str) -> Option<&'a Value> {
    parent.get(key).filter(|value| !value.is_null())
}

fn ensure_object(input: &Value, errors: &mut Vec<FieldError>) -> bool {
    if input.is_object() {
        true
    } else {
        errors.push(FieldError::new("", "expected a JSON object"));
        false
    }
}

fn joined(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn required_number(
    parent: &Value,
    key: &str,
    min: f64,
    max: f64,
    errors: &mut Vec<FieldError>,
) -> Option<f64> {
    match field(parent, key) {
        None => {
            errors.push(FieldError::new(key, format!("{key} is required")));
            None
        }
        Some(raw) => checked_number(raw, key, min, max, errors),
    }
}

fn optional_number(
    parent: &Value,
    key: &str,
    min: f64,
    max: f64,
    errors: &mut Vec<FieldError>,
) -> Option<f64> {
    optional_number_at(parent, key, "", min, max, errors)
}

fn optional_number_at(
    parent: &Value,
    key: &str,
    prefix: &str,
    min: f64,
    max: f64,
    errors: &mut Vec<FieldError>,
) -> Option<f64> {
    field(parent, key).and_then(|raw| checked_number(raw, &joined(prefix, key), min, max, errors))
}

fn checked_number(
    raw: &Value,
    path: &str,
    min: f64,
    max: f64,
    errors: &mut Vec<FieldError>,
) -> Option<f64> {
    match raw.as_f64() {
        None => {
            errors.push(FieldError::new(path, "must be a number"));
            None
        }
        Some(value) if value < min || value > max => {
            let message = if max.is_infinite() {
                format!("must be at least {min}")
            } else {
                format!("must be between {min} and {max}")
            };
            errors.push(FieldError::new(path, message));
            None
        }
        Some(value) => Some(value),
    }
}

fn required_string(
    parent: &Value,
    key: &str,
    prefix: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match field(parent, key).and_then(Value::as_str) {
        Some(value) if !value.is_empty() => Some(value.to_string()),
        _ => {
            errors.push(FieldError::new(
                joined(prefix, key),
                format!("{key} must be a non-empty string"),
            ));
            None
        }
    }
}
