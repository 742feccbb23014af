//! Google Maps geocoding/directions client. Failures are wrapped into
//! `AppError::Upstream` naming the operation and the address or context
//! involved; nothing is swallowed or retried.

use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::driver::GeoPoint;
use crate::observability::metrics::Metrics;
use crate::routing::{RouteCandidate, RouteLeg, RouteProvider};

pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api";

pub struct GoogleMapsProvider {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    metrics: Metrics,
}

impl GoogleMapsProvider {
    pub fn new(http: reqwest::Client, api_key: String, base_url: String, metrics: Metrics) -> Self {
        Self {
            http,
            api_key,
            base_url,
            metrics,
        }
    }

    fn observe(&self, operation: &str, started: Instant, ok: bool) {
        let outcome = if ok { "success" } else { "error" };
        self.metrics
            .provider_requests_total
            .with_label_values(&[operation, outcome])
            .inc();
        self.metrics
            .provider_latency_seconds
            .with_label_values(&[operation])
            .observe(started.elapsed().as_secs_f64());
    }
}

#[derive(Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct DirectionsRoute {
    legs: Vec<DirectionsLeg>,
    overview_polyline: OverviewPolyline,
}

#[derive(Deserialize)]
struct DirectionsLeg {
    distance: TextValue,
    duration: TextValue,
}

#[derive(Deserialize)]
struct TextValue {
    value: u64,
}

#[derive(Deserialize)]
struct OverviewPolyline {
    points: String,
}

fn provider_suffix(error_message: Option<&str>) -> String {
    match error_message {
        Some(detail) => format!(" - {detail}"),
        None => String::new(),
    }
}

#[async_trait]
impl RouteProvider for GoogleMapsProvider {
    async fn geocode(&self, address: &str) -> Result<GeoPoint, AppError> {
        let started = Instant::now();
        let result = self.geocode_inner(address).await;
        self.observe("geocode", started, result.is_ok());
        result
    }

    async fn directions(
        &self,
        origin: GeoPoint,
        waypoints: &[GeoPoint],
        destination: GeoPoint,
    ) -> Result<RouteCandidate, AppError> {
        let started = Instant::now();
        let result = self.directions_inner(origin, waypoints, destination).await;
        self.observe("directions", started, result.is_ok());
        result
    }
}

impl GoogleMapsProvider {
    async fn geocode_inner(&self, address: &str) -> Result<GeoPoint, AppError> {
        let url = format!("{}/geocode/json", self.base_url);
        let response: GeocodeResponse = self
            .http
            .get(&url)
            .query(&[("address", address), ("key", &self.api_key)])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| {
                AppError::Upstream(format!("geocoding request failed for \"{address}\": {err}"))
            })?
            .json()
            .await
            .map_err(|err| {
                AppError::Upstream(format!("geocoding response malformed for \"{address}\": {err}"))
            })?;

        if response.status != "OK" || response.results.is_empty() {
            return Err(AppError::Upstream(format!(
                "geocoding failed for \"{address}\": {}{}",
                response.status,
                provider_suffix(response.error_message.as_deref()),
            )));
        }

        let location = &response.results[0].geometry.location;
        Ok(GeoPoint {
            lat: location.lat,
            lng: location.lng,
        })
    }

    async fn directions_inner(
        &self,
        origin: GeoPoint,
        waypoints: &[GeoPoint],
        destination: GeoPoint,
    ) -> Result<RouteCandidate, AppError> {
        let url = format!("{}/directions/json", self.base_url);
        let waypoint_param = waypoints
            .iter()
            .map(|point| format!("{},{}", point.lat, point.lng))
            .collect::<Vec<_>>()
            .join("|");

        let mut query = vec![
            ("origin", format!("{},{}", origin.lat, origin.lng)),
            ("destination", format!("{},{}", destination.lat, destination.lng)),
            ("mode", "driving".to_string()),
            ("key", self.api_key.clone()),
        ];
        if !waypoint_param.is_empty() {
            query.push(("waypoints", waypoint_param));
        }

        let response: DirectionsResponse = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| AppError::Upstream(format!("directions request failed: {err}")))?
            .json()
            .await
            .map_err(|err| AppError::Upstream(format!("directions response malformed: {err}")))?;

        if response.status != "OK" {
            return Err(AppError::Upstream(format!(
                "directions provider error: {}{}",
                response.status,
                provider_suffix(response.error_message.as_deref()),
            )));
        }

        // Take the first candidate; no alternative-route selection.
        let route = response
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Upstream("directions returned no routes".to_string()))?;

        Ok(RouteCandidate {
            polyline: route.overview_polyline.points,
            legs: route
                .legs
                .iter()
                .map(|leg| RouteLeg {
                    distance_meters: leg.distance.value,
                    duration_seconds: leg.duration.value,
                })
                .collect(),
        })
    }
}
