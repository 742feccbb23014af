pub mod google;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::driver::GeoPoint;
use crate::models::trip::{TripRoute, TripStop};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteLeg {
    pub distance_meters: u64,
    pub duration_seconds: u64,
}

/// First route candidate returned by the directions provider: its
/// overview polyline, verbatim, plus the per-leg totals.
#[derive(Debug, Clone)]
pub struct RouteCandidate {
    pub polyline: String,
    pub legs: Vec<RouteLeg>,
}

/// Seam to the external geocoding/directions provider. No retries and
/// no caching: a single upstream failure surfaces to the caller.
#[async_trait]
pub trait RouteProvider: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<GeoPoint, AppError>;

    async fn directions(
        &self,
        origin: GeoPoint,
        waypoints: &[GeoPoint],
        destination: GeoPoint,
    ) -> Result<RouteCandidate, AppError>;
}

/// Aggregate a trip's stops into a single route. Stops are ordered by
/// `sequence` (stable, ties keep input order); the first becomes the
/// origin, the last the destination, the rest waypoints in order.
/// Waypoint order is preserved exactly, never re-optimized.
pub async fn resolve_route(
    provider: &dyn RouteProvider,
    stops: &[TripStop],
) -> Result<TripRoute, AppError> {
    if stops.len() < 2 {
        return Err(AppError::Internal(
            "route resolution requires at least 2 stops".to_string(),
        ));
    }

    let mut ordered: Vec<&TripStop> = stops.iter().collect();
    ordered.sort_by_key(|stop| stop.sequence);

    let origin = point(ordered[0]);
    let destination = point(ordered[ordered.len() - 1]);
    let waypoints: Vec<GeoPoint> = ordered[1..ordered.len() - 1]
        .iter()
        .map(|stop| point(stop))
        .collect();

    let candidate = provider.directions(origin, &waypoints, destination).await?;

    let mut distance_meters = 0;
    let mut duration_seconds = 0;
    for leg in &candidate.legs {
        distance_meters += leg.distance_meters;
        duration_seconds += leg.duration_seconds;
    }

    Ok(TripRoute {
        polyline: candidate.polyline,
        distance_meters,
        duration_seconds,
    })
}

fn point(stop: &TripStop) -> GeoPoint {
    GeoPoint {
        lat: stop.lat,
        lng: stop.lng,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use uuid::Uuid;

    use super::*;

    struct CapturingProvider {
        calls: Mutex<Vec<(GeoPoint, Vec<GeoPoint>, GeoPoint)>>,
        legs: Vec<RouteLeg>,
    }

    impl CapturingProvider {
        fn with_legs(legs: Vec<RouteLeg>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                legs,
            }
        }
    }

    #[async_trait]
    impl RouteProvider for CapturingProvider {
        async fn geocode(&self, address: &str) -> Result<GeoPoint, AppError> {
            Err(AppError::Upstream(format!(
                "geocoding not expected for \"{address}\""
            )))
        }

        async fn directions(
            &self,
            origin: GeoPoint,
            waypoints: &[GeoPoint],
            destination: GeoPoint,
        ) -> Result<RouteCandidate, AppError> {
            self.calls
                .lock()
                .unwrap()
                .push((origin, waypoints.to_vec(), destination));
            Ok(RouteCandidate {
                polyline: "mocked".to_string(),
                legs: self.legs.clone(),
            })
        }
    }

    fn stop(sequence: u32, lat: f64) -> TripStop {
        TripStop {
            stop_id: Uuid::new_v4(),
            address: format!("stop-{sequence}"),
            lat,
            lng: 10.0,
            sequence,
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn orders_stops_by_sequence_not_input_order() {
        let provider = CapturingProvider::with_legs(vec![
            RouteLeg {
                distance_meters: 1,
                duration_seconds: 1,
            };
            2
        ]);
        let stops = [stop(1, 51.0), stop(0, 50.0), stop(2, 52.0)];

        resolve_route(&provider, &stops).await.unwrap();

        let calls = provider.calls.lock().unwrap();
        let (origin, waypoints, destination) = &calls[0];
        assert_eq!(origin.lat, 50.0);
        assert_eq!(waypoints.len(), 1);
        assert_eq!(waypoints[0].lat, 51.0);
        assert_eq!(destination.lat, 52.0);
    }

    #[tokio::test]
    async fn sums_distance_and_duration_across_legs() {
        let provider = CapturingProvider::with_legs(vec![
            RouteLeg {
                distance_meters: 1200,
                duration_seconds: 300,
            },
            RouteLeg {
                distance_meters: 800,
                duration_seconds: 150,
            },
        ]);
        let stops = [stop(0, 50.0), stop(1, 51.0), stop(2, 52.0)];

        let route = resolve_route(&provider, &stops).await.unwrap();

        assert_eq!(route.distance_meters, 2000);
        assert_eq!(route.duration_seconds, 450);
        assert_eq!(route.polyline, "mocked");
    }

    #[tokio::test]
    async fn two_stops_produce_no_waypoints() {
        let provider = CapturingProvider::with_legs(vec![RouteLeg {
            distance_meters: 1,
            duration_seconds: 1,
        }]);
        let stops = [stop(5, 50.0), stop(2, 49.0)];

        resolve_route(&provider, &stops).await.unwrap();

        let calls = provider.calls.lock().unwrap();
        let (origin, waypoints, destination) = &calls[0];
        assert_eq!(origin.lat, 49.0);
        assert!(waypoints.is_empty());
        assert_eq!(destination.lat, 50.0);
    }

    #[tokio::test]
    async fn fewer_than_two_stops_is_rejected() {
        let provider = CapturingProvider::with_legs(Vec::new());
        let result = resolve_route(&provider, &[stop(0, 50.0)]).await;
        assert!(matches!(result, Err(AppError::Internal(_))));
        assert!(provider.calls.lock().unwrap().is_empty());
    }
}
