use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::auth::TokenVerifier;
use crate::models::driver::DriverRecord;
use crate::models::event::DriverEvent;
use crate::models::trip::Trip;
use crate::models::user::UserProfile;
use crate::observability::metrics::Metrics;
use crate::routing::RouteProvider;

/// Document stores keyed by id, one map per record type. Every write is
/// scoped to a single entry; no cross-map atomicity is provided.
pub struct AppState {
    pub users: DashMap<String, UserProfile>,
    pub drivers: DashMap<String, DriverRecord>,
    pub trips: DashMap<Uuid, Trip>,
    pub events: DashMap<Uuid, DriverEvent>,
    pub events_tx: broadcast::Sender<DriverEvent>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub routes: Arc<dyn RouteProvider>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        event_buffer_size: usize,
        verifier: Arc<dyn TokenVerifier>,
        routes: Arc<dyn RouteProvider>,
        metrics: Metrics,
    ) -> Self {
        let (events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            users: DashMap::new(),
            drivers: DashMap::new(),
            trips: DashMap::new(),
            events: DashMap::new(),
            events_tx,
            verifier,
            routes,
            metrics,
        }
    }
}
