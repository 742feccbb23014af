use prometheus::{
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub trips_created_total: IntCounter,
    pub trip_status_transitions_total: IntCounterVec,
    pub location_pings_total: IntCounter,
    pub drivers_online: IntGauge,
    pub provider_requests_total: IntCounterVec,
    pub provider_latency_seconds: HistogramVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let trips_created_total =
            IntCounter::new("trips_created_total", "Total trips created")
                .expect("valid trips_created_total metric");

        let trip_status_transitions_total = IntCounterVec::new(
            Opts::new(
                "trip_status_transitions_total",
                "Trip status transitions by target status",
            ),
            &["to"],
        )
        .expect("valid trip_status_transitions_total metric");

        let location_pings_total =
            IntCounter::new("location_pings_total", "Total driver location pings")
                .expect("valid location_pings_total metric");

        let drivers_online = IntGauge::new("drivers_online", "Drivers currently online")
            .expect("valid drivers_online metric");

        let provider_requests_total = IntCounterVec::new(
            Opts::new(
                "provider_requests_total",
                "Geocoding/directions provider requests by operation and outcome",
            ),
            &["operation", "outcome"],
        )
        .expect("valid provider_requests_total metric");

        let provider_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "provider_latency_seconds",
                "Latency of provider calls in seconds",
            ),
            &["operation"],
        )
        .expect("valid provider_latency_seconds metric");

        registry
            .register(Box::new(trips_created_total.clone()))
            .expect("register trips_created_total");
        registry
            .register(Box::new(trip_status_transitions_total.clone()))
            .expect("register trip_status_transitions_total");
        registry
            .register(Box::new(location_pings_total.clone()))
            .expect("register location_pings_total");
        registry
            .register(Box::new(drivers_online.clone()))
            .expect("register drivers_online");
        registry
            .register(Box::new(provider_requests_total.clone()))
            .expect("register provider_requests_total");
        registry
            .register(Box::new(provider_latency_seconds.clone()))
            .expect("register provider_latency_seconds");

        Self {
            registry,
            trips_created_total,
            trip_status_transitions_total,
            location_pings_total,
            drivers_online,
            provider_requests_total,
            provider_latency_seconds,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
