use prometheus::{
    Encoder, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub location_pushes_total: IntCounterVec,
    pub location_push_latency_seconds: HistogramVec,
    pub booking_submissions_total: IntCounterVec,
    pub active_job: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let location_pushes_total = IntCounterVec::new(
            Opts::new(
                "location_pushes_total",
                "Driver position pushes by outcome",
            ),
            &["outcome"],
        )
        .expect("valid location_pushes_total metric");

        let location_push_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "location_push_latency_seconds",
                "Latency of position pushes in seconds",
            ),
            &["outcome"],
        )
        .expect("valid location_push_latency_seconds metric");

        let booking_submissions_total = IntCounterVec::new(
            Opts::new(
                "booking_submissions_total",
                "Booking submissions by outcome",
            ),
            &["outcome"],
        )
        .expect("valid booking_submissions_total metric");

        let active_job = IntGauge::new("active_job", "1 while the driver has an active job")
            .expect("valid active_job metric");

        registry
            .register(Box::new(location_pushes_total.clone()))
            .expect("register location_pushes_total");
        registry
            .register(Box::new(location_push_latency_seconds.clone()))
            .expect("register location_push_latency_seconds");
        registry
            .register(Box::new(booking_submissions_total.clone()))
            .expect("register booking_submissions_total");
        registry
            .register(Box::new(active_job.clone()))
            .expect("register active_job");

        Self {
            registry,
            location_pushes_total,
            location_push_latency_seconds,
            booking_submissions_total,
            active_job,
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
