use prometheus::{
    Counter, Encoder, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub transitions_total: IntCounterVec,
    pub transition_latency_seconds: HistogramVec,
    pub earnings_amount_total: Counter,
    pub ws_subscribers: IntGauge,
    pub safety_reports_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let transitions_total = IntCounterVec::new(
            Opts::new(
                "order_transitions_total",
                "Order lifecycle transitions by action and outcome",
            ),
            &["action", "outcome"],
        )
        .expect("valid order_transitions_total metric");

        let transition_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "order_transition_latency_seconds",
                "Latency of applying an order lifecycle transition in seconds",
            ),
            &["action", "outcome"],
        )
        .expect("valid order_transition_latency_seconds metric");

        let earnings_amount_total = Counter::new(
            "earnings_amount_total",
            "Sum of earnings amounts recorded on completed deliveries",
        )
        .expect("valid earnings_amount_total metric");

        let ws_subscribers = IntGauge::new(
            "ws_subscribers",
            "Currently connected live-subscription clients",
        )
        .expect("valid ws_subscribers metric");

        let safety_reports_total = IntCounterVec::new(
            Opts::new(
                "safety_reports_total",
                "Incident reports and emergency alerts filed",
            ),
            &["kind"],
        )
        .expect("valid safety_reports_total metric");

        registry
            .register(Box::new(transitions_total.clone()))
            .expect("register order_transitions_total");
        registry
            .register(Box::new(transition_latency_seconds.clone()))
            .expect("register order_transition_latency_seconds");
        registry
            .register(Box::new(earnings_amount_total.clone()))
            .expect("register earnings_amount_total");
        registry
            .register(Box::new(ws_subscribers.clone()))
            .expect("register ws_subscribers");
        registry
            .register(Box::new(safety_reports_total.clone()))
            .expect("register safety_reports_total");

        Self {
            registry,
            transitions_total,
            transition_latency_seconds,
            earnings_amount_total,
            ws_subscribers,
            safety_reports_total,
        }
    }

    pub fn observe_transition(&self, action: &str, ok: bool, elapsed_secs: f64) {
        let outcome = if ok { "success" } else { "rejected" };
        self.transitions_total
            .with_label_values(&[action, outcome])
            .inc();
        self.transition_latency_seconds
            .with_label_values(&[action, outcome])
            .observe(elapsed_secs);
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
