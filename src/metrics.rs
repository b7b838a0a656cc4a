use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    register_defaults();
    Ok(handle)
}

/// A handle that renders without being the global recorder. Lets tests build
/// several apps in one process.
pub fn detached_handle() -> PrometheusHandle {
    PrometheusBuilder::new().build_recorder().handle()
}

fn register_defaults() {
    // Pre-register counters so they appear even before the first increment.
    counter!("reconcile_total").absolute(0);
    counter!("rounds_settled_total").absolute(0);
    counter!("store_errors_total").absolute(0);
    counter!("malformed_state_total").absolute(0);
    counter!("clock_corrections_total").absolute(0);
    for phase in ["BETTING", "REVEALING", "SETTLED"] {
        counter!("phase_transitions_total", "to" => phase).absolute(0);
    }

    gauge!("round_phase").set(0.0);
    gauge!("ws_subscribers").set(0.0);

    // Histogram is lazily created on first record; force creation.
    histogram!("reconcile_latency_seconds").record(0.0);
}
