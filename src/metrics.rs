use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    // Pre-register counters so they appear even before the first increment.
    counter!("trades_opened_total").absolute(0);
    counter!("trades_amended_total").absolute(0);
    counter!("trades_deleted_total").absolute(0);
    counter!("stats_requests_total").absolute(0);
    for status in ["winner", "loser", "breakeven", "cancelled"] {
        counter!("trades_closed_total", "status" => status).absolute(0);
    }

    Ok(handle)
}

/// A handle backed by a recorder that is not installed globally.
/// Only one recorder may be installed per process, so tests use this.
pub fn detached_handle() -> PrometheusHandle {
    PrometheusBuilder::new().build_recorder().handle()
}
