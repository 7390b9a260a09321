use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Counter: booking attempts. Labels: status (booked, unavailable, rejected).
pub const BOOKINGS_TOTAL: &str = "roombook_bookings_total";

/// Counter: cancellation attempts. Labels: status (cancelled, not_found, rejected).
pub const CANCELLATIONS_TOTAL: &str = "roombook_cancellations_total";

/// Counter: cancellation confirmations that could not be delivered.
pub const NOTIFICATION_FAILURES_TOTAL: &str = "roombook_notification_failures_total";

/// Histogram: number of rooms returned by an availability search.
pub const AVAILABLE_ROOMS: &str = "roombook_available_rooms";

/// Install tracing and, if configured, the metrics exporter.
pub fn init(config: &Config) -> Result<(), BuildError> {
    init_tracing(&config.log_filter);
    init_metrics(config.metrics_port)
}

/// Install the fmt subscriber. A second call keeps the first subscriber.
pub fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init_metrics(port: Option<u16>) -> Result<(), BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}
