//! Metrics recorder initialization.

use tracing::info;

use crate::error::{Error, Result};

/// Configuration for the metrics system.
#[derive(Debug, Clone, Default)]
pub struct MetricsRecorderConfig {
    /// Whether metrics collection is enabled
    pub enabled: bool,
    /// Scrape listener address, e.g. `127.0.0.1:9464`
    pub listen: String,
}

/// Install the global recorder.
///
/// With the `prometheus` feature this binds an HTTP scrape listener on
/// `config.listen`. Without it, or when disabled, the `metrics` facade keeps
/// its no-op recorder and every `counter!` call is free.
pub fn init_metrics(config: &MetricsRecorderConfig) -> Result<()> {
    if !config.enabled {
        info!("metrics collection is disabled");
        return Ok(());
    }

    let addr: std::net::SocketAddr =
        config
            .listen
            .parse()
            .map_err(|source| Error::InvalidListen {
                address: config.listen.clone(),
                source,
            })?;

    #[cfg(feature = "prometheus")]
    {
        use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};

        PrometheusBuilder::new()
            .with_http_listener(addr)
            .set_buckets_for_metric(
                Matcher::Full(crate::jobs::DURATION_SECONDS.to_string()),
                crate::buckets::JOB_DURATION,
            )?
            .install()?;
        info!(%addr, "prometheus exporter listening");
    }

    #[cfg(not(feature = "prometheus"))]
    info!(%addr, "metrics enabled but the prometheus exporter is not compiled in");

    Ok(())
}
