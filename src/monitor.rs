// Monitor binary entry point

mod config;
mod render;

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use config::MonitorConfig;
use incinerator_monitor::{
    display_offset, ChartSlots, HttpTelemetrySource, RefreshScheduler, SystemClock,
};
use render::{render_view, LogRenderer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = MonitorConfig::from_env().context("Failed to load configuration")?;

    info!(
        endpoint = %config.endpoint,
        refresh_secs = config.refresh_interval.as_secs(),
        query = %config.search_query,
        "Incinerator monitor starting"
    );

    let source = HttpTelemetrySource::new(config.endpoint.clone(), config.request_timeout)
        .context("Failed to build telemetry client")?;

    let scheduler = Arc::new(RefreshScheduler::new(
        Arc::new(source),
        Arc::new(SystemClock::new()),
        display_offset(config.display_utc_offset_hours),
        config.search_query.clone(),
    ));

    let mut updates = scheduler.subscribe();
    let handle = scheduler.start(config.refresh_interval);
    let mut slots = ChartSlots::new(LogRenderer::default());

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    error!("View updates closed unexpectedly");
                    break;
                }
                let view = updates.borrow_and_update().clone();
                render_view(&view, &mut slots);
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    error!(error = %e, "Failed to listen for shutdown signal");
                }
                info!("Shutdown requested");
                break;
            }
        }
    }

    handle.stop();
    slots.clear();
    info!("Incinerator monitor stopped");
    Ok(())
}
