// History binary entry point

mod config;

use anyhow::Context;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::MonitorConfig;
use incinerator_monitor::{
    assemble, Axis, ChartDataset, ChartWindow, Clock, HistoryRange, HttpTelemetrySource, Palette,
    SystemClock, TelemetrySource,
};

/// Everything a detail chart needs, printed as JSON
#[derive(Debug, Serialize)]
struct DetailChart {
    model: String,
    range: HistoryRange,
    window: ChartWindow,
    primary_axis_title: String,
    secondary_axis_title: String,
    dataset: ChartDataset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = MonitorConfig::from_env().context("Failed to load configuration")?;
    let model = MonitorConfig::history_model_from_env().context("Failed to load configuration")?;
    let range = HistoryRange::from_step(config.history_range_step);

    info!(model = %model, hours = range.hours, label = %range.label, "Fetching history");

    let source = HttpTelemetrySource::new(config.endpoint.clone(), config.request_timeout)
        .context("Failed to build telemetry client")?;
    let history = source
        .fetch_history(&model, range.hours)
        .await
        .with_context(|| format!("Failed to fetch history for {}", model))?;

    let dataset = assemble(&history, Palette::Extended);
    let window = ChartWindow::ending_at(SystemClock::new().now(), range.hours);

    info!(
        model = %model,
        sensors = history.len(),
        series = dataset.series.len(),
        "History assembled"
    );

    let chart = DetailChart {
        primary_axis_title: dataset.axis_title(Axis::Primary),
        secondary_axis_title: dataset.axis_title(Axis::Secondary),
        model,
        range,
        window,
        dataset,
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&chart).context("Failed to serialize chart")?
    );
    Ok(())
}
