use tracing::{debug, info};

use incinerator_monitor::{
    Axis, ChartDataset, ChartRenderer, ChartSlots, DashboardView, FieldValue, PlantView,
};

/// Chart surface that writes each chart's shape to the log
#[derive(Debug, Default)]
pub struct LogRenderer {
    next_id: u64,
}

impl ChartRenderer for LogRenderer {
    type Handle = u64;

    fn create(&mut self, slot: &str, dataset: &ChartDataset) -> u64 {
        self.next_id += 1;
        let points: usize = dataset.series.iter().map(|s| s.points.len()).sum();
        debug!(
            slot = %slot,
            chart_id = self.next_id,
            series = dataset.series.len(),
            points,
            primary = %dataset.axis_title(Axis::Primary),
            secondary = %dataset.axis_title(Axis::Secondary),
            "Chart created"
        );
        self.next_id
    }

    fn release(&mut self, slot: &str, handle: u64) {
        debug!(slot = %slot, chart_id = handle, "Chart released");
    }
}

/// Log one applied dashboard view and keep chart slots in step with it
pub fn render_view(view: &DashboardView, slots: &mut ChartSlots<LogRenderer>) {
    info!(
        query = %view.query,
        with_sensors = view.plants.len(),
        others = view.others.len(),
        "Dashboard view"
    );

    for plant in &view.plants {
        render_plant(plant);
        match &plant.chart {
            Some(chart) => slots.render(&plant.id, chart),
            None => {
                slots.unmount(&plant.id);
            }
        }
    }

    slots.retain(
        view.plants
            .iter()
            .filter(|plant| plant.chart.is_some())
            .map(|plant| plant.id.as_str()),
    );

    for other in &view.others {
        info!(plant = %other.id, customer = %other.customer, province = %other.province, "No sensor data");
    }
}

fn render_plant(plant: &PlantView) {
    let units: Vec<String> = plant
        .units
        .iter()
        .map(|row| {
            let status = row
                .furnace
                .as_ref()
                .and_then(|furnace| furnace.status.label.clone())
                .unwrap_or_else(|| "-".to_string());
            let opening = row
                .valve
                .as_ref()
                .and_then(|valve| valve.opening.as_ref())
                .map(|m| format!("{}{}", m.value, m.unit))
                .unwrap_or_else(|| "-".to_string());
            format!("{}:{}/{}", row.suffix, status, opening)
        })
        .collect();

    let exhaust = plant
        .exhaust
        .as_ref()
        .map(|gas| {
            format!(
                "CO={} O2={}",
                display_or_dash(gas.carbon_monoxide.as_ref()),
                display_or_dash(gas.oxygen.as_ref())
            )
        })
        .unwrap_or_default();

    info!(
        plant = %plant.id,
        customer = %plant.customer,
        updated_at = %plant.updated_at,
        units = %units.join(" "),
        exhaust = %exhaust,
        "Plant status"
    );
}

fn display_or_dash(value: Option<&FieldValue>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string())
}
