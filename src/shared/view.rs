use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use crate::chart::{assemble, ChartDataset, Palette};
use crate::classifier::classify;
use crate::domain::{FieldValue, PlantSnapshot};
use crate::grouping::{NamedReading, SensorGroups};
use crate::sensor_schema::{Measurement, ReadingFields};
use crate::status::{resolve_status, CanonicalStatus, ResolvedStatus};
use crate::time::{format_display, parse_timestamp};

/// Shown for plants without a customer name
pub const UNKNOWN_CUSTOMER: &str = "客先名不明";
/// Shown when a timestamp is present but cannot be read
pub const UNREADABLE_TIMESTAMP: &str = "N/A";

/// Combustion panels above this temperature are highlighted as burning
const BURNING_TEMPERATURE_C: f64 = 50.0;

/// Inputs to view building that do not come from the snapshots
#[derive(Debug, Clone, Copy)]
pub struct ViewContext {
    pub now: DateTime<Utc>,
    pub display_offset: FixedOffset,
}

// ============================================================================
// Panels
// ============================================================================

/// Visual emphasis of a sensor panel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelHighlight {
    #[default]
    None,
    Burning,
    Cooling,
    ValveOpen,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementView {
    pub label: String,
    pub value: FieldValue,
    pub unit: String,
}

impl From<Measurement<'_>> for MeasurementView {
    fn from(measurement: Measurement<'_>) -> Self {
        Self {
            label: measurement.label.to_string(),
            value: measurement.value.clone(),
            unit: measurement.unit.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FurnacePanel {
    pub name: String,
    pub status: ResolvedStatus,
    pub temperature: Option<MeasurementView>,
    pub highlight: PanelHighlight,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValvePanel {
    pub name: String,
    pub opening: Option<MeasurementView>,
    pub highlight: PanelHighlight,
}

/// Furnace and valve panels for one suffix
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitRow {
    pub suffix: char,
    pub furnace: Option<FurnacePanel>,
    pub valve: Option<ValvePanel>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombustionPanel {
    pub name: String,
    pub temperature: Option<MeasurementView>,
    pub highlight: PanelHighlight,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExhaustPanel {
    pub carbon_monoxide: Option<FieldValue>,
    pub oxygen: Option<FieldValue>,
}

fn furnace_panel(furnace: NamedReading<'_>, valve: Option<NamedReading<'_>>) -> FurnacePanel {
    let fields = ReadingFields::of(furnace.reading);
    let status = resolve_status(furnace.reading, valve.map(|v| v.reading));
    let highlight = match status.status {
        CanonicalStatus::Auto => PanelHighlight::Burning,
        CanonicalStatus::Cooling => PanelHighlight::Cooling,
        _ => PanelHighlight::None,
    };

    FurnacePanel {
        name: furnace.name.to_string(),
        status,
        temperature: fields.temperature.map(MeasurementView::from),
        highlight,
    }
}

fn valve_panel(valve: NamedReading<'_>) -> ValvePanel {
    let fields = ReadingFields::of(valve.reading);
    let highlight = if fields.opening_or_zero() > 0.0 {
        PanelHighlight::ValveOpen
    } else {
        PanelHighlight::None
    };

    ValvePanel {
        name: valve.name.to_string(),
        opening: fields.opening.map(MeasurementView::from),
        highlight,
    }
}

fn combustion_panel(combustion: NamedReading<'_>) -> CombustionPanel {
    let fields = ReadingFields::of(combustion.reading);
    let highlight = if fields.temperature_or_zero() > BURNING_TEMPERATURE_C {
        PanelHighlight::Burning
    } else {
        PanelHighlight::None
    };

    CombustionPanel {
        name: combustion.name.to_string(),
        temperature: fields.temperature.map(MeasurementView::from),
        highlight,
    }
}

// ============================================================================
// Plant views
// ============================================================================

/// Everything the dashboard shows for one plant with sensor data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlantView {
    pub id: String,
    pub model: String,
    pub customer: String,
    pub province: String,
    pub image_url: String,
    pub updated_at: String,
    pub units: Vec<UnitRow>,
    pub combustion: Option<CombustionPanel>,
    pub exhaust: Option<ExhaustPanel>,
    pub chart: Option<ChartDataset>,
    /// Model passed to the detail page's history request
    pub detail_model: String,
}

impl PlantView {
    pub fn from_snapshot(snapshot: &PlantSnapshot, ctx: &ViewContext) -> Self {
        let groups = SensorGroups::of(&snapshot.sensors);

        let units = groups
            .unit_pairs()
            .into_iter()
            .map(|pair| UnitRow {
                suffix: pair.suffix,
                furnace: pair.furnace.map(|furnace| furnace_panel(furnace, pair.valve)),
                valve: pair.valve.map(valve_panel),
            })
            .collect();

        let gas = groups.exhaust_gas();
        let exhaust = (!gas.is_empty()).then(|| ExhaustPanel {
            carbon_monoxide: gas.carbon_monoxide.cloned(),
            oxygen: gas.oxygen.cloned(),
        });

        let chart = snapshot
            .history
            .as_ref()
            .map(|history| assemble(history, Palette::Compact))
            .filter(|dataset| !dataset.is_empty());

        Self {
            id: snapshot.plant_id(),
            model: snapshot.model.clone(),
            customer: snapshot.customer.clone(),
            province: snapshot.province.clone(),
            image_url: snapshot.image_url.clone(),
            updated_at: display_updated_at(snapshot.last_updated.as_deref(), ctx),
            units,
            combustion: groups.combustion.map(combustion_panel),
            exhaust,
            chart,
            detail_model: snapshot.model.clone(),
        }
    }
}

/// Compact card for a plant without sensor data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OtherPlantSummary {
    pub id: String,
    pub model: String,
    pub customer: String,
    pub province: String,
    pub image_url: String,
}

impl OtherPlantSummary {
    pub fn from_snapshot(snapshot: &PlantSnapshot) -> Self {
        let customer = if snapshot.customer.trim().is_empty() {
            UNKNOWN_CUSTOMER.to_string()
        } else {
            snapshot.customer.clone()
        };

        Self {
            id: snapshot.plant_id(),
            model: snapshot.model.clone(),
            customer,
            province: snapshot.province.clone(),
            image_url: snapshot.image_url.clone(),
        }
    }
}

/// Human-readable update time: now when absent, N/A when unreadable
pub fn display_updated_at(last_updated: Option<&str>, ctx: &ViewContext) -> String {
    match last_updated {
        None => format_display(ctx.now, ctx.display_offset),
        Some(raw) => parse_timestamp(raw)
            .map(|ts| format_display(ts, ctx.display_offset))
            .unwrap_or_else(|| UNREADABLE_TIMESTAMP.to_string()),
    }
}

// ============================================================================
// Dashboard
// ============================================================================

/// Immutable dashboard view-model, a pure function of (snapshots, query, context)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardView {
    pub query: String,
    pub plants: Vec<PlantView>,
    pub others: Vec<OtherPlantSummary>,
}

impl DashboardView {
    pub fn build(snapshots: &[PlantSnapshot], query: &str, ctx: &ViewContext) -> Self {
        let classified = classify(snapshots, query);

        Self {
            query: query.to_string(),
            plants: classified
                .with_sensors
                .iter()
                .map(|snapshot| PlantView::from_snapshot(snapshot, ctx))
                .collect(),
            others: classified
                .other
                .iter()
                .map(OtherPlantSummary::from_snapshot)
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.plants.is_empty() && self.others.is_empty()
    }
}
