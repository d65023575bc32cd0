use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::domain::{HistoryRecord, HistorySeries};
use crate::time::timestamp_millis_or_epoch;
use crate::units::{infer_unit, UNIT_CELSIUS, UNIT_PERCENT};

// ============================================================================
// Palettes and axes
// ============================================================================

const COMPACT_COLORS: &[&str] = &["#ef4444", "#3b82f6", "#f97316", "#8b5cf6"];
const EXTENDED_COLORS: &[&str] = &[
    "#ef4444", "#3b82f6", "#f97316", "#8b5cf6", "#10b981", "#06b6d4", "#d946ef",
];

/// Alpha suffix appended to a series color for its translucent fill
const FILL_ALPHA: &str = "33";

/// Series color cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    /// Four colors, used by the dashboard's mini charts
    Compact,
    /// Seven colors, used by the detail chart
    Extended,
}

impl Palette {
    pub fn colors(&self) -> &'static [&'static str] {
        match self {
            Palette::Compact => COMPACT_COLORS,
            Palette::Extended => EXTENDED_COLORS,
        }
    }

    /// Color for the n-th emitted series, cycling through the palette
    pub fn color(&self, index: usize) -> &'static str {
        let colors = self.colors();
        colors[index % colors.len()]
    }
}

/// Which value scale a series is drawn against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Axis {
    /// Temperature-like values
    #[serde(rename = "y_temp")]
    Primary,
    /// Percentage and opening-like values
    #[serde(rename = "y_valve")]
    Secondary,
}

impl Axis {
    /// Axis for a history record's field label
    pub fn for_field(field: &str) -> Self {
        if field.contains("温度") {
            Axis::Primary
        } else {
            Axis::Secondary
        }
    }
}

// ============================================================================
// Dataset
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    /// Raw time text as received
    pub x: String,
    /// None for values that are not numeric; charts draw a gap
    pub y: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub label: String,
    pub points: Vec<ChartPoint>,
    pub axis: Axis,
    pub color: String,
    pub fill_color: String,
    pub unit: String,
}

/// Chart-ready, dual-axis dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDataset {
    pub series: Vec<ChartSeries>,
    pub primary_unit: String,
    pub secondary_unit: String,
}

impl ChartDataset {
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn unit(&self, axis: Axis) -> &str {
        match axis {
            Axis::Primary => &self.primary_unit,
            Axis::Secondary => &self.secondary_unit,
        }
    }

    /// Axis title as shown on the detail chart, e.g. "温度 (°C)"
    pub fn axis_title(&self, axis: Axis) -> String {
        let name = match axis {
            Axis::Primary => "温度",
            Axis::Secondary => "開度",
        };
        format!("{} ({})", name, self.unit(axis))
    }
}

/// Turn a history map into a chart dataset
///
/// Series follow the history's key order. Each sensor's records are stably
/// sorted by time on a copy; the input is left untouched. The first sorted
/// record's field decides the axis and unit, and the first non-empty unit seen
/// on an axis becomes that axis' label.
pub fn assemble(history: &HistorySeries, palette: Palette) -> ChartDataset {
    let mut series = Vec::with_capacity(history.len());
    let mut primary_unit: Option<String> = None;
    let mut secondary_unit: Option<String> = None;

    for (name, records) in history.iter() {
        let sorted = sorted_by_time(records);
        let Some(first) = sorted.first() else {
            continue;
        };

        let axis = Axis::for_field(&first.field);
        let unit = infer_unit(&first.field);

        let axis_unit = match axis {
            Axis::Primary => &mut primary_unit,
            Axis::Secondary => &mut secondary_unit,
        };
        if axis_unit.is_none() && !unit.is_empty() {
            *axis_unit = Some(unit.to_string());
        }

        let color = palette.color(series.len());
        series.push(ChartSeries {
            label: name.to_string(),
            points: sorted
                .iter()
                .map(|record| ChartPoint {
                    x: record.time.clone(),
                    y: record.value.as_number(),
                })
                .collect(),
            axis,
            color: color.to_string(),
            fill_color: format!("{}{}", color, FILL_ALPHA),
            unit: unit.to_string(),
        });
    }

    ChartDataset {
        series,
        primary_unit: primary_unit.unwrap_or_else(|| UNIT_CELSIUS.to_string()),
        secondary_unit: secondary_unit.unwrap_or_else(|| UNIT_PERCENT.to_string()),
    }
}

fn sorted_by_time(records: &[HistoryRecord]) -> Vec<&HistoryRecord> {
    let mut sorted: Vec<&HistoryRecord> = records.iter().collect();
    sorted.sort_by_key(|record| timestamp_millis_or_epoch(Some(&record.time)));
    sorted
}

// ============================================================================
// History range and window
// ============================================================================

/// Largest selectable range step (7 days)
pub const MAX_RANGE_STEP: u32 = 30;
/// Default range step (1 day)
pub const DEFAULT_RANGE_STEP: u32 = 24;

/// Hour-granular steps before the selector switches to days
const HOURLY_STEPS: u32 = 23;

/// A history range chosen on the detail page's slider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRange {
    pub step: u32,
    pub hours: u32,
    pub label: String,
}

impl HistoryRange {
    /// Steps 0..=23 select 1..=24 hours, 24..=30 select 1..=7 days; larger steps clamp
    pub fn from_step(step: u32) -> Self {
        let step = step.min(MAX_RANGE_STEP);
        if step <= HOURLY_STEPS {
            let hours = step + 1;
            Self {
                step,
                hours,
                label: format!("{} 時間", hours),
            }
        } else {
            let days = step - HOURLY_STEPS;
            Self {
                step,
                hours: days * 24,
                label: format!("{} 日", days),
            }
        }
    }
}

impl Default for HistoryRange {
    fn default() -> Self {
        Self::from_step(DEFAULT_RANGE_STEP)
    }
}

/// Tick granularity for the time axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TickUnit {
    Hour,
    Day,
}

/// Time-axis bounds and ticking for a detail chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub tick: TickUnit,
    pub tick_format: &'static str,
}

impl ChartWindow {
    /// Window covering the last `hours` hours up to `now`
    ///
    /// Windows longer than two days tick per day.
    pub fn ending_at(now: DateTime<Utc>, hours: u32) -> Self {
        let (tick, tick_format) = if hours > 48 {
            (TickUnit::Day, "MM/dd")
        } else {
            (TickUnit::Hour, "HH:mm")
        };

        Self {
            start: now - Duration::hours(i64::from(hours)),
            end: now,
            tick,
            tick_format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FieldValue;

    fn history(entries: Vec<(&str, Vec<HistoryRecord>)>) -> HistorySeries {
        entries.into_iter().collect()
    }

    #[test]
    fn test_records_are_sorted_by_time() {
        let input = history(vec![(
            "乾溜ガス化炉A",
            vec![
                HistoryRecord::new("2024-01-01T00:02:00Z", 5.0, "温度(℃)"),
                HistoryRecord::new("2024-01-01T00:01:00Z", 3.0, "温度(℃)"),
            ],
        )]);

        let dataset = assemble(&input, Palette::Extended);
        let points: Vec<(&str, Option<f64>)> = dataset.series[0]
            .points
            .iter()
            .map(|p| (p.x.as_str(), p.y))
            .collect();

        assert_eq!(
            points,
            vec![
                ("2024-01-01T00:01:00Z", Some(3.0)),
                ("2024-01-01T00:02:00Z", Some(5.0)),
            ]
        );
    }

    #[test]
    fn test_input_history_is_not_mutated() {
        let input = history(vec![(
            "s",
            vec![
                HistoryRecord::new("2024-01-01T00:02:00Z", 5.0, "温度"),
                HistoryRecord::new("2024-01-01T00:01:00Z", 3.0, "温度"),
            ],
        )]);
        let before = input.clone();

        let _ = assemble(&input, Palette::Compact);
        assert_eq!(input, before);
    }

    #[test]
    fn test_default_units_when_nothing_matches() {
        let input = history(vec![(
            "Counter",
            vec![HistoryRecord::new("2024-01-01T00:00:00Z", 1.0, "count")],
        )]);

        let dataset = assemble(&input, Palette::Compact);
        assert_eq!(dataset.primary_unit, "°C");
        assert_eq!(dataset.secondary_unit, "%");
        assert_eq!(dataset.series[0].axis, Axis::Secondary);
        assert_eq!(dataset.series[0].unit, "");
    }

    #[test]
    fn test_axis_assignment_and_units() {
        let input = history(vec![
            (
                "乾溜ガス化炉A",
                vec![HistoryRecord::new("2024-01-01T00:00:00Z", 600.0, "温度(℃)")],
            ),
            (
                "排ガス濃度",
                vec![HistoryRecord::new("2024-01-01T00:00:00Z", 12.0, "CO濃度(ppm)")],
            ),
            (
                "乾溜空気弁A",
                vec![HistoryRecord::new("2024-01-01T00:00:00Z", 40.0, "開度(%)")],
            ),
        ]);

        let dataset = assemble(&input, Palette::Extended);
        let axes: Vec<Axis> = dataset.series.iter().map(|s| s.axis).collect();
        assert_eq!(axes, vec![Axis::Primary, Axis::Secondary, Axis::Secondary]);
        assert_eq!(dataset.primary_unit, "°C");
        // First non-empty unit on the secondary axis wins
        assert_eq!(dataset.secondary_unit, "ppm");
        assert_eq!(dataset.axis_title(Axis::Secondary), "開度 (ppm)");
    }

    #[test]
    fn test_axis_comes_from_first_sorted_record() {
        let input = history(vec![(
            "mixed",
            vec![
                HistoryRecord::new("2024-01-01T00:05:00Z", 1.0, "温度"),
                HistoryRecord::new("2024-01-01T00:00:00Z", 2.0, "開度"),
            ],
        )]);

        let dataset = assemble(&input, Palette::Extended);
        assert_eq!(dataset.series[0].axis, Axis::Secondary);
        assert_eq!(dataset.series[0].unit, "%");
    }

    #[test]
    fn test_empty_lists_are_skipped_and_do_not_consume_colors() {
        let input = history(vec![
            ("a", vec![HistoryRecord::new("2024-01-01T00:00:00Z", 1.0, "温度")]),
            ("empty", vec![]),
            ("b", vec![HistoryRecord::new("2024-01-01T00:00:00Z", 2.0, "開度")]),
        ]);

        let dataset = assemble(&input, Palette::Compact);
        let labels: Vec<&str> = dataset.series.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["a", "b"]);
        assert_eq!(dataset.series[0].color, "#ef4444");
        assert_eq!(dataset.series[1].color, "#3b82f6");
        assert_eq!(dataset.series[1].fill_color, "#3b82f633");
    }

    #[test]
    fn test_colors_cycle_through_palette() {
        let input: HistorySeries = (0..6)
            .map(|i| {
                (
                    format!("s{}", i),
                    vec![HistoryRecord::new("2024-01-01T00:00:00Z", 1.0, "温度")],
                )
            })
            .collect();

        let dataset = assemble(&input, Palette::Compact);
        assert_eq!(dataset.series[4].color, dataset.series[0].color);
        assert_eq!(dataset.series[5].color, dataset.series[1].color);
        assert_eq!(Palette::Extended.color(7), "#ef4444");
        assert_eq!(Palette::Extended.color(6), "#d946ef");
    }

    #[test]
    fn test_duplicates_kept_and_unparseable_times_first() {
        let input = history(vec![(
            "s",
            vec![
                HistoryRecord::new("2024-01-01T00:00:00Z", 1.0, "温度"),
                HistoryRecord::new("garbage", 2.0, "温度"),
                HistoryRecord::new("2024-01-01T00:00:00Z", 3.0, "温度"),
            ],
        )]);

        let dataset = assemble(&input, Palette::Compact);
        let ys: Vec<Option<f64>> = dataset.series[0].points.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![Some(2.0), Some(1.0), Some(3.0)]);
    }

    #[test]
    fn test_non_numeric_values_become_gaps() {
        let input = history(vec![(
            "s",
            vec![
                HistoryRecord::new("2024-01-01T00:00:00Z", FieldValue::Null, "温度"),
                HistoryRecord::new("2024-01-01T00:01:00Z", "12.5", "温度"),
            ],
        )]);

        let dataset = assemble(&input, Palette::Compact);
        let ys: Vec<Option<f64>> = dataset.series[0].points.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![None, Some(12.5)]);
    }

    #[test]
    fn test_history_range_from_step() {
        let first = HistoryRange::from_step(0);
        assert_eq!(first.hours, 1);
        assert_eq!(first.label, "1 時間");

        let last_hourly = HistoryRange::from_step(23);
        assert_eq!(last_hourly.hours, 24);
        assert_eq!(last_hourly.label, "24 時間");

        let one_day = HistoryRange::from_step(24);
        assert_eq!(one_day.hours, 24);
        assert_eq!(one_day.label, "1 日");

        let week = HistoryRange::from_step(30);
        assert_eq!(week.hours, 168);
        assert_eq!(week.label, "7 日");

        assert_eq!(HistoryRange::from_step(99), week);
        assert_eq!(HistoryRange::default(), one_day);
    }

    #[test]
    fn test_chart_window_ticks() {
        let now = DateTime::parse_from_rfc3339("2024-03-10T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let day = ChartWindow::ending_at(now, 24);
        assert_eq!(day.tick, TickUnit::Hour);
        assert_eq!(day.tick_format, "HH:mm");
        assert_eq!(day.start, now - Duration::hours(24));
        assert_eq!(day.end, now);

        assert_eq!(ChartWindow::ending_at(now, 48).tick, TickUnit::Hour);

        let week = ChartWindow::ending_at(now, 168);
        assert_eq!(week.tick, TickUnit::Day);
        assert_eq!(week.tick_format, "MM/dd");
    }

    #[test]
    fn test_dataset_serialization_uses_axis_ids() {
        let input = history(vec![(
            "s",
            vec![HistoryRecord::new("2024-01-01T00:00:00Z", 1.0, "温度")],
        )]);

        let json = serde_json::to_value(assemble(&input, Palette::Compact)).unwrap();
        assert_eq!(json["series"][0]["axis"], "y_temp");
        assert_eq!(json["primary_unit"], "°C");
    }
}
