//! Shared proptest generators for telemetry snapshots and history
#![allow(dead_code)]

use chrono::DateTime;
use proptest::prelude::*;

use incinerator_monitor::{FieldValue, HistoryRecord, OrderedMap, PlantSnapshot, SensorReading};

/// Seconds between 1970 and roughly 2096
const MAX_EPOCH_SECS: i64 = 4_000_000_000;

/// Label noise that contains none of the unit tokens
///
/// Leaves out i, m, o, p, t and v so "temp", "ppm", "o2" and "valve" cannot form.
pub fn neutral_text() -> impl Strategy<Value = String> {
    "[a-hj-lnq-suw-z 0-9_()]{0,12}"
}

/// A label guaranteed to contain a temperature token somewhere
pub fn temperature_label() -> impl Strategy<Value = String> {
    (
        neutral_text(),
        prop_oneof![Just("℃"), Just("温度"), Just("temp"), Just("TEMP"), Just("Temp")],
        prop_oneof![Just(""), Just("%"), Just("開度"), Just("valve"), Just("O2"), Just("ppm")],
        neutral_text(),
    )
        .prop_map(|(head, token, other, tail)| format!("{}{}{}{}", head, other, token, tail))
}

/// Timestamp text in any of the accepted layouts, or something unreadable
pub fn timestamp_text() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        4 => (0..MAX_EPOCH_SECS).prop_map(|secs| DateTime::from_timestamp(secs, 0).map(|t| t.to_rfc3339())),
        2 => (0..MAX_EPOCH_SECS).prop_map(|secs| {
            DateTime::from_timestamp(secs, 0).map(|t| t.format("%Y-%m-%dT%H:%MZ").to_string())
        }),
        1 => (0..MAX_EPOCH_SECS).prop_map(|secs| {
            DateTime::from_timestamp(secs, 0).map(|t| t.format("%Y-%m-%d").to_string())
        }),
        1 => Just(Some("not a date".to_string())),
        1 => Just(None),
    ]
}

/// A plain scalar field value
pub fn field_value() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        (-100.0f64..1500.0).prop_map(FieldValue::Number),
        "[0-9]{1,3}".prop_map(FieldValue::Text),
        Just(FieldValue::Text("AUTO".to_string())),
        Just(FieldValue::Null),
    ]
}

/// A sensor map drawn from the furnace/valve families plus stray sensors
pub fn sensor_map() -> impl Strategy<Value = OrderedMap<SensorReading>> {
    let name = prop_oneof![
        "[A-Z]?".prop_map(|s| format!("乾溜ガス化炉{}", s)),
        "[A-Z]?".prop_map(|s| format!("乾溜空気弁{}", s)),
        "[a-z0-9]".prop_map(|s| format!("乾溜ガス化炉{}", s)),
        Just("燃焼炉".to_string()),
        Just("排ガス濃度".to_string()),
        "[a-z]{1,6}".prop_map(|s| format!("外部{}", s)),
    ];
    let reading = prop::collection::vec(("[a-z温度開度%]{1,4}", field_value()), 0..4)
        .prop_map(|fields| fields.into_iter().collect::<SensorReading>());

    prop::collection::vec((name, reading), 0..8).prop_map(|entries| entries.into_iter().collect())
}

/// A plant snapshot with a short identity drawn from a small alphabet so queries hit
pub fn plant_snapshot() -> impl Strategy<Value = PlantSnapshot> {
    (
        "[A-Z]{1,3}-[0-9]{2,3}",
        prop_oneof![Just("Acme Corp"), Just("Other Co"), Just("東日本環境"), Just("")],
        prop_oneof![Just("Osaka"), Just("北海道"), Just("Aichi")],
        timestamp_text(),
        sensor_map(),
    )
        .prop_map(|(model, customer, province, last_updated, sensors)| PlantSnapshot {
            model,
            customer: customer.to_string(),
            province: province.to_string(),
            image_url: String::new(),
            last_updated,
            sensors,
            history: None,
        })
}

/// A search query that sometimes matches the generated identities
pub fn search_query() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("acme".to_string()),
        Just(" ACME ".to_string()),
        Just("osaka".to_string()),
        Just("北海道".to_string()),
        "[a-z]{1,3}",
    ]
}

/// Records for one sensor; the value encodes the arrival index for stability checks
pub fn history_records() -> impl Strategy<Value = Vec<HistoryRecord>> {
    prop::collection::vec(
        (
            prop_oneof![
                8 => (0i64..50).prop_map(|minute| format!("2024-01-01T00:{:02}:00Z", minute)),
                1 => Just("garbage".to_string()),
            ],
            prop_oneof![Just("温度(℃)"), Just("開度(%)"), Just("CO濃度(ppm)"), Just("count")],
        ),
        0..12,
    )
    .prop_map(|records| {
        records
            .into_iter()
            .enumerate()
            .map(|(index, (time, field))| HistoryRecord::new(time, index as f64, field))
            .collect()
    })
}
