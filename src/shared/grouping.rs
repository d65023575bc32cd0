use std::collections::BTreeSet;

use crate::domain::{FieldValue, OrderedMap, SensorReading};
use crate::sensor_schema::{classify_sensor, ReadingFields, SensorKind};

/// A sensor entry borrowed from a snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NamedReading<'a> {
    pub name: &'a str,
    pub reading: &'a SensorReading,
}

/// CO and O2 concentrations from the exhaust-gas panel
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExhaustGas<'a> {
    pub carbon_monoxide: Option<&'a FieldValue>,
    pub oxygen: Option<&'a FieldValue>,
}

impl ExhaustGas<'_> {
    /// The panel is only worth showing when at least one value is present
    pub fn is_empty(&self) -> bool {
        self.carbon_monoxide.is_none() && self.oxygen.is_none()
    }
}

/// Furnace and valve sharing one suffix; either side may be missing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitPair<'a> {
    pub suffix: char,
    pub furnace: Option<NamedReading<'a>>,
    pub valve: Option<NamedReading<'a>>,
}

/// Read-only projection of a plant's flat sensor map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorGroups<'a> {
    /// Furnace family entries in source order
    pub furnaces: Vec<NamedReading<'a>>,
    /// Valve family entries in source order
    pub valves: Vec<NamedReading<'a>>,
    pub combustion: Option<NamedReading<'a>>,
    pub exhaust: Option<NamedReading<'a>>,
    /// Union of furnace and valve suffixes, ascending, without duplicates
    pub suffixes: Vec<char>,
}

impl<'a> SensorGroups<'a> {
    /// Partition a sensor map in one classification pass
    pub fn of(sensors: &'a OrderedMap<SensorReading>) -> Self {
        let mut groups = SensorGroups::default();
        let mut suffixes = BTreeSet::new();

        for (name, reading) in sensors.iter() {
            let entry = NamedReading { name, reading };
            match classify_sensor(name) {
                SensorKind::FurnaceUnit { suffix } => {
                    suffixes.extend(suffix);
                    groups.furnaces.push(entry);
                }
                SensorKind::ValveUnit { suffix } => {
                    suffixes.extend(suffix);
                    groups.valves.push(entry);
                }
                SensorKind::CombustionFurnace => {
                    groups.combustion.get_or_insert(entry);
                }
                SensorKind::ExhaustPanel => {
                    groups.exhaust.get_or_insert(entry);
                }
                SensorKind::Other => {}
            }
        }

        groups.suffixes = suffixes.into_iter().collect();
        groups
    }

    /// Furnace entry carrying the given suffix
    pub fn furnace(&self, suffix: char) -> Option<NamedReading<'a>> {
        find_by_suffix(&self.furnaces, suffix)
    }

    /// Valve entry carrying the given suffix
    pub fn valve(&self, suffix: char) -> Option<NamedReading<'a>> {
        find_by_suffix(&self.valves, suffix)
    }

    /// One pair per discovered suffix, in suffix order
    pub fn unit_pairs(&self) -> Vec<UnitPair<'a>> {
        self.suffixes
            .iter()
            .map(|&suffix| UnitPair {
                suffix,
                furnace: self.furnace(suffix),
                valve: self.valve(suffix),
            })
            .collect()
    }

    /// CO and O2 values from the exhaust panel, if there is one
    pub fn exhaust_gas(&self) -> ExhaustGas<'a> {
        self.exhaust
            .map(|entry| {
                let fields = ReadingFields::of(entry.reading);
                ExhaustGas {
                    carbon_monoxide: fields.carbon_monoxide,
                    oxygen: fields.oxygen,
                }
            })
            .unwrap_or_default()
    }
}

fn find_by_suffix<'a>(entries: &[NamedReading<'a>], suffix: char) -> Option<NamedReading<'a>> {
    entries
        .iter()
        .find(|entry| entry.name.ends_with(suffix))
        .copied()
}
