use crate::domain::PlantSnapshot;
use crate::time::timestamp_millis_or_epoch;

/// Plant snapshots split by whether they carry live sensor data
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedPlants {
    /// Matching plants with a non-empty sensor map, most recently updated first
    pub with_sensors: Vec<PlantSnapshot>,
    /// Matching plants without sensor data, most recently updated first
    pub other: Vec<PlantSnapshot>,
}

impl ClassifiedPlants {
    pub fn len(&self) -> usize {
        self.with_sensors.len() + self.other.len()
    }

    pub fn is_empty(&self) -> bool {
        self.with_sensors.is_empty() && self.other.is_empty()
    }
}

/// Whether a snapshot matches a free-text search query
///
/// An empty (or all-whitespace) query matches everything; otherwise the trimmed
/// query must appear case-insensitively in the model, customer or province.
pub fn matches_query(plant: &PlantSnapshot, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }

    [&plant.model, &plant.customer, &plant.province]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Filter, partition and order a list of plant snapshots
///
/// Sorting is stable and descending by `last_updated`; missing or unparseable
/// timestamps sort as the epoch, so such plants land at the end in input order.
pub fn classify(plants: &[PlantSnapshot], query: &str) -> ClassifiedPlants {
    let (mut with_sensors, mut other): (Vec<PlantSnapshot>, Vec<PlantSnapshot>) = plants
        .iter()
        .filter(|plant| matches_query(plant, query))
        .cloned()
        .partition(PlantSnapshot::has_sensors);

    sort_most_recent_first(&mut with_sensors);
    sort_most_recent_first(&mut other);

    ClassifiedPlants {
        with_sensors,
        other,
    }
}

fn sort_most_recent_first(plants: &mut [PlantSnapshot]) {
    // sort_by_key is stable
    plants.sort_by_key(|plant| {
        std::cmp::Reverse(timestamp_millis_or_epoch(plant.last_updated.as_deref()))
    });
}
