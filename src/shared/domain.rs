use regex::Regex;
use serde::de::{Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::sync::OnceLock;

// ============================================================================
// Ordered map
// ============================================================================

/// String-keyed map that keeps keys in the order the telemetry source sent them
///
/// Sensor maps, reading fields and history series are all JSON objects whose
/// key order drives display order, so a hash map would lose information.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert a value; an existing key keeps its position and takes the new value
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> IntoIterator for OrderedMap<V> {
    type Item = (String, V);
    type IntoIter = std::vec::IntoIter<(String, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct OrderedMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
    type Value = OrderedMap<V>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = OrderedMap::new();
        while let Some((key, value)) = access.next_entry::<String, V>()? {
            map.insert(key, value);
        }
        Ok(map)
    }

    // Arrays are keyed by position; an empty array is an empty map
    fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = OrderedMap::new();
        let mut index = 0usize;
        while let Some(value) = access.next_element::<V>()? {
            map.insert(index.to_string(), value);
            index += 1;
        }
        Ok(map)
    }

    // The source sends null for "no sensors"
    fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(OrderedMap::new())
    }

    fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(OrderedMap::new())
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(OrderedMapVisitor(PhantomData))
    }
}

// ============================================================================
// Scalar field values
// ============================================================================

/// A loosely-typed scalar as it arrives from the spreadsheet-backed source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Number(f64),
    Flag(bool),
    Text(String),
}

impl FieldValue {
    /// Strict numeric reading: numbers and numeric text, None otherwise
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) if n.is_finite() => Some(*n),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Numeric reading used by status inference; anything unusable counts as 0
    pub fn as_number_or_zero(&self) -> f64 {
        match self {
            FieldValue::Flag(true) => 1.0,
            other => other.as_number().unwrap_or(0.0),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Flag(b) => write!(f, "{}", b),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

/// Accept any scalar (or null) where a string is expected
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Option::<FieldValue>::deserialize(deserializer)?;
    Ok(value.map(|v| v.to_string()).unwrap_or_default())
}

fn lenient_optional_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Option::<FieldValue>::deserialize(deserializer)?;
    Ok(value
        .map(|v| v.to_string())
        .filter(|s| !s.trim().is_empty()))
}

// ============================================================================
// Snapshot Models
// ============================================================================

/// One named sensor's instantaneous state: field label -> scalar
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorReading(pub OrderedMap<FieldValue>);

impl SensorReading {
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter()
    }

    pub fn get(&self, label: &str) -> Option<&FieldValue> {
        self.0.get(label)
    }

    /// First field whose label satisfies the predicate
    pub fn find_field(&self, mut pred: impl FnMut(&str) -> bool) -> Option<(&str, &FieldValue)> {
        self.0.iter().find(|(label, _)| pred(label))
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for SensorReading {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        SensorReading(iter.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

/// Full current-state reading for one plant at one poll cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlantSnapshot {
    #[serde(default, deserialize_with = "lenient_string")]
    pub model: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub customer: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub province: String,
    /// Image location without extension; the presentation layer appends .png/.jpg
    #[serde(default, deserialize_with = "lenient_string")]
    pub image_url: String,
    #[serde(
        default,
        deserialize_with = "lenient_optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub sensors: OrderedMap<SensorReading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<HistorySeries>,
}

impl PlantSnapshot {
    /// Stable UI identity derived from (model, customer, province)
    pub fn plant_id(&self) -> String {
        plant_id(&self.model, &self.customer, &self.province)
    }

    pub fn has_sensors(&self) -> bool {
        !self.sensors.is_empty()
    }
}

/// Separator between slugged identity fields; a field slug never contains it
const FIELD_SEPARATOR: &str = "--";

/// Slugify a plant identity triple
///
/// Each field is slugged on its own: whitespace runs and any character that is
/// not a letter, digit, `-` or `_` become `-`, hyphen runs collapse and edge
/// hyphens are dropped. Letters and digits from any script are kept so Japanese
/// customer names stay distinct. Fields are joined with `--`, which no field slug
/// can contain, so empty fields keep their position.
pub fn plant_id(model: &str, customer: &str, province: &str) -> String {
    [model, customer, province]
        .iter()
        .map(|field| slug_field(field))
        .collect::<Vec<_>>()
        .join(FIELD_SEPARATOR)
}

fn slug_field(field: &str) -> String {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    static DISALLOWED: OnceLock<Regex> = OnceLock::new();
    static HYPHEN_RUN: OnceLock<Regex> = OnceLock::new();

    let whitespace = WHITESPACE.get_or_init(|| Regex::new(r"\s+").unwrap());
    let disallowed =
        DISALLOWED.get_or_init(|| Regex::new(r"[^\p{Alphabetic}\p{Nd}_\-]").unwrap());
    let hyphen_run = HYPHEN_RUN.get_or_init(|| Regex::new(r"-+").unwrap());

    let slug = whitespace.replace_all(field, "-");
    let slug = disallowed.replace_all(&slug, "-");
    let slug = hyphen_run.replace_all(&slug, "-");
    slug.trim_matches('-').to_string()
}

// ============================================================================
// History Models
// ============================================================================

/// One historical sample of a sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub time: String,
    #[serde(default = "null_value")]
    pub value: FieldValue,
    /// Field label the value came from; drives unit and axis inference
    #[serde(default, deserialize_with = "lenient_string")]
    pub field: String,
}

fn null_value() -> FieldValue {
    FieldValue::Null
}

impl HistoryRecord {
    pub fn new(time: impl Into<String>, value: impl Into<FieldValue>, field: impl Into<String>) -> Self {
        Self {
            time: time.into(),
            value: value.into(),
            field: field.into(),
        }
    }
}

/// Sensor name -> records in arrival order (not necessarily time order)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "OrderedMap<Option<Vec<HistoryRecord>>>",
    into = "OrderedMap<Vec<HistoryRecord>>"
)]
pub struct HistorySeries(pub OrderedMap<Vec<HistoryRecord>>);

impl HistorySeries {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[HistoryRecord])> {
        self.0.iter().map(|(name, records)| (name, records.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<OrderedMap<Option<Vec<HistoryRecord>>>> for HistorySeries {
    fn from(raw: OrderedMap<Option<Vec<HistoryRecord>>>) -> Self {
        HistorySeries(
            raw.into_iter()
                .map(|(name, records)| (name, records.unwrap_or_default()))
                .collect(),
        )
    }
}

impl From<HistorySeries> for OrderedMap<Vec<HistoryRecord>> {
    fn from(series: HistorySeries) -> Self {
        series.0
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<HistoryRecord>)> for HistorySeries {
    fn from_iter<I: IntoIterator<Item = (K, Vec<HistoryRecord>)>>(iter: I) -> Self {
        HistorySeries(iter.into_iter().collect())
    }
}
