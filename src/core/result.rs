use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A single property value as returned by the provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    List(Vec<FieldValue>),
}

impl FieldValue {
    /// The value usable as a row key: only non-empty strings qualify.
    pub fn as_title(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

/// Field values of one row, in the order the class requested them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultRow {
    fields: Vec<(String, FieldValue)>,
}

impl ResultRow {
    /// Records a value. A field requested twice keeps its first position and latest value.
    pub fn insert(&mut self, name: &str, value: FieldValue) {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    #[cfg(test)]
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n, v))
    }
}

impl<const N: usize> From<[(&str, FieldValue); N]> for ResultRow {
    fn from(pairs: [(&str, FieldValue); N]) -> Self {
        let mut row = ResultRow::default();
        for (name, value) in pairs {
            row.insert(name, value);
        }
        row
    }
}

impl Serialize for ResultRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Output of one class for one cycle. The variant follows from whether the
/// class configures a title field and never changes between cycles.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ClassResult {
    Keyed(BTreeMap<String, ResultRow>),
    Listed(Vec<ResultRow>),
}

impl ClassResult {
    pub fn for_title(title_field: Option<&str>) -> Self {
        match title_field {
            Some(_) => ClassResult::Keyed(BTreeMap::new()),
            None => ClassResult::Listed(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ClassResult::Keyed(map) => map.len(),
            ClassResult::Listed(rows) => rows.len(),
        }
    }

    /// Rows in emission order: key order for keyed results, provider order otherwise.
    #[cfg(test)]
    pub fn rows(&self) -> Vec<&ResultRow> {
        match self {
            ClassResult::Keyed(map) => map.values().collect(),
            ClassResult::Listed(rows) => rows.iter().collect(),
        }
    }
}

/// Everything one poll cycle produced, keyed by class name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleResult {
    classes: Vec<(String, ClassResult)>,
}

impl CycleResult {
    pub fn insert(&mut self, class_name: &str, result: ClassResult) {
        match self.classes.iter_mut().find(|(n, _)| n == class_name) {
            Some((_, slot)) => *slot = result,
            None => self.classes.push((class_name.to_string(), result)),
        }
    }

    #[cfg(test)]
    pub fn get(&self, class_name: &str) -> Option<&ClassResult> {
        self.classes
            .iter()
            .find(|(n, _)| n == class_name)
            .map(|(_, r)| r)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ClassResult)> {
        self.classes.iter().map(|(n, r)| (n.as_str(), r))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.classes.len()
    }
}

impl Serialize for CycleResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.classes.len()))?;
        for (name, result) in &self.classes {
            map.serialize_entry(name, result)?;
        }
        map.end()
    }
}

pub const NAMESPACE_FIELD: &str = "wmi";

/// The per-cycle event handed to the sink.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleEvent {
    pub timestamp: DateTime<Utc>,
    pub source_type: String,
    pub classes: CycleResult,
}

impl CycleEvent {
    pub fn new(source_type: &str, classes: CycleResult) -> Self {
        Self {
            timestamp: Utc::now(),
            source_type: source_type.to_string(),
            classes,
        }
    }

    fn stamp(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// `{"@timestamp", "type", "wmi": {class: result}}`
    pub fn to_json(&self) -> Value {
        let mut record = Map::new();
        record.insert("@timestamp".into(), Value::String(self.stamp()));
        record.insert("type".into(), Value::String(self.source_type.clone()));
        record.insert(
            NAMESPACE_FIELD.into(),
            serde_json::to_value(&self.classes).unwrap_or(Value::Null),
        );
        Value::Object(record)
    }

    /// One flat record per row, tagged with its class and carrying the row's fields.
    /// Keyed results also carry the key the row was filed under as `title`.
    /// The tags are written last, so a field named like a tag is replaced by it.
    pub fn to_row_json(&self) -> Vec<Value> {
        let stamp = self.stamp();
        let mut events = Vec::new();
        for (class_name, result) in self.classes.iter() {
            let mut push = |title: Option<&str>, row: &ResultRow| {
                let mut record = Map::new();
                for (name, value) in row.iter() {
                    let value = serde_json::to_value(value).unwrap_or(Value::Null);
                    record.insert(name.clone(), value);
                }
                record.insert("@timestamp".into(), Value::String(stamp.clone()));
                record.insert("type".into(), Value::String(self.source_type.clone()));
                record.insert("class".into(), Value::String(class_name.to_string()));
                if let Some(title) = title {
                    record.insert("title".into(), Value::String(title.to_string()));
                }
                events.push(Value::Object(record));
            };
            match result {
                ClassResult::Keyed(map) => {
                    for (key, row) in map {
                        push(Some(key.as_str()), row);
                    }
                }
                ClassResult::Listed(rows) => {
                    for row in rows {
                        push(None, row);
                    }
                }
            }
        }
        events
    }
}
