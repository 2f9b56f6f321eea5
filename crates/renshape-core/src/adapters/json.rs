//! JSON-backed producers, for records exported by the raw-format readers.

use super::library::{DecayEntry, DecayLibrary, DiscreteTransition, RecordSource, SourceRecord};
use crate::archive::{FieldMap, FieldValue};
use crate::domain::{RenshapeError, RenshapeResult, Section};
use crate::spectrum::ContinuumPoint;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

fn read_json(path: &Path) -> RenshapeResult<Value> {
    let text = fs::read_to_string(path).map_err(|error| {
        RenshapeError::input_validation(
            "SOURCE.READ",
            format!("failed to read '{}': {error}", path.display()),
        )
    })?;
    serde_json::from_str(&text).map_err(|error| {
        RenshapeError::input_validation(
            "SOURCE.PARSE",
            format!("failed to parse '{}': {error}", path.display()),
        )
    })
}

/// Convert a plain JSON value into a stored field.
pub fn field_value_from_json(value: &Value) -> Option<FieldValue> {
    match value {
        Value::Number(number) => number.as_f64().map(FieldValue::Number),
        Value::String(text) => Some(FieldValue::Text(text.clone())),
        Value::Array(items) if items.iter().all(Value::is_number) => Some(FieldValue::Array(
            items.iter().filter_map(Value::as_f64).collect(),
        )),
        Value::Array(items) if items.iter().all(Value::is_string) => Some(FieldValue::TextArray(
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
        )),
        Value::Array(items) if items.iter().all(Value::is_array) => {
            let rows = items
                .iter()
                .map(|row| {
                    row.as_array()?
                        .iter()
                        .map(Value::as_f64)
                        .collect::<Option<Vec<f64>>>()
                })
                .collect::<Option<Vec<Vec<f64>>>>()?;
            Some(FieldValue::Matrix(rows))
        }
        _ => None,
    }
}

/// Records from a JSON file:
///
/// ```json
/// { "info": { "JEFF_release": "3.3" },
///   "records": [ { "name": "135I", "section": "info", "fields": { "z": 53 } } ] }
/// ```
///
/// `section` defaults to `info`.
#[derive(Debug, Clone)]
pub struct JsonRecordSource {
    path: PathBuf,
}

impl JsonRecordSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parse_record(index: usize, value: &Value) -> RenshapeResult<SourceRecord> {
        let malformed = |message: String| {
            RenshapeError::malformed_source("SOURCE.RECORD", format!("record {index}: {message}"))
        };

        let name = value
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| malformed("missing nuclide name".to_string()))?;
        let section = match value.get("section").and_then(Value::as_str) {
            None | Some("info") => Section::Info,
            Some("data") => Section::Data,
            Some(other) => return Err(malformed(format!("unknown section '{other}'"))),
        };
        let raw_fields = value
            .get("fields")
            .and_then(Value::as_object)
            .ok_or_else(|| malformed(format!("'{name}' has no fields object")))?;

        let mut fields = FieldMap::new();
        for (key, raw) in raw_fields {
            let field = field_value_from_json(raw)
                .ok_or_else(|| malformed(format!("'{name}' field '{key}' has an unsupported value")))?;
            fields.insert(key.clone(), field);
        }

        Ok(SourceRecord {
            name: name.to_string(),
            section,
            fields,
        })
    }
}

impl RecordSource for JsonRecordSource {
    fn read_records(&self) -> RenshapeResult<Vec<RenshapeResult<SourceRecord>>> {
        let document = read_json(&self.path)?;
        let records = document
            .get("records")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                RenshapeError::input_validation(
                    "SOURCE.PARSE",
                    format!("'{}' has no records array", self.path.display()),
                )
            })?;
        Ok(records
            .iter()
            .enumerate()
            .map(|(index, value)| Self::parse_record(index, value))
            .collect())
    }

    fn general_info(&self) -> FieldMap {
        let document = match read_json(&self.path) {
            Ok(document) => document,
            Err(error) => {
                warn!(%error, "general info not read");
                return FieldMap::new();
            }
        };
        let Some(info) = document.get("info").and_then(Value::as_object) else {
            return FieldMap::new();
        };
        info.iter()
            .filter_map(|(key, value)| {
                let field = field_value_from_json(value);
                if field.is_none() {
                    warn!(
                        field = %key,
                        source = %self.path.display(),
                        "general info value has no stored form, dropped"
                    );
                }
                field.map(|field| (key.clone(), field))
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct LibraryRecord {
    z: u32,
    a: u32,
    #[serde(default)]
    m: u32,
    #[serde(default)]
    discrete: Option<Vec<DiscreteTransition>>,
    #[serde(default)]
    continuum: Option<Vec<ContinuumPoint>>,
}

/// Decay library from a JSON array of
/// `{ "z", "a", "m", "discrete": [...] }` or `{ "z", "a", "m", "continuum": [...] }`.
#[derive(Debug, Clone, Default)]
pub struct JsonDecayLibrary {
    entries: BTreeMap<(u32, u32, u32), DecayEntry>,
}

impl JsonDecayLibrary {
    pub fn load(path: &Path) -> RenshapeResult<Self> {
        let value = read_json(path)?;
        let records: Vec<LibraryRecord> = serde_json::from_value(value).map_err(|error| {
            RenshapeError::input_validation(
                "LIBRARY.PARSE",
                format!("invalid decay library '{}': {error}", path.display()),
            )
        })?;

        let mut entries = BTreeMap::new();
        for record in records {
            let entry = match (record.discrete, record.continuum) {
                (Some(transitions), None) => DecayEntry::Discrete(transitions),
                (None, Some(points)) => DecayEntry::Continuum(points),
                _ => {
                    return Err(RenshapeError::input_validation(
                        "LIBRARY.PARSE",
                        format!(
                            "entry z={} a={} m={} needs exactly one of 'discrete' or 'continuum'",
                            record.z, record.a, record.m
                        ),
                    ));
                }
            };
            entries.insert((record.z, record.a, record.m), entry);
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DecayLibrary for JsonDecayLibrary {
    fn lookup(&self, z: u32, a: u32, m: u32) -> RenshapeResult<Option<DecayEntry>> {
        Ok(self.entries.get(&(z, a, m)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::{JsonDecayLibrary, JsonRecordSource, field_value_from_json};
    use crate::adapters::library::{DecayEntry, DecayLibrary, RecordSource};
    use crate::archive::FieldValue;
    use crate::domain::{ErrorCategory, Section};
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn plain_json_values_map_to_field_values() {
        assert_eq!(field_value_from_json(&json!(53)), Some(FieldValue::Number(53.0)));
        assert_eq!(
            field_value_from_json(&json!([1, 2.5])),
            Some(FieldValue::Array(vec![1.0, 2.5]))
        );
        assert_eq!(
            field_value_from_json(&json!([[1], [2, 3]])),
            Some(FieldValue::Matrix(vec![vec![1.0], vec![2.0, 3.0]]))
        );
        assert_eq!(
            field_value_from_json(&json!(["a", "1u"])),
            Some(FieldValue::TextArray(vec!["a".to_string(), "1u".to_string()]))
        );
        assert_eq!(field_value_from_json(&json!({"nested": 1})), None);
        assert_eq!(field_value_from_json(&json!([1, "a"])), None);
    }

    #[test]
    fn malformed_records_are_isolated() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("yields.json");
        let document = json!({
            "info": { "JEFF_release": "3.3" },
            "records": [
                { "name": "135I", "fields": { "z": 53, "n": 82, "m": 0 } },
                { "fields": { "z": 54 } },
                { "name": "135Xe", "section": "data", "fields": { "dN_dE_tot": [0.1] } }
            ]
        });
        std::fs::write(&path, document.to_string()).expect("fixture");

        let source = JsonRecordSource::new(&path);
        let records = source.read_records().expect("records");
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].as_ref().expect("first").name, "135I");
        let error = records[1].as_ref().expect_err("second is malformed");
        assert_eq!(error.category(), ErrorCategory::MalformedSource);
        assert_eq!(records[2].as_ref().expect("third").section, Section::Data);
        assert_eq!(source.general_info()["JEFF_release"], FieldValue::from("3.3"));
    }

    #[test]
    fn general_info_keeps_only_storable_values() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("yields.json");
        let document = json!({
            "info": { "JEFF_release": "3.3", "nested": { "a": 1 }, "flag": true },
            "records": []
        });
        std::fs::write(&path, document.to_string()).expect("fixture");

        let info = JsonRecordSource::new(&path).general_info();
        assert_eq!(info.len(), 1);
        assert_eq!(info["JEFF_release"], FieldValue::from("3.3"));

        std::fs::write(&path, "{ not json").expect("fixture");
        assert!(JsonRecordSource::new(&path).general_info().is_empty());
    }

    #[test]
    fn decay_library_is_keyed_by_z_a_m() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("library.json");
        let document = json!([
            { "z": 53, "a": 135, "continuum": [
                { "energy": 0.0, "electron": 1.0, "antineutrino": 2.0 }
            ] },
            { "z": 36, "a": 88, "m": 0, "discrete": [
                { "energy": 2.9, "intensity": 0.7, "type": "a" }
            ] }
        ]);
        std::fs::write(&path, document.to_string()).expect("fixture");

        let library = JsonDecayLibrary::load(&path).expect("library");
        assert_eq!(library.len(), 2);
        assert!(matches!(
            library.lookup(53, 135, 0).expect("lookup"),
            Some(DecayEntry::Continuum(points)) if points.len() == 1
        ));
        assert!(matches!(
            library.lookup(36, 88, 0).expect("lookup"),
            Some(DecayEntry::Discrete(transitions)) if transitions[0].transition_type == "a"
        ));
        assert!(library.lookup(36, 88, 1).expect("lookup").is_none());
    }
}
