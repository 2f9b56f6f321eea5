use super::document::NuclideEntry;
use super::fields;
use super::value::{FieldMap, FieldValue};
use super::{ArchiveError, ArchiveResult};
use crate::domain::{ProvenanceState, ProvenanceTag};
use crate::spectrum::TransitionData;

/// Typed view of one nuclide: every well-known field is an `Option`, so which
/// pipeline stage produced what is visible in the type. Open-ended keys (fission
/// yields and their uncertainties) stay reachable through [`NuclideRecord::field`].
#[derive(Debug, Clone)]
pub struct NuclideRecord {
    pub name: String,
    pub z: Option<u32>,
    pub n: Option<u32>,
    pub m: Option<u32>,
    pub q_value: Option<f64>,
    pub q_uncertainty: Option<f64>,
    pub half_life_sec: Option<f64>,
    pub tag: Option<ProvenanceTag>,
    pub emax: Option<f64>,
    pub transitions: Option<TransitionData>,
    pub total_spectrum: Option<Vec<f64>>,
    pub total_uncertainty: Option<Vec<f64>>,
    pub info: FieldMap,
    pub data: FieldMap,
}

impl NuclideRecord {
    pub fn from_entry(entry: &NuclideEntry) -> ArchiveResult<Self> {
        let info = entry.info.clone().unwrap_or_default();
        let data = entry.data.clone().unwrap_or_default();
        let name = entry.name.as_str();

        let tag = match text_field(name, &info, fields::TAG)? {
            Some(text) => Some(ProvenanceTag::parse(text).ok_or_else(|| {
                ArchiveError::FieldType {
                    name: name.to_string(),
                    field: fields::TAG.to_string(),
                    expected: "a provenance tag",
                    actual: "text",
                }
            })?),
            None => None,
        };

        Ok(Self {
            name: entry.name.clone(),
            z: count_field(name, &info, fields::Z)?,
            n: count_field(name, &info, fields::N)?,
            m: count_field(name, &info, fields::M)?,
            q_value: number_field(name, &info, fields::Q)?,
            q_uncertainty: number_field(name, &info, fields::UNC_Q)?,
            half_life_sec: number_field(name, &info, fields::HALF_LIFE_SEC)?,
            tag,
            emax: number_field(name, &info, fields::EMAX)?,
            transitions: TransitionData::from_fields(name, &data)?,
            total_spectrum: array_field(name, &data, fields::DN_DE_TOT)?,
            total_uncertainty: array_field(name, &data, fields::UNC_DN_DE)?,
            info,
            data,
        })
    }

    pub fn state(&self) -> ProvenanceState {
        ProvenanceState::resolve(self.z.is_some(), self.tag)
    }

    /// Merged lookup; a `data` field shadows an `info` field of the same name.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.data.get(name).or_else(|| self.info.get(name))
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.field(name).and_then(FieldValue::as_number)
    }
}

fn type_error(name: &str, field: &str, expected: &'static str, value: &FieldValue) -> ArchiveError {
    ArchiveError::FieldType {
        name: name.to_string(),
        field: field.to_string(),
        expected,
        actual: value.kind(),
    }
}

fn number_field(name: &str, section: &FieldMap, field: &str) -> ArchiveResult<Option<f64>> {
    match section.get(field) {
        None => Ok(None),
        Some(value) => value
            .as_number()
            .map(Some)
            .ok_or_else(|| type_error(name, field, "number", value)),
    }
}

fn count_field(name: &str, section: &FieldMap, field: &str) -> ArchiveResult<Option<u32>> {
    let Some(value) = number_field(name, section, field)? else {
        return Ok(None);
    };
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= f64::from(u32::MAX) {
        Ok(Some(value as u32))
    } else {
        Err(ArchiveError::FieldType {
            name: name.to_string(),
            field: field.to_string(),
            expected: "a non-negative integer",
            actual: "number",
        })
    }
}

fn text_field<'a>(name: &str, section: &'a FieldMap, field: &str) -> ArchiveResult<Option<&'a str>> {
    match section.get(field) {
        None => Ok(None),
        Some(value) => value
            .as_text()
            .map(Some)
            .ok_or_else(|| type_error(name, field, "text", value)),
    }
}

pub(crate) fn array_field(
    name: &str,
    section: &FieldMap,
    field: &str,
) -> ArchiveResult<Option<Vec<f64>>> {
    match section.get(field) {
        None => Ok(None),
        Some(value) => value
            .as_array()
            .map(|values| Some(values.to_vec()))
            .ok_or_else(|| type_error(name, field, "array", value)),
    }
}

pub(crate) fn matrix_field(
    name: &str,
    section: &FieldMap,
    field: &str,
) -> ArchiveResult<Option<Vec<Vec<f64>>>> {
    match section.get(field) {
        None => Ok(None),
        Some(value) => value
            .as_matrix()
            .map(|rows| Some(rows.to_vec()))
            .ok_or_else(|| type_error(name, field, "matrix", value)),
    }
}

pub(crate) fn text_array_field(
    name: &str,
    section: &FieldMap,
    field: &str,
) -> ArchiveResult<Option<Vec<String>>> {
    match section.get(field) {
        None => Ok(None),
        Some(value) => value
            .as_text_array()
            .map(|values| Some(values.to_vec()))
            .ok_or_else(|| type_error(name, field, "text_array", value)),
    }
}
