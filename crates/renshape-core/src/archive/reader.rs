use super::document::ArchiveDocument;
use super::fields;
use super::record::NuclideRecord;
use super::value::FieldMap;
use super::{ArchiveError, ArchiveResult};
use crate::numerics::{SpectrumMatrix, matrix_from_rows, uniform_grid};
use std::path::{Path, PathBuf};

pub const DEFAULT_LABEL_ATTEMPTS: usize = 20;

/// Energy range, in keV, of the spectra returned by
/// [`ArchiveReader::data_matrix_across_all`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyWindow {
    pub e_min: f64,
    pub e_max: f64,
    /// Grid spacing; `None` uses the archive's `E_step`.
    pub e_step: Option<f64>,
}

impl Default for EnergyWindow {
    fn default() -> Self {
        Self {
            e_min: 0.0,
            e_max: 12_000.0,
            e_step: None,
        }
    }
}

/// Per-nuclide arrays clipped to a common energy grid.
///
/// `values` row `i` belongs to nuclide `present[i]` of the archive order; `present`
/// and `absent` partition the nuclide indices.
#[derive(Debug, Clone)]
pub struct DataMatrix {
    pub values: SpectrumMatrix,
    pub energies: Vec<f64>,
    pub present: Vec<usize>,
    pub absent: Vec<usize>,
}

impl ArchiveDocument {
    pub fn record_at(&self, index: usize) -> ArchiveResult<NuclideRecord> {
        let entry = self
            .nuclides
            .get(index)
            .ok_or(ArchiveError::IndexOutOfRange {
                index,
                count: self.nuclides.len(),
            })?;
        NuclideRecord::from_entry(entry)
    }

    pub fn record(&self, name: &str) -> ArchiveResult<NuclideRecord> {
        let entry = self.entry(name).ok_or_else(|| ArchiveError::NuclideNotFound {
            name: name.to_string(),
        })?;
        NuclideRecord::from_entry(entry)
    }

    /// One `info` value per nuclide; absent or non-numeric entries become `fill`.
    pub fn parameter_across_all(&self, field: &str, fill: f64) -> Vec<f64> {
        self.nuclides
            .iter()
            .map(|entry| {
                entry
                    .info
                    .as_ref()
                    .and_then(|info| info.get(field))
                    .and_then(|value| value.as_number())
                    .unwrap_or(fill)
            })
            .collect()
    }

    pub fn text_parameter_across_all(&self, field: &str, fill: &str) -> Vec<String> {
        self.nuclides
            .iter()
            .map(|entry| {
                entry
                    .info
                    .as_ref()
                    .and_then(|info| info.get(field))
                    .and_then(|value| value.as_text())
                    .unwrap_or(fill)
                    .to_string()
            })
            .collect()
    }

    pub fn energy_step(&self) -> ArchiveResult<f64> {
        self.info
            .get(fields::E_STEP)
            .and_then(|value| value.as_number())
            .ok_or_else(|| ArchiveError::MissingGeneralInfo {
                field: fields::E_STEP.to_string(),
            })
    }

    pub fn data_matrix_across_all(
        &self,
        field: &str,
        window: EnergyWindow,
    ) -> ArchiveResult<DataMatrix> {
        let step = match window.e_step {
            Some(step) => step,
            None => self.energy_step()?,
        };
        if !(step > 0.0) || !step.is_finite() {
            return Err(ArchiveError::InvalidEnergyWindow {
                message: format!("energy step must be positive, got {step}"),
            });
        }

        let grid = uniform_grid(0.0, window.e_max, step);
        let selected: Vec<usize> = grid
            .iter()
            .enumerate()
            .filter(|(_, energy)| **energy >= window.e_min && **energy <= window.e_max)
            .map(|(index, _)| index)
            .collect();
        let (Some(&first), Some(&last)) = (selected.first(), selected.last()) else {
            return Err(ArchiveError::InvalidEnergyWindow {
                message: format!(
                    "no grid point between {} and {} keV with step {step}",
                    window.e_min, window.e_max
                ),
            });
        };
        let width = last - first + 1;
        let energies = grid[first..=last].to_vec();

        let mut rows = Vec::new();
        let mut present = Vec::new();
        let mut absent = Vec::new();
        for (index, entry) in self.nuclides.iter().enumerate() {
            let values = entry
                .data
                .as_ref()
                .and_then(|data| data.get(field))
                .and_then(|value| value.as_array());
            match values {
                Some(values) => {
                    let end = values.len().min(last + 1);
                    let clipped = if first < end { &values[first..end] } else { &[][..] };
                    rows.push(clipped.to_vec());
                    present.push(index);
                }
                None => absent.push(index),
            }
        }

        Ok(DataMatrix {
            values: matrix_from_rows(&rows, width),
            energies,
            present,
            absent,
        })
    }

    /// The longest `info` key list among the first `attempts` nuclides.
    pub fn parameter_labels(&self, attempts: usize) -> Vec<String> {
        self.nuclides
            .iter()
            .take(attempts)
            .filter_map(|entry| entry.info.as_ref())
            .max_by_key(|info| info.len())
            .map(|info| info.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// Read access to an archive file. Every call takes its own snapshot of the file;
/// use [`ArchiveReader::snapshot`] to run several queries against one state.
#[derive(Debug, Clone)]
pub struct ArchiveReader {
    path: PathBuf,
}

impl ArchiveReader {
    /// Open an existing archive. Fails when the file is missing or unreadable.
    pub fn open(path: impl Into<PathBuf>) -> ArchiveResult<Self> {
        let reader = Self { path: path.into() };
        reader.snapshot()?;
        Ok(reader)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> ArchiveResult<ArchiveDocument> {
        ArchiveDocument::load(&self.path)
    }

    pub fn general_info(&self) -> ArchiveResult<FieldMap> {
        Ok(self.snapshot()?.info)
    }

    pub fn nuclide_names(&self) -> ArchiveResult<Vec<String>> {
        Ok(self.snapshot()?.nuclide_names())
    }

    pub fn record(&self, name: &str) -> ArchiveResult<NuclideRecord> {
        self.snapshot()?.record(name)
    }

    pub fn record_at(&self, index: usize) -> ArchiveResult<NuclideRecord> {
        self.snapshot()?.record_at(index)
    }

    pub fn parameter_across_all(&self, field: &str, fill: f64) -> ArchiveResult<Vec<f64>> {
        Ok(self.snapshot()?.parameter_across_all(field, fill))
    }

    pub fn text_parameter_across_all(&self, field: &str, fill: &str) -> ArchiveResult<Vec<String>> {
        Ok(self.snapshot()?.text_parameter_across_all(field, fill))
    }

    pub fn data_matrix_across_all(
        &self,
        field: &str,
        window: EnergyWindow,
    ) -> ArchiveResult<DataMatrix> {
        self.snapshot()?.data_matrix_across_all(field, window)
    }

    pub fn parameter_labels(&self, attempts: usize) -> ArchiveResult<Vec<String>> {
        Ok(self.snapshot()?.parameter_labels(attempts))
    }
}
