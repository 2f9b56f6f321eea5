use crate::archive::record::{array_field, matrix_field, text_array_field};
use crate::archive::{ArchiveResult, FieldMap, FieldValue, fields};
use crate::numerics::{SpectrumMatrix, matrix_from_rows, matrix_rows, quadrature_sum, stable_sum};

/// One beta transition as produced by the spectrum calculator, before padding.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionEntry {
    /// End-point energy (keV).
    pub emax: f64,
    /// Branching ratio (percent).
    pub intensity: f64,
    /// Shorthand uncertainty digits of `intensity`; NaN when unknown.
    pub unc_intensity: f64,
    pub spectrum: Vec<f64>,
    pub uncertainty: Vec<f64>,
    pub transition_type: String,
}

/// Per-transition spectra of one nuclide, right-zero-padded to the longest one.
#[derive(Debug, Clone)]
pub struct TransitionData {
    pub emax: Vec<f64>,
    pub intensity: Vec<f64>,
    pub unc_intensity: Vec<f64>,
    pub spectra: SpectrumMatrix,
    pub uncertainties: SpectrumMatrix,
    pub types: Vec<String>,
}

impl TransitionData {
    pub fn from_ragged(entries: Vec<TransitionEntry>) -> Self {
        let width = entries
            .iter()
            .map(|entry| entry.spectrum.len().max(entry.uncertainty.len()))
            .max()
            .unwrap_or(0);

        let mut emax = Vec::with_capacity(entries.len());
        let mut intensity = Vec::with_capacity(entries.len());
        let mut unc_intensity = Vec::with_capacity(entries.len());
        let mut spectra = Vec::with_capacity(entries.len());
        let mut uncertainties = Vec::with_capacity(entries.len());
        let mut types = Vec::with_capacity(entries.len());
        for entry in entries {
            emax.push(entry.emax);
            intensity.push(entry.intensity);
            unc_intensity.push(entry.unc_intensity);
            spectra.push(entry.spectrum);
            uncertainties.push(entry.uncertainty);
            types.push(entry.transition_type);
        }

        Self {
            emax,
            intensity,
            unc_intensity,
            spectra: matrix_from_rows(&spectra, width),
            uncertainties: matrix_from_rows(&uncertainties, width),
            types,
        }
    }

    /// Rebuild from a stored `data` section. `None` when the section holds no
    /// per-transition spectra (continuum records, unprocessed records).
    pub fn from_fields(name: &str, data: &FieldMap) -> ArchiveResult<Option<Self>> {
        let Some(spectra) = matrix_field(name, data, fields::TRANSITION_DN_DE)? else {
            return Ok(None);
        };
        let Some(intensity) = array_field(name, data, fields::TRANSITION_INTENSITY)? else {
            return Ok(None);
        };
        let count = spectra.len();
        let width = spectra.iter().map(Vec::len).max().unwrap_or(0);

        let uncertainties = matrix_field(name, data, fields::TRANSITION_UNC_DN_DE)?
            .unwrap_or_else(|| vec![Vec::new(); count]);
        let unc_intensity = array_field(name, data, fields::TRANSITION_UNC_INTENSITY)?
            .unwrap_or_else(|| vec![f64::NAN; count]);
        let emax = match data.get(fields::TRANSITION_EMAX) {
            Some(FieldValue::Number(value)) => vec![*value],
            _ => array_field(name, data, fields::TRANSITION_EMAX)?.unwrap_or_default(),
        };
        let types = text_array_field(name, data, fields::TRANSITION_TYPE)?.unwrap_or_default();

        Ok(Some(Self {
            emax,
            intensity,
            unc_intensity,
            spectra: matrix_from_rows(&spectra, width),
            uncertainties: matrix_from_rows(&uncertainties, width),
            types,
        }))
    }

    pub fn transition_count(&self) -> usize {
        self.spectra.nrows()
    }

    pub fn width(&self) -> usize {
        self.spectra.ncols()
    }

    pub fn max_emax(&self) -> Option<f64> {
        self.emax.iter().copied().reduce(f64::max)
    }

    /// Column sum of the transition spectra.
    pub fn total_spectrum(&self) -> Vec<f64> {
        (0..self.width())
            .map(|col| {
                let column: Vec<f64> = (0..self.transition_count())
                    .map(|row| self.spectra[(row, col)])
                    .collect();
                stable_sum(&column)
            })
            .collect()
    }

    /// Column sum in quadrature of the per-point uncertainties.
    pub fn total_uncertainty(&self) -> Vec<f64> {
        (0..self.width())
            .map(|col| {
                quadrature_sum((0..self.transition_count()).map(|row| self.uncertainties[(row, col)]))
            })
            .collect()
    }

    /// The `data` section written for a processed nuclide.
    pub fn to_fields(&self) -> FieldMap {
        FieldMap::from([
            (fields::TRANSITION_EMAX.to_string(), FieldValue::from(self.emax.clone())),
            (
                fields::TRANSITION_INTENSITY.to_string(),
                FieldValue::from(self.intensity.clone()),
            ),
            (
                fields::TRANSITION_UNC_INTENSITY.to_string(),
                FieldValue::from(self.unc_intensity.clone()),
            ),
            (
                fields::TRANSITION_DN_DE.to_string(),
                FieldValue::from(matrix_rows(&self.spectra)),
            ),
            (
                fields::TRANSITION_UNC_DN_DE.to_string(),
                FieldValue::from(matrix_rows(&self.uncertainties)),
            ),
            (
                fields::TRANSITION_TYPE.to_string(),
                FieldValue::from(self.types.clone()),
            ),
            (fields::DN_DE_TOT.to_string(), FieldValue::from(self.total_spectrum())),
            (fields::UNC_DN_DE.to_string(), FieldValue::from(self.total_uncertainty())),
        ])
    }
}
