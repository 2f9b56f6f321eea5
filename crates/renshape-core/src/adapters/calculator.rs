use crate::domain::{RenshapeError, RenshapeResult};
use crate::spectrum::{SpectrumKind, TransitionData, TransitionEntry};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::betashape::output::{intensity_from_diagnostics, transition_type_from_diagnostics};

/// Column of the calculator tables holding the computed dN/dE.
pub const SPECTRUM_COLUMN_LABEL: &str = "dN/dEcalc.";

/// One daughter level fed by the beta decay, values in shorthand notation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelParameters {
    /// Level energy (keV).
    pub energy: String,
    pub energy_uncertainty: String,
    pub spin_parity: String,
    /// Beta intensity (percent).
    pub intensity: String,
    pub intensity_uncertainty: String,
}

/// Calculator input describing one decay, values in shorthand notation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecayParameters {
    /// Parent nuclide as `<A><SYMBOL>`, e.g. `135I`.
    pub parent: String,
    pub daughter: String,
    pub parent_level_energy: String,
    pub parent_level_uncertainty: String,
    pub parent_spin_parity: String,
    pub half_life: String,
    pub half_life_units: String,
    pub half_life_uncertainty: String,
    /// Q-value (keV).
    pub q_value: String,
    pub q_uncertainty: String,
    pub normalization: String,
    pub normalization_uncertainty: String,
    pub branching: String,
    pub branching_uncertainty: String,
    pub levels: Vec<LevelParameters>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CalculatorRequest {
    Parameters(DecayParameters),
    /// Evaluated-levels file (ENSDF).
    LevelsFile(PathBuf),
}

/// Raw result of one beta transition.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionResult {
    pub labels: Vec<String>,
    pub electron: Vec<Vec<f64>>,
    pub antineutrino: Vec<Vec<f64>>,
    pub diagnostics: Vec<String>,
}

/// Metastable-state index of the parent to its transitions.
pub type CalculatorOutput = BTreeMap<u32, Vec<TransitionResult>>;

pub trait DecaySpectrumCalculator {
    fn evaluate(&self, request: &CalculatorRequest) -> RenshapeResult<CalculatorOutput>;
}

impl TransitionResult {
    pub fn table(&self, kind: SpectrumKind) -> &[Vec<f64>] {
        match kind {
            SpectrumKind::Antineutrino => &self.antineutrino,
            SpectrumKind::Electron => &self.electron,
        }
    }

    /// The spectrum, its uncertainty and end-point energy.
    ///
    /// The last table row carries the end-point energy in its first column and is
    /// not part of the spectrum.
    pub fn to_entry(&self, kind: SpectrumKind) -> RenshapeResult<TransitionEntry> {
        let column = self
            .labels
            .iter()
            .position(|label| label.starts_with(SPECTRUM_COLUMN_LABEL))
            .ok_or_else(|| {
                RenshapeError::external_tool(
                    "CALCULATOR.COLUMN",
                    format!("no '{SPECTRUM_COLUMN_LABEL}' column in calculator output"),
                )
            })?;

        let table = self.table(kind);
        let Some((last, body)) = table.split_last() else {
            return Err(RenshapeError::external_tool(
                "CALCULATOR.EMPTY",
                format!("empty {kind} table in calculator output"),
            ));
        };
        let cell = |row: &Vec<f64>, col: usize| row.get(col).copied().unwrap_or(0.0);

        let (intensity, unc_intensity) = intensity_from_diagnostics(&self.diagnostics)
            .ok_or_else(|| {
                RenshapeError::external_tool(
                    "CALCULATOR.INTENSITY",
                    "no intensity line in calculator diagnostics",
                )
            })?;

        Ok(TransitionEntry {
            emax: cell(last, 0),
            intensity,
            unc_intensity,
            spectrum: body.iter().map(|row| cell(row, column)).collect(),
            uncertainty: body.iter().map(|row| cell(row, column + 1)).collect(),
            transition_type: transition_type_from_diagnostics(&self.diagnostics),
        })
    }
}

/// Padded per-transition spectra of one parent state.
pub fn transitions_from_results(
    results: &[TransitionResult],
    kind: SpectrumKind,
) -> RenshapeResult<TransitionData> {
    if results.is_empty() {
        return Err(RenshapeError::external_tool(
            "CALCULATOR.EMPTY",
            "calculator returned no transitions",
        ));
    }
    let entries = results
        .iter()
        .map(|result| result.to_entry(kind))
        .collect::<RenshapeResult<Vec<_>>>()?;
    Ok(TransitionData::from_ragged(entries))
}
