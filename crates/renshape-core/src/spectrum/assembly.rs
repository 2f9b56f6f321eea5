use super::fission::{
    FissionWeighting, Reduction, SourceYields, WeightedSpectra, combine_by_fission_yield,
};
use super::normalization::NormalizationPolicy;
use super::total::{DEFAULT_UNCERTAINTY_FRACTION, evaluate_total_spectrum};
use crate::archive::{ArchiveDocument, EnergyWindow, fields};
use crate::domain::{RenshapeError, RenshapeResult};
use crate::numerics::{SpectrumMatrix, stable_sum};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NuSpectraOptions {
    pub window: EnergyWindow,
    /// Propagate branching-ratio uncertainties instead of reading `unc_dN_dE`.
    pub branching_ratio_uncertainty: bool,
    pub default_uncertainty: f64,
    /// `None` disables normalization.
    pub normalization: Option<NormalizationPolicy>,
}

impl Default for NuSpectraOptions {
    fn default() -> Self {
        Self {
            window: EnergyWindow::default(),
            branching_ratio_uncertainty: true,
            default_uncertainty: DEFAULT_UNCERTAINTY_FRACTION,
            normalization: Some(NormalizationPolicy::default()),
        }
    }
}

/// Spectra of every nuclide holding a `dN_dE_tot`, on a common energy grid.
#[derive(Debug, Clone)]
pub struct NuSpectra {
    pub energies: Vec<f64>,
    pub spectra: SpectrumMatrix,
    pub uncertainties: SpectrumMatrix,
    /// Archive index of each row.
    pub present: Vec<usize>,
    pub absent: Vec<usize>,
}

pub fn nu_spectra(document: &ArchiveDocument, options: &NuSpectraOptions) -> RenshapeResult<NuSpectra> {
    let data = document.data_matrix_across_all(fields::DN_DE_TOT, options.window)?;
    let spectra = data.values;
    let rows = spectra.nrows();
    let cols = spectra.ncols();

    let mut uncertainties = if options.branching_ratio_uncertainty {
        let mut uncertainties = SpectrumMatrix::zeros(rows, cols);
        let window_start = data.energies.first().copied().unwrap_or(0.0);
        let offset = grid_offset(document, options.window, window_start);
        for (row, &index) in data.present.iter().enumerate() {
            let propagated = document.record_at(index)?.transitions.map(|transitions| {
                evaluate_total_spectrum(&transitions, options.default_uncertainty).uncertainty
            });
            match propagated {
                Some(values) => {
                    for col in 0..cols {
                        uncertainties[(row, col)] = values.get(offset + col).copied().unwrap_or(0.0);
                    }
                }
                None => {
                    debug!(
                        nuclide = %document.nuclides[index].name,
                        "no transition data, using default uncertainty"
                    );
                    for col in 0..cols {
                        uncertainties[(row, col)] = spectra[(row, col)] * options.default_uncertainty;
                    }
                }
            }
        }
        uncertainties
    } else {
        let stored = document.data_matrix_across_all(fields::UNC_DN_DE, options.window)?;
        let mut uncertainties = SpectrumMatrix::zeros(rows, cols);
        for (row, index) in data.present.iter().enumerate() {
            let stored_row = stored.present.iter().position(|candidate| candidate == index);
            let values: Vec<f64> = match stored_row {
                Some(stored_row) => (0..cols).map(|col| stored.values[(stored_row, col)]).collect(),
                None => vec![0.0; cols],
            };
            let known = cols > 0 && stable_sum(&values) / cols as f64 != 0.0;
            for col in 0..cols {
                uncertainties[(row, col)] = if known {
                    values[col]
                } else {
                    spectra[(row, col)] * options.default_uncertainty
                };
            }
        }
        uncertainties
    };

    let mut spectra = spectra;
    if let Some(policy) = options.normalization {
        if data.energies.len() >= 2 {
            policy
                .normalize_rows(&mut spectra, &mut uncertainties, &data.energies)
                .map_err(|error| RenshapeError::internal("SPECTRUM.NORMALIZE", error.to_string()))?;
        } else {
            warn!(points = data.energies.len(), "energy window too narrow to normalize");
        }
    }

    Ok(NuSpectra {
        energies: data.energies,
        spectra,
        uncertainties,
        present: data.present,
        absent: data.absent,
    })
}

/// First stored bin inside the window: stored arrays start at 0 keV.
fn grid_offset(document: &ArchiveDocument, window: EnergyWindow, window_start: f64) -> usize {
    let step = window
        .e_step
        .or_else(|| document.energy_step().ok())
        .unwrap_or(1.0);
    (window_start / step).round() as usize
}

/// Reactor spectrum of the archive: [`nu_spectra`] weighted by `weighting`.
pub fn reactor_spectrum(
    document: &ArchiveDocument,
    nu: &NuSpectra,
    weighting: &FissionWeighting,
    reduction: Reduction,
) -> WeightedSpectra {
    let sources: Vec<SourceYields> = weighting
        .sources
        .iter()
        .map(|source| SourceYields::collect(document, source, &nu.present))
        .collect();
    combine_by_fission_yield(&sources, &nu.spectra, &nu.uncertainties, reduction)
}
