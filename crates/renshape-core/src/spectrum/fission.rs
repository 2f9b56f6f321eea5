use crate::archive::ArchiveDocument;
use crate::numerics::SpectrumMatrix;
use serde::{Deserialize, Serialize};

/// One fissioning isotope contributing to a reactor spectrum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FissionSource {
    /// `info` field holding the cumulative fission yield.
    pub yield_field: String,
    /// `info` field holding the yield uncertainty.
    pub uncertainty_field: String,
    /// Fission fraction.
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_uncertainty: Option<f64>,
}

impl FissionSource {
    pub fn new(yield_field: &str, uncertainty_field: &str, weight: f64) -> Self {
        Self {
            yield_field: yield_field.to_string(),
            uncertainty_field: uncertainty_field.to_string(),
            weight,
            weight_uncertainty: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FissionWeighting {
    pub sources: Vec<FissionSource>,
}

impl FissionWeighting {
    /// Typical PWR fission fractions: ²³⁵U, ²³⁹Pu and ²⁴¹Pu thermal, ²³⁸U fast.
    pub fn reactor_default() -> Self {
        Self {
            sources: vec![
                FissionSource::new("cumulative_thermal_fy_235u", "unc_ct_235u", 0.564),
                FissionSource::new("cumulative_thermal_fy_239Pu", "unc_ct_239Pu", 0.076),
                FissionSource::new("cumulative_thermal_fy_241Pu", "unc_ct_241Pu", 0.304),
                FissionSource::new("cumulative_fast_fy_238u", "unc_cf_238u", 0.056),
            ],
        }
    }
}

/// Per-nuclide yield columns of one source, aligned with the spectrum rows.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceYields {
    pub weight: f64,
    pub weight_uncertainty: Option<f64>,
    pub yields: Vec<f64>,
    pub uncertainties: Vec<f64>,
}

impl SourceYields {
    /// Yields of every `present` nuclide; absent fields count as zero.
    pub fn collect(document: &ArchiveDocument, source: &FissionSource, present: &[usize]) -> Self {
        let yields = document.parameter_across_all(&source.yield_field, 0.0);
        let uncertainties = document.parameter_across_all(&source.uncertainty_field, 0.0);
        Self {
            weight: source.weight,
            weight_uncertainty: source.weight_uncertainty,
            yields: present.iter().map(|index| yields[*index]).collect(),
            uncertainties: present.iter().map(|index| uncertainties[*index]).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    /// Sum all nuclides into one aggregate spectrum.
    Summed,
    /// Keep one weighted row per nuclide.
    PerNuclide,
}

#[derive(Debug, Clone)]
pub enum WeightedSpectra {
    Summed {
        spectrum: Vec<f64>,
        uncertainty: Vec<f64>,
    },
    PerNuclide {
        spectra: SpectrumMatrix,
        uncertainties: SpectrumMatrix,
    },
}

/// Weight each nuclide spectrum by its effective fission yield
/// `Σ_s weight_s · cfy_s` and propagate uncertainties in quadrature.
///
/// Rows of `spectra`/`uncertainties` line up with the entries of each
/// [`SourceYields`]. Unreduced uncertainties are standard deviations.
pub fn combine_by_fission_yield(
    sources: &[SourceYields],
    spectra: &SpectrumMatrix,
    uncertainties: &SpectrumMatrix,
    reduction: Reduction,
) -> WeightedSpectra {
    let rows = spectra.nrows();
    let cols = spectra.ncols();

    let mut effective = vec![0.0; rows];
    let mut effective_variance = vec![0.0; rows];
    for source in sources {
        for row in 0..rows {
            let cfy = source.yields.get(row).copied().unwrap_or(0.0);
            let unc = source.uncertainties.get(row).copied().unwrap_or(0.0);
            effective[row] += source.weight * cfy;
            effective_variance[row] += (unc * source.weight).powi(2);
            if let Some(weight_uncertainty) = source.weight_uncertainty {
                effective_variance[row] += (cfy * weight_uncertainty).powi(2);
            }
        }
    }

    let mut weighted = SpectrumMatrix::zeros(rows, cols);
    let mut weighted_variance = SpectrumMatrix::zeros(rows, cols);
    for row in 0..rows {
        let effective_unc = effective_variance[row].sqrt();
        for col in 0..cols {
            let value = spectra[(row, col)];
            let value_unc = if col < uncertainties.ncols() && row < uncertainties.nrows() {
                uncertainties[(row, col)]
            } else {
                0.0
            };
            weighted[(row, col)] = value * effective[row];
            weighted_variance[(row, col)] =
                (value_unc * effective[row]).powi(2) + (value * effective_unc).powi(2);
        }
    }

    match reduction {
        Reduction::Summed => WeightedSpectra::Summed {
            spectrum: (0..cols)
                .map(|col| (0..rows).map(|row| weighted[(row, col)]).sum())
                .collect(),
            uncertainty: (0..cols)
                .map(|col| {
                    (0..rows)
                        .map(|row| weighted_variance[(row, col)])
                        .sum::<f64>()
                        .sqrt()
                })
                .collect(),
        },
        Reduction::PerNuclide => {
            for row in 0..rows {
                for col in 0..cols {
                    weighted_variance[(row, col)] = weighted_variance[(row, col)].sqrt();
                }
            }
            WeightedSpectra::PerNuclide {
                spectra: weighted,
                uncertainties: weighted_variance,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FissionWeighting, Reduction, SourceYields, WeightedSpectra, combine_by_fission_yield};
    use crate::numerics::{matrix_from_rows, matrix_rows};

    fn single_source(yields: Vec<f64>, uncertainties: Vec<f64>) -> SourceYields {
        SourceYields {
            weight: 1.0,
            weight_uncertainty: None,
            yields,
            uncertainties,
        }
    }

    #[test]
    fn single_source_scales_the_row_by_its_yield() {
        let spectra = matrix_from_rows(&[vec![1.0, 1.0, 1.0]], 3);
        let uncertainties = matrix_from_rows(&[vec![0.0, 0.0, 0.0]], 3);
        let sources = [single_source(vec![0.5], vec![0.0])];

        let WeightedSpectra::PerNuclide {
            spectra,
            uncertainties,
        } = combine_by_fission_yield(&sources, &spectra, &uncertainties, Reduction::PerNuclide)
        else {
            panic!("expected per-nuclide output");
        };
        assert_eq!(matrix_rows(&spectra), vec![vec![0.5, 0.5, 0.5]]);
        assert_eq!(matrix_rows(&uncertainties), vec![vec![0.0, 0.0, 0.0]]);
    }

    #[test]
    fn summed_reduction_adds_rows_and_uncertainties_in_quadrature() {
        let spectra = matrix_from_rows(&[vec![1.0, 2.0], vec![3.0, 0.0]], 2);
        let uncertainties = matrix_from_rows(&[vec![0.3, 0.0], vec![0.4, 0.0]], 2);
        let sources = [single_source(vec![1.0, 1.0], vec![0.0, 0.0])];

        let WeightedSpectra::Summed {
            spectrum,
            uncertainty,
        } = combine_by_fission_yield(&sources, &spectra, &uncertainties, Reduction::Summed)
        else {
            panic!("expected summed output");
        };
        assert_eq!(spectrum, vec![4.0, 2.0]);
        assert!((uncertainty[0] - 0.5).abs() < 1.0e-12);
        assert_eq!(uncertainty[1], 0.0);
    }

    #[test]
    fn yield_and_weight_uncertainties_propagate() {
        let spectra = matrix_from_rows(&[vec![2.0]], 1);
        let uncertainties = matrix_from_rows(&[vec![0.0]], 1);
        let sources = [
            SourceYields {
                weight: 0.5,
                weight_uncertainty: Some(0.1),
                yields: vec![0.4],
                uncertainties: vec![0.06],
            },
            SourceYields {
                weight: 0.5,
                weight_uncertainty: None,
                yields: vec![0.2],
                uncertainties: vec![0.08],
            },
        ];

        let WeightedSpectra::Summed {
            spectrum,
            uncertainty,
        } = combine_by_fission_yield(&sources, &spectra, &uncertainties, Reduction::Summed)
        else {
            panic!("expected summed output");
        };
        // effective = 0.3; σ² = 0.03² + 0.04² + 0.04² = 0.0041.
        assert!((spectrum[0] - 0.6).abs() < 1.0e-12);
        assert!((uncertainty[0] - 2.0 * 0.0041_f64.sqrt()).abs() < 1.0e-12);
    }

    #[test]
    fn reactor_default_fractions_sum_to_one() {
        let weighting = FissionWeighting::reactor_default();
        assert_eq!(weighting.sources.len(), 4);
        let total: f64 = weighting.sources.iter().map(|source| source.weight).sum();
        assert!((total - 1.0).abs() < 1.0e-12);
        assert_eq!(weighting.sources[3].yield_field, "cumulative_fast_fy_238u");
    }
}
