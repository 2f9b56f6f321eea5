use crate::numerics::{IntegrationError, SpectrumMatrix, integrate_simpson};

pub const DEFAULT_NORMALIZATION_THRESHOLD: f64 = 0.99;

/// Unit-area normalization of spectra whose integral is close enough to one.
///
/// Spectra integrating below `threshold` are treated as truncated and left alone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizationPolicy {
    pub threshold: f64,
}

impl Default for NormalizationPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_NORMALIZATION_THRESHOLD,
        }
    }
}

impl NormalizationPolicy {
    pub const fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Rescale `spectrum` and `uncertainty` in place by `1/I`. Returns the integral
    /// and whether it was applied.
    pub fn normalize(
        &self,
        spectrum: &mut [f64],
        uncertainty: &mut [f64],
        energies: &[f64],
    ) -> Result<(f64, bool), IntegrationError> {
        let integral = integrate_simpson(spectrum, energies)?;
        if !(integral >= self.threshold) {
            return Ok((integral, false));
        }
        for value in spectrum.iter_mut() {
            *value /= integral;
        }
        for value in uncertainty.iter_mut() {
            *value /= integral;
        }
        Ok((integral, true))
    }

    /// Row-wise [`NormalizationPolicy::normalize`]. Returns how many rows were rescaled.
    pub fn normalize_rows(
        &self,
        spectra: &mut SpectrumMatrix,
        uncertainties: &mut SpectrumMatrix,
        energies: &[f64],
    ) -> Result<usize, IntegrationError> {
        let mut rescaled = 0;
        for row in 0..spectra.nrows() {
            let mut spectrum: Vec<f64> = (0..spectra.ncols()).map(|col| spectra[(row, col)]).collect();
            let mut uncertainty: Vec<f64> = (0..uncertainties.ncols())
                .map(|col| uncertainties[(row, col)])
                .collect();
            let (_, applied) = self.normalize(&mut spectrum, &mut uncertainty, energies)?;
            if !applied {
                continue;
            }
            rescaled += 1;
            for (col, value) in spectrum.into_iter().enumerate() {
                spectra[(row, col)] = value;
            }
            for (col, value) in uncertainty.into_iter().enumerate() {
                uncertainties[(row, col)] = value;
            }
        }
        Ok(rescaled)
    }
}

#[cfg(test)]
mod tests {
    use super::NormalizationPolicy;
    use crate::numerics::{matrix_from_rows, matrix_rows, uniform_grid};

    fn assert_all_close(label: &str, expected: &[f64], actual: &[f64]) {
        assert_eq!(expected.len(), actual.len(), "{label} length");
        for (index, (left, right)) in expected.iter().zip(actual).enumerate() {
            assert!(
                (left - right).abs() <= 1.0e-12,
                "{label}[{index}] expected={left:.15e} actual={right:.15e}"
            );
        }
    }

    #[test]
    fn already_normalized_spectrum_is_unchanged() {
        let energies = uniform_grid(0.0, 5.0, 1.0);
        let mut spectrum = vec![0.25; 5];
        let mut uncertainty = vec![0.01; 5];
        let policy = NormalizationPolicy::default();

        let (integral, applied) = policy
            .normalize(&mut spectrum, &mut uncertainty, &energies)
            .expect("normalize");
        assert!(applied);
        assert!((integral - 1.0).abs() < 1.0e-12);
        assert_all_close("first pass", &[0.25; 5], &spectrum);

        policy
            .normalize(&mut spectrum, &mut uncertainty, &energies)
            .expect("normalize twice");
        assert_all_close("second pass", &[0.25; 5], &spectrum);
        assert_all_close("uncertainty", &[0.01; 5], &uncertainty);
    }

    #[test]
    fn spectra_above_threshold_are_rescaled_with_their_uncertainty() {
        let energies = uniform_grid(0.0, 3.0, 1.0);
        let mut spectrum = vec![1.0, 1.0, 1.0];
        let mut uncertainty = vec![0.2, 0.2, 0.2];

        let (integral, applied) = NormalizationPolicy::default()
            .normalize(&mut spectrum, &mut uncertainty, &energies)
            .expect("normalize");
        assert!(applied);
        assert!((integral - 2.0).abs() < 1.0e-12);
        assert_all_close("spectrum", &[0.5, 0.5, 0.5], &spectrum);
        assert_all_close("uncertainty", &[0.1, 0.1, 0.1], &uncertainty);
    }

    #[test]
    fn truncated_spectra_are_left_unscaled() {
        let energies = uniform_grid(0.0, 3.0, 1.0);
        let mut spectra = matrix_from_rows(&[vec![0.1, 0.1, 0.1], vec![2.0, 2.0, 2.0]], 3);
        let mut uncertainties = matrix_from_rows(&[vec![0.0; 3], vec![1.0; 3]], 3);

        let rescaled = NormalizationPolicy::default()
            .normalize_rows(&mut spectra, &mut uncertainties, &energies)
            .expect("normalize");
        assert_eq!(rescaled, 1);

        let rows = matrix_rows(&spectra);
        assert_eq!(rows[0], vec![0.1, 0.1, 0.1]);
        assert_all_close("rescaled row", &[0.5, 0.5, 0.5], &rows[1]);
        assert_all_close("rescaled uncertainty", &[0.25; 3], &matrix_rows(&uncertainties)[1]);
    }
}
