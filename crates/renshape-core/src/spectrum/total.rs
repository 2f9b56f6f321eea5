use super::transitions::TransitionData;
use crate::common::uncertainty::shorthand_to_std;

/// Relative branching-ratio uncertainty assumed when the stored one is unusable.
pub const DEFAULT_UNCERTAINTY_FRACTION: f64 = 0.2;

#[derive(Debug, Clone, PartialEq)]
pub struct TotalSpectrum {
    pub values: Vec<f64>,
    pub uncertainty: Vec<f64>,
}

/// Total spectrum of one nuclide with branching-ratio uncertainties propagated.
///
/// Each transition row is divided by its branching ratio to get its shape, and the
/// uncertainty per bin is
/// `sqrt(Σ_t (shape_t·σ_BR,t)² + (shape_err_t·BR_t)²)`.
/// The returned values are the plain column sum of the stored rows.
///
/// A zero branching ratio makes its shape undefined; the resulting NaN/inf is
/// propagated rather than hidden.
pub fn evaluate_total_spectrum(transitions: &TransitionData, default_fraction: f64) -> TotalSpectrum {
    let count = transitions.transition_count();
    let width = transitions.width();

    let branching_uncertainty: Vec<f64> = (0..count)
        .map(|row| {
            let ratio = transitions.intensity.get(row).copied().unwrap_or(f64::NAN);
            let digits = transitions.unc_intensity.get(row).copied().unwrap_or(f64::NAN);
            shorthand_to_std(ratio, digits).unwrap_or(ratio * default_fraction)
        })
        .collect();

    let mut variance = vec![0.0; width];
    for row in 0..count {
        let ratio = transitions.intensity.get(row).copied().unwrap_or(f64::NAN);
        let sigma_ratio = branching_uncertainty[row];
        for (col, slot) in variance.iter_mut().enumerate() {
            let shape = transitions.spectra[(row, col)] / ratio;
            let shape_err = transitions.uncertainties[(row, col)] / ratio;
            let from_ratio = shape * sigma_ratio;
            let from_shape = shape_err * ratio;
            *slot += from_ratio * from_ratio + from_shape * from_shape;
        }
    }

    TotalSpectrum {
        values: transitions.total_spectrum(),
        uncertainty: variance.into_iter().map(f64::sqrt).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_UNCERTAINTY_FRACTION, evaluate_total_spectrum};
    use crate::spectrum::{TransitionData, TransitionEntry};

    fn transition(intensity: f64, unc_intensity: f64, spectrum: Vec<f64>) -> TransitionEntry {
        TransitionEntry {
            emax: 100.0,
            intensity,
            unc_intensity,
            uncertainty: vec![0.0; spectrum.len()],
            spectrum,
            transition_type: "a".to_string(),
        }
    }

    #[test]
    fn total_is_the_row_sum_of_the_original_matrix() {
        let data = TransitionData::from_ragged(vec![
            transition(60.0, 5.0, vec![0.2, 0.3, 0.1]),
            transition(40.0, f64::NAN, vec![0.7, 0.0]),
        ]);
        let total = evaluate_total_spectrum(&data, DEFAULT_UNCERTAINTY_FRACTION);
        assert_eq!(total.values, vec![0.2 + 0.7, 0.3, 0.1]);
    }

    #[test]
    fn branching_ratio_uncertainty_propagates_through_the_shape() {
        // BR 60(5) -> σ = 5; shape = row / 60.
        let data = TransitionData::from_ragged(vec![transition(60.0, 5.0, vec![6.0, 12.0])]);
        let total = evaluate_total_spectrum(&data, DEFAULT_UNCERTAINTY_FRACTION);
        assert!((total.uncertainty[0] - 0.5).abs() < 1.0e-12);
        assert!((total.uncertainty[1] - 1.0).abs() < 1.0e-12);
    }

    #[test]
    fn unknown_branching_uncertainty_falls_back_to_the_default_fraction() {
        let data = TransitionData::from_ragged(vec![transition(40.0, f64::NAN, vec![4.0])]);
        let total = evaluate_total_spectrum(&data, 0.2);
        // shape = 0.1, σ_BR = 8.
        assert!((total.uncertainty[0] - 0.8).abs() < 1.0e-12);
    }

    #[test]
    fn per_point_uncertainty_is_combined_in_quadrature() {
        let mut entry = transition(50.0, 0.0, vec![5.0]);
        entry.uncertainty = vec![0.3];
        let data = TransitionData::from_ragged(vec![entry, transition(50.0, 0.0, vec![5.0])]);
        let total = evaluate_total_spectrum(&data, 0.2);
        // shape_err * BR recovers the stored 0.3; σ_BR = 0 for both rows.
        assert!((total.uncertainty[0] - 0.3).abs() < 1.0e-12);
    }

    #[test]
    fn zero_branching_ratio_produces_non_finite_values_without_panicking() {
        let data = TransitionData::from_ragged(vec![transition(0.0, 1.0, vec![0.5, 0.0])]);
        let total = evaluate_total_spectrum(&data, 0.2);
        assert_eq!(total.values, vec![0.5, 0.0]);
        assert!(total.uncertainty.iter().any(|value| !value.is_finite()));
    }
}
