use super::SpectrumKind;
use crate::archive::{FieldMap, FieldValue, fields};
use crate::numerics::{interpolate_linear, stable_sum, uniform_grid};
use serde::{Deserialize, Serialize};

/// One row of a theoretical continuum table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContinuumPoint {
    /// Energy in MeV.
    pub energy: f64,
    pub electron: f64,
    pub antineutrino: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContinuumSpectrum {
    /// Interpolated spectrum normalized so that `Σ value · step = 1`.
    pub spectrum: Vec<f64>,
    /// Interpolated spectrum before normalization.
    pub raw: Vec<f64>,
    /// Last tabulated energy (keV).
    pub emax: f64,
}

impl ContinuumSpectrum {
    pub fn to_fields(&self) -> FieldMap {
        FieldMap::from([
            (fields::DN_DE_TOT.to_string(), FieldValue::from(self.spectrum.clone())),
            (
                fields::UNC_DN_DE.to_string(),
                FieldValue::from(vec![0.0; self.spectrum.len()]),
            ),
            (fields::TRANSITION_EMAX.to_string(), FieldValue::Number(self.emax)),
            (fields::DN_DE_TOT_CONTINUUM.to_string(), FieldValue::from(self.raw.clone())),
        ])
    }
}

/// Interpolate a theoretical table onto `0, step, …` up to its last energy.
///
/// Returns `None` for an empty table, a non-positive step or a table whose
/// interpolated area is not positive.
pub fn continuum_spectrum(
    points: &[ContinuumPoint],
    step: f64,
    kind: SpectrumKind,
) -> Option<ContinuumSpectrum> {
    let last = points.last()?;
    if !(step > 0.0) {
        return None;
    }

    let energies: Vec<f64> = points.iter().map(|point| point.energy * 1.0e3).collect();
    let values: Vec<f64> = points
        .iter()
        .map(|point| match kind {
            SpectrumKind::Antineutrino => point.antineutrino,
            SpectrumKind::Electron => point.electron,
        })
        .collect();
    let emax = last.energy * 1.0e3;

    let raw: Vec<f64> = uniform_grid(0.0, emax + step, step)
        .into_iter()
        .map(|energy| interpolate_linear(energy, &energies, &values))
        .collect();
    let area = stable_sum(&raw) * step;
    if !(area > 0.0) || !area.is_finite() {
        return None;
    }
    let spectrum = raw.iter().map(|value| value / area).collect();

    Some(ContinuumSpectrum {
        spectrum,
        raw,
        emax,
    })
}

#[cfg(test)]
mod tests {
    use super::{ContinuumPoint, continuum_spectrum};
    use crate::spectrum::SpectrumKind;

    fn table() -> Vec<ContinuumPoint> {
        [(0.0, 2.0), (0.1, 4.0), (0.2, 0.0)]
            .into_iter()
            .map(|(energy, antineutrino)| ContinuumPoint {
                energy,
                electron: 1.0,
                antineutrino,
            })
            .collect()
    }

    #[test]
    fn interpolates_onto_the_step_grid_and_normalizes_by_sum_times_step() {
        let continuum = continuum_spectrum(&table(), 50.0, SpectrumKind::Antineutrino)
            .expect("spectrum");

        assert_eq!(continuum.spectrum.len(), 5);
        assert_eq!(continuum.emax, 200.0);
        let expected_raw = [2.0, 3.0, 4.0, 2.0, 0.0];
        for (expected, actual) in expected_raw.iter().zip(&continuum.raw) {
            assert!((expected - actual).abs() < 1.0e-12);
        }
        let area: f64 = continuum.spectrum.iter().sum::<f64>() * 50.0;
        assert!((area - 1.0).abs() < 1.0e-12);
    }

    #[test]
    fn electron_kind_reads_the_electron_column() {
        let continuum =
            continuum_spectrum(&table(), 50.0, SpectrumKind::Electron).expect("spectrum");
        for value in &continuum.spectrum {
            assert!((value - 1.0 / 250.0).abs() < 1.0e-12);
        }
    }

    #[test]
    fn stored_fields_carry_scalar_emax_and_zero_uncertainty() {
        let continuum = continuum_spectrum(&table(), 50.0, SpectrumKind::Antineutrino)
            .expect("spectrum");
        let fields = continuum.to_fields();
        assert_eq!(fields["transition_Emax"].as_number(), Some(200.0));
        assert_eq!(fields["unc_dN_dE"].as_array(), Some(&[0.0; 5][..]));
        assert!(continuum_spectrum(&[], 50.0, SpectrumKind::Antineutrino).is_none());
    }

    #[test]
    fn all_zero_table_has_no_spectrum() {
        let zeros: Vec<ContinuumPoint> = table()
            .into_iter()
            .map(|point| ContinuumPoint {
                antineutrino: 0.0,
                ..point
            })
            .collect();
        assert!(continuum_spectrum(&zeros, 50.0, SpectrumKind::Antineutrino).is_none());
        assert!(continuum_spectrum(&zeros, 50.0, SpectrumKind::Electron).is_some());
    }
}
