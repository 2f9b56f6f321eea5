//! Derivation of per-nuclide and reactor spectra from stored transition data.

pub mod assembly;
pub mod continuum;
pub mod fission;
pub mod normalization;
pub mod total;
pub mod transitions;

pub use assembly::{NuSpectra, NuSpectraOptions, nu_spectra, reactor_spectrum};
pub use continuum::{ContinuumPoint, ContinuumSpectrum, continuum_spectrum};
pub use fission::{
    FissionSource, FissionWeighting, Reduction, SourceYields, WeightedSpectra,
    combine_by_fission_yield,
};
pub use normalization::{DEFAULT_NORMALIZATION_THRESHOLD, NormalizationPolicy};
pub use total::{DEFAULT_UNCERTAINTY_FRACTION, TotalSpectrum, evaluate_total_spectrum};
pub use transitions::{TransitionData, TransitionEntry};

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Which emitted particle a spectrum describes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpectrumKind {
    #[default]
    #[serde(rename = "nu")]
    Antineutrino,
    #[serde(rename = "beta")]
    Electron,
}

impl SpectrumKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Antineutrino => "nu",
            Self::Electron => "beta",
        }
    }
}

impl Display for SpectrumKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

impl FromStr for SpectrumKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "nu" | "data_nu" | "antineutrino" => Ok(Self::Antineutrino),
            "beta" | "data_beta" | "electron" => Ok(Self::Electron),
            other => Err(format!("unknown spectrum kind '{other}', expected nu or beta")),
        }
    }
}
