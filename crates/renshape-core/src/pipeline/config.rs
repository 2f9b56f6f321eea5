use crate::adapters::betashape::{DEFAULT_OPTIONS, energy_step_from_options};
use crate::domain::RenshapeError;
use crate::spectrum::SpectrumKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Energy step assumed when the calculator options do not select one (keV).
pub const DEFAULT_ENERGY_STEP: f64 = 1.0;

/// Settings of a processing run, loaded from JSON. Every field is optional in the
/// file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub decay_library: Option<PathBuf>,
    pub ensdf_dir: Option<PathBuf>,
    pub betashape_dir: Option<PathBuf>,
    pub betashape_program: Option<PathBuf>,
    pub betashape_options: String,
    pub betashape_version: Option<String>,
    pub kind: SpectrumKind,
    /// Run the ENSDF fix-up pass after the decay-library pass.
    pub fix: bool,
    /// Recompute records that already carry a provenance tag.
    pub overwrite: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            decay_library: None,
            ensdf_dir: None,
            betashape_dir: None,
            betashape_program: None,
            betashape_options: DEFAULT_OPTIONS.to_string(),
            betashape_version: None,
            kind: SpectrumKind::default(),
            fix: true,
            overwrite: false,
        }
    }
}

impl RunConfig {
    /// Spectrum grid step implied by the calculator options.
    pub fn energy_step(&self) -> f64 {
        energy_step_from_options(&self.betashape_options).unwrap_or(DEFAULT_ENERGY_STEP)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read run config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse run config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl From<ConfigError> for RenshapeError {
    fn from(error: ConfigError) -> Self {
        let placeholder = match error {
            ConfigError::Read { .. } => "CONFIG.READ",
            ConfigError::Parse { .. } => "CONFIG.PARSE",
        };
        RenshapeError::input_validation(placeholder, error.to_string())
    }
}

pub fn load_run_config(config_path: impl AsRef<Path>) -> Result<RunConfig, ConfigError> {
    let config_path = config_path.as_ref();
    let source = fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
        path: config_path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&source).map_err(|source| ConfigError::Parse {
        path: config_path.to_path_buf(),
        source,
    })
}
