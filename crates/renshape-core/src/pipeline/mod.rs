//! Passes that fill an archive: record ingest, the decay-library spectrum pass and
//! the ENSDF fix-up pass.

pub mod config;
pub mod ingest;
pub mod passes;

pub use config::{ConfigError, DEFAULT_ENERGY_STEP, RunConfig, load_run_config};
pub use ingest::ingest_records;
pub use passes::{
    PassOptions, ProcessSummary, process_archive, record_calculator_settings,
    run_decay_library_pass, run_ensdf_fix_pass,
};

use crate::domain::{RenshapeError, RenshapeResult};
use serde::Serialize;
use std::fmt::{Display, Formatter};
use tracing::warn;

/// What a pass did to one nuclide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NuclideOutcome {
    Written,
    /// Not eligible in its current provenance state.
    Skipped,
    /// Eligible, but the source had nothing for it.
    Unchanged,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    pub written: usize,
    pub skipped: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl PassSummary {
    /// Count one nuclide. Per-nuclide errors are logged and counted; any other
    /// error is returned and aborts the pass.
    pub fn record(&mut self, nuclide: &str, result: RenshapeResult<NuclideOutcome>) -> RenshapeResult<()> {
        match result {
            Ok(NuclideOutcome::Written) => self.written += 1,
            Ok(NuclideOutcome::Skipped) => self.skipped += 1,
            Ok(NuclideOutcome::Unchanged) => self.unchanged += 1,
            Err(error) if error.category().is_per_nuclide() => {
                warn!(nuclide, error = %error, "skipping nuclide");
                self.failed += 1;
            }
            Err(error) => return Err(error),
        }
        Ok(())
    }

    pub fn total(&self) -> usize {
        self.written + self.skipped + self.unchanged + self.failed
    }
}

impl Display for PassSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "written={} skipped={} unchanged={} failed={}",
            self.written, self.skipped, self.unchanged, self.failed
        )
    }
}

pub(crate) fn missing_field(nuclide: &str, field: &str) -> RenshapeError {
    RenshapeError::malformed_source(
        "PIPELINE.FIELD",
        format!("nuclide '{nuclide}' has no '{field}' field"),
    )
}
