//! Betashape subprocess adapter.
//!
//! Betashape reads an ENSDF file from its own directory and writes result
//! directories next to it. Each evaluation copies the input there, runs the
//! program, moves everything the run created into a scoped work directory and
//! parses the result files from it.

pub mod input;
pub mod output;

use super::calculator::{CalculatorOutput, CalculatorRequest, DecaySpectrumCalculator};
use crate::common::uncertainty::UncertaintyError;
use crate::domain::{RenshapeError, RenshapeResult};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use tracing::{debug, warn};

pub const DEFAULT_PROGRAM: &str = "betashape";
pub const DEFAULT_OPTIONS: &str = "myEstep=1 nu=1";
const GENERATED_INPUT_NAME: &str = "dummy.ensdf";

#[derive(Debug, thiserror::Error)]
pub enum BetashapeError {
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("betashape exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("'{}' already exists in the betashape directory", path.display())]
    StagingConflict { path: PathBuf },
    #[error("malformed betashape result '{}': {message}", path.display())]
    MalformedResult { path: PathBuf, message: String },
    #[error("invalid glob pattern: {message}")]
    Pattern { message: String },
    #[error("no element with atomic number {atomic_number}")]
    UnknownElement { atomic_number: u32 },
    #[error("decay entry has no transitions")]
    NoTransitions,
    #[error("transition type '{transition_type}' has no daughter spin-parity mapping")]
    UnsupportedTransition { transition_type: String },
    #[error("invalid decay parameter: {message}")]
    InvalidParameter { message: String },
    #[error(transparent)]
    Uncertainty(#[from] UncertaintyError),
}

impl From<BetashapeError> for RenshapeError {
    fn from(error: BetashapeError) -> Self {
        let message = error.to_string();
        match error {
            BetashapeError::Io { .. } => RenshapeError::external_tool("BETASHAPE.IO", message),
            BetashapeError::Spawn { .. } => RenshapeError::external_tool("BETASHAPE.SPAWN", message),
            BetashapeError::Failed { .. } => RenshapeError::external_tool("BETASHAPE.EXIT", message),
            BetashapeError::StagingConflict { .. } => {
                RenshapeError::external_tool("BETASHAPE.STAGING", message)
            }
            BetashapeError::MalformedResult { .. } => {
                RenshapeError::external_tool("BETASHAPE.RESULT", message)
            }
            BetashapeError::Pattern { .. } => RenshapeError::internal("BETASHAPE.PATTERN", message),
            BetashapeError::UnknownElement { .. }
            | BetashapeError::NoTransitions
            | BetashapeError::UnsupportedTransition { .. }
            | BetashapeError::InvalidParameter { .. }
            | BetashapeError::Uncertainty(_) => {
                RenshapeError::malformed_source("BETASHAPE.INPUT", message)
            }
        }
    }
}

/// Energy step (keV) selected by a `myEstep=<value>` option.
pub fn energy_step_from_options(options: &str) -> Option<f64> {
    options
        .split_whitespace()
        .find_map(|option| option.strip_prefix("myEstep="))
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|step| *step > 0.0)
}

#[derive(Debug, Clone)]
pub struct BetashapeCalculator {
    program: PathBuf,
    betashape_dir: PathBuf,
    options: String,
}

impl BetashapeCalculator {
    pub fn new(betashape_dir: impl Into<PathBuf>, options: impl Into<String>) -> Self {
        Self {
            program: PathBuf::from(DEFAULT_PROGRAM),
            betashape_dir: betashape_dir.into(),
            options: options.into(),
        }
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn options(&self) -> &str {
        &self.options
    }

    fn run(&self, source: &Path, work_dir: &Path) -> Result<(), BetashapeError> {
        let file_name = source
            .file_name()
            .ok_or_else(|| BetashapeError::InvalidParameter {
                message: format!("'{}' has no file name", source.display()),
            })?;

        let before = list_entries(&self.betashape_dir)?;
        let staged = self.betashape_dir.join(file_name);
        if !same_file(source, &staged) {
            // Everything created in the directory is moved out after the run.
            if staged.exists() {
                return Err(BetashapeError::StagingConflict { path: staged });
            }
            fs::copy(source, &staged).map_err(|source| BetashapeError::Io {
                path: staged.clone(),
                source,
            })?;
        }

        debug!(
            program = %self.program.display(),
            input = %file_name.to_string_lossy(),
            options = %self.options,
            "running betashape"
        );
        let output = Command::new(&self.program)
            .arg(file_name)
            .args(self.options.split_whitespace())
            .current_dir(&self.betashape_dir)
            .output()
            .map_err(|source| BetashapeError::Spawn {
                program: self.program.display().to_string(),
                source,
            });

        // Created entries are moved out even when the run failed.
        let after = list_entries(&self.betashape_dir)?;
        for created in after.difference(&before) {
            let from = self.betashape_dir.join(created);
            let to = work_dir.join(created);
            move_entry(&from, &to)?;
        }

        let output = output?;
        if !output.status.success() {
            return Err(BetashapeError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    fn collect(work_dir: &Path) -> Result<CalculatorOutput, BetashapeError> {
        let mut collected = CalculatorOutput::new();
        for name in list_entries(work_dir)? {
            let path = work_dir.join(&name);
            if !path.is_dir() {
                continue;
            }
            let Some(index) = output::metastable_index(&name) else {
                warn!(directory = %name, "cannot infer metastable state, ignoring");
                continue;
            };
            collected.insert(index, output::read_result_directory(&path)?);
        }
        Ok(collected)
    }
}

impl DecaySpectrumCalculator for BetashapeCalculator {
    fn evaluate(&self, request: &CalculatorRequest) -> RenshapeResult<CalculatorOutput> {
        let work = TempDir::new().map_err(|source| BetashapeError::Io {
            path: std::env::temp_dir(),
            source,
        })?;
        let input_dir = TempDir::new().map_err(|source| BetashapeError::Io {
            path: std::env::temp_dir(),
            source,
        })?;

        let source = match request {
            CalculatorRequest::Parameters(parameters) => {
                let path = input_dir.path().join(GENERATED_INPUT_NAME);
                fs::write(&path, parameters.to_ensdf()).map_err(|source| BetashapeError::Io {
                    path: path.clone(),
                    source,
                })?;
                path
            }
            CalculatorRequest::LevelsFile(path) => path.clone(),
        };

        self.run(&source, work.path())?;
        Ok(Self::collect(work.path())?)
    }
}

fn list_entries(directory: &Path) -> Result<BTreeSet<String>, BetashapeError> {
    let io_error = |source| BetashapeError::Io {
        path: directory.to_path_buf(),
        source,
    };
    let mut names = BTreeSet::new();
    for entry in fs::read_dir(directory).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        names.insert(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}

fn same_file(left: &Path, right: &Path) -> bool {
    match (fs::canonicalize(left), fs::canonicalize(right)) {
        (Ok(left), Ok(right)) => left == right,
        _ => false,
    }
}

/// Rename, falling back to copy-and-delete across file systems.
fn move_entry(from: &Path, to: &Path) -> Result<(), BetashapeError> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    let io_error = |source| BetashapeError::Io {
        path: from.to_path_buf(),
        source,
    };
    if from.is_dir() {
        fs::create_dir_all(to).map_err(io_error)?;
        for entry in fs::read_dir(from).map_err(io_error)? {
            let entry = entry.map_err(io_error)?;
            move_entry(&entry.path(), &to.join(entry.file_name()))?;
        }
        fs::remove_dir(from).map_err(io_error)
    } else {
        fs::copy(from, to).map_err(io_error)?;
        fs::remove_file(from).map_err(io_error)
    }
}

#[cfg(test)]
mod tests {
    use super::{BetashapeCalculator, BetashapeError, energy_step_from_options};
    use crate::domain::{ErrorCategory, RenshapeError};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn energy_step_is_read_from_options() {
        assert_eq!(energy_step_from_options("myEstep=1 nu=1"), Some(1.0));
        assert_eq!(energy_step_from_options("nu=1 myEstep=2.5"), Some(2.5));
        assert_eq!(energy_step_from_options("nu=1"), None);
        assert_eq!(energy_step_from_options("myEstep=0"), None);
    }

    #[test]
    fn tool_failures_are_per_nuclide_errors() {
        let error = RenshapeError::from(BetashapeError::Failed {
            status: "exit status: 1".to_string(),
            stderr: "segfault".to_string(),
        });
        assert_eq!(error.category(), ErrorCategory::ExternalToolFailure);
        assert!(error.category().is_per_nuclide());

        let error = RenshapeError::from(BetashapeError::NoTransitions);
        assert_eq!(error.category(), ErrorCategory::MalformedSource);
    }

    #[test]
    fn existing_files_in_the_betashape_directory_are_not_replaced() {
        let temp = TempDir::new().expect("tempdir should be created");
        let betashape_dir = temp.path().join("betashape");
        let input_dir = temp.path().join("input");
        let work_dir = temp.path().join("work");
        for directory in [&betashape_dir, &input_dir, &work_dir] {
            fs::create_dir(directory).expect("directory");
        }
        fs::write(betashape_dir.join("135XE.ensdf"), "kept").expect("existing file");
        fs::write(input_dir.join("135XE.ensdf"), "levels").expect("input file");

        let calculator = BetashapeCalculator::new(&betashape_dir, "myEstep=1")
            .with_program(temp.path().join("no-such-program"));
        let error = calculator
            .run(&input_dir.join("135XE.ensdf"), &work_dir)
            .expect_err("name is taken");
        assert!(matches!(error, BetashapeError::StagingConflict { .. }));
        assert_eq!(
            fs::read_to_string(betashape_dir.join("135XE.ensdf")).expect("read"),
            "kept"
        );
        assert!(fs::read_dir(&work_dir).expect("work dir").next().is_none());

        let error = RenshapeError::from(error);
        assert_eq!(error.category(), ErrorCategory::ExternalToolFailure);
    }
}
