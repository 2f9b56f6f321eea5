//! The nuclide data archive: one JSON document per analysis run holding run-wide
//! metadata and one `info`/`data` record per nuclide.

pub mod document;
pub mod reader;
pub mod record;
pub mod store;
pub mod value;

pub use document::{ArchiveDocument, NuclideEntry};
pub use reader::{ArchiveReader, DataMatrix, EnergyWindow};
pub use record::NuclideRecord;
pub use store::{ArchiveSession, ArchiveWriter};
pub use value::{FieldMap, FieldValue};

use crate::domain::RenshapeError;
use std::path::PathBuf;

pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Well-known field names.
pub mod fields {
    pub const Z: &str = "z";
    pub const N: &str = "n";
    pub const M: &str = "m";
    pub const Q: &str = "Q";
    pub const UNC_Q: &str = "unc_Q";
    pub const HALF_LIFE_SEC: &str = "half_life_sec";
    pub const TAG: &str = "tag";
    pub const EMAX: &str = "Emax";

    pub const TRANSITION_EMAX: &str = "transition_Emax";
    pub const TRANSITION_INTENSITY: &str = "transition_intensity";
    pub const TRANSITION_UNC_INTENSITY: &str = "transition_unc_intensity";
    pub const TRANSITION_DN_DE: &str = "transition_dN_dE";
    pub const TRANSITION_UNC_DN_DE: &str = "transition_unc_dN_dE";
    pub const TRANSITION_TYPE: &str = "transition_type";
    pub const DN_DE_TOT: &str = "dN_dE_tot";
    pub const UNC_DN_DE: &str = "unc_dN_dE";
    pub const DN_DE_TOT_CONTINUUM: &str = "dN_dE_tot_c";

    pub const E_STEP: &str = "E_step";
    pub const JEFF_RELEASE: &str = "JEFF_release";
    pub const BETASHAPE_OPTIONS: &str = "Betashape_options";
    pub const BETASHAPE_VERSION: &str = "Betashape_version";
}

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("failed to read archive '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse archive '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode archive '{}': {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write archive '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("nuclide name must not be empty")]
    EmptyName,
    #[error("nuclide '{name}' is not in the archive")]
    NuclideNotFound { name: String },
    #[error("nuclide index {index} is out of range for {count} nuclides")]
    IndexOutOfRange { index: usize, count: usize },
    #[error("archive has no general info field '{field}'")]
    MissingGeneralInfo { field: String },
    #[error("field '{field}' of nuclide '{name}' is {actual}, expected {expected}")]
    FieldType {
        name: String,
        field: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("invalid energy window: {message}")]
    InvalidEnergyWindow { message: String },
}

impl ArchiveError {
    pub const fn placeholder(&self) -> &'static str {
        match self {
            Self::Read { .. } => "ARCHIVE.READ",
            Self::Parse { .. } => "ARCHIVE.PARSE",
            Self::Encode { .. } => "ARCHIVE.ENCODE",
            Self::Write { .. } => "ARCHIVE.WRITE",
            Self::EmptyName => "ARCHIVE.NAME",
            Self::NuclideNotFound { .. } | Self::IndexOutOfRange { .. } => "ARCHIVE.NOT_FOUND",
            Self::MissingGeneralInfo { .. } => "ARCHIVE.GENERAL_INFO",
            Self::FieldType { .. } => "ARCHIVE.FIELD_TYPE",
            Self::InvalidEnergyWindow { .. } => "ARCHIVE.ENERGY_WINDOW",
        }
    }
}

impl From<ArchiveError> for RenshapeError {
    fn from(error: ArchiveError) -> Self {
        let placeholder = error.placeholder();
        let message = error.to_string();
        match error {
            ArchiveError::Read { .. }
            | ArchiveError::Parse { .. }
            | ArchiveError::Encode { .. }
            | ArchiveError::Write { .. } => RenshapeError::store_io(placeholder, message),
            ArchiveError::NuclideNotFound { .. }
            | ArchiveError::IndexOutOfRange { .. }
            | ArchiveError::MissingGeneralInfo { .. } => {
                RenshapeError::not_found(placeholder, message)
            }
            ArchiveError::FieldType { .. } => RenshapeError::malformed_source(placeholder, message),
            ArchiveError::EmptyName | ArchiveError::InvalidEnergyWindow { .. } => {
                RenshapeError::input_validation(placeholder, message)
            }
        }
    }
}
