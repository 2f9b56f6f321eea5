pub mod errors;

pub use errors::{ErrorCategory, RenshapeError, RenshapeResult};

use std::fmt::{Display, Formatter};

/// Sub-group of a nuclide record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Info,
    Data,
}

impl Section {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Data => "data",
        }
    }
}

impl Display for Section {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// Which source last produced the spectrum of a nuclide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProvenanceTag {
    /// Discrete ENDF/B transitions processed by the spectrum calculator.
    EndfB,
    /// Theoretical ENDF/B continuum spectrum.
    EndfBContinuum,
    /// Evaluated ENSDF levels processed by the spectrum calculator.
    Ensdf,
}

impl ProvenanceTag {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EndfB => "endf_b",
            Self::EndfBContinuum => "endf_b_c",
            Self::Ensdf => "ensdf",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "endf_b" => Some(Self::EndfB),
            "endf_b_c" => Some(Self::EndfBContinuum),
            "ensdf" => Some(Self::Ensdf),
            _ => None,
        }
    }
}

impl Display for ProvenanceTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProvenanceState {
    /// No fission yield known (`z` absent). Terminal.
    NoYield,
    /// Yield known, no spectrum yet.
    Unprocessed,
    Tagged(ProvenanceTag),
}

impl ProvenanceState {
    pub fn resolve(has_yield: bool, tag: Option<ProvenanceTag>) -> Self {
        match (has_yield, tag) {
            (false, _) => Self::NoYield,
            (true, None) => Self::Unprocessed,
            (true, Some(tag)) => Self::Tagged(tag),
        }
    }

    pub const fn tag(self) -> Option<ProvenanceTag> {
        match self {
            Self::Tagged(tag) => Some(tag),
            _ => None,
        }
    }

    /// Whether the decay-library pass should (re)compute this record.
    pub const fn eligible_for_decay_library(self, overwrite: bool) -> bool {
        match self {
            Self::NoYield => false,
            Self::Unprocessed => true,
            Self::Tagged(_) => overwrite,
        }
    }

    /// Whether the ENSDF fix-up pass should try to replace this record's spectrum.
    ///
    /// Continuum spectra are always eligible; `endf_b` and `ensdf` spectra only when
    /// overwrite is forced.
    pub const fn eligible_for_ensdf_fix(self, overwrite: bool) -> bool {
        match self {
            Self::NoYield => false,
            Self::Unprocessed => true,
            Self::Tagged(ProvenanceTag::EndfBContinuum) => true,
            Self::Tagged(ProvenanceTag::EndfB | ProvenanceTag::Ensdf) => overwrite,
        }
    }
}

impl Display for ProvenanceState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoYield => f.write_str("no-yield"),
            Self::Unprocessed => f.write_str("unprocessed"),
            Self::Tagged(tag) => write!(f, "tagged:{tag}"),
        }
    }
}
