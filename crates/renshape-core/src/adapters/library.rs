use crate::archive::FieldMap;
use crate::domain::{RenshapeResult, Section};
use crate::spectrum::ContinuumPoint;
use serde::{Deserialize, Serialize};

/// One tabulated beta branch of a decay library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscreteTransition {
    /// End-point energy (MeV).
    pub energy: f64,
    #[serde(default)]
    pub energy_uncertainty: f64,
    /// Branching fraction (0..1).
    pub intensity: f64,
    #[serde(default)]
    pub intensity_uncertainty: f64,
    /// `a`, `1u`, `2u` or `3u`.
    #[serde(rename = "type")]
    pub transition_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecayEntry {
    Discrete(Vec<DiscreteTransition>),
    Continuum(Vec<ContinuumPoint>),
}

/// Decay data keyed by (Z, A, metastable index).
pub trait DecayLibrary {
    fn lookup(&self, z: u32, a: u32, m: u32) -> RenshapeResult<Option<DecayEntry>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    pub name: String,
    pub section: Section,
    pub fields: FieldMap,
}

/// A producer of per-nuclide fields (fission yields, Q-values, half-lives).
///
/// The outer error fails the whole source; inner errors belong to one record and
/// are skipped by the ingest pass.
pub trait RecordSource {
    fn read_records(&self) -> RenshapeResult<Vec<RenshapeResult<SourceRecord>>>;

    /// Run-wide metadata stored alongside the records.
    fn general_info(&self) -> FieldMap {
        FieldMap::new()
    }
}
