//! Producers feeding the archive: the decay spectrum calculator, decay libraries
//! and per-nuclide record sources.

pub mod betashape;
pub mod calculator;
pub mod json;
pub mod library;

pub use betashape::{BetashapeCalculator, BetashapeError};
pub use calculator::{
    CalculatorOutput, CalculatorRequest, DecayParameters, DecaySpectrumCalculator,
    LevelParameters, TransitionResult, transitions_from_results,
};
pub use json::{JsonDecayLibrary, JsonRecordSource};
pub use library::{DecayEntry, DecayLibrary, DiscreteTransition, RecordSource, SourceRecord};
