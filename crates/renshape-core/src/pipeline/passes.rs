use super::config::RunConfig;
use super::{NuclideOutcome, PassSummary, missing_field};
use crate::adapters::{
    CalculatorOutput, CalculatorRequest, DecayEntry, DecayLibrary, DecayParameters,
    DecaySpectrumCalculator, TransitionResult, transitions_from_results,
};
use crate::archive::{
    ArchiveReader, ArchiveSession, ArchiveWriter, FieldMap, FieldValue, NuclideRecord, fields,
};
use crate::common::elements::{ENSDF_EXTENSION, NuclideId, ensdf_file_name};
use crate::domain::{ProvenanceState, ProvenanceTag, RenshapeError, RenshapeResult, Section};
use crate::spectrum::{SpectrumKind, continuum_spectrum};
use globset::Glob;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassOptions {
    pub kind: SpectrumKind,
    pub overwrite: bool,
    /// Grid step of continuum spectra (keV).
    pub energy_step: f64,
}

impl PassOptions {
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            kind: config.kind,
            overwrite: config.overwrite,
            energy_step: config.energy_step(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessSummary {
    pub decay_library: Option<PassSummary>,
    pub ensdf_fix: Option<PassSummary>,
}

/// Store the calculator settings the spectra of this run are computed with.
pub fn record_calculator_settings(writer: &ArchiveWriter, config: &RunConfig) -> RenshapeResult<()> {
    let mut settings = FieldMap::from([
        (fields::E_STEP.to_string(), FieldValue::Number(config.energy_step())),
        (
            fields::BETASHAPE_OPTIONS.to_string(),
            FieldValue::from(config.betashape_options.as_str()),
        ),
    ]);
    if let Some(version) = &config.betashape_version {
        settings.insert(
            fields::BETASHAPE_VERSION.to_string(),
            FieldValue::from(version.as_str()),
        );
    }
    writer.set_general_info(&settings)?;
    Ok(())
}

/// Compute spectra from the decay library for every eligible nuclide.
///
/// Discrete entries go through the calculator and are tagged `endf_b`; continuum
/// entries are interpolated onto the energy grid and tagged `endf_b_c`. The
/// archive is read once and persisted after each stored nuclide.
pub fn run_decay_library_pass(
    writer: &ArchiveWriter,
    library: &dyn DecayLibrary,
    calculator: &dyn DecaySpectrumCalculator,
    options: &PassOptions,
) -> RenshapeResult<PassSummary> {
    let mut session = ArchiveSession::open(writer.path())?;
    let mut summary = PassSummary::default();
    for index in 0..session.document().nuclides.len() {
        let name = session.document().nuclides[index].name.clone();
        let record = session.document().record_at(index);
        let outcome = record
            .map_err(RenshapeError::from)
            .and_then(|record| decay_library_nuclide(&mut session, library, calculator, options, &record));
        summary.record(&name, outcome)?;
    }
    info!(%summary, "decay-library pass finished");
    Ok(summary)
}

fn decay_library_nuclide(
    session: &mut ArchiveSession,
    library: &dyn DecayLibrary,
    calculator: &dyn DecaySpectrumCalculator,
    options: &PassOptions,
    record: &NuclideRecord,
) -> RenshapeResult<NuclideOutcome> {
    let state = record.state();
    if !state.eligible_for_decay_library(options.overwrite) {
        debug!(nuclide = %record.name, %state, "not eligible for the decay library");
        return Ok(NuclideOutcome::Skipped);
    }

    let nuclide = nuclide_id(record)?;
    let Some(entry) = library.lookup(nuclide.atomic_number, nuclide.mass_number, nuclide.metastable)?
    else {
        debug!(nuclide = %record.name, "no decay-library entry");
        return Ok(NuclideOutcome::Unchanged);
    };

    match entry {
        DecayEntry::Discrete(transitions) => {
            let q = record
                .q_value
                .map(|q| (q, record.q_uncertainty.unwrap_or(0.0)));
            let parameters = DecayParameters::from_discrete_transitions(
                &nuclide,
                &transitions,
                q,
                record.half_life_sec,
            )?;
            let output = calculator.evaluate(&CalculatorRequest::Parameters(parameters))?;
            // The synthesized input describes a single parent state.
            let Some(results) = first_state(&output) else {
                return Err(RenshapeError::external_tool(
                    "CALCULATOR.EMPTY",
                    format!("calculator returned no results for '{}'", record.name),
                ));
            };
            let data = transitions_from_results(results, options.kind)?;
            let emax = data.max_emax().unwrap_or(0.0);
            store_spectrum(session, &record.name, &data.to_fields(), ProvenanceTag::EndfB, emax)?;
        }
        DecayEntry::Continuum(points) => {
            let continuum = continuum_spectrum(&points, options.energy_step, options.kind)
                .ok_or_else(|| {
                    RenshapeError::malformed_source(
                        "LIBRARY.CONTINUUM",
                        format!("continuum table for '{}' is empty or has no area", record.name),
                    )
                })?;
            store_spectrum(
                session,
                &record.name,
                &continuum.to_fields(),
                ProvenanceTag::EndfBContinuum,
                continuum.emax,
            )?;
        }
    }
    Ok(NuclideOutcome::Written)
}

/// Replace spectra with ENSDF-based calculator results where an evaluated file
/// exists for the nuclide.
pub fn run_ensdf_fix_pass(
    writer: &ArchiveWriter,
    calculator: &dyn DecaySpectrumCalculator,
    ensdf_dir: &Path,
    options: &PassOptions,
) -> RenshapeResult<PassSummary> {
    let available = ensdf_files(ensdf_dir)?;
    debug!(files = available.len(), dir = %ensdf_dir.display(), "ENSDF files found");

    let mut session = ArchiveSession::open(writer.path())?;
    let mut summary = PassSummary::default();
    for index in 0..session.document().nuclides.len() {
        let name = session.document().nuclides[index].name.clone();
        let record = session.document().record_at(index);
        let outcome = record
            .map_err(RenshapeError::from)
            .and_then(|record| ensdf_nuclide(&mut session, calculator, ensdf_dir, &available, options, &record));
        summary.record(&name, outcome)?;
    }
    info!(%summary, "ENSDF fix-up pass finished");
    Ok(summary)
}

fn ensdf_nuclide(
    session: &mut ArchiveSession,
    calculator: &dyn DecaySpectrumCalculator,
    ensdf_dir: &Path,
    available: &BTreeSet<String>,
    options: &PassOptions,
    record: &NuclideRecord,
) -> RenshapeResult<NuclideOutcome> {
    let state = record.state();
    if !state.eligible_for_ensdf_fix(options.overwrite) {
        debug!(nuclide = %record.name, %state, "not eligible for the ENSDF fix-up");
        return Ok(NuclideOutcome::Skipped);
    }

    let file_name = ensdf_file_name(&record.name);
    if !available.contains(&file_name) {
        debug!(nuclide = %record.name, file = %file_name, "no ENSDF file");
        return Ok(NuclideOutcome::Unchanged);
    }

    let metastable = record.m.unwrap_or(0);
    let output = calculator.evaluate(&CalculatorRequest::LevelsFile(ensdf_dir.join(&file_name)))?;
    let Some(results) = output.get(&metastable) else {
        debug!(
            nuclide = %record.name,
            metastable,
            "ENSDF file has no decay for this state"
        );
        return Ok(NuclideOutcome::Unchanged);
    };

    let data = transitions_from_results(results, options.kind)?;
    let emax = data.max_emax().unwrap_or(0.0);
    store_spectrum(session, &record.name, &data.to_fields(), ProvenanceTag::Ensdf, emax)?;
    if matches!(state, ProvenanceState::Tagged(ProvenanceTag::EndfBContinuum)) {
        info!(nuclide = %record.name, "continuum spectrum replaced by ENSDF");
    }
    Ok(NuclideOutcome::Written)
}

/// Run the passes `config` enables: the decay-library pass when a library is
/// given, then the ENSDF fix-up when `fix` is set and an ENSDF directory is known.
pub fn process_archive(
    writer: &ArchiveWriter,
    config: &RunConfig,
    library: Option<&dyn DecayLibrary>,
    calculator: &dyn DecaySpectrumCalculator,
) -> RenshapeResult<ProcessSummary> {
    let options = PassOptions::from_config(config);
    ArchiveReader::open(writer.path())?;
    record_calculator_settings(writer, config)?;

    let mut summary = ProcessSummary::default();
    if let Some(library) = library {
        summary.decay_library = Some(run_decay_library_pass(writer, library, calculator, &options)?);
    }
    if config.fix {
        match &config.ensdf_dir {
            Some(ensdf_dir) => {
                summary.ensdf_fix = Some(run_ensdf_fix_pass(writer, calculator, ensdf_dir, &options)?);
            }
            None => debug!("no ENSDF directory configured, fix-up pass skipped"),
        }
    }
    Ok(summary)
}

/// Data and tag land in one write so a stored spectrum is never left untagged.
fn store_spectrum(
    session: &mut ArchiveSession,
    name: &str,
    data: &FieldMap,
    tag: ProvenanceTag,
    emax: f64,
) -> RenshapeResult<()> {
    let info = FieldMap::from([
        (fields::TAG.to_string(), FieldValue::from(tag.as_str())),
        (fields::EMAX.to_string(), FieldValue::Number(emax)),
    ]);
    session.write_nuclide(name, &[(Section::Data, data), (Section::Info, &info)])?;
    debug!(nuclide = name, %tag, emax, "spectrum stored");
    Ok(())
}

fn first_state(output: &CalculatorOutput) -> Option<&[TransitionResult]> {
    output
        .get(&0)
        .or_else(|| output.values().next())
        .map(Vec::as_slice)
}

/// Identity from `z`/`n`/`m`, or from the archive name when `n` was never stored.
fn nuclide_id(record: &NuclideRecord) -> RenshapeResult<NuclideId> {
    let z = record.z.ok_or_else(|| missing_field(&record.name, fields::Z))?;
    match record.n {
        Some(n) => Ok(NuclideId::new(z, z + n, record.m.unwrap_or(0))),
        None => NuclideId::parse(&record.name)
            .filter(|parsed| parsed.atomic_number == z)
            .ok_or_else(|| missing_field(&record.name, fields::N)),
    }
}

fn ensdf_files(ensdf_dir: &Path) -> RenshapeResult<BTreeSet<String>> {
    let matcher = Glob::new(&format!("*{ENSDF_EXTENSION}"))
        .map_err(|error| RenshapeError::internal("ENSDF.PATTERN", error.to_string()))?
        .compile_matcher();
    let read_error = |error: std::io::Error| {
        RenshapeError::input_validation(
            "ENSDF.DIR",
            format!("failed to list '{}': {error}", ensdf_dir.display()),
        )
    };

    let mut names = BTreeSet::new();
    for entry in fs::read_dir(ensdf_dir).map_err(read_error)? {
        let entry = entry.map_err(read_error)?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if matcher.is_match(&name) {
            names.insert(name);
        }
    }
    Ok(names)
}
