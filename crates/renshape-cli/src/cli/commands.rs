use super::CliError;
use super::helpers::*;
use renshape_core::adapters::{BetashapeCalculator, DecayLibrary, JsonDecayLibrary, JsonRecordSource};
use renshape_core::archive::{ArchiveWriter, EnergyWindow, FieldMap, FieldValue, fields};
use renshape_core::domain::{ProvenanceState, ProvenanceTag, RenshapeError};
use renshape_core::numerics::matrix_rows;
use renshape_core::pipeline::{RunConfig, ingest_records, load_run_config, process_archive};
use renshape_core::spectrum::{
    FissionWeighting, NormalizationPolicy, NuSpectraOptions, Reduction, SpectrumKind,
    WeightedSpectra, nu_spectra, reactor_spectrum,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(clap::Args)]
pub(super) struct IngestArgs {
    /// Archive file, created when missing
    #[arg(long)]
    archive: PathBuf,

    /// JSON file of per-nuclide records
    #[arg(long)]
    records: PathBuf,

    /// Run-wide metadata, repeatable
    #[arg(long = "info", value_name = "KEY=VALUE", value_parser = parse_info_pair)]
    info: Vec<(String, FieldValue)>,
}

#[derive(clap::Args)]
pub(super) struct ProcessArgs {
    /// Archive file
    #[arg(long)]
    archive: PathBuf,

    /// JSON run configuration; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON decay library
    #[arg(long)]
    decay_library: Option<PathBuf>,

    /// Directory of `<A><SYMBOL>.ensdf` files
    #[arg(long)]
    ensdf_dir: Option<PathBuf>,

    /// Directory betashape runs in
    #[arg(long)]
    betashape_dir: Option<PathBuf>,

    /// Betashape executable
    #[arg(long)]
    betashape_program: Option<PathBuf>,

    /// Options passed to betashape
    #[arg(long, allow_hyphen_values = true)]
    betashape_options: Option<String>,

    /// Betashape version recorded in the archive
    #[arg(long)]
    betashape_version: Option<String>,

    /// Spectrum to store: nu or beta
    #[arg(long)]
    kind: Option<SpectrumKind>,

    /// Skip the ENSDF fix-up pass
    #[arg(long)]
    no_fix: bool,

    /// Recompute nuclides that already have a spectrum
    #[arg(long)]
    overwrite: bool,
}

impl ProcessArgs {
    fn into_config(self) -> Result<(PathBuf, RunConfig), CliError> {
        let mut config = match &self.config {
            Some(path) => load_run_config(path).map_err(RenshapeError::from)?,
            None => RunConfig::default(),
        };
        if self.decay_library.is_some() {
            config.decay_library = self.decay_library;
        }
        if self.ensdf_dir.is_some() {
            config.ensdf_dir = self.ensdf_dir;
        }
        if self.betashape_dir.is_some() {
            config.betashape_dir = self.betashape_dir;
        }
        if self.betashape_program.is_some() {
            config.betashape_program = self.betashape_program;
        }
        if let Some(options) = self.betashape_options {
            config.betashape_options = options;
        }
        if self.betashape_version.is_some() {
            config.betashape_version = self.betashape_version;
        }
        if let Some(kind) = self.kind {
            config.kind = kind;
        }
        if self.no_fix {
            config.fix = false;
        }
        if self.overwrite {
            config.overwrite = true;
        }
        Ok((self.archive, config))
    }
}

#[derive(clap::Args)]
pub(super) struct SpectrumArgs {
    /// Archive file
    #[arg(long)]
    archive: PathBuf,

    /// Lower bound of the energy window (keV)
    #[arg(long, default_value_t = 0.0)]
    e_min: f64,

    /// Upper bound of the energy window (keV)
    #[arg(long, default_value_t = 12_000.0)]
    e_max: f64,

    /// Grid step (keV); defaults to the archive's E_step
    #[arg(long)]
    e_step: Option<f64>,

    /// Relative uncertainty used where none is known
    #[arg(long, default_value_t = 0.2)]
    default_unc: f64,

    /// Use stored uncertainties instead of propagating branching ratios
    #[arg(long)]
    no_br_unc: bool,

    /// Keep spectra unnormalized
    #[arg(long)]
    no_normalization: bool,

    /// Minimum integral for a spectrum to be rescaled to unit area
    #[arg(long, default_value_t = 0.99)]
    threshold: f64,

    /// JSON fission weighting; defaults to the four-isotope reactor mix
    #[arg(long)]
    weighting: Option<PathBuf>,

    /// Keep one weighted spectrum per nuclide
    #[arg(long)]
    per_nuclide: bool,

    /// JSON output path
    #[arg(long)]
    output: PathBuf,
}

#[derive(clap::Args)]
pub(super) struct ListArgs {
    /// Archive file
    #[arg(long)]
    archive: PathBuf,
}

pub(super) fn run_ingest_command(args: IngestArgs) -> Result<i32, CliError> {
    let writer = ArchiveWriter::new(&args.archive);
    let summary = ingest_records(&writer, &JsonRecordSource::new(&args.records))?;
    if !args.info.is_empty() {
        let info: FieldMap = args.info.into_iter().collect();
        writer.set_general_info(&info).map_err(RenshapeError::from)?;
    }
    println!("ingest: {summary}");
    Ok(0)
}

pub(super) fn run_process_command(args: ProcessArgs) -> Result<i32, CliError> {
    let (archive, config) = args.into_config()?;
    let Some(betashape_dir) = config.betashape_dir.clone() else {
        return Err(CliError::Usage(
            "a betashape directory is required (--betashape-dir or the config file)".to_string(),
        ));
    };
    let mut calculator = BetashapeCalculator::new(betashape_dir, config.betashape_options.clone());
    if let Some(program) = &config.betashape_program {
        calculator = calculator.with_program(program);
    }
    let library = config
        .decay_library
        .as_deref()
        .map(JsonDecayLibrary::load)
        .transpose()?;

    let writer = ArchiveWriter::new(&archive);
    let summary = process_archive(
        &writer,
        &config,
        library.as_ref().map(|library| library as &dyn DecayLibrary),
        &calculator,
    )?;
    if let Some(pass) = summary.decay_library {
        println!("decay-library: {pass}");
    }
    if let Some(pass) = summary.ensdf_fix {
        println!("ensdf-fix: {pass}");
    }
    Ok(0)
}

#[derive(Serialize)]
struct SpectrumReport {
    energies: Vec<f64>,
    nuclides: Vec<String>,
    missing: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    spectrum: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uncertainty: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    spectra: Option<Vec<Vec<f64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uncertainties: Option<Vec<Vec<f64>>>,
}

pub(super) fn run_spectrum_command(args: SpectrumArgs) -> Result<i32, CliError> {
    let document = load_archive(&args.archive)?;
    let weighting = match &args.weighting {
        Some(path) => read_json_file::<FissionWeighting>(path)?,
        None => FissionWeighting::reactor_default(),
    };
    let options = NuSpectraOptions {
        window: EnergyWindow {
            e_min: args.e_min,
            e_max: args.e_max,
            e_step: args.e_step,
        },
        branching_ratio_uncertainty: !args.no_br_unc,
        default_uncertainty: args.default_unc,
        normalization: (!args.no_normalization).then(|| NormalizationPolicy::new(args.threshold)),
    };

    let nu = nu_spectra(&document, &options)?;
    let reduction = if args.per_nuclide {
        Reduction::PerNuclide
    } else {
        Reduction::Summed
    };
    let weighted = reactor_spectrum(&document, &nu, &weighting, reduction);

    let name_of = |index: &usize| document.nuclides[*index].name.clone();
    let mut report = SpectrumReport {
        energies: nu.energies.clone(),
        nuclides: nu.present.iter().map(name_of).collect(),
        missing: nu.absent.iter().map(name_of).collect(),
        spectrum: None,
        uncertainty: None,
        spectra: None,
        uncertainties: None,
    };
    match weighted {
        WeightedSpectra::Summed {
            spectrum,
            uncertainty,
        } => {
            report.spectrum = Some(spectrum);
            report.uncertainty = Some(uncertainty);
        }
        WeightedSpectra::PerNuclide {
            spectra,
            uncertainties,
        } => {
            report.spectra = Some(matrix_rows(&spectra));
            report.uncertainties = Some(matrix_rows(&uncertainties));
        }
    }

    write_json_output(&args.output, &report)?;
    println!(
        "spectrum: {} nuclides, {} without spectrum, {} energies -> {}",
        report.nuclides.len(),
        report.missing.len(),
        report.energies.len(),
        args.output.display()
    );
    Ok(0)
}

pub(super) fn run_list_command(args: ListArgs) -> Result<i32, CliError> {
    let document = load_archive(&args.archive)?;
    let z = document.parameter_across_all(fields::Z, f64::NAN);
    let tags = document.text_parameter_across_all(fields::TAG, "");

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for ((entry, z), tag) in document.nuclides.iter().zip(&z).zip(&tags) {
        let state = ProvenanceState::resolve(!z.is_nan(), ProvenanceTag::parse(tag));
        println!("{}\t{}", entry.name, state);
        *counts.entry(state.to_string()).or_default() += 1;
    }

    let breakdown = counts
        .iter()
        .map(|(state, count)| format!("{state}={count}"))
        .collect::<Vec<_>>()
        .join(" ");
    println!("nuclides={} {breakdown}", document.nuclides.len());
    Ok(0)
}
