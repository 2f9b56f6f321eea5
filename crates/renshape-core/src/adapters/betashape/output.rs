//! Readers for the text files Betashape leaves behind.

use super::BetashapeError;
use crate::adapters::calculator::TransitionResult;
use crate::common::uncertainty::{parse_shorthand, std_to_digits};
use globset::{Glob, GlobMatcher};
use std::fs;
use std::path::{Path, PathBuf};

const TABLE_HEADER_PREFIX: &str = "E(keV)";
const INTENSITY_MARKER: &str = "Intensity: ";
const STEP_MARKER: &str = "_myEstep";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultHeader {
    /// Every header line, the column-label line included.
    pub lines: Vec<String>,
    pub labels: Vec<String>,
}

/// Files are Latin-1 encoded.
pub fn read_latin1(path: &Path) -> Result<String, BetashapeError> {
    let bytes = fs::read(path).map_err(|source| BetashapeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(bytes.iter().map(|&byte| char::from(byte)).collect())
}

/// Header lines up to and including the one starting with `E(keV)`.
pub fn parse_header(text: &str, path: &Path) -> Result<ResultHeader, BetashapeError> {
    let mut lines = Vec::new();
    for line in text.lines() {
        lines.push(line.to_string());
        let compact: String = line.chars().filter(|c| *c != ' ').collect();
        if compact.starts_with(TABLE_HEADER_PREFIX) {
            let labels = line
                .split("  ")
                .map(|label| label.replace(' ', ""))
                .filter(|label| !label.is_empty())
                .collect();
            return Ok(ResultHeader { lines, labels });
        }
    }
    Err(BetashapeError::MalformedResult {
        path: path.to_path_buf(),
        message: format!("no '{TABLE_HEADER_PREFIX}' header line"),
    })
}

fn parse_row(line: &str, path: &Path) -> Result<Vec<f64>, BetashapeError> {
    line.split_whitespace()
        .map(|token| {
            token.parse::<f64>().map_err(|_| BetashapeError::MalformedResult {
                path: path.to_path_buf(),
                message: format!("non-numeric value '{token}'"),
            })
        })
        .collect()
}

/// Electron and antineutrino tables of one result file.
///
/// The electron block follows the header up to the first blank line; the
/// antineutrino block starts two lines after the last blank line.
pub fn parse_tables(text: &str, path: &Path) -> Result<(ResultHeader, Vec<Vec<f64>>, Vec<Vec<f64>>), BetashapeError> {
    let header = parse_header(text, path)?;
    let lines: Vec<&str> = text.lines().collect();
    let body_start = header.lines.len();

    let blanks: Vec<usize> = lines
        .iter()
        .enumerate()
        .skip(body_start + 1)
        .filter(|(_, line)| line.trim().is_empty())
        .map(|(index, _)| index)
        .collect();
    let (Some(&first_blank), Some(&last_blank)) = (blanks.first(), blanks.last()) else {
        return Err(BetashapeError::MalformedResult {
            path: path.to_path_buf(),
            message: "no blank line separating the electron and antineutrino tables".to_string(),
        });
    };

    let parse_block = |block: &[&str]| -> Result<Vec<Vec<f64>>, BetashapeError> {
        block
            .iter()
            .filter(|line| !line.trim().is_empty())
            .map(|line| parse_row(line, path))
            .collect()
    };
    let electron = parse_block(&lines[body_start..first_blank])?;
    let antineutrino_start = (last_blank + 2).min(lines.len());
    let antineutrino = parse_block(&lines[antineutrino_start..])?;

    Ok((header, electron, antineutrino))
}

/// Metastable index encoded in a result directory name: `X_k` is state `k + 1`,
/// a trailing `m` is state 1, anything else the ground state.
pub fn metastable_index(directory_name: &str) -> Option<u32> {
    if let Some((_, suffix)) = directory_name.split_once('_') {
        return suffix.trim().parse::<u32>().ok().map(|index| index + 1);
    }
    if directory_name.ends_with('m') {
        Some(1)
    } else {
        Some(0)
    }
}

/// `(intensity, shorthand digits)` from the last `Intensity: v(d)` line. A value
/// without parenthesis has zero digits.
///
/// The digits are re-expressed against the stored `f64`, so `60.0(5)` yields
/// `(60.0, 0.5)` and `shorthand_to_std` gives back 0.5.
pub fn intensity_from_diagnostics(lines: &[String]) -> Option<(f64, f64)> {
    let mut found = None;
    for line in lines {
        let Some(position) = line.find(INTENSITY_MARKER) else {
            continue;
        };
        let rest = line[position + INTENSITY_MARKER.len()..].trim();
        let notation = match rest.find(')') {
            Some(close) => &rest[..=close],
            None => rest.split_whitespace().next().unwrap_or(rest),
        };
        let parsed = parse_shorthand(notation).ok().map(|measurement| {
            let digits = measurement
                .std_dev
                .map_or(0.0, |std_dev| std_to_digits(measurement.value, std_dev));
            (measurement.value, digits)
        });
        if parsed.is_some() {
            found = parsed;
        }
    }
    found
}

/// Transition type from the calculation log: `a`, `<n>u` or `<n>nu`. Later lines win.
pub fn transition_type_from_diagnostics(lines: &[String]) -> String {
    let first_number = |line: &str| -> Option<String> {
        let start = line.find(|c: char| c.is_ascii_digit())?;
        let digits: String = line[start..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        Some(digits)
    };

    let mut transition_type = String::new();
    for line in lines {
        if line.contains("forbidden non-unique") {
            if let Some(order) = first_number(line) {
                transition_type = format!("{order}nu");
            }
        } else if line.contains("forbidden unique") {
            if let Some(order) = first_number(line) {
                transition_type = format!("{order}u");
            }
        } else if line.contains("allowed") {
            transition_type = "a".to_string();
        }
    }
    transition_type
}

fn result_file_matcher() -> Result<GlobMatcher, BetashapeError> {
    Glob::new("*trans*myEstep*")
        .map(|glob| glob.compile_matcher())
        .map_err(|error| BetashapeError::Pattern {
            message: error.to_string(),
        })
}

/// Parse every `*trans*myEstep*` file of one result directory, in name order.
pub fn read_result_directory(directory: &Path) -> Result<Vec<TransitionResult>, BetashapeError> {
    let matcher = result_file_matcher()?;
    let entries = fs::read_dir(directory).map_err(|source| BetashapeError::Io {
        path: directory.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| BetashapeError::Io {
            path: directory.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| matcher.is_match(name));
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    files
        .iter()
        .map(|path| {
            let text = read_latin1(path)?;
            let (header, electron, antineutrino) = parse_tables(&text, path)?;
            let diagnostics = diagnostics_for(path)?;
            Ok(TransitionResult {
                labels: header.labels,
                electron,
                antineutrino,
                diagnostics,
            })
        })
        .collect()
}

/// Header of the sibling file without `_myEstep`, which carries the calculation log.
fn diagnostics_for(result_file: &Path) -> Result<Vec<String>, BetashapeError> {
    let Some(name) = result_file.file_name().and_then(|name| name.to_str()) else {
        return Ok(Vec::new());
    };
    let sibling = result_file.with_file_name(name.replacen(STEP_MARKER, "", 1));
    if !sibling.is_file() {
        return Ok(Vec::new());
    }
    let text = read_latin1(&sibling)?;
    Ok(parse_header(&text, &sibling)?.lines)
}
