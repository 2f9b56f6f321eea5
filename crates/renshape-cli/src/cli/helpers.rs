use super::CliError;
use anyhow::Context;
use renshape_core::archive::{ArchiveDocument, ArchiveReader, FieldValue};
use renshape_core::domain::RenshapeError;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// `KEY=VALUE`; numeric values are stored as numbers, everything else as text.
pub(super) fn parse_info_pair(raw: &str) -> Result<(String, FieldValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    let value = value.trim();
    let field = match value.parse::<f64>() {
        Ok(number) => FieldValue::Number(number),
        Err(_) => FieldValue::from(value),
    };
    Ok((key.to_string(), field))
}

pub(super) fn load_archive(path: &Path) -> Result<ArchiveDocument, CliError> {
    let document = ArchiveReader::open(path)
        .and_then(|reader| reader.snapshot())
        .map_err(RenshapeError::from)?;
    Ok(document)
}

pub(super) fn write_json_output(path: &Path, value: &impl Serialize) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    let mut text = serde_json::to_string_pretty(value).context("failed to encode output")?;
    text.push('\n');
    fs::write(path, text).with_context(|| format!("failed to write '{}'", path.display()))?;
    Ok(())
}

pub(super) fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let source = fs::read_to_string(path).map_err(|error| {
        RenshapeError::input_validation(
            "INPUT.CLI_FILE",
            format!("failed to read '{}': {error}", path.display()),
        )
    })?;
    let value = serde_json::from_str(&source).map_err(|error| {
        RenshapeError::input_validation(
            "INPUT.CLI_FILE",
            format!("failed to parse '{}': {error}", path.display()),
        )
    })?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::parse_info_pair;
    use renshape_core::archive::FieldValue;

    #[test]
    fn info_pairs_keep_numbers_numeric() {
        assert_eq!(
            parse_info_pair("E_step=50").expect("pair"),
            ("E_step".to_string(), FieldValue::Number(50.0))
        );
        assert_eq!(
            parse_info_pair("JEFF_release = 3.3.1").expect("pair"),
            ("JEFF_release".to_string(), FieldValue::from("3.3.1"))
        );
        assert!(parse_info_pair("no-separator").is_err());
        assert!(parse_info_pair("=1").is_err());
    }
}
