//! Subcommands and the loaders they share.

pub mod calibrate;
pub mod estimate;
pub mod evaluate;
pub mod import;
pub mod params;

use std::path::Path;

use anyhow::{Context, Result, bail};
use inkcal::store::{JsonFileStore, load_merged};
use inkcal::{CalibrationFamily, CalibrationParameters, MeasuredSample, SampleImporter};

use crate::ParamsSource;

/// Parameters from a file, a merged store, or the defaults.
pub fn load_params(source: &ParamsSource) -> Result<CalibrationParameters> {
    if let Some(path) = &source.params {
        return CalibrationParameters::load(path)
            .with_context(|| format!("Failed to load parameters from {}", path.display()));
    }
    if let Some(dir) = &source.store {
        let store = JsonFileStore::open(dir)
            .with_context(|| format!("Failed to open store at {}", dir.display()))?;
        let merged = load_merged(&store, &CalibrationParameters::default());
        tracing::debug!(area = ?merged.area_source, "merged stored parameters");
        return Ok(merged.parameters);
    }
    tracing::info!("no parameters given, using defaults");
    Ok(CalibrationParameters::default())
}

/// Samples from a JSON array or a CSV file.
pub fn load_samples(path: &Path) -> Result<Vec<MeasuredSample>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    // Try JSON first
    if let Ok(samples) = serde_json::from_str::<Vec<MeasuredSample>>(&content) {
        return Ok(samples);
    }

    SampleImporter::auto_detect()
        .import_from(content.as_bytes())
        .with_context(|| format!("Failed to parse {} as JSON or CSV", path.display()))
}

/// Parse a store scope name. `combined` is `None`.
pub fn parse_scope(name: &str) -> Result<Option<CalibrationFamily>> {
    if name.trim().eq_ignore_ascii_case("combined") {
        return Ok(None);
    }
    match CalibrationFamily::from_str_loose(name) {
        Some(family) => Ok(Some(family)),
        None => bail!("Unknown scope '{name}' (expected combined, standard or special)"),
    }
}

/// Write pretty JSON to `path`, or to stdout when `path` is `None`.
pub fn write_json<T: serde::Serialize>(value: &T, path: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match path {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
            eprintln!("Saved to: {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
