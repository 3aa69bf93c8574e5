//! Parameter file utilities.

use std::path::Path;

use anyhow::{Context, Result, bail};
use inkcal::params::{MergedParameters, validate_scoped};
use inkcal::store::{JsonFileStore, load_merged};
use inkcal::{CalibrationFamily, CalibrationParameters, Channel};

use super::write_json;
use crate::ParamsAction;

pub fn run(action: ParamsAction) -> Result<()> {
    match action {
        ParamsAction::Defaults { output } => {
            write_json(&CalibrationParameters::default(), output.as_deref())
        }
        ParamsAction::Validate { input, family } => {
            let family = family
                .as_deref()
                .map(str::parse::<CalibrationFamily>)
                .transpose()?;
            validate_file(&input, family)
        }
        ParamsAction::Merge { store, output } => {
            let store = JsonFileStore::open(&store)
                .with_context(|| format!("Failed to open store at {}", store.display()))?;
            let merged = load_merged(&store, &CalibrationParameters::default());
            print_sources(&merged);
            write_json(&merged.parameters, output.as_deref())
        }
    }
}

fn validate_file(path: &Path, family: Option<CalibrationFamily>) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let params: CalibrationParameters = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    match validate_scoped(params, family) {
        Ok(_) => {
            println!("{}: ok", path.display());
            Ok(())
        }
        Err(e) => {
            for violation in &e.violations {
                println!("  {violation}");
            }
            bail!(
                "{} has {} violation(s)",
                path.display(),
                e.violations.len()
            )
        }
    }
}

fn print_sources(merged: &MergedParameters) {
    eprintln!("Sources:");
    for channel in Channel::ALL {
        eprintln!("  {:<10} {:?}", channel, merged.channel_sources.get(channel));
    }
    eprintln!("  {:<10} {:?}", "area", merged.area_source);
}
