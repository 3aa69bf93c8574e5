//! Calibrate command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use inkcal::calibration::{AccuracyReport, FactorStatus};
use inkcal::store::{JsonFileStore, save_verified, scope_name};
use inkcal::{CalibrationConfig, CalibrationParameters, Calibrator};

use super::{load_params, load_samples, parse_scope, write_json};
use crate::ParamsSource;

pub fn run(
    samples: PathBuf,
    source: &ParamsSource,
    config: Option<PathBuf>,
    parallel: bool,
    output: Option<PathBuf>,
    report: Option<PathBuf>,
    save_scope: Option<&str>,
) -> Result<()> {
    let mut config = match config {
        Some(path) => CalibrationConfig::load(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => CalibrationConfig::default(),
    };
    config.parallel |= parallel;
    let calibrator = Calibrator::new(config)?;

    let samples = load_samples(&samples)?;
    let initial = load_params(source)?;
    println!("Loaded {} samples", samples.len());

    let outcome = calibrator.calibrate(&samples, &initial)?;
    print_report(&outcome.report);

    if let Some(path) = output {
        write_parameters(&outcome.parameters, &path)?;
    }
    if let Some(path) = report {
        write_json(&outcome.report, Some(&path))?;
    }

    if let (Some(scope), Some(dir)) = (save_scope, &source.store) {
        let family = parse_scope(scope)?;
        let store = JsonFileStore::open(dir)
            .with_context(|| format!("Failed to open store at {}", dir.display()))?;
        save_verified(&store, &outcome.parameters, family).with_context(|| {
            format!("Failed to save {} parameters", scope_name(family))
        })?;
        println!("Saved {} parameters to {}", scope_name(family), store.dir().display());
    }

    Ok(())
}

/// Save calibrated parameters, refusing a set that still violates its bands.
fn write_parameters(params: &CalibrationParameters, path: &Path) -> Result<()> {
    params.save(path).with_context(|| {
        format!(
            "Refusing to write {}: calibrated parameters are not valid",
            path.display()
        )
    })?;
    eprintln!("Saved to: {}", path.display());
    Ok(())
}

fn print_report(report: &AccuracyReport) {
    println!("Status: {}", report.status());
    if !report.skipped.is_empty() {
        println!("Skipped {} samples:", report.skipped.len());
        for s in &report.skipped {
            let label = s.id.clone().unwrap_or_else(|| format!("#{}", s.index));
            println!("  {}: {}", label, s.reason);
        }
    }

    println!();
    println!(
        "{:<10} {:>8} {:>12} {:>12} {:>8}",
        "Channel", "Samples", "MAE before", "MAE after", "Gain"
    );
    println!("{:-<54}", "");
    for (channel, acc) in &report.per_channel {
        println!(
            "{:<10} {:>8} {:>12.5} {:>12.5} {:>7.1}%",
            channel,
            acc.samples,
            acc.mae_before,
            acc.mae_after,
            acc.improvement_percent()
        );
    }
    println!("{:-<54}", "");
    println!(
        "{:<10} {:>8} {:>12.5} {:>12.5}",
        "overall", "", report.overall_before, report.overall_after
    );

    let updated: Vec<_> = report.updated().collect();
    if !updated.is_empty() {
        println!();
        println!("Updated factors:");
        for f in updated {
            println!("  {:<36} {:>12} -> {}", f.factor.to_string(), f.before, f.after);
        }
    }
    let starved = report
        .factors
        .iter()
        .filter(|f| f.status == FactorStatus::InsufficientData)
        .count();
    if starved > 0 {
        println!("{} factors left unchanged for lack of data", starved);
    }
    for v in &report.remaining_violations {
        println!("warning: {}", v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkcal::Channel;
    use tempfile::TempDir;

    #[test]
    fn test_write_parameters_refuses_out_of_band_set() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("params.json");
        let mut params = CalibrationParameters::default();
        params.channel_scaling_factor.set(Channel::Magenta, 0.000_003_9);

        let err = write_parameters(&params, &path).unwrap_err();
        assert!(err.to_string().contains("Refusing"));
        assert!(!path.exists());
    }

    #[test]
    fn test_write_parameters_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("params.json");
        let params = CalibrationParameters::default();
        write_parameters(&params, &path).unwrap();
        assert_eq!(CalibrationParameters::load(&path).unwrap(), params);
    }
}
