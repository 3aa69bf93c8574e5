//! Evaluate command.

use std::path::PathBuf;

use anyhow::Result;
use inkcal::calibration::evaluator::{VolumeCategory, channel_errors};
use inkcal::sample::{PreparedSample, prepare_samples};
use inkcal::stats::Summary;
use inkcal::{CalibrationParameters, Channel};

use super::{load_params, load_samples};
use crate::ParamsSource;

pub fn run(samples: PathBuf, source: &ParamsSource) -> Result<()> {
    let samples = load_samples(&samples)?;
    let params = load_params(source)?;
    let prep = prepare_samples(&samples);
    let refs: Vec<&PreparedSample> = prep.samples.iter().collect();

    println!(
        "Samples: {} usable, {} skipped",
        prep.samples.len(),
        prep.skipped.len()
    );
    println!();
    print_by_channel(&refs, &params);
    println!();
    print_by_volume(&refs, &params);

    Ok(())
}

fn print_by_channel(samples: &[&PreparedSample], params: &CalibrationParameters) {
    println!("Absolute error by channel (mL):");
    println!(
        "{:<10} {:>6} {:>10} {:>10} {:>10} {:>10}",
        "Channel", "N", "MAE", "RMSE", "Median", "P90"
    );
    println!("{:-<61}", "");
    for channel in Channel::ALL {
        let errors = channel_errors(samples, channel, params);
        if let Some(s) = Summary::compute(&errors) {
            println!(
                "{:<10} {:>6} {:>10.5} {:>10.5} {:>10.5} {:>10.5}",
                channel, s.count, s.mean, s.rmse, s.median, s.p90
            );
        }
    }
}

fn print_by_volume(samples: &[&PreparedSample], params: &CalibrationParameters) {
    println!("Absolute error by measured volume:");
    println!("{:<12} {:>6} {:>10} {:>10}", "Volume", "N", "MAE", "Max");
    println!("{:-<41}", "");
    for (label, category) in [
        ("< 0.02 mL", VolumeCategory::VerySmall),
        ("0.02-0.1", VolumeCategory::Small),
        ("0.1-0.5", VolumeCategory::Medium),
        (">= 0.5 mL", VolumeCategory::Large),
    ] {
        let mut errors = Vec::new();
        for channel in Channel::ALL {
            let in_category: Vec<&PreparedSample> = samples
                .iter()
                .copied()
                .filter(|s| {
                    s.qualifying(channel)
                        .is_some_and(|(m, _)| VolumeCategory::for_volume(m) == category)
                })
                .collect();
            errors.extend(channel_errors(&in_category, channel, params));
        }
        if let Some(s) = Summary::compute(&errors) {
            println!("{:<12} {:>6} {:>10.5} {:>10.5}", label, s.count, s.mean, s.max);
        }
    }
}
