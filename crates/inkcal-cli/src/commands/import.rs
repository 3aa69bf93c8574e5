//! CSV import command.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use anyhow::{Context, Result};
use inkcal::model::LengthUnit;
use inkcal::{Channel, SampleImporter};
use inkcal::sample::SampleSchema;

use super::write_json;

pub fn run(
    input: PathBuf,
    output: Option<PathBuf>,
    mode_col: Option<String>,
    quality_col: Option<String>,
    unit: Option<&str>,
) -> Result<()> {
    tracing::debug!(input = %input.display(), "importing samples");

    // Build schema
    let mut schema = SampleSchema::builder();
    if let Some(col) = mode_col {
        schema = schema.ink_mode_column(col);
    }
    if let Some(col) = quality_col {
        schema = schema.quality_column(col);
    }
    if let Some(unit) = unit {
        let unit: LengthUnit = unit.parse()?;
        schema = schema.default_unit(unit);
    }

    let importer = SampleImporter::new(schema.build());
    let samples = importer
        .import(&input)
        .with_context(|| format!("Failed to import CSV from {}", input.display()))?;

    println!("Imported {} samples", samples.len());

    // Count by ink mode
    let mut by_mode: HashMap<&str, usize> = HashMap::new();
    for sample in &samples {
        *by_mode.entry(&sample.ink_mode).or_default() += 1;
    }

    println!("Ink modes:");
    let mut sorted: Vec<_> = by_mode.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    for (mode, count) in sorted {
        println!("  {}: {}", mode, count);
    }

    // Measurements per channel
    let mut by_channel: BTreeMap<Channel, usize> = BTreeMap::new();
    for sample in &samples {
        for channel in sample.measured_ml.keys() {
            *by_channel.entry(*channel).or_default() += 1;
        }
    }
    println!("Measurements:");
    for (channel, count) in by_channel {
        println!("  {}: {} samples", channel, count);
    }

    if let Some(output_path) = output {
        write_json(&samples, Some(&output_path))?;
    }

    Ok(())
}
