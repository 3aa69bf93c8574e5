//! Estimate command.

use anyhow::{Context, Result, anyhow};
use inkcal::model::{LengthUnit, PrintJob, PrintSize, estimate};
use inkcal::{Channel, InkMode, Quality};

use super::{load_params, write_json};
use crate::ParamsSource;

pub struct EstimateArgs {
    pub mode: String,
    pub quality: String,
    pub width: f64,
    pub height: f64,
    pub unit: String,
    pub coverage: f64,
    pub channel_coverage: Vec<String>,
    pub json: bool,
}

pub fn run(args: EstimateArgs, source: &ParamsSource) -> Result<()> {
    let mode: InkMode = args.mode.parse()?;
    let quality: Quality = args.quality.parse()?;
    let unit: LengthUnit = args.unit.parse()?;
    let params = load_params(source)?;

    let mut job = PrintJob::new(
        mode.channels(),
        quality,
        PrintSize::new(args.width, args.height, unit),
        args.coverage,
    );
    for arg in &args.channel_coverage {
        let (channel, percent) = parse_channel_coverage(arg)?;
        job = job.with_channel_coverage(channel, percent);
    }

    let est = estimate(&job, &params).context("Estimation failed")?;

    if args.json {
        return write_json(&est, None);
    }

    println!(
        "{} {} {}x{} {} ({:.1} sq in, {} bucket)",
        mode, quality, args.width, args.height, unit, est.area_sq_in, est.area_bucket
    );
    println!("{:-<40}", "");
    for (channel, ml) in &est.per_channel {
        println!("{:<10} {:>12.4} mL", channel, ml);
    }
    println!("{:-<40}", "");
    println!("{:<10} {:>12.4} mL", "total", est.total_ml);

    Ok(())
}

fn parse_channel_coverage(arg: &str) -> Result<(Channel, f64)> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected CHANNEL=PERCENT, got '{arg}'"))?;
    let channel: Channel = name.parse()?;
    let percent: f64 = value
        .trim()
        .parse()
        .with_context(|| format!("Invalid coverage in '{arg}'"))?;
    Ok((channel, percent))
}
