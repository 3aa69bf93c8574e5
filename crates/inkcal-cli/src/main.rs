//! inkcal CLI - ink volume estimation and calibration tool

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

/// Ink volume estimation and auto-calibration tool.
#[derive(Parser)]
#[command(name = "inkcal")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where to take calibration parameters from.
#[derive(clap::Args, Debug, Clone)]
pub struct ParamsSource {
    /// Parameters JSON file
    #[arg(short, long, conflicts_with = "store")]
    params: Option<PathBuf>,

    /// Parameter store directory (scopes are merged over defaults)
    #[arg(long, env = "INKCAL_STORE")]
    store: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate ink volume for a print job
    Estimate {
        /// Ink mode (e.g. CMYK, CMYK+W, CMYK+W+GLOSS)
        #[arg(short, long, default_value = "CMYK")]
        mode: String,

        /// Quality tier (draft, standard, high)
        #[arg(short, long, default_value = "standard")]
        quality: String,

        /// Print width
        #[arg(long)]
        width: f64,

        /// Print height
        #[arg(long)]
        height: f64,

        /// Unit of width and height (in, mm, cm)
        #[arg(long, default_value = "in")]
        unit: String,

        /// Coverage percent for every channel
        #[arg(short, long, default_value_t = 100.0)]
        coverage: f64,

        /// Per-channel coverage override, e.g. `white=100`
        #[arg(long = "channel-coverage", value_name = "CHANNEL=PERCENT")]
        channel_coverage: Vec<String>,

        #[command(flatten)]
        source: ParamsSource,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Calibrate parameters against measured samples
    Calibrate {
        /// Samples file (JSON array or CSV)
        #[arg(short, long)]
        samples: PathBuf,

        #[command(flatten)]
        source: ParamsSource,

        /// Calibration config JSON (search bounds, iterations)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Search channels concurrently
        #[arg(long)]
        parallel: bool,

        /// Write calibrated parameters to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the accuracy report to this file
        #[arg(long)]
        report: Option<PathBuf>,

        /// Save into the store under this scope (combined, standard, special)
        #[arg(long, requires = "store")]
        save_scope: Option<String>,
    },

    /// Show prediction errors of parameters against measured samples
    Evaluate {
        /// Samples file (JSON array or CSV)
        #[arg(short, long)]
        samples: PathBuf,

        #[command(flatten)]
        source: ParamsSource,
    },

    /// Import measured samples from CSV
    Import {
        /// Input CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Output JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Ink mode column name
        #[arg(long)]
        mode_col: Option<String>,

        /// Quality column name
        #[arg(long)]
        quality_col: Option<String>,

        /// Unit for rows without a unit column
        #[arg(long)]
        unit: Option<String>,
    },

    /// Inspect and manage calibration parameters
    Params {
        #[command(subcommand)]
        action: ParamsAction,
    },
}

#[derive(Subcommand)]
pub enum ParamsAction {
    /// Print or write the default parameters
    Defaults {
        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a parameters file against the expected magnitude bands
    Validate {
        /// Parameters JSON file
        input: PathBuf,

        /// Only check the channels of one family (standard, special)
        #[arg(long)]
        family: Option<String>,
    },

    /// Merge the scopes of a store over the defaults
    Merge {
        /// Parameter store directory
        store: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Estimate {
            mode,
            quality,
            width,
            height,
            unit,
            coverage,
            channel_coverage,
            source,
            json,
        } => commands::estimate::run(
            commands::estimate::EstimateArgs {
                mode,
                quality,
                width,
                height,
                unit,
                coverage,
                channel_coverage,
                json,
            },
            &source,
        ),
        Commands::Calibrate {
            samples,
            source,
            config,
            parallel,
            output,
            report,
            save_scope,
        } => commands::calibrate::run(
            samples,
            &source,
            config,
            parallel,
            output,
            report,
            save_scope.as_deref(),
        ),
        Commands::Evaluate { samples, source } => commands::evaluate::run(samples, &source),
        Commands::Import {
            input,
            output,
            mode_col,
            quality_col,
            unit,
        } => commands::import::run(input, output, mode_col, quality_col, unit.as_deref()),
        Commands::Params { action } => commands::params::run(action),
    }
}
