mod input;
mod model;
mod pipeline;
mod plot;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::model::cuts::CutConfig;
use crate::pipeline::{LimitsConfig, PipelineError, run_limits};
use crate::plot::style::PlotStyle;
use crate::plot::{PlotError, run_plot};

/// Target lifetimes (ctau, mm) scanned when `--lifetimes` is not given.
const DEFAULT_LIFETIMES: [f64; 13] = [
    10.0, 30.0, 50.0, 100.0, 200.0, 300.0, 500.0, 800.0, 1000.0, 2000.0, 3000.0, 5000.0, 10000.0,
];

#[derive(Parser)]
#[command(name = "llp-limits", version)]
#[command(about = "Limit extraction and plotting for long-lived-particle calorimeter searches.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute yields and background predictions, run the external limit
    /// tool per lifetime, and write a result record.
    Limits {
        /// Signal minituple (TSV, optionally .gz).
        #[arg(short, long, value_name = "PATH")]
        input: PathBuf,
        /// Background data minituple (TSV, optionally .gz).
        #[arg(short = 'D', long, value_name = "PATH")]
        data: PathBuf,
        /// Input file tag.
        #[arg(short, long, value_name = "TAG")]
        filetag: String,
        /// Generated sample lifetime in mm.
        #[arg(short, long, value_name = "MM")]
        ctau: f64,
        /// Datacard template; its filename must contain "TEMPLATE".
        #[arg(
            short,
            long,
            value_name = "PATH",
            default_value = "templates/datacard_TEMPLATE.txt"
        )]
        template: PathBuf,
        #[arg(short, long, value_name = "DIR", default_value = "output")]
        output_dir: PathBuf,
        /// Signal-region inclusive score cut.
        #[arg(long, value_name = "SCORE", default_value_t = 0.9)]
        incl_score: f64,
        /// Signal-region depth score cut.
        #[arg(long, value_name = "SCORE", default_value_t = 0.8)]
        depth_score: f64,
        /// Target lifetimes in mm, comma separated.
        #[arg(long, value_name = "MM,...", value_delimiter = ',', default_values_t = DEFAULT_LIFETIMES)]
        lifetimes: Vec<f64>,
        /// Luminosity scale factor for partial datasets.
        #[arg(long, value_name = "SF", default_value_t = 6.8)]
        lumi_sf: f64,
        /// Limit-setting executable.
        #[arg(long, value_name = "PROG", default_value = "combine")]
        combine: String,
        #[arg(short, long)]
        debug: bool,
    },
    /// Render plots from result records. One path renders the single
    /// Brazil-band plot; a tag followed by paths renders the multi overlay.
    Plot {
        #[arg(value_name = "ARGS", num_args = 1.., required = true)]
        args: Vec<String>,
        #[arg(long, value_name = "DIR", default_value = "plots")]
        plots_dir: PathBuf,
        #[arg(short, long)]
        debug: bool,
    },
}

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Plot(#[from] PlotError),
}

fn main() {
    let cli = Cli::parse();
    init_tracing(match &cli.command {
        Commands::Limits { debug, .. } | Commands::Plot { debug, .. } => *debug,
    });
    if let Err(err) = run(cli) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn init_tracing(debug: bool) {
    let default_filter = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Commands::Limits {
            input,
            data,
            filetag,
            ctau,
            template,
            output_dir,
            incl_score,
            depth_score,
            lifetimes,
            lumi_sf,
            combine,
            debug: _,
        } => {
            let config = LimitsConfig {
                signal_path: input,
                data_path: data,
                template_path: template,
                output_dir,
                cuts: CutConfig::new(filetag, incl_score, depth_score),
                ctau_sample: ctau,
                lifetimes,
                lumi_sf,
                combine_program: combine,
            };
            run_limits(&config)?;
            Ok(())
        }
        Commands::Plot {
            args,
            plots_dir,
            debug: _,
        } => {
            run_plot(&args, &plots_dir, &PlotStyle::default())?;
            Ok(())
        }
    }
}
