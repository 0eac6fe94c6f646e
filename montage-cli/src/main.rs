use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use montage_cli::commands;
use montage_cli::config::Config;
use montage_cli::error::{print_error_and_exit, CliError};

#[derive(Parser)]
#[command(name = "montage")]
#[command(about = "Multi-wavelength cutout montages for radio source catalogs")]
#[command(version)]
#[command(long_about = "
Builds one strip of same-sky cutouts per catalog source (radio first, then
optical and infrared bands), each with the source ellipse drawn on top, and
paginates the strips into PDF report pages.

Examples:
  montage config --example > montage.toml
  montage inspect
  montage run --per-page 3
  montage clean
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (defaults to ./montage.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Number of threads to use
    #[arg(short, long, global = true)]
    pub threads: Option<usize>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render panels, thumbnails, strips and report pages for every source
    Run {
        /// Output directory (overrides output.directory)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Strips per report page (overrides parameters.number_figures_per_page)
        #[arg(long)]
        per_page: Option<usize>,

        /// Keep panels and thumbnails in memory only
        #[arg(long)]
        no_intermediates: bool,

        /// Also write each cutout as FITS
        #[arg(long)]
        cutouts: bool,
    },

    /// Remove per-band panel and thumbnail PDFs
    Clean {
        /// Directory to clean (overrides output.directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print shape and pixel scale of every configured image
    Inspect,

    /// Print the effective configuration
    Config {
        /// Print an example configuration instead
        #[arg(long)]
        example: bool,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn setup_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn run(cli: Cli) -> Result<()> {
    setup_logging(cli.verbose, cli.quiet);

    let mut config = Config::load(cli.config.as_deref())?;

    let threads = cli.threads.unwrap_or(config.general.threads);
    if threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to set thread count")?;
    }

    match cli.command {
        Commands::Run { out, per_page, no_intermediates, cutouts } => {
            if let Some(out) = out {
                config.output.directory = out;
            }
            if let Some(per_page) = per_page {
                config.parameters.number_figures_per_page = per_page;
            }
            if no_intermediates {
                config.output.keep_intermediates = false;
            }
            if cutouts {
                config.output.write_cutouts = true;
            }
            config.validate()?;
            commands::run::execute(&config, cli.quiet)?;
        }

        Commands::Clean { out } => {
            if let Some(out) = out {
                config.output.directory = out;
            }
            commands::clean::execute(&config)?;
        }

        Commands::Inspect => {
            commands::inspect::execute(&config)?;
        }

        Commands::Config { example, output } => {
            commands::config::execute(&config, example, output)?;
        }
    }

    Ok(())
}

fn main() {
    if let Err(err) = run(Cli::parse()) {
        match err.downcast_ref::<CliError>() {
            Some(cli_err) => print_error_and_exit(cli_err),
            None => {
                eprintln!("Error: {:#}", err);
                std::process::exit(1);
            }
        }
    }
}
