//! Tendril CLI
//!
//! Render demo trees headlessly and print the document as it changes.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod demo;

use config::TendrilConfig;

#[derive(Parser)]
#[command(name = "tendril")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Tendril render engine demos", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./tendril.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the counter and click its button
    Counter {
        /// Number of simulated clicks
        #[arg(long, default_value = "3")]
        clicks: u32,
    },

    /// Render a lazy subtree and flip it between text and an element
    Toggle {
        /// Number of flips
        #[arg(long, default_value = "4")]
        steps: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = TendrilConfig::load(cli.config.as_deref())?;

    let snapshots = match cli.command {
        Commands::Counter { clicks } => {
            info!("Rendering counter with {} clicks", clicks);
            demo::run_counter(&config.render, clicks)?
        }
        Commands::Toggle { steps } => {
            info!("Rendering toggle for {} steps", steps);
            demo::run_toggle(&config.render, steps)?
        }
    };

    for (step, html) in snapshots.iter().enumerate() {
        println!("{step:>3}  {html}");
    }

    Ok(())
}
