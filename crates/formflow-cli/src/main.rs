mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "formflow")]
#[command(version, about = "Formflow CLI - declarative form validation", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = "formflow.toml")]
    config: PathBuf,

    /// Log pipeline activity to stderr (repeat for more detail)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List managed forms, their fields and rules
    Inspect {
        /// HTML page to read
        page: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Fill in a form and report validation errors
    Check {
        /// HTML page to read
        page: PathBuf,

        #[command(flatten)]
        fill: commands::Fill,
    },

    /// Fill in a form and submit it to its endpoint
    Submit {
        /// HTML page to read
        page: PathBuf,

        #[command(flatten)]
        fill: commands::Fill,

        /// Origin relative form actions resolve against (overrides config)
        #[arg(long)]
        base_url: Option<String>,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = formflow::FormflowConfig::load(&cli.config)?;

    // Execute command
    match cli.command {
        Commands::Inspect { page, json } => {
            commands::inspect::execute(&page, config, json)?;
        }
        Commands::Check { page, fill } => {
            commands::check::execute(&page, config, &fill)?;
        }
        Commands::Submit { page, fill, base_url } => {
            commands::submit::execute(&page, config, &fill, base_url)?;
        }
    }

    Ok(())
}
