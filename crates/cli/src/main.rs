use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

/// Read the fields of an Indonesian identity card (KTP) from a photo.
#[derive(Parser)]
#[command(name = "ktp")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the binarization threshold (0–255)
    #[arg(short, long, global = true)]
    threshold: Option<u8>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a card photo: binarize, recognize, extract
    Scan {
        image: PathBuf,
        /// Print the document as JSON
        #[arg(long)]
        json: bool,
        /// Also print the raw recognized text
        #[arg(long)]
        raw: bool,
    },
    /// Extract fields from already recognized text (file or stdin)
    Extract {
        /// Text file; reads stdin when absent or `-`
        input: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Write the binarized image for inspection
    Binarize {
        image: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = commands::load_config(cli.config.as_deref())?;
    if let Some(threshold) = cli.threshold {
        config.threshold = threshold;
    }

    match cli.command {
        Commands::Scan { image, json, raw } => commands::scan(&config, &image, json, raw).await,
        Commands::Extract { input, json } => commands::extract(input.as_deref(), json),
        Commands::Binarize { image, output } => commands::binarize(&config, &image, &output),
    }
}
