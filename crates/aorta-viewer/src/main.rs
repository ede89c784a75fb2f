//! Aorta Viewer - Main entry point
//!
//! Loads the segmented aorta model and shows it in a window, or lists it
//! headlessly with `--inspect`.

mod app;
mod config;
mod inspect;
mod loading;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "aorta-viewer")]
#[command(about = "Interactive viewer for the segmented aorta model")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "aorta.toml")]
    config: PathBuf,

    /// Asset base (URL or directory), overrides the configuration
    #[arg(short, long)]
    assets: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Load and list the model without opening a window
    #[arg(long)]
    inspect: bool,

    /// Write the default configuration to the config path and exit
    #[arg(long)]
    write_default_config: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Aorta Viewer v{}", env!("CARGO_PKG_VERSION"));

    if args.write_default_config {
        config::save_default_config(&args.config)?;
        println!("Wrote default configuration to {}", args.config.display());
        return Ok(());
    }

    let mut config = config::load_config(&args.config)?;
    if let Some(assets) = args.assets {
        config.assets.base = assets;
    }

    let catalog = config.catalog()?;
    info!(
        base = %config.assets.base,
        parts = catalog.len(),
        "Configuration loaded"
    );

    if args.inspect {
        inspect::run(&config, &catalog)
    } else {
        app::run(&config, catalog)
    }
}
