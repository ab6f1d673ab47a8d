//! apitrail CLI — tracks the history of an evolving API surface.
//!
//! Each run collects build lists from the configured snapshot sources,
//! extends the cached patch history with whatever is new, rebuilds the
//! entity graph, and rewrites the manifest and search index.

#![warn(missing_docs)]

mod pipeline;
mod settings;

use std::path::PathBuf;
use std::process;

use clap::Parser;
use log::LevelFilter;

/// apitrail — API surface history tracker.
#[derive(Parser, Debug)]
#[command(name = "apitrail", version, about = "API surface history tracker")]
pub struct Cli {
    /// Path to the settings file.
    #[arg(short, long, default_value = "apitrail.toml")]
    pub settings: PathBuf,

    /// Ignore the cached manifest and recompute every patch.
    #[arg(short, long)]
    pub force: bool,

    /// Suppress all output except errors.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long)]
    pub verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.quiet {
        LevelFilter::Error
    } else if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let settings = match settings::load_settings(&cli.settings) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = pipeline::run(&settings, cli.force) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
