//! TileForge CLI - Command-line interface
//!
//! Renders job files into raster tile pyramids and previews tile counts.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tileforge::coord::BoundingBox;

use commands::common::{parse_bbox, FormatArg};
use commands::generate::GenerateArgs;

#[derive(Parser)]
#[command(name = "tileforge")]
#[command(version, about = "Render styled vector layers into raster map tiles", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a job file into an XYZ directory or MBTiles file
    Generate {
        /// Path to the JSON job file
        #[arg(long)]
        job: PathBuf,

        /// Output path (overrides the job file)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format (overrides the job file and config)
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Tiles rendered at once, 0 for every core
        #[arg(long)]
        threads: Option<usize>,

        /// Replace existing output
        #[arg(long)]
        overwrite: bool,

        /// Enable debug logging
        #[arg(long)]
        debug: bool,
    },

    /// Print how many tiles a bounding box covers
    Count {
        /// minLon,minLat,maxLon,maxLat
        #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
        bbox: BoundingBox,

        #[arg(long, default_value = "0")]
        min_zoom: u8,

        #[arg(long)]
        max_zoom: u8,
    },

    /// Write a default config.ini
    Init {
        /// Replace an existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate {
            job,
            output,
            format,
            threads,
            overwrite,
            debug,
        } => commands::generate::run(GenerateArgs {
            job,
            output,
            format,
            threads,
            overwrite,
            debug,
        }),
        Commands::Count {
            bbox,
            min_zoom,
            max_zoom,
        } => commands::count::run(bbox, min_zoom, max_zoom),
        Commands::Init { force } => commands::init::run(force),
    };

    if let Err(e) = result {
        e.exit();
    }
}
