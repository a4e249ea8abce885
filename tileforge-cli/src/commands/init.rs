//! Init command - write a default configuration file.

use tileforge::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Run the init command.
pub fn run(force: bool) -> Result<(), CliError> {
    let path = config_file_path();

    if path.exists() && !force {
        println!("Configuration file already exists:");
        println!("  {}", path.display());
        println!();
        println!("Use --force to replace it with defaults.");
        return Ok(());
    }

    ConfigFile::default().save_to(&path)?;

    println!("Configuration file: {}", path.display());
    println!();
    println!("Edit this file to customize TileForge settings.");
    println!("Job files and CLI arguments override config file values when specified.");
    Ok(())
}
