//! Logger setup for the binary.
//!
//! The terminal player owns the screen, so it logs to a file in the system
//! temp directory. Every other command logs warnings to stderr.

use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::error::Error;
#[cfg(feature = "player")]
use std::path::PathBuf;

#[cfg(feature = "player")]
pub fn player_log_path() -> PathBuf {
    std::env::temp_dir().join("shadow-player.log")
}

#[cfg(feature = "player")]
pub fn init_player_logging() -> Result<PathBuf, Box<dyn Error>> {
    use simplelog::{CombinedLogger, WriteLogger};

    let log_file = player_log_path();
    CombinedLogger::init(vec![WriteLogger::new(
        LevelFilter::Debug,
        Config::default(),
        std::fs::File::create(&log_file)?,
    )])?;
    Ok(log_file)
}

pub fn init_cli_logging(verbose: bool) -> Result<(), Box<dyn Error>> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;
    Ok(())
}
