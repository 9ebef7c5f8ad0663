//! Shadow - a terminal audio player for language shadowing practice.
//!
//! Folders of audio are imported into a persistent library. Each track can
//! carry timestamped notes, subtitle captions and navigation markers, and the
//! player offers the repetition controls shadowing needs: auto-replay with a
//! pause between repeats, looping the current track, pausing between tracks
//! and an A-B loop over a passage.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Generator, Shell, generate};
use owo_colors::OwoColorize;
use std::error::Error;
use std::io;

mod cli;
mod logging;

#[cfg(feature = "player")]
mod player;

#[derive(Parser)]
#[command(name = "shadow")]
#[command(about = "Terminal audio player and study library for shadowing practice")]
#[command(version)]
struct Cli {
    /// Print debug logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration and create the library directory
    Init,
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Import a folder of audio files into the library
    Import {
        /// Folder to import
        dir: String,
        /// Replace the whole library instead of merging into it
        #[arg(long)]
        reset: bool,
    },
    /// List the tracks in the library
    List {
        /// Show the folder hierarchy
        #[arg(short, long)]
        tree: bool,
    },
    /// Remove a track or a whole folder from the library
    Remove {
        /// Library path of the file or folder
        path: String,
    },
    /// Remove every track and annotation from the library
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Import or export subtitles as SRT
    Subs {
        #[command(subcommand)]
        action: SubsAction,
    },
    /// Show the notes and markers of a track
    Notes {
        /// Library path of the track
        track: String,
    },
    /// Open the terminal player
    Play {
        /// Library path of the track to start with
        track: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// View current configuration
    View,
    /// Set a configuration value
    ///
    /// Keys: library_dir, auto_replay.count, auto_replay.interval and
    /// keys.<action> (use "none" to unbind)
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },
    /// Edit configuration file in your editor
    Edit,
}

#[derive(Subcommand)]
enum SubsAction {
    /// Replace a track's subtitles with the contents of an SRT file
    Import {
        /// Library path of the track
        track: String,
        /// SRT file to read
        file: String,
    },
    /// Write a track's subtitles as SRT
    Export {
        /// Library path of the track
        track: String,
        /// Output file (defaults to stdout)
        output: Option<String>,
    },
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(
        generator,
        cmd,
        cmd.get_name().to_string(),
        &mut io::stdout(),
    );
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {e}", "Error:".red().bold());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    if !matches!(cli.command, Commands::Play { .. }) {
        logging::init_cli_logging(cli.verbose)?;
    }

    match cli.command {
        Commands::Init => {
            cli::init::handle_init()?;
        }
        Commands::Config { action } => match action {
            ConfigAction::View => {
                cli::config::handle_config_view()?;
            }
            ConfigAction::Set { key, value } => {
                cli::config::handle_config_set(&key, &value)?;
            }
            ConfigAction::Edit => {
                cli::config::handle_config_edit()?;
            }
        },
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            print_completions(shell, &mut cmd);
        }
        Commands::Import { dir, reset } => {
            cli::import::handle_import(&dir, reset)?;
        }
        Commands::List { tree } => {
            cli::list::handle_list(tree)?;
        }
        Commands::Remove { path } => {
            cli::remove::handle_remove(&path)?;
        }
        Commands::Clear { yes } => {
            cli::clear::handle_clear(yes)?;
        }
        Commands::Subs { action } => match action {
            SubsAction::Import { track, file } => {
                cli::subs::handle_subs_import(&track, &file)?;
            }
            SubsAction::Export { track, output } => {
                cli::subs::handle_subs_export(&track, output.as_deref())?;
            }
        },
        Commands::Notes { track } => {
            cli::notes::handle_notes(&track)?;
        }
        Commands::Play { track } => {
            cli::play::handle_play(track.as_deref())?;
        }
    }

    Ok(())
}
