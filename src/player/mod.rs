pub mod app;
pub mod keys;
pub mod output;
pub mod playlist;
pub mod ui;

use std::error::Error;

/// Launch the terminal player, optionally starting on the track at
/// `track_path`.
pub fn run(track_path: Option<&str>) -> Result<(), Box<dyn Error>> {
    app::run(track_path)
}
