pub mod clear;
pub mod config;
pub mod import;
pub mod init;
pub mod list;
pub mod notes;
pub mod play;
pub mod remove;
pub mod subs;

use owo_colors::OwoColorize;
use shadow_studio::catalog::Track;
use shadow_studio::config::Settings;
use shadow_studio::library::Library;
use shadow_studio::store::FsStore;
use std::error::Error;
use tokio::runtime::{Builder, Runtime};

/// Library commands run on a single-threaded runtime.
pub fn runtime() -> std::io::Result<Runtime> {
    Builder::new_current_thread().enable_all().build()
}

/// Open the configured library and load its catalog.
pub async fn open_library(settings: &Settings) -> Result<Library<FsStore>, Box<dyn Error>> {
    let store = FsStore::open(settings.library_path()).await?;
    let mut library = Library::new(store);
    let report = library.restore(|_| {}).await;

    if let Some(e) = report.error {
        eprintln!("{} Could not read library: {e}", "Warning:".yellow());
    }
    if report.unplayable > 0 {
        eprintln!(
            "{} {} stored tracks have no readable audio and were skipped",
            "Warning:".yellow(),
            report.unplayable
        );
    }
    Ok(library)
}

/// Look up a track by its library path.
pub fn find_track<'a>(
    library: &'a Library<FsStore>,
    path: &str,
) -> Result<&'a Track, Box<dyn Error>> {
    let path = path.trim_matches('/');
    library
        .catalog()
        .track_by_path(path)
        .ok_or_else(|| {
            format!("No track at '{path}'. Run 'shadow list' to see library paths.").into()
        })
}

/// `m:ss.s` for short clips, `h:mm:ss` past an hour.
pub fn format_clock(seconds: f64) -> String {
    let tenths = (seconds.max(0.0) * 10.0).round() as u64;
    let whole = tenths / 10;
    if whole >= 3600 {
        format!("{}:{:02}:{:02}", whole / 3600, (whole / 60) % 60, whole % 60)
    } else {
        format!("{}:{:02}.{}", whole / 60, whole % 60, tenths % 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0.0), "0:00.0");
        assert_eq!(format_clock(65.5), "1:05.5");
        assert_eq!(format_clock(3725.0), "1:02:05");
        assert_eq!(format_clock(-1.0), "0:00.0");
    }
}
