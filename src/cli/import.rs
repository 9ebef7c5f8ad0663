use super::{open_library, runtime};
use owo_colors::OwoColorize;
use shadow_studio::config::Settings;
use shadow_studio::utils::progress::{ingest_bar, report_to, scan_spinner};
use shadow_studio::utils::scan::scan_directory;
use std::error::Error;
use std::path::Path;

pub fn handle_import(dir: &str, reset: bool) -> Result<(), Box<dyn Error>> {
    let expanded = shellexpand::tilde(dir);
    let dir = Path::new(expanded.as_ref());
    if !dir.is_dir() {
        return Err(format!("Not a directory: {}", dir.display()).into());
    }

    let spinner = scan_spinner(&format!("Scanning {}...", dir.display()));
    let descriptors = scan_directory(dir)?;
    spinner.finish_and_clear();

    if descriptors.is_empty() && !reset {
        println!("No audio files found in {}", dir.display());
        return Ok(());
    }

    let settings = Settings::load_or_default();
    let rt = runtime()?;
    let report = rt.block_on(async {
        let mut library = open_library(&settings).await?;
        let pb = ingest_bar(descriptors.len() as u64);
        let result = library.ingest(descriptors, reset, report_to(&pb)).await;
        pb.finish_and_clear();
        Ok::<_, Box<dyn Error>>(result?)
    })?;

    if let Some(e) = &report.reset_error {
        eprintln!("{} Library could not be fully cleared: {e}", "Warning:".yellow());
    }
    if report.persist_failures > 0 {
        eprintln!(
            "{} Some tracks were not saved and will be missing next time ({})",
            "Warning:".yellow(),
            report.first_persist_error.as_deref().unwrap_or("unknown error")
        );
    }

    println!("\n{} Import complete!", "✓".green());
    println!("  Imported: {} audio files", report.accepted);
    if report.skipped > 0 {
        println!("  Skipped: {} non-audio files", report.skipped);
    }
    println!("  Library: {} tracks", report.total_tracks);

    Ok(())
}
