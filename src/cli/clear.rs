use super::{open_library, runtime};
use dialoguer::Confirm;
use owo_colors::OwoColorize;
use shadow_studio::config::Settings;
use std::error::Error;

pub fn handle_clear(yes: bool) -> Result<(), Box<dyn Error>> {
    let settings = Settings::load_or_default();
    let rt = runtime()?;
    let mut library = rt.block_on(open_library(&settings))?;

    if library.catalog().is_empty() {
        println!("Library is already empty");
        return Ok(());
    }

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Remove all {} tracks with their notes, subtitles and markers?",
                library.catalog().len()
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Cancelled");
            return Ok(());
        }
    }

    let removal = rt.block_on(library.clear());
    if let Some(e) = removal.store_error {
        return Err(format!("Failed to clear library storage: {e}").into());
    }

    println!(
        "{} Library cleared ({} tracks removed)",
        "✓".green(),
        removal.removed.len()
    );
    Ok(())
}
