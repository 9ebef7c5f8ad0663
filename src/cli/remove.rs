use super::{open_library, runtime};
use owo_colors::OwoColorize;
use shadow_studio::config::Settings;
use std::error::Error;

pub fn handle_remove(path: &str) -> Result<(), Box<dyn Error>> {
    let settings = Settings::load_or_default();
    let path = path.trim_matches('/');

    let removal = runtime()?.block_on(async {
        let mut library = open_library(&settings).await?;
        Ok::<_, Box<dyn Error>>(library.delete_node(path).await)
    })?;

    let Some(removal) = removal else {
        return Err(format!("Nothing in the library at '{path}'").into());
    };

    if let Some(e) = removal.store_error {
        return Err(format!("Failed to remove '{path}' from storage: {e}").into());
    }

    println!(
        "{} Removed {} track(s) under '{path}'",
        "✓".green(),
        removal.removed.len()
    );
    Ok(())
}
