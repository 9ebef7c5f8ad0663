use owo_colors::OwoColorize;
use shadow_studio::config::Settings;
use shadow_studio::hotkeys::HotkeyAction;
use std::error::Error;
use std::process::Command;

pub fn handle_config_view() -> Result<(), Box<dyn Error>> {
    let settings = Settings::load()?;

    println!("Current shadow configuration:");
    println!("  library_dir: {}", settings.library_dir);
    println!("  auto_replay.count: {}", settings.auto_replay.count);
    println!(
        "  auto_replay.interval: {}s",
        settings.auto_replay.interval_seconds
    );
    println!("  keys:");
    for action in HotkeyAction::ALL {
        match settings.keys.get(action) {
            Some(code) => println!("    {:<16} {}", action.name(), code.cyan()),
            None => println!("    {:<16} {}", action.name(), "unbound".dimmed()),
        }
    }

    Ok(())
}

pub fn handle_config_set(key: &str, value: &str) -> Result<(), Box<dyn Error>> {
    let mut settings = Settings::load()?;

    settings.set_value(key, value)?;
    settings.save()?;

    println!("Configuration updated: {key} = {value}");

    Ok(())
}

pub fn handle_config_edit() -> Result<(), Box<dyn Error>> {
    if !Settings::exists()? {
        return Err("Shadow not initialized. Run 'shadow init' first.".into());
    }

    let config_path = Settings::config_path()?;
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    println!("Opening {} in {}", config_path.display(), editor);

    let status = Command::new(&editor)
        .arg(&config_path)
        .status()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                format!("Editor '{editor}' not found. Set $EDITOR to a valid editor path.")
            } else {
                format!("Failed to launch editor '{editor}': {e}")
            }
        })?;

    if !status.success() {
        return Err(format!("Editor '{editor}' exited with error").into());
    }

    match Settings::load() {
        Ok(_) => println!("Configuration saved successfully"),
        Err(e) => {
            return Err(format!("Configuration validation failed: {e}").into());
        }
    }

    Ok(())
}
