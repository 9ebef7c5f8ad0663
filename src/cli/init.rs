use owo_colors::OwoColorize;
use shadow_studio::config::Settings;
use std::error::Error;
use std::fs;

pub fn handle_init() -> Result<(), Box<dyn Error>> {
    if Settings::exists()? {
        return Err(
            "Shadow is already initialized. Use 'shadow config set library_dir <path>' to move the library."
                .into(),
        );
    }

    let settings = Settings::new();
    let library_path = settings.library_path();

    if !library_path.exists() {
        println!("Creating library directory: {}", library_path.display());
        fs::create_dir_all(&library_path)?;
    } else if !library_path.is_dir() {
        return Err(format!("{} exists but is not a directory", library_path.display()).into());
    }

    settings.save()?;

    println!("{} Shadow initialized", "✓".green());
    println!("Library directory: {}", library_path.display());
    println!(
        "Configuration saved to: {}",
        Settings::config_path()?.display()
    );

    Ok(())
}
