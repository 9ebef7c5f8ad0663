use super::{find_track, format_clock, open_library, runtime};
use owo_colors::OwoColorize;
use shadow_studio::annotations::AnnotationStore;
use shadow_studio::config::Settings;
use std::error::Error;

pub fn handle_notes(track_path: &str) -> Result<(), Box<dyn Error>> {
    let settings = Settings::load_or_default();

    let (name, annotations) = runtime()?.block_on(async {
        let library = open_library(&settings).await?;
        let track = find_track(&library, track_path)?;
        let mut annotations = AnnotationStore::new();
        annotations
            .load(library.store(), Some(track.id.clone()))
            .await;
        Ok::<_, Box<dyn Error>>((track.path.clone(), annotations))
    })?;

    println!("{}", name.bold());

    println!("\n{}", "Notes".cyan());
    if annotations.notes().is_empty() {
        println!("  {}", "none".dimmed());
    }
    for note in annotations.notes() {
        println!(
            "  {:>8}  {}  {}",
            format_clock(note.timestamp),
            note.content,
            note.created_at.format("%Y-%m-%d %H:%M").dimmed()
        );
    }

    println!("\n{}", "Markers".cyan());
    if annotations.markers().is_empty() {
        println!("  {}", "none".dimmed());
    }
    for marker in annotations.markers() {
        println!("  {:>8}  {}", format_clock(marker.time), marker.label);
    }

    println!(
        "\n{} subtitle segments",
        annotations.subtitles().len()
    );
    Ok(())
}
