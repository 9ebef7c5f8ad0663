use super::{find_track, open_library, runtime};
use owo_colors::OwoColorize;
use shadow_studio::annotations::AnnotationStore;
use shadow_studio::config::Settings;
use std::error::Error;
use std::fs;

pub fn handle_subs_import(track_path: &str, srt_file: &str) -> Result<(), Box<dyn Error>> {
    let content = fs::read_to_string(shellexpand::tilde(srt_file).as_ref())?;
    let settings = Settings::load_or_default();

    let count = runtime()?.block_on(async {
        let library = open_library(&settings).await?;
        let track = find_track(&library, track_path)?;
        let mut annotations = AnnotationStore::new();
        annotations
            .load(library.store(), Some(track.id.clone()))
            .await;
        Ok::<_, Box<dyn Error>>(annotations.import_srt(library.store(), &content).await?)
    })?;

    match count {
        Some(count) => println!(
            "{} Imported {count} subtitle segments for {}",
            "✓".green(),
            track_path.trim_matches('/')
        ),
        None => return Err("Track annotations could not be opened".into()),
    }
    Ok(())
}

pub fn handle_subs_export(track_path: &str, output: Option<&str>) -> Result<(), Box<dyn Error>> {
    let settings = Settings::load_or_default();

    let srt = runtime()?.block_on(async {
        let library = open_library(&settings).await?;
        let track = find_track(&library, track_path)?;
        let mut annotations = AnnotationStore::new();
        annotations
            .load(library.store(), Some(track.id.clone()))
            .await;
        Ok::<_, Box<dyn Error>>((annotations.subtitles().len(), annotations.export_srt()))
    })?;

    let (count, content) = srt;
    match output {
        Some(path) => {
            let path = shellexpand::tilde(path);
            fs::write(path.as_ref(), content)?;
            println!("{} Wrote {count} subtitle segments to {path}", "✓".green());
        }
        None => print!("{content}"),
    }
    Ok(())
}
