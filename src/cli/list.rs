use super::{open_library, runtime};
use owo_colors::OwoColorize;
use shadow_studio::catalog::{Catalog, TreeNode};
use shadow_studio::config::Settings;
use std::error::Error;

pub fn handle_list(tree: bool) -> Result<(), Box<dyn Error>> {
    let settings = Settings::load_or_default();
    let library = runtime()?.block_on(open_library(&settings))?;
    let catalog = library.catalog();

    if catalog.is_empty() {
        println!("Library is empty. Import a folder with 'shadow import <dir>'.");
        return Ok(());
    }

    if tree {
        print_nodes(catalog.tree(), 0);
    } else {
        let width = catalog.len().to_string().len();
        for (i, track) in catalog.tracks().iter().enumerate() {
            println!("{:>width$}  {}", (i + 1).dimmed(), track.path);
        }
    }

    println!("\n{}", summary(catalog));
    Ok(())
}

fn summary(catalog: &Catalog) -> String {
    let tracks = counted(catalog.len(), "track");
    match catalog.folder_paths().len() {
        0 => tracks,
        folders => format!("{tracks} in {}", counted(folders, "folder")),
    }
}

fn counted(n: usize, noun: &str) -> String {
    if n == 1 { format!("1 {noun}") } else { format!("{n} {noun}s") }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadow_studio::catalog::{Track, build_catalog};

    fn catalog(paths: &[&str]) -> Catalog {
        build_catalog(paths.iter().map(|p| Track::new(p, 1, 1, None)))
    }

    #[test]
    fn test_summary_counts_nested_folders() {
        assert_eq!(summary(&catalog(&["1.mp3", "2.mp3"])), "2 tracks");
        assert_eq!(summary(&catalog(&["a/1.mp3"])), "1 track in 1 folder");
        assert_eq!(
            summary(&catalog(&["a/1.mp3", "a/b/2.mp3", "c/3.mp3"])),
            "3 tracks in 3 folders"
        );
    }
}
