//! Directory scanning for imports.
//!
//! Subdirectories are walked in parallel with rayon, so the raw order of the
//! collected files is not deterministic. [`scan_directory`] sorts its output
//! by relative path; the catalog imposes its own order anyway.

use crate::catalog::is_audio;
use crate::constants::SKIP_DIRECTORIES;
use crate::library::FileDescriptor;
use crate::store::Payload;
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Check if a file or directory is hidden (starts with '.')
pub fn is_hidden_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

pub fn should_skip_directory(name: &str) -> bool {
    SKIP_DIRECTORIES.contains(&name)
}

/// Build import descriptors for every audio file under `root`.
///
/// Relative paths start with the name of `root` itself, the way a browser
/// reports the files of a picked folder. Unreadable subdirectories are logged
/// and skipped.
pub fn scan_directory(root: &Path) -> io::Result<Vec<FileDescriptor>> {
    let root_name = root
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_default();

    let mut files = Vec::new();
    collect_audio_files(root, &mut files)?;

    let mut descriptors: Vec<FileDescriptor> = files
        .into_par_iter()
        .filter_map(|path| match describe(root, &root_name, &path) {
            Ok(descriptor) => Some(descriptor),
            Err(e) => {
                log::warn!("Skipping '{}': {e}", path.display());
                None
            }
        })
        .collect();

    descriptors.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(descriptors)
}

fn describe(root: &Path, root_name: &str, path: &Path) -> io::Result<FileDescriptor> {
    let metadata = fs::metadata(path)?;
    let last_modified = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0);

    let relative = path
        .strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");
    let relative_path = if root_name.is_empty() {
        relative
    } else {
        format!("{root_name}/{relative}")
    };

    Ok(FileDescriptor {
        relative_path: Some(relative_path),
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        size: metadata.len(),
        last_modified,
        mime: None,
        payload: Payload::File(path.to_path_buf()),
    })
}

fn collect_audio_files(dir: &Path, files: &mut Vec<PathBuf>) -> io::Result<()> {
    let entries: Vec<_> = fs::read_dir(dir)?.collect::<Result<_, _>>()?;

    let mut directories = Vec::new();
    for entry in entries {
        let path = entry.path();
        if is_hidden_file(&path) {
            continue;
        }

        if path.is_dir() {
            let Some(dir_name) = path.file_name() else {
                continue;
            };
            if !should_skip_directory(&dir_name.to_string_lossy()) {
                directories.push(path);
            }
        } else if path.is_file()
            && is_audio(&path.file_name().unwrap_or_default().to_string_lossy(), None)
        {
            files.push(path);
        }
    }

    if directories.len() > 1 {
        let nested: Vec<Vec<PathBuf>> = directories
            .par_iter()
            .filter_map(|subdir| {
                let mut found = Vec::new();
                match collect_audio_files(subdir, &mut found) {
                    Ok(()) => Some(found),
                    Err(e) => {
                        log::warn!("Failed to scan directory '{}': {e}", subdir.display());
                        None
                    }
                }
            })
            .collect();
        files.extend(nested.into_iter().flatten());
    } else {
        for subdir in directories {
            if let Err(e) = collect_audio_files(&subdir, files) {
                log::warn!("Failed to scan directory '{}': {e}", subdir.display());
            }
        }
    }

    Ok(())
}
