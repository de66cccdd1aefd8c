//! Candidate-file discovery.
//!
//! Recursively lists files under the source root, dropping extensions on
//! the exclusion list. Results are sorted so processing order is stable
//! across platforms instead of depending on directory-listing order.

use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Extensions never worth feeding to the extractor: images, archives,
/// audio, video, executables and libraries, disk images.
pub const DEFAULT_EXCLUDED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tiff", "svg", // images
    "zip", "rar", "7z", "tar", "gz", // archives
    "mp3", "wav", "aac", "flac", // audio
    "mp4", "avi", "mov", "mkv", // video
    "exe", "dll", "so", "dmg", "app", // executables & libraries
    "iso", // disk images
];

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("source directory not found or not a directory: {}", .0.display())]
    NotFound(PathBuf),
}

/// List every regular file under `source_dir`, excluding the given
/// extensions (case-insensitive, with or without a leading dot).
/// Unreadable entries are logged and skipped rather than aborting the walk.
pub fn list_files(
    source_dir: &Path,
    excluded_extensions: &[&str],
) -> Result<Vec<PathBuf>, DiscoveryError> {
    if !source_dir.is_dir() {
        return Err(DiscoveryError::NotFound(source_dir.to_path_buf()));
    }

    let excluded: Vec<String> = excluded_extensions
        .iter()
        .map(|ext| ext.trim_start_matches('.').to_lowercase())
        .collect();

    let mut files = Vec::new();
    for entry in WalkDir::new(source_dir).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("[Discovery] Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let ext = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();

        if excluded.iter().any(|excluded| *excluded == ext) {
            continue;
        }

        files.push(entry.into_path());
    }

    files.sort();
    Ok(files)
}
