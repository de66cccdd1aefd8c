//! Category-subdirectory creation and file relocation.
//!
//! Subdirectory creation is idempotent. Moves preserve the original
//! filename and apply an explicit policy when the destination already
//! holds a file of that name, rather than inheriting platform-default
//! overwrite behavior.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Policy for a same-named file already present at the destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ConflictPolicy {
    /// Report an error for this file; it stays in the source tree.
    Fail,
    /// Leave the file in place without treating it as an error.
    Skip,
    /// Move under a unique name (stem_1, stem_2, ...).
    #[default]
    Rename,
}

/// How a requested move ended up.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    /// Moved to the expected destination path.
    Moved(PathBuf),
    /// Moved, but under a collision-avoiding name.
    Renamed(PathBuf),
    /// Not moved; the reason is carried for logging.
    Skipped(String),
}

#[derive(Debug, Error)]
pub enum RelocateError {
    #[error("source file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),
    #[error("{context}: {source}")]
    Os {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// Create (or reuse) a named subdirectory under `target_dir`.
pub fn ensure_subdir(target_dir: &Path, name: &str) -> Result<PathBuf, RelocateError> {
    let subdir = target_dir.join(name);
    fs::create_dir_all(&subdir).map_err(|e| RelocateError::Os {
        context: format!("failed to create directory {}", subdir.display()),
        source: e,
    })?;
    Ok(subdir)
}

/// Move `source` into `dest_dir`, keeping its filename. The conflict
/// policy decides what happens when the destination name is taken.
pub fn move_file(
    source: &Path,
    dest_dir: &Path,
    policy: ConflictPolicy,
) -> Result<MoveOutcome, RelocateError> {
    if !source.is_file() {
        return Err(RelocateError::NotFound(source.to_path_buf()));
    }
    let file_name = source
        .file_name()
        .ok_or_else(|| RelocateError::NotFound(source.to_path_buf()))?;
    let destination = dest_dir.join(file_name);

    if destination.exists() {
        match policy {
            ConflictPolicy::Fail => {
                return Err(RelocateError::DestinationExists(destination));
            }
            ConflictPolicy::Skip => {
                return Ok(MoveOutcome::Skipped(format!(
                    "destination already exists: {}",
                    destination.display()
                )));
            }
            ConflictPolicy::Rename => {
                let unique = unique_destination(&destination);
                perform_move(source, &unique)?;
                return Ok(MoveOutcome::Renamed(unique));
            }
        }
    }

    perform_move(source, &destination)?;
    Ok(MoveOutcome::Moved(destination))
}

/// Rename first (same filesystem), fall back to copy+delete for
/// cross-device moves.
fn perform_move(source: &Path, destination: &Path) -> Result<(), RelocateError> {
    if fs::rename(source, destination).is_ok() {
        return Ok(());
    }

    fs::copy(source, destination).map_err(|e| RelocateError::Os {
        context: format!(
            "failed to copy {} to {}",
            source.display(),
            destination.display()
        ),
        source: e,
    })?;
    fs::remove_file(source).map_err(|e| RelocateError::Os {
        context: format!("failed to remove {} after copy", source.display()),
        source: e,
    })
}

/// Append a counter suffix to the file stem until the name is free.
fn unique_destination(original: &Path) -> PathBuf {
    let parent = original.parent().unwrap_or(Path::new("."));
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".to_string());
    let ext = original
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut counter = 1;
    loop {
        let candidate = parent.join(format!("{}_{}{}", stem, counter, ext));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn ensure_subdir_is_idempotent() {
        let dir = TempDir::new().unwrap();

        let first = ensure_subdir(dir.path(), "Reports").unwrap();
        let second = ensure_subdir(dir.path(), "Reports").unwrap();

        assert_eq!(first, second);
        assert!(first.is_dir());
    }

    #[test]
    fn ensure_subdir_accepts_ampersands() {
        let dir = TempDir::new().unwrap();
        let subdir = ensure_subdir(dir.path(), "Theses & Dissertations").unwrap();
        assert!(subdir.is_dir());
    }

    #[test]
    fn move_keeps_the_original_filename() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("report.docx");
        std::fs::write(&source, b"contents").unwrap();
        let dest_dir = ensure_subdir(dir.path(), "Reports").unwrap();

        let outcome = move_file(&source, &dest_dir, ConflictPolicy::default()).unwrap();

        assert_eq!(outcome, MoveOutcome::Moved(dest_dir.join("report.docx")));
        assert!(!source.exists());
        assert_eq!(
            std::fs::read(dest_dir.join("report.docx")).unwrap(),
            b"contents"
        );
    }

    #[test]
    fn vanished_source_is_not_found() {
        let dir = TempDir::new().unwrap();
        let result = move_file(
            &dir.path().join("gone.docx"),
            dir.path(),
            ConflictPolicy::default(),
        );
        assert!(matches!(result, Err(RelocateError::NotFound(_))));
    }

    #[test]
    fn collision_with_rename_policy_keeps_both_files() {
        let dir = TempDir::new().unwrap();
        let dest_dir = ensure_subdir(dir.path(), "Reports").unwrap();
        std::fs::write(dest_dir.join("report.docx"), b"first").unwrap();

        let source = dir.path().join("report.docx");
        std::fs::write(&source, b"second").unwrap();

        let outcome = move_file(&source, &dest_dir, ConflictPolicy::Rename).unwrap();

        assert_eq!(
            outcome,
            MoveOutcome::Renamed(dest_dir.join("report_1.docx"))
        );
        assert_eq!(std::fs::read(dest_dir.join("report.docx")).unwrap(), b"first");
        assert_eq!(
            std::fs::read(dest_dir.join("report_1.docx")).unwrap(),
            b"second"
        );
    }

    #[test]
    fn rename_counter_advances_past_taken_names() {
        let dir = TempDir::new().unwrap();
        let dest_dir = ensure_subdir(dir.path(), "Reports").unwrap();
        std::fs::write(dest_dir.join("report.docx"), b"a").unwrap();
        std::fs::write(dest_dir.join("report_1.docx"), b"b").unwrap();

        let source = dir.path().join("report.docx");
        std::fs::write(&source, b"c").unwrap();

        let outcome = move_file(&source, &dest_dir, ConflictPolicy::Rename).unwrap();
        assert_eq!(
            outcome,
            MoveOutcome::Renamed(dest_dir.join("report_2.docx"))
        );
    }

    #[test]
    fn collision_with_skip_policy_leaves_source_in_place() {
        let dir = TempDir::new().unwrap();
        let dest_dir = ensure_subdir(dir.path(), "Reports").unwrap();
        std::fs::write(dest_dir.join("report.docx"), b"first").unwrap();

        let source = dir.path().join("report.docx");
        std::fs::write(&source, b"second").unwrap();

        let outcome = move_file(&source, &dest_dir, ConflictPolicy::Skip).unwrap();

        assert!(matches!(outcome, MoveOutcome::Skipped(_)));
        assert!(source.exists());
        assert_eq!(std::fs::read(dest_dir.join("report.docx")).unwrap(), b"first");
    }

    #[test]
    fn collision_with_fail_policy_is_an_error() {
        let dir = TempDir::new().unwrap();
        let dest_dir = ensure_subdir(dir.path(), "Reports").unwrap();
        std::fs::write(dest_dir.join("report.docx"), b"first").unwrap();

        let source = dir.path().join("report.docx");
        std::fs::write(&source, b"second").unwrap();

        let result = move_file(&source, &dest_dir, ConflictPolicy::Fail);

        assert!(matches!(result, Err(RelocateError::DestinationExists(_))));
        assert!(source.exists());
    }
}
