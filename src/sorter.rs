//! Batch orchestration.
//!
//! Drives discovery, extraction, categorization, and relocation for one
//! run. Failures are contained at the file boundary: a corrupt or
//! unmovable file is logged and left in the source tree, and the batch
//! moves on to the next file.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::categorize::{Categorizer, PREDEFINED_CATEGORIES};
use crate::discovery::{self, DiscoveryError, DEFAULT_EXCLUDED_EXTENSIONS};
use crate::extract::{self, Extraction};
use crate::relocate::{self, ConflictPolicy, MoveOutcome};

/// Fatal run-level failures. Everything below these is handled per file.
#[derive(Debug, Error)]
pub enum SortError {
    #[error("source directory does not exist or is not a directory: {}", .0.display())]
    SourceMissing(std::path::PathBuf),
    #[error("failed to create target directory {}: {source}", .path.display())]
    TargetUnavailable {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Counts and diagnostics from one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Files discovered after extension exclusions.
    pub discovered: usize,
    /// Files moved into a category folder (including collision renames).
    pub moved: usize,
    /// Unsupported document types left in place.
    pub skipped_unsupported: usize,
    /// Supported documents that yielded no text.
    pub skipped_empty: usize,
    /// Documents that matched no category.
    pub skipped_unmatched: usize,
    /// Moves skipped because the destination name was taken.
    pub skipped_collision: usize,
    /// Per-file failures (extraction or relocation).
    pub failed: usize,
    /// Messages for the failed files.
    pub errors: Vec<String>,
    /// True when the run stopped early on an interrupt.
    pub interrupted: bool,
}

/// The per-file control loop. Construct with `new`, adjust with the
/// builder methods, then call `run`.
pub struct Sorter {
    categorizer: Categorizer,
    categories: Vec<String>,
    excluded_extensions: Vec<String>,
    conflict_policy: ConflictPolicy,
    cancel: Arc<AtomicBool>,
}

impl Sorter {
    pub fn new() -> Self {
        Self {
            categorizer: Categorizer::with_default_rules(),
            categories: PREDEFINED_CATEGORIES
                .iter()
                .map(|c| c.to_string())
                .collect(),
            excluded_extensions: DEFAULT_EXCLUDED_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            conflict_policy: ConflictPolicy::default(),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Replace the classifier and the ordered category list together, so
    /// custom keyword tables stay consistent with the categories tried.
    pub fn with_categorizer(mut self, categorizer: Categorizer, categories: Vec<String>) -> Self {
        self.categorizer = categorizer;
        self.categories = categories;
        self
    }

    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    /// Add extensions to the exclusion list on top of the defaults.
    pub fn with_extra_excluded_extensions(mut self, extensions: &[String]) -> Self {
        for ext in extensions {
            self.excluded_extensions
                .push(ext.trim_start_matches('.').to_lowercase());
        }
        self
    }

    /// Flag checked between files; set it (e.g. from a signal handler) to
    /// stop the run after the current file completes.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Run one full batch: discover, then extract/categorize/move each
    /// file in sorted discovery order.
    pub fn run(&self, source_dir: &Path, target_dir: &Path) -> Result<RunSummary, SortError> {
        info!(
            "[Sorter] Starting run. Source: {}, Target: {}",
            source_dir.display(),
            target_dir.display()
        );

        if !source_dir.is_dir() {
            error!(
                "[Sorter] Source directory {} does not exist, aborting",
                source_dir.display()
            );
            return Err(SortError::SourceMissing(source_dir.to_path_buf()));
        }

        if !target_dir.is_dir() {
            warn!(
                "[Sorter] Target directory {} does not exist, creating it",
                target_dir.display()
            );
            std::fs::create_dir_all(target_dir).map_err(|e| SortError::TargetUnavailable {
                path: target_dir.to_path_buf(),
                source: e,
            })?;
        }

        let excluded: Vec<&str> = self
            .excluded_extensions
            .iter()
            .map(String::as_str)
            .collect();
        let files = match discovery::list_files(source_dir, &excluded) {
            Ok(files) => files,
            // The directory vanished between the check above and the walk.
            Err(DiscoveryError::NotFound(path)) => return Err(SortError::SourceMissing(path)),
        };
        info!(
            "[Sorter] Found {} files to process (after exclusions)",
            files.len()
        );

        let allowed: Vec<&str> = self.categories.iter().map(String::as_str).collect();
        let mut summary = RunSummary {
            discovered: files.len(),
            ..Default::default()
        };

        for path in &files {
            if self.cancel.load(Ordering::SeqCst) {
                warn!(
                    "[Sorter] Interrupt requested, stopping before {}",
                    path.display()
                );
                summary.interrupted = true;
                break;
            }

            // Containment boundary: a panic out of a parser library must
            // not abort the batch any more than a typed error does.
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                self.process_file(path, target_dir, &allowed, &mut summary)
            }));
            if outcome.is_err() {
                error!(
                    "[Sorter] Unexpected panic while processing {}, leaving in place",
                    path.display()
                );
                summary.failed += 1;
                summary
                    .errors
                    .push(format!("panic while processing {}", path.display()));
            }
        }

        info!(
            "[Sorter] Run complete: {} moved, {} unsupported, {} empty, {} unmatched, {} failed",
            summary.moved,
            summary.skipped_unsupported,
            summary.skipped_empty,
            summary.skipped_unmatched,
            summary.failed
        );
        Ok(summary)
    }

    fn process_file(
        &self,
        path: &Path,
        target_dir: &Path,
        allowed: &[&str],
        summary: &mut RunSummary,
    ) {
        info!("[Sorter] Processing {}", path.display());
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();
        if !extract::is_supported(&ext) {
            info!(
                "[Sorter] {} (type {:?}) is not a supported document type, leaving in place",
                file_name, ext
            );
            summary.skipped_unsupported += 1;
            return;
        }

        let text = match extract::extract(path) {
            Ok(Extraction::Text(text)) => text,
            Ok(Extraction::Empty) => {
                warn!(
                    "[Sorter] No text extracted from {}, leaving in place",
                    file_name
                );
                summary.skipped_empty += 1;
                return;
            }
            Ok(Extraction::Unsupported { extension }) => {
                info!(
                    "[Sorter] {} ({}) cannot be parsed, leaving in place",
                    file_name, extension
                );
                summary.skipped_unsupported += 1;
                return;
            }
            Err(e) => {
                error!("[Sorter] Failed to extract text from {}: {}", file_name, e);
                summary.failed += 1;
                summary.errors.push(e.to_string());
                return;
            }
        };

        let Some(category) = self.categorizer.categorize(&text, allowed) else {
            info!(
                "[Sorter] {} did not match any category, leaving in place",
                file_name
            );
            summary.skipped_unmatched += 1;
            return;
        };

        let dest_dir = match relocate::ensure_subdir(target_dir, category) {
            Ok(dir) => dir,
            Err(e) => {
                error!(
                    "[Sorter] Failed to create directory for category {:?}: {}",
                    category, e
                );
                summary.failed += 1;
                summary.errors.push(e.to_string());
                return;
            }
        };

        match relocate::move_file(path, &dest_dir, self.conflict_policy) {
            Ok(MoveOutcome::Moved(dest)) => {
                info!(
                    "[Sorter] Moved {} to {} (category: {})",
                    file_name,
                    dest.display(),
                    category
                );
                summary.moved += 1;
            }
            Ok(MoveOutcome::Renamed(dest)) => {
                info!(
                    "[Sorter] Moved {} to {} (renamed to avoid a collision, category: {})",
                    file_name,
                    dest.display(),
                    category
                );
                summary.moved += 1;
            }
            Ok(MoveOutcome::Skipped(reason)) => {
                warn!("[Sorter] Did not move {}: {}", file_name, reason);
                summary.skipped_collision += 1;
            }
            Err(e) => {
                error!(
                    "[Sorter] Failed to move {} to category {:?}: {}, leaving in place",
                    file_name, category, e
                );
                summary.failed += 1;
                summary.errors.push(e.to_string());
            }
        }
    }
}

impl Default for Sorter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_source_aborts_before_any_work() {
        let dir = TempDir::new().unwrap();
        let sorter = Sorter::new();

        let result = sorter.run(&dir.path().join("nope"), &dir.path().join("target"));
        assert!(matches!(result, Err(SortError::SourceMissing(_))));
    }

    #[test]
    fn missing_target_is_created() {
        let source = TempDir::new().unwrap();
        let target_root = TempDir::new().unwrap();
        let target = target_root.path().join("sorted");

        let summary = Sorter::new().run(source.path(), &target).unwrap();

        assert!(target.is_dir());
        assert_eq!(summary.discovered, 0);
    }

    #[test]
    fn cancelled_run_processes_nothing() {
        let source = TempDir::new().unwrap();
        std::fs::write(source.path().join("notes.txt"), b"some notes").unwrap();
        let target = TempDir::new().unwrap();

        let sorter = Sorter::new();
        sorter.cancel_flag().store(true, Ordering::SeqCst);

        let summary = sorter.run(source.path(), target.path()).unwrap();

        assert!(summary.interrupted);
        assert_eq!(summary.discovered, 1);
        assert_eq!(summary.skipped_unsupported, 0);
        assert!(source.path().join("notes.txt").exists());
    }

    #[test]
    fn unsupported_types_stay_in_source() {
        let source = TempDir::new().unwrap();
        std::fs::write(source.path().join("notes.txt"), b"report of the week").unwrap();
        let target = TempDir::new().unwrap();

        let summary = Sorter::new().run(source.path(), target.path()).unwrap();

        assert_eq!(summary.skipped_unsupported, 1);
        assert_eq!(summary.moved, 0);
        assert!(source.path().join("notes.txt").exists());
    }

    #[test]
    fn extra_exclusions_gate_files_from_the_extractor() {
        let source = TempDir::new().unwrap();
        std::fs::write(source.path().join("data.docx"), b"garbage").unwrap();
        let target = TempDir::new().unwrap();

        // Excluded files are never discovered, so the corrupt docx never
        // reaches the extractor and nothing is counted as failed.
        let sorter = Sorter::new().with_extra_excluded_extensions(&[".docx".to_string()]);
        let summary = sorter.run(source.path(), target.path()).unwrap();

        assert_eq!(summary.discovered, 0);
        assert_eq!(summary.failed, 0);
        assert!(source.path().join("data.docx").exists());
    }
}
