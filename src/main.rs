//! docsort CLI entry point.
//!
//! Parses the two path arguments, wires logging (console plus a rolling
//! log file) and the interrupt flag, runs one batch, and maps the result
//! to an exit code: 0 success, 1 fatal error, 130 interrupt.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use docsort::relocate::ConflictPolicy;
use docsort::sorter::Sorter;

#[derive(Parser, Debug)]
#[command(
    name = "docsort",
    version,
    about = "Sorts document files from a source directory into categorized subfolders in a target directory"
)]
struct Cli {
    /// Source directory containing files to sort
    source_dir: PathBuf,

    /// Target directory where categorized subfolders will be created
    target_dir: PathBuf,

    /// How to handle a same-named file already present in a category folder
    #[arg(long, value_enum, default_value_t = ConflictPolicy::Rename)]
    collisions: ConflictPolicy,

    /// Directory for the structured log file
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    /// Additional file extensions to exclude from processing (repeatable)
    #[arg(long = "exclude", value_name = "EXT")]
    exclude: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _log_guard = init_logging(&cli.log_dir);

    info!(
        "[Main] Invoked with source: {}, target: {}",
        cli.source_dir.display(),
        cli.target_dir.display()
    );

    if !cli.source_dir.is_dir() {
        return fatal(&format!(
            "Source directory {} does not exist or is not a directory",
            cli.source_dir.display()
        ));
    }

    // The target may not exist yet, in which case it cannot alias the
    // source; canonicalize both only when both resolve.
    if let (Ok(source), Ok(target)) = (cli.source_dir.canonicalize(), cli.target_dir.canonicalize())
    {
        if source == target {
            return fatal("Source and target directories must differ");
        }
    }

    let sorter = Sorter::new()
        .with_conflict_policy(cli.collisions)
        .with_extra_excluded_extensions(&cli.exclude);

    let cancel = sorter.cancel_flag();
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("Interrupt received, stopping after the current file...");
        cancel.store(true, Ordering::SeqCst);
    }) {
        tracing::warn!("[Main] Failed to install interrupt handler: {}", e);
    }

    match sorter.run(&cli.source_dir, &cli.target_dir) {
        Ok(summary) => {
            println!(
                "Processed {} files: {} moved, {} unsupported, {} empty, {} unmatched, {} collisions skipped, {} failed",
                summary.discovered,
                summary.moved,
                summary.skipped_unsupported,
                summary.skipped_empty,
                summary.skipped_unmatched,
                summary.skipped_collision,
                summary.failed
            );
            if summary.interrupted {
                println!("Run interrupted before completion");
                return ExitCode::from(130);
            }
            ExitCode::SUCCESS
        }
        Err(e) => fatal(&e.to_string()),
    }
}

fn fatal(message: &str) -> ExitCode {
    eprintln!("{message}");
    error!("[Main] {}", message);
    ExitCode::from(1)
}

/// Console layer plus a daily-rolling file layer under `log_dir`. A file
/// layer that cannot be created downgrades to console-only with a warning.
/// The returned guard must stay alive for the file writer to flush.
fn init_logging(log_dir: &Path) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("docsort=info"));

    let mut guard = None;
    let file_layer = match std::fs::create_dir_all(log_dir) {
        Ok(()) => {
            let file_appender = tracing_appender::rolling::daily(log_dir, "docsort.log");
            let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
            guard = Some(file_guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(file_writer)
                    .with_ansi(false)
                    .with_filter(env_filter.clone()),
            )
        }
        Err(e) => {
            eprintln!("Warning: failed to create log directory: {e}");
            None
        }
    };

    let console_layer = tracing_subscriber::fmt::layer().with_filter(env_filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .init();

    guard
}
