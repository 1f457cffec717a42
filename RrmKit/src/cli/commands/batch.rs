//! CLI interface for directory batch conversion
use std::path::Path;
use std::time::Instant;

use anyhow::Context;

use crate::batch::{BatchMode, BatchOptions, batch_convert, find_input_files};
use crate::cli::progress::{TRUCK, print_done, print_step, simple_bar};
use crate::converter::ConversionOptions;

/// Batch flags after parsing.
pub struct BatchCliOptions<'a> {
    pub mode: BatchMode,
    pub jobs: Option<usize>,
    pub recursive: bool,
    pub textures: bool,
    pub report: Option<&'a Path>,
    pub show_progress: bool,
}

/// # Errors
/// Batch-level failures, or a summary error when any file failed.
pub fn execute(
    input: &Path,
    output: &Path,
    cli: &BatchCliOptions,
    conversion: &ConversionOptions,
) -> anyhow::Result<()> {
    let started = Instant::now();
    let total = find_input_files(input, cli.mode.input_extension(), cli.recursive)?.len();
    if total == 0 {
        println!(
            "No .{} files found in: {}",
            cli.mode.input_extension(),
            input.display()
        );
        return Ok(());
    }

    print_step(
        1,
        1,
        TRUCK,
        &format!("Converting {total} files from {}...", input.display()),
    );

    let pb = cli.show_progress.then(|| simple_bar(total as u64, "Converting"));
    let options = BatchOptions {
        mode: cli.mode,
        jobs: cli.jobs,
        recursive: cli.recursive,
        textures: cli.textures,
    };
    let result = batch_convert(input, output, &options, conversion, |progress| {
        if let Some(pb) = &pb {
            pb.set_position(progress.current as u64);
            pb.set_message(progress.file.clone());
        }
    })?;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    println!();
    println!("Batch complete:");
    println!("  Success: {}", result.success_count);
    println!("  Failed: {}", result.fail_count);

    if let Some(path) = cli.report {
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        println!("  Report: {}", path.display());
    }

    if result.fail_count > 0 {
        println!();
        println!("Failures:");
        for outcome in result.failures() {
            if let Some(error) = &outcome.error {
                println!("  [{}] {}", error.code, error.message);
            }
        }
        anyhow::bail!("{} of {total} files failed", result.fail_count);
    }

    print_done(started.elapsed());
    Ok(())
}
