//! Batch conversion
//!
//! Converts every matching file of a directory on a fixed-size worker pool.
//! One file's failure never stops the others; the result carries per-file
//! outcomes and the tallies the CLI turns into an exit code.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::converter::{ConversionOptions, Diagnostic, convert_obj_to_rrm, convert_rrm_to_obj};
use crate::error::Result;

/// Conversion direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchMode {
    /// `.rrm` -> `.obj` + `.mtl` (+ texture).
    ToMesh,
    /// `.obj` -> minimal `.rrm` (+ sidecars).
    ToContainer,
}

impl BatchMode {
    #[must_use]
    pub const fn input_extension(self) -> &'static str {
        match self {
            Self::ToMesh => "rrm",
            Self::ToContainer => "obj",
        }
    }

    #[must_use]
    pub const fn output_extension(self) -> &'static str {
        match self {
            Self::ToMesh => "obj",
            Self::ToContainer => "rrm",
        }
    }
}

/// How a batch runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub mode: BatchMode,
    /// Worker threads; `None` uses the available parallelism.
    pub jobs: Option<usize>,
    /// Descend into subdirectories, mirroring them under the output.
    pub recursive: bool,
    /// Handle texture sidecars.
    pub textures: bool,
}

impl BatchOptions {
    #[must_use]
    pub fn new(mode: BatchMode) -> Self {
        Self {
            mode,
            jobs: None,
            recursive: false,
            textures: true,
        }
    }
}

/// Progress of a running batch.
#[derive(Debug, Clone)]
pub struct BatchProgress {
    /// Files started so far (1-indexed).
    pub current: usize,
    pub total: usize,
    /// Input path relative to the input directory.
    pub file: String,
}

/// Why one file failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    /// Stable error code, e.g. `MalformedHeader`.
    pub code: String,
    pub message: String,
}

/// Result for one input file.
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    pub error: Option<FileFailure>,
    pub diagnostics: Vec<Diagnostic>,
}

impl FileOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub success_count: usize,
    pub fail_count: usize,
    /// One entry per input, in discovery order.
    pub outcomes: Vec<FileOutcome>,
}

impl BatchResult {
    /// 0 when every file converted, 1 otherwise.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        i32::from(self.fail_count > 0)
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

/// Files in `dir` with extension `ext` (case-insensitive), sorted.
///
/// # Errors
/// `WalkDirError` if `dir` or a subdirectory cannot be read.
pub fn find_input_files(dir: &Path, ext: &str, recursive: bool) -> Result<Vec<PathBuf>> {
    let walker = WalkDir::new(dir).min_depth(1);
    let walker = if recursive { walker } else { walker.max_depth(1) };

    let mut files = Vec::new();
    for entry in walker.follow_links(true) {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_file()
            && path
                .extension()
                .is_some_and(|e| e.eq_ignore_ascii_case(ext))
        {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

/// Where `input` lands under `output_dir`, keeping its relative parent.
#[must_use]
pub fn output_path_for(input: &Path, input_dir: &Path, output_dir: &Path, mode: BatchMode) -> PathBuf {
    let relative = input.strip_prefix(input_dir).unwrap_or(input);
    let parent = relative.parent().unwrap_or_else(|| Path::new(""));
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    output_dir
        .join(parent)
        .join(format!("{stem}.{}", mode.output_extension()))
}

/// Convert every input file of `input_dir` into `output_dir`.
///
/// # Errors
/// Only for batch-level problems: the input directory cannot be listed or
/// the worker pool cannot start. Per-file failures are in the result.
pub fn batch_convert<F>(
    input_dir: &Path,
    output_dir: &Path,
    options: &BatchOptions,
    conversion: &ConversionOptions,
    progress: F,
) -> Result<BatchResult>
where
    F: Fn(&BatchProgress) + Send + Sync,
{
    let files = find_input_files(input_dir, options.mode.input_extension(), options.recursive)?;
    std::fs::create_dir_all(output_dir)?;

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(jobs) = options.jobs {
        builder = builder.num_threads(jobs.max(1));
    }
    let pool = builder.build()?;

    tracing::info!(
        "Batch {:?}: {} files from {:?} on {} workers",
        options.mode,
        files.len(),
        input_dir,
        pool.current_num_threads()
    );

    let success_counter = AtomicUsize::new(0);
    let fail_counter = AtomicUsize::new(0);
    let processed = AtomicUsize::new(0);
    let total = files.len();

    let outcomes: Vec<FileOutcome> = pool.install(|| {
        files
            .par_iter()
            .map(|input| {
                let relative = input.strip_prefix(input_dir).unwrap_or(input);
                let current = processed.fetch_add(1, Ordering::SeqCst) + 1;
                progress(&BatchProgress {
                    current,
                    total,
                    file: relative.to_string_lossy().to_string(),
                });

                let output = output_path_for(input, input_dir, output_dir, options.mode);
                let result = match options.mode {
                    BatchMode::ToMesh => convert_rrm_to_obj(input, &output, conversion, options.textures),
                    BatchMode::ToContainer => convert_obj_to_rrm(input, &output, options.textures),
                };

                match result {
                    Ok(report) => {
                        success_counter.fetch_add(1, Ordering::SeqCst);
                        FileOutcome {
                            input: input.clone(),
                            output,
                            error: None,
                            diagnostics: report.diagnostics,
                        }
                    }
                    Err(e) => {
                        fail_counter.fetch_add(1, Ordering::SeqCst);
                        tracing::warn!("Failed {}: {e}", relative.display());
                        FileOutcome {
                            input: input.clone(),
                            output,
                            error: Some(FileFailure {
                                code: e.code().to_string(),
                                message: e.to_string(),
                            }),
                            diagnostics: Vec::new(),
                        }
                    }
                }
            })
            .collect()
    });

    let result = BatchResult {
        success_count: success_counter.load(Ordering::SeqCst),
        fail_count: fail_counter.load(Ordering::SeqCst),
        outcomes,
    };
    tracing::info!(
        "Batch complete: {} succeeded, {} failed",
        result.success_count,
        result.fail_count
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_discovery_depth_and_case() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        for name in ["b.rrm", "a.RRM", "c.obj", "sub/d.rrm"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let flat = find_input_files(dir.path(), "rrm", false).unwrap();
        let names: Vec<String> = flat
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.RRM", "b.rrm"]);

        let deep = find_input_files(dir.path(), "rrm", true).unwrap();
        assert_eq!(deep.len(), 3);
    }

    #[test]
    fn test_output_path_keeps_relative_parent() {
        let out = output_path_for(
            Path::new("/in/chars/caha000.rrm"),
            Path::new("/in"),
            Path::new("/out"),
            BatchMode::ToMesh,
        );
        assert_eq!(out, PathBuf::from("/out/chars/caha000.obj"));
    }

    #[test]
    fn test_exit_code() {
        let mut result = BatchResult {
            success_count: 2,
            fail_count: 0,
            outcomes: Vec::new(),
        };
        assert_eq!(result.exit_code(), 0);
        result.fail_count = 1;
        assert_eq!(result.exit_code(), 1);
    }
}
