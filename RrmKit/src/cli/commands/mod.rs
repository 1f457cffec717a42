use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Subcommand, ValueEnum};

use crate::batch::BatchMode;
use crate::converter::ConversionOptions;
use crate::mesh::DedupPolicy;

pub mod batch;
pub mod convert;
pub mod inspect;
pub mod uv;

/// Recovery options shared by every command that reads containers.
#[derive(Args, Debug, Clone, Default)]
pub struct RecoveryArgs {
    /// TOML file with layout/detector/assembly settings (flags override it)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Commit to UV candidate set N for export
    #[arg(long)]
    uv_set: Option<usize>,

    /// Merge vertices whose every attribute is bit-identical
    #[arg(long)]
    dedup: bool,

    /// Use the best normal/UV candidate even below the confidence threshold
    #[arg(long)]
    allow_low_confidence: bool,
}

impl RecoveryArgs {
    /// Load `--config` (if any) and apply the flags on top.
    ///
    /// # Errors
    /// If the config file cannot be read or parsed.
    pub fn load(&self) -> anyhow::Result<ConversionOptions> {
        let mut options = match &self.config {
            Some(path) => ConversionOptions::from_toml_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ConversionOptions::default(),
        };
        if self.uv_set.is_some() {
            options.uv_set = self.uv_set;
        }
        if self.dedup {
            options.assembly.dedup = DedupPolicy::ExactAttributes;
        }
        options.allow_low_confidence |= self.allow_low_confidence;
        Ok(options)
    }
}

/// Batch conversion direction
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    /// .rrm -> .obj/.mtl
    ToMesh,
    /// .obj -> minimal .rrm
    ToContainer,
}

impl From<ModeArg> for BatchMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::ToMesh => BatchMode::ToMesh,
            ModeArg::ToContainer => BatchMode::ToContainer,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert one file
    Convert {
        #[command(subcommand)]
        command: ConvertCommands,
    },

    /// Convert every file of a directory
    Batch {
        /// Conversion direction
        #[arg(short, long, value_enum)]
        mode: ModeArg,

        /// Input directory
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Worker threads (default: available parallelism)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,

        #[command(flatten)]
        recovery: RecoveryArgs,

        /// Skip texture sidecars
        #[arg(long)]
        no_texture: bool,

        /// Write a JSON report of every file outcome
        #[arg(long)]
        report: Option<PathBuf>,

        /// Suppress progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show what the recovery pipeline finds in a container
    Inspect {
        /// RRM file
        file: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        recovery: RecoveryArgs,
    },

    /// Export one OBJ per UV candidate set for visual comparison
    UvVariants {
        /// RRM file
        file: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        recovery: RecoveryArgs,

        /// Skip texture sidecars
        #[arg(long)]
        no_texture: bool,
    },
}

/// Single-file conversion directions
#[derive(Subcommand)]
pub enum ConvertCommands {
    /// Recover an OBJ/MTL mesh from an RRM container
    RrmToMesh {
        /// RRM file
        input: PathBuf,

        /// Destination .obj file
        output: PathBuf,

        #[command(flatten)]
        recovery: RecoveryArgs,

        /// Skip texture sidecars
        #[arg(long)]
        no_texture: bool,
    },

    /// Write the positions of an OBJ mesh into a minimal RRM container
    MeshToRrm {
        /// OBJ file
        input: PathBuf,

        /// Destination .rrm file
        output: PathBuf,

        /// Skip texture sidecars
        #[arg(long)]
        no_texture: bool,
    },

    /// Pick the direction from the file extensions (.rrm -> .obj, .obj -> .rrm)
    Auto {
        /// Source file
        input: PathBuf,

        /// Destination file
        output: PathBuf,

        #[command(flatten)]
        recovery: RecoveryArgs,

        /// Skip texture sidecars
        #[arg(long)]
        no_texture: bool,
    },
}

impl ConvertCommands {
    /// # Errors
    /// Any conversion error, with file context.
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            ConvertCommands::RrmToMesh {
                input,
                output,
                recovery,
                no_texture,
            } => convert::rrm_to_mesh(input, output, &recovery.load()?, !*no_texture),
            ConvertCommands::MeshToRrm {
                input,
                output,
                no_texture,
            } => convert::mesh_to_rrm(input, output, !*no_texture),
            ConvertCommands::Auto {
                input,
                output,
                recovery,
                no_texture,
            } => convert::by_extension(input, output, &recovery.load()?, !*no_texture),
        }
    }
}

impl Commands {
    /// # Errors
    /// Any error of the command, with file context.
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::Convert { command } => command.execute(),
            Commands::Batch {
                mode,
                input,
                output,
                jobs,
                recursive,
                recovery,
                no_texture,
                report,
                quiet,
            } => batch::execute(
                input,
                output,
                &batch::BatchCliOptions {
                    mode: (*mode).into(),
                    jobs: *jobs,
                    recursive: *recursive,
                    textures: !*no_texture,
                    report: report.as_deref(),
                    show_progress: !*quiet,
                },
                &recovery.load()?,
            ),
            Commands::Inspect {
                file,
                json,
                recovery,
            } => inspect::execute(file, *json, &recovery.load()?),
            Commands::UvVariants {
                file,
                output,
                recovery,
                no_texture,
            } => uv::execute(file, output, &recovery.load()?, !*no_texture),
        }
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(str::to_lowercase)
}
