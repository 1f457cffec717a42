//! CLI interface for UV candidate export
use std::path::Path;

use crate::cli::progress::{DISK, LOOKING_GLASS, print_step};
use crate::converter::{ConversionOptions, export_uv_variants};

/// # Errors
/// Any pipeline or write error.
pub fn execute(
    file: &Path,
    output: &Path,
    options: &ConversionOptions,
    textures: bool,
) -> anyhow::Result<()> {
    print_step(1, 2, LOOKING_GLASS, &format!("Scanning {} for UV sets...", file.display()));
    let written = export_uv_variants(file, output, options, textures)?;

    if written.is_empty() {
        println!("No UV candidate sets found in {}", file.display());
        return Ok(());
    }

    print_step(2, 2, DISK, &format!("Wrote {} variants:", written.len()));
    for path in &written {
        println!("  {}", path.display());
    }
    Ok(())
}
