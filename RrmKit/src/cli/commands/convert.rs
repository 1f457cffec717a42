//! CLI interface for single-file conversion
use std::path::Path;
use std::time::Instant;

use super::extension_of;
use crate::cli::progress::{DISK, GEAR, print_done, print_step, print_warning};
use crate::converter::{ConversionOptions, ConversionReport, convert_obj_to_rrm, convert_rrm_to_obj};

/// `convert rrm-to-mesh`: recover `output` (.obj + .mtl) from `input`.
///
/// # Errors
/// Any conversion error.
pub fn rrm_to_mesh(input: &Path, output: &Path, options: &ConversionOptions, textures: bool) -> anyhow::Result<()> {
    let started = Instant::now();
    print_step(1, 2, GEAR, &format!("Recovering mesh from {}...", input.display()));
    let report = convert_rrm_to_obj(input, output, options, textures)?;
    print_step(2, 2, DISK, &format!("Wrote {}", output.display()));
    print_summary(&report);
    print_done(started.elapsed());
    Ok(())
}

/// `convert mesh-to-rrm`: write the positions of `input` to a minimal container.
///
/// # Errors
/// Any conversion error.
pub fn mesh_to_rrm(input: &Path, output: &Path, textures: bool) -> anyhow::Result<()> {
    let started = Instant::now();
    print_step(1, 2, GEAR, &format!("Reading {}...", input.display()));
    let report = convert_obj_to_rrm(input, output, textures)?;
    print_step(2, 2, DISK, &format!("Wrote {}", output.display()));
    print_summary(&report);
    print_done(started.elapsed());
    Ok(())
}

/// `convert auto`: pick the direction from the file extensions.
///
/// # Errors
/// Unsupported extension pairs and any conversion error.
pub fn by_extension(input: &Path, output: &Path, options: &ConversionOptions, textures: bool) -> anyhow::Result<()> {
    match direction(input, output)? {
        Direction::RrmToMesh => rrm_to_mesh(input, output, options, textures),
        Direction::MeshToRrm => mesh_to_rrm(input, output, textures),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    RrmToMesh,
    MeshToRrm,
}

fn direction(input: &Path, output: &Path) -> anyhow::Result<Direction> {
    let from = extension_of(input)
        .ok_or_else(|| anyhow::anyhow!("Cannot detect input format from {}", input.display()))?;
    let to = extension_of(output)
        .ok_or_else(|| anyhow::anyhow!("Cannot detect output format from {}", output.display()))?;
    match (from.as_str(), to.as_str()) {
        ("rrm", "obj") => Ok(Direction::RrmToMesh),
        ("obj", "rrm") => Ok(Direction::MeshToRrm),
        _ => anyhow::bail!("Unsupported conversion: {from} -> {to} (expected rrm -> obj or obj -> rrm)"),
    }
}

fn print_summary(report: &ConversionReport) {
    println!("  Vertices: {}", report.vertices);
    println!("  Faces:    {}", report.faces);
    if report.uv_sets > 0 {
        match report.uv_set_selected {
            Some(set) => println!("  UV sets:  {} (exported set {set})", report.uv_sets),
            None => println!("  UV sets:  {} (none selected, use --uv-set)", report.uv_sets),
        }
    }
    if let Some(texture) = &report.texture {
        println!("  Texture:  {}", texture.texture_name());
    }
    for sidecar in &report.sidecars {
        println!("  Copied:   {}", sidecar.display());
    }
    for diagnostic in &report.diagnostics {
        print_warning(&diagnostic.to_string());
    }
}
