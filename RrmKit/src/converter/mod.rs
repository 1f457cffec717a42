//! Format conversion
//!
//! - RRM -> OBJ/MTL: staged recovery ([`pipeline`]), optional texture sidecar
//! - OBJ -> minimal RRM: positions only, sidecars copied unchanged
//! - RRM -> one OBJ per UV candidate, for visual comparison
//!
//! File-level functions wrap every error in [`Error::InFile`] so batch
//! reports can name the failing input.

mod options;
pub mod pipeline;

use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

pub use crate::formats::rrm::Diagnostic;
pub use options::ConversionOptions;
pub use pipeline::{Extraction, IndexSummary, Pipeline, extract_mesh};

use crate::error::{Error, Result};
use crate::formats::obj::{read_obj, save_obj_with_mtl, write_atomically};
use crate::formats::rrm::detect::RoleRanking;
use crate::formats::rrm::{
    RawBuffer, RrmHeader, is_minimal_container, read_minimal_container, write_minimal_container,
};
use crate::mesh::{Mesh, UvSetStats, select_uv_set, summarize_uv_sets};
use crate::texture::{TextureAction, copy_sidecars, export_texture};

/// Summary of one file conversion.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub vertices: usize,
    pub faces: usize,
    pub uv_sets: usize,
    pub uv_set_selected: Option<usize>,
    pub texture: Option<TextureAction>,
    /// Sidecars copied unchanged (container direction).
    pub sidecars: Vec<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Recover a mesh from container bytes.
///
/// Minimal `RRMEXTR` containers are read directly; anything else goes
/// through the recovery pipeline and `options.uv_set` is applied.
///
/// # Errors
/// Any pipeline error, or `InvalidContainer` for a damaged minimal container.
pub fn container_to_mesh(buffer: &RawBuffer, options: &ConversionOptions) -> Result<(Mesh, Vec<Diagnostic>)> {
    if is_minimal_container(buffer.as_bytes()) {
        return Ok((read_minimal_container(buffer)?, Vec::new()));
    }
    let extraction = extract_mesh(buffer, options)?;
    Ok((extraction.mesh, extraction.diagnostics))
}

/// Serialize `mesh` as a minimal container.
///
/// # Errors
/// `InvalidContainer` if the mesh is too large for the layout.
pub fn mesh_to_container(mesh: &Mesh) -> Result<Vec<u8>> {
    write_minimal_container(mesh)
}

/// Convert an RRM file to `output` (OBJ) plus a sibling MTL.
///
/// With `textures`, the model's DDS is transcoded next to the OBJ and named
/// in the MTL.
///
/// # Errors
/// Any error, wrapped in [`Error::InFile`] naming `input`.
pub fn convert_rrm_to_obj(
    input: &Path,
    output: &Path,
    options: &ConversionOptions,
    textures: bool,
) -> Result<ConversionReport> {
    rrm_to_obj(input, output, options, textures).map_err(|e| e.in_file(input))
}

fn rrm_to_obj(
    input: &Path,
    output: &Path,
    options: &ConversionOptions,
    textures: bool,
) -> Result<ConversionReport> {
    tracing::info!("Converting RRM→OBJ: {:?} → {:?}", input, output);
    let buffer = RawBuffer::new(fs::read(input)?);
    let (mut mesh, diagnostics) = container_to_mesh(&buffer, options)?;

    let out_dir = ensure_parent(output)?;
    let texture = if textures {
        let name = file_stem(output);
        export_texture(input, &out_dir, &name)?
    } else {
        None
    };
    mesh.material = texture.as_ref().map(TextureAction::texture_name);

    save_obj_with_mtl(&mesh, output)?;
    tracing::info!(
        "Conversion complete: {} vertices, {} faces, {} diagnostics",
        mesh.vertex_count(),
        mesh.faces.len(),
        diagnostics.len()
    );

    Ok(ConversionReport {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        vertices: mesh.vertex_count(),
        faces: mesh.faces.len(),
        uv_sets: mesh.uv_sets.len(),
        uv_set_selected: mesh.uv_set_selected,
        texture,
        sidecars: Vec::new(),
        diagnostics,
    })
}

/// Convert an OBJ file to a minimal RRM container.
///
/// With `textures`, PNG/DDS/MTL sidecars sharing the OBJ's stem are copied
/// next to the output unchanged.
///
/// # Errors
/// Any error, wrapped in [`Error::InFile`] naming `input`.
pub fn convert_obj_to_rrm(input: &Path, output: &Path, textures: bool) -> Result<ConversionReport> {
    obj_to_rrm(input, output, textures).map_err(|e| e.in_file(input))
}

fn obj_to_rrm(input: &Path, output: &Path, textures: bool) -> Result<ConversionReport> {
    tracing::info!("Converting OBJ→RRM: {:?} → {:?}", input, output);
    let mesh = read_obj(BufReader::new(File::open(input)?))?;
    if mesh.vertices.is_empty() {
        return Err(Error::NoVertices(input.display().to_string()));
    }

    let out_dir = ensure_parent(output)?;
    let container = mesh_to_container(&mesh)?;
    write_atomically(output, |writer| Ok(writer.write_all(&container)?))?;
    let sidecars = if textures {
        copy_sidecars(input, &out_dir)?
    } else {
        Vec::new()
    };
    tracing::info!("Conversion complete: {} vertices", mesh.vertex_count());

    Ok(ConversionReport {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        vertices: mesh.vertex_count(),
        faces: mesh.faces.len(),
        uv_sets: 0,
        uv_set_selected: None,
        texture: None,
        sidecars,
        diagnostics: Vec::new(),
    })
}

/// Write `<stem>_uv<N>.obj` (+ MTL) into `out_dir` for every UV candidate
/// set of `input`, all referencing the same texture.
///
/// Returns the written OBJ paths in set order.
///
/// # Errors
/// Any error, wrapped in [`Error::InFile`] naming `input`.
pub fn export_uv_variants(
    input: &Path,
    out_dir: &Path,
    options: &ConversionOptions,
    textures: bool,
) -> Result<Vec<PathBuf>> {
    uv_variants(input, out_dir, options, textures).map_err(|e| e.in_file(input))
}

fn uv_variants(
    input: &Path,
    out_dir: &Path,
    options: &ConversionOptions,
    textures: bool,
) -> Result<Vec<PathBuf>> {
    let buffer = RawBuffer::new(fs::read(input)?);
    let extraction = Pipeline::new(&buffer, options)
        .read_header()?
        .scan_streams()
        .extract_indices()?
        .assemble()?;

    fs::create_dir_all(out_dir)?;
    let stem = file_stem(input);
    let texture = if textures {
        export_texture(input, out_dir, &stem)?
    } else {
        None
    };

    let mut written = Vec::with_capacity(extraction.mesh.uv_sets.len());
    for index in 0..extraction.mesh.uv_sets.len() {
        let mut mesh = select_uv_set(&extraction.mesh, index)?;
        mesh.material = texture.as_ref().map(TextureAction::texture_name);
        let path = out_dir.join(format!("{stem}_uv{index}.obj"));
        save_obj_with_mtl(&mesh, &path)?;
        written.push(path);
    }

    tracing::info!("Exported {} UV variants to {:?}", written.len(), out_dir);
    Ok(written)
}

/// Everything `inspect` reports about one container.
#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub file: PathBuf,
    pub size: usize,
    pub header: RrmHeader,
    pub indices: IndexSummary,
    pub faces: usize,
    pub rankings: Vec<RoleRanking>,
    pub uv_sets: Vec<UvSetStats>,
    pub bounds: Option<([f32; 3], [f32; 3])>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Run the pipeline on `input` and report every intermediate result.
///
/// # Errors
/// Any error, wrapped in [`Error::InFile`] naming `input`.
pub fn inspect_container(input: &Path, options: &ConversionOptions) -> Result<InspectReport> {
    let inspect = || -> Result<InspectReport> {
        let buffer = RawBuffer::new(fs::read(input)?);
        let extraction = extract_mesh(&buffer, options)?;
        Ok(InspectReport {
            file: input.to_path_buf(),
            size: buffer.len(),
            faces: extraction.mesh.faces.len(),
            uv_sets: summarize_uv_sets(&extraction.mesh),
            bounds: extraction.mesh.bounds(),
            header: extraction.header,
            indices: extraction.indices,
            rankings: extraction.detection.rankings,
            diagnostics: extraction.diagnostics,
        })
    };
    inspect().map_err(|e| e.in_file(input))
}

/// Create the parent directory of `path` and return it.
fn ensure_parent(path: &Path) -> Result<PathBuf> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string())
}
