//! OBJ parsing for the mesh -> container direction.
//!
//! Only positions and faces matter for the minimal container; normals,
//! texture coordinates and materials are ignored.

use std::io::BufRead;

use crate::error::{Error, Result};
use crate::mesh::Mesh;

/// Parse OBJ text into a positions-only mesh.
///
/// Polygons are triangulated and every object/group in the file is merged
/// into one mesh, with face indices offset per model.
///
/// # Errors
/// `ObjParse` on malformed records or out-of-range face indices.
pub fn read_obj<R: BufRead>(mut reader: R) -> Result<Mesh> {
    let load_opts = tobj::LoadOptions {
        triangulate: true,
        ignore_lines: true,
        ignore_points: true,
        ..Default::default()
    };
    let (models, _materials) =
        tobj::load_obj_buf(&mut reader, &load_opts, |_| Ok((Vec::new(), Default::default())))
            .map_err(|e| Error::ObjParse { message: e.to_string() })?;

    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut faces: Vec<[u32; 3]> = Vec::new();
    for model in models {
        let mesh = model.mesh;
        let base = u32::try_from(positions.len()).map_err(|_| Error::ObjParse {
            message: format!("too many vertices at model '{}'", model.name),
        })?;
        positions.extend(mesh.positions.chunks_exact(3).map(|p| [p[0], p[1], p[2]]));
        faces.extend(
            mesh.indices
                .chunks_exact(3)
                .map(|t| [base + t[0], base + t[1], base + t[2]]),
        );
    }

    tracing::debug!("Parsed OBJ: {} vertices, {} faces", positions.len(), faces.len());
    Ok(Mesh::from_positions(positions, faces))
}
