//! OBJ and MTL serialization.

use std::io::{BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::Result;
use crate::mesh::Mesh;

/// Material name used by every exported OBJ.
pub const MATERIAL_NAME: &str = "material0";

/// What goes into the OBJ header.
#[derive(Debug, Clone, Default)]
pub struct ObjWriteOptions {
    /// File name written after `mtllib`. No `mtllib`/`usemtl` lines when `None`.
    pub mtl_file: Option<String>,
}

/// The single material referenced by an exported OBJ.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MtlMaterial {
    /// Texture file name for `map_Kd`.
    pub texture: Option<String>,
}

/// Which face form `write_obj` emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FaceForm {
    Position,
    PositionUv,
    PositionNormal,
    PositionUvNormal,
}

impl FaceForm {
    fn corner(self, i: u32) -> String {
        let i = u64::from(i) + 1;
        match self {
            Self::Position => format!("{i}"),
            Self::PositionUv => format!("{i}/{i}"),
            Self::PositionNormal => format!("{i}//{i}"),
            Self::PositionUvNormal => format!("{i}/{i}/{i}"),
        }
    }
}

/// Write `mesh` as Wavefront OBJ.
///
/// Floats use Rust's shortest round-trip formatting, so parsing the output
/// yields the same f32 bits. `vn` lines are written only when every vertex
/// has a normal, `vt` lines only for the committed UV set. Non-finite UVs
/// are written as `0 0`.
///
/// # Errors
/// Any I/O error from `writer`.
pub fn write_obj<W: Write>(writer: &mut W, mesh: &Mesh, options: &ObjWriteOptions) -> Result<()> {
    writeln!(writer, "# rrmkit {}", crate::VERSION)?;
    writeln!(writer, "# vertices: {}, faces: {}", mesh.vertex_count(), mesh.faces.len())?;
    if let Some(mtl) = &options.mtl_file {
        writeln!(writer, "mtllib {mtl}")?;
        writeln!(writer, "usemtl {MATERIAL_NAME}")?;
    }

    for [x, y, z] in mesh.positions() {
        writeln!(writer, "v {x} {y} {z}")?;
    }

    let has_normals = mesh.has_normals();
    if has_normals {
        for [x, y, z] in mesh.vertices.iter().filter_map(|v| v.normal) {
            writeln!(writer, "vn {x} {y} {z}")?;
        }
    }

    let has_uvs = mesh.uv_set_selected.is_some()
        && (0..mesh.vertex_count()).all(|i| mesh.selected_uv(i).is_some());
    if has_uvs {
        for i in 0..mesh.vertex_count() {
            let [u, v] = mesh.selected_uv(i).unwrap_or_default();
            if u.is_finite() && v.is_finite() {
                writeln!(writer, "vt {u} {v}")?;
            } else {
                writeln!(writer, "vt 0 0")?;
            }
        }
    }

    let form = match (has_uvs, has_normals) {
        (false, false) => FaceForm::Position,
        (true, false) => FaceForm::PositionUv,
        (false, true) => FaceForm::PositionNormal,
        (true, true) => FaceForm::PositionUvNormal,
    };
    for [a, b, c] in &mesh.faces {
        writeln!(
            writer,
            "f {} {} {}",
            form.corner(*a),
            form.corner(*b),
            form.corner(*c)
        )?;
    }

    Ok(())
}

/// Write the MTL for [`MATERIAL_NAME`].
///
/// # Errors
/// Any I/O error from `writer`.
pub fn write_mtl<W: Write>(writer: &mut W, material: &MtlMaterial) -> Result<()> {
    writeln!(writer, "newmtl {MATERIAL_NAME}")?;
    writeln!(writer, "Ka 1.000 1.000 1.000")?;
    writeln!(writer, "Kd 1.000 1.000 1.000")?;
    writeln!(writer, "Ks 0.000 0.000 0.000")?;
    writeln!(writer, "d 1.0")?;
    writeln!(writer, "illum 1")?;
    if let Some(texture) = &material.texture {
        writeln!(writer, "map_Kd {texture}")?;
    }
    Ok(())
}

/// Write `mesh` to `obj_path`, plus a sibling `.mtl` naming `mesh.material`.
///
/// # Errors
/// Any I/O error while creating or writing either file.
pub fn save_obj_with_mtl(mesh: &Mesh, obj_path: &Path) -> Result<()> {
    let mtl_path = obj_path.with_extension("mtl");
    let mtl_file = mtl_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());

    write_atomically(obj_path, |writer| write_obj(writer, mesh, &ObjWriteOptions { mtl_file }))?;
    write_atomically(&mtl_path, |writer| {
        write_mtl(
            writer,
            &MtlMaterial {
                texture: mesh.material.clone(),
            },
        )
    })?;

    tracing::debug!("Wrote {} and {}", obj_path.display(), mtl_path.display());
    Ok(())
}

/// Write `path` through a temporary sibling that is renamed into place only
/// after `write` succeeded. On error the target is left untouched.
///
/// # Errors
/// Errors from `write`, or I/O errors creating, flushing or renaming the
/// temporary file.
pub(crate) fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<&mut NamedTempFile>) -> Result<()>,
{
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(&mut tmp);
        write(&mut writer)?;
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::UvSetInfo;

    fn render(mesh: &Mesh, options: &ObjWriteOptions) -> String {
        let mut out = Vec::new();
        write_obj(&mut out, mesh, options).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn body(text: &str) -> Vec<&str> {
        text.lines().filter(|l| !l.starts_with('#')).collect()
    }

    fn uv_mesh() -> Mesh {
        let mut mesh = Mesh::from_positions(
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![[0, 1, 2]],
        );
        let uvs = [[0.0, 0.0], [1.0, 0.0], [f32::NAN, 1.0]];
        for (vertex, uv) in mesh.vertices.iter_mut().zip(uvs) {
            vertex.uv_candidates = vec![uv];
        }
        mesh.uv_sets.push(UvSetInfo {
            layout: "normal_uv_interleaved".to_string(),
            stream_offset: 0x20C0,
            stride: 32,
            field_offset: 24,
            confidence: 1.0,
        });
        mesh
    }

    #[test]
    fn test_positions_only() {
        let mesh = Mesh::from_positions([[0.5, -1.25, 3.0], [0.1, 0.0, 0.0], [0.0, 0.0, 1.0]], vec![[0, 1, 2]]);
        let text = render(&mesh, &ObjWriteOptions::default());
        assert_eq!(
            body(&text),
            vec!["v 0.5 -1.25 3", "v 0.1 0 0", "v 0 0 1", "f 1 2 3"]
        );
    }

    #[test]
    fn test_uvs_only_when_committed() {
        let mesh = uv_mesh();
        let text = render(&mesh, &ObjWriteOptions::default());
        assert!(!text.contains("vt "));
        assert!(text.contains("f 1 2 3"));

        let selected = Mesh {
            uv_set_selected: Some(0),
            ..mesh
        };
        let text = render(&selected, &ObjWriteOptions::default());
        let lines = body(&text);
        assert_eq!(&lines[3..], &["vt 0 0", "vt 1 0", "vt 0 0", "f 1/1 2/2 3/3"]);
    }

    #[test]
    fn test_normals_and_material_header() {
        let mut mesh = uv_mesh();
        mesh.uv_set_selected = Some(0);
        for vertex in &mut mesh.vertices {
            vertex.normal = Some([0.0, 0.0, 1.0]);
        }
        let options = ObjWriteOptions {
            mtl_file: Some("model.mtl".to_string()),
        };
        let text = render(&mesh, &options);
        let lines = body(&text);
        assert_eq!(lines[0], "mtllib model.mtl");
        assert_eq!(lines[1], "usemtl material0");
        assert!(lines.contains(&"vn 0 0 1"));
        assert_eq!(*lines.last().unwrap(), "f 1/1/1 2/2/2 3/3/3");

        mesh.uv_set_selected = None;
        let text = render(&mesh, &options);
        assert!(text.ends_with("f 1//1 2//2 3//3\n"));
    }

    #[test]
    fn test_mtl() {
        let mut out = Vec::new();
        write_mtl(
            &mut out,
            &MtlMaterial {
                texture: Some("model.png".to_string()),
            },
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("newmtl material0\n"));
        assert!(text.contains("illum 1\n"));
        assert!(text.ends_with("map_Kd model.png\n"));
    }

    #[test]
    fn test_save_replaces_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let obj = dir.path().join("model.obj");
        std::fs::write(&obj, "stale").unwrap();
        save_obj_with_mtl(&uv_mesh(), &obj).unwrap();

        let text = std::fs::read_to_string(&obj).unwrap();
        assert!(text.contains("mtllib model.mtl"));
        assert!(dir.path().join("model.mtl").is_file());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_failed_write_leaves_target_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("model.obj");
        std::fs::write(&target, "previous").unwrap();

        let result = write_atomically(&target, |writer| {
            writer.write_all(b"v 0 0 0\n")?;
            Err(crate::Error::NoVertices("model.obj".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "previous");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
