//! Texture sidecars
//!
//! RRM models ship their textures as DDS files next to the container,
//! named after the model (`caha000.dds`, `caha000_alt.dds`, `caha000-1.dds`).
//! The mesh direction transcodes the texture to PNG so OBJ viewers can load
//! it, falling back to copying the DDS when it cannot be decoded.

mod decode;

use std::fs;
use std::path::{Path, PathBuf};

use ddsfile::Dds;
use image::{ImageBuffer, RgbaImage};
use serde::Serialize;
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Sidecar extensions copied unchanged in the container direction.
pub const CONTAINER_SIDECARS: [&str; 3] = ["png", "dds", "mtl"];

/// What happened to a model's texture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TextureAction {
    /// `source` DDS decoded and written as PNG.
    Transcoded { source: PathBuf, written: PathBuf },
    /// DDS could not be decoded; copied as is.
    CopiedDds {
        source: PathBuf,
        written: PathBuf,
        reason: String,
    },
    /// An existing PNG was copied.
    CopiedPng { source: PathBuf, written: PathBuf },
}

impl TextureAction {
    #[must_use]
    pub fn written(&self) -> &Path {
        match self {
            Self::Transcoded { written, .. }
            | Self::CopiedDds { written, .. }
            | Self::CopiedPng { written, .. } => written,
        }
    }

    /// File name to reference from `map_Kd`.
    #[must_use]
    pub fn texture_name(&self) -> String {
        self.written()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Convert DDS bytes to PNG bytes.
///
/// # Errors
/// `DdsError` if the DDS cannot be parsed or decoded, `PngEncodeFailed` if
/// the PNG encoder fails.
pub fn dds_bytes_to_png_bytes(dds_data: &[u8]) -> Result<Vec<u8>> {
    let dds = Dds::read(&mut std::io::Cursor::new(dds_data))
        .map_err(|e| Error::DdsError(format!("Failed to parse DDS: {e}")))?;

    let rgba = decode::decode_dds_to_rgba(&dds)?;

    let img: RgbaImage = ImageBuffer::from_raw(dds.get_width(), dds.get_height(), rgba)
        .ok_or_else(|| Error::DdsError("Failed to create image buffer".to_string()))?;

    let mut png_data = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_data);
    img.write_with_encoder(encoder)
        .map_err(|e| Error::PngEncodeFailed {
            message: e.to_string(),
        })?;

    Ok(png_data)
}

/// Convert a DDS file to PNG.
///
/// # Errors
/// I/O errors, or any error from [`dds_bytes_to_png_bytes`].
pub fn convert_dds_to_png(dds_path: &Path, png_path: &Path) -> Result<()> {
    let data = fs::read(dds_path)?;
    let png = dds_bytes_to_png_bytes(&data)?;
    fs::write(png_path, png)?;
    Ok(())
}

/// DDS textures in `dir` belonging to the model `stem`, primary first.
///
/// Matches `<stem>.dds`, then `<stem>_*.dds`, then `<stem>-*.dds`, each
/// group sorted by name. Extensions compare case-insensitively.
///
/// # Errors
/// `WalkDirError` if `dir` cannot be listed.
pub fn find_dds_variants(dir: &Path, stem: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut groups: [Vec<PathBuf>; 3] = Default::default();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || !has_extension(path, "dds") {
            continue;
        }
        let Some(file_stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let group = if file_stem == stem {
            0
        } else if file_stem.strip_prefix(stem).is_some_and(|rest| rest.starts_with('_')) {
            1
        } else if file_stem.strip_prefix(stem).is_some_and(|rest| rest.starts_with('-')) {
            2
        } else {
            continue;
        };
        groups[group].push(path.to_path_buf());
    }

    Ok(groups
        .into_iter()
        .flat_map(|mut g| {
            g.sort();
            g
        })
        .collect())
}

/// Export the texture of model `input` into `output_dir` as `<name>.png`.
///
/// Looks for the primary DDS variant next to `input`, then for an existing
/// `<stem>.png`. Returns `Ok(None)` when the model has no texture.
///
/// # Errors
/// I/O errors while copying or writing. A DDS that fails to decode is not
/// an error; it is copied instead.
pub fn export_texture(input: &Path, output_dir: &Path, name: &str) -> Result<Option<TextureAction>> {
    let dir = parent_dir(input);
    let Some(stem) = input.file_stem().and_then(|s| s.to_str()) else {
        return Ok(None);
    };

    if let Some(dds) = find_dds_variants(dir, stem)?.into_iter().next() {
        let png_path = output_dir.join(format!("{name}.png"));
        return match convert_dds_to_png(&dds, &png_path) {
            Ok(()) => {
                tracing::debug!("Transcoded {} -> {}", dds.display(), png_path.display());
                Ok(Some(TextureAction::Transcoded {
                    source: dds,
                    written: png_path,
                }))
            }
            Err(e @ Error::Io(_)) => Err(e),
            Err(e) => {
                let dds_out = output_dir.join(format!("{name}.dds"));
                tracing::warn!("Could not decode {}: {e}; copying DDS", dds.display());
                if !same_path(&dds, &dds_out) {
                    fs::copy(&dds, &dds_out)?;
                }
                Ok(Some(TextureAction::CopiedDds {
                    source: dds,
                    written: dds_out,
                    reason: e.to_string(),
                }))
            }
        };
    }

    let png = dir.join(format!("{stem}.png"));
    if png.is_file() {
        let written = output_dir.join(format!("{name}.png"));
        if !same_path(&png, &written) {
            fs::copy(&png, &written)?;
        }
        return Ok(Some(TextureAction::CopiedPng { source: png, written }));
    }

    Ok(None)
}

/// Copy `<stem>.png`, `<stem>.dds` and `<stem>.mtl` next to `input` into
/// `output_dir`, unchanged.
///
/// # Errors
/// I/O errors while copying.
pub fn copy_sidecars(input: &Path, output_dir: &Path) -> Result<Vec<PathBuf>> {
    let dir = parent_dir(input);
    let Some(stem) = input.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
        return Ok(Vec::new());
    };

    let mut copied = Vec::new();
    for ext in CONTAINER_SIDECARS {
        let file_name = format!("{stem}.{ext}");
        let source = dir.join(&file_name);
        if !source.is_file() {
            continue;
        }
        let target = output_dir.join(&file_name);
        if !same_path(&source, &target) {
            fs::copy(&source, &target)?;
            copied.push(target);
        }
    }
    Ok(copied)
}

fn parent_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Copying a file onto itself truncates it, so relative and absolute
/// spellings of one file must compare equal.
fn same_path(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ddsfile::{AlphaMode, D3D10ResourceDimension, DxgiFormat, NewDxgiParams};

    fn rgba_dds(width: u32, height: u32, pixel: [u8; 4]) -> Vec<u8> {
        let mut dds = Dds::new_dxgi(NewDxgiParams {
            height,
            width,
            depth: None,
            format: DxgiFormat::R8G8B8A8_UNorm,
            mipmap_levels: None,
            array_layers: None,
            caps2: None,
            is_cubemap: false,
            resource_dimension: D3D10ResourceDimension::Texture2D,
            alpha_mode: AlphaMode::Straight,
        })
        .unwrap();
        for px in dds.get_mut_data(0).unwrap().chunks_exact_mut(4) {
            px.copy_from_slice(&pixel);
        }
        let mut out = Vec::new();
        dds.write(&mut out).unwrap();
        out
    }

    #[test]
    fn test_dds_to_png_bytes() {
        let png = dds_bytes_to_png_bytes(&rgba_dds(4, 4, [10, 20, 30, 255])).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_garbage_is_dds_error() {
        let err = dds_bytes_to_png_bytes(b"not a dds").unwrap_err();
        assert_eq!(err.code(), "DdsError");
    }

    #[test]
    fn test_variant_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["caha000-1.dds", "caha000_alt.dds", "caha000.DDS", "caha0001.dds", "other.dds"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        let found: Vec<String> = find_dds_variants(dir.path(), "caha000")
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(found, vec!["caha000.DDS", "caha000_alt.dds", "caha000-1.dds"]);
    }

    #[test]
    fn test_export_transcodes_or_copies() {
        let input_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let model = input_dir.path().join("good.rrm");
        fs::write(input_dir.path().join("good.dds"), rgba_dds(2, 2, [1, 2, 3, 4])).unwrap();
        let action = export_texture(&model, out_dir.path(), "good").unwrap().unwrap();
        assert!(matches!(action, TextureAction::Transcoded { .. }));
        assert_eq!(action.texture_name(), "good.png");
        assert!(out_dir.path().join("good.png").is_file());

        let broken = input_dir.path().join("broken.rrm");
        fs::write(input_dir.path().join("broken.dds"), b"garbage").unwrap();
        let action = export_texture(&broken, out_dir.path(), "broken").unwrap().unwrap();
        assert!(matches!(action, TextureAction::CopiedDds { .. }));
        assert_eq!(action.texture_name(), "broken.dds");

        let bare = input_dir.path().join("bare.rrm");
        assert_eq!(export_texture(&bare, out_dir.path(), "bare").unwrap(), None);
    }

    #[test]
    fn test_export_in_place_keeps_undecodable_dds() {
        let dir = tempfile::tempdir().unwrap();
        let garbage = b"definitely not a dds file";
        fs::write(dir.path().join("model.dds"), garbage).unwrap();
        let action = export_texture(&dir.path().join("model.rrm"), dir.path(), "model")
            .unwrap()
            .unwrap();
        assert!(matches!(action, TextureAction::CopiedDds { .. }));
        assert_eq!(fs::read(dir.path().join("model.dds")).unwrap(), garbage);
    }

    #[test]
    fn test_same_path_sees_through_relative_spelling() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.png");
        fs::write(&file, b"png").unwrap();
        assert!(same_path(&file, &dir.path().join(".").join("a.png")));
        assert!(!same_path(&file, &dir.path().join("b.png")));
    }

    #[test]
    fn test_copy_sidecars() {
        let input_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        fs::write(input_dir.path().join("m.png"), b"png").unwrap();
        fs::write(input_dir.path().join("m.mtl"), b"mtl").unwrap();
        let copied = copy_sidecars(&input_dir.path().join("m.obj"), out_dir.path()).unwrap();
        assert_eq!(copied.len(), 2);
        assert_eq!(fs::read(out_dir.path().join("m.mtl")).unwrap(), b"mtl");
    }
}
