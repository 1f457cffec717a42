//! UV candidate sets: inspection and explicit selection.
//!
//! A recovered mesh may carry several competing UV columns. None of them is
//! used for export until one is committed with [`select_uv_set`].

use serde::Serialize;

use super::Mesh;
use crate::error::{Error, Result};
use crate::formats::rrm::diagnostics::Diagnostic;

/// Commit to UV candidate `index`, returning a new mesh.
///
/// # Errors
/// `UvSetOutOfRange` if the mesh has no such candidate.
pub fn select_uv_set(mesh: &Mesh, index: usize) -> Result<Mesh> {
    check_index(mesh, index)?;
    Ok(Mesh {
        uv_set_selected: Some(index),
        ..mesh.clone()
    })
}

/// One UV candidate column, one entry per vertex.
///
/// # Errors
/// `UvSetOutOfRange` if the mesh has no such candidate.
pub fn uv_set(mesh: &Mesh, index: usize) -> Result<Vec<[f32; 2]>> {
    check_index(mesh, index)?;
    Ok(mesh
        .vertices
        .iter()
        .map(|v| v.uv_candidates.get(index).copied().unwrap_or([f32::NAN; 2]))
        .collect())
}

fn check_index(mesh: &Mesh, index: usize) -> Result<()> {
    if index < mesh.uv_sets.len() {
        Ok(())
    } else {
        Err(Error::UvSetOutOfRange {
            index,
            available: mesh.uv_sets.len(),
        })
    }
}

/// Numbers for comparing UV candidates side by side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UvSetStats {
    pub index: usize,
    pub label: String,
    pub confidence: f32,
    /// Bounds over finite coordinates; `None` when there are none.
    pub min: Option<[f32; 2]>,
    pub max: Option<[f32; 2]>,
    /// Fraction of finite coordinates outside [0, 1].
    pub outside_unit: f32,
    pub non_finite: usize,
}

#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn summarize_uv_sets(mesh: &Mesh) -> Vec<UvSetStats> {
    mesh.uv_sets
        .iter()
        .enumerate()
        .map(|(index, info)| {
            let mut min: Option<glam::Vec2> = None;
            let mut max: Option<glam::Vec2> = None;
            let mut outside = 0usize;
            let mut finite = 0usize;
            let mut non_finite = 0usize;

            for uv in mesh.vertices.iter().filter_map(|v| v.uv_candidates.get(index)) {
                let uv = glam::Vec2::from_array(*uv);
                if !uv.is_finite() {
                    non_finite += 1;
                    continue;
                }
                finite += 1;
                if uv.min_element() < 0.0 || uv.max_element() > 1.0 {
                    outside += 1;
                }
                min = Some(min.map_or(uv, |m| m.min(uv)));
                max = Some(max.map_or(uv, |m| m.max(uv)));
            }

            UvSetStats {
                index,
                label: info.label(),
                confidence: info.confidence,
                min: min.map(|v| v.to_array()),
                max: max.map(|v| v.to_array()),
                outside_unit: if finite == 0 { 0.0 } else { outside as f32 / finite as f32 },
                non_finite,
            }
        })
        .collect()
}

/// One `NonFiniteUv` per candidate set holding NaN or infinite coordinates.
#[must_use]
pub fn non_finite_diagnostics(mesh: &Mesh) -> Vec<Diagnostic> {
    summarize_uv_sets(mesh)
        .into_iter()
        .filter(|s| s.non_finite > 0)
        .map(|s| Diagnostic::NonFiniteUv {
            uv_set: s.index,
            count: s.non_finite,
        })
        .collect()
}
