//! In-memory mesh model shared by the readers and writers.

pub mod assemble;
pub mod uv;

use serde::Serialize;

pub use assemble::{AssemblyOptions, DedupPolicy, assemble_vertices};
pub use uv::{UvSetStats, select_uv_set, summarize_uv_sets, uv_set};

/// One recovered vertex.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: Option<[f32; 3]>,
    /// One entry per [`Mesh::uv_sets`] column. Never merged.
    pub uv_candidates: Vec<[f32; 2]>,
}

impl Vertex {
    #[must_use]
    pub fn at(position: [f32; 3]) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

/// Where a UV candidate column came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UvSetInfo {
    /// Stream layout the column was read with.
    pub layout: String,
    pub stream_offset: u64,
    pub stride: u32,
    /// Offset of the UV field inside each record.
    pub field_offset: u32,
    /// Detector confidence of the stream.
    pub confidence: f32,
}

impl UvSetInfo {
    /// Short human label, e.g. `packed_uv_pairs@0x31c0+8`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}@{:#x}+{}", self.layout, self.stream_offset, self.field_offset)
    }
}

/// A triangle mesh with unresolved UV candidates.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub faces: Vec<[u32; 3]>,
    pub uv_sets: Vec<UvSetInfo>,
    /// The UV column committed for export, if any.
    pub uv_set_selected: Option<usize>,
    /// Texture file name written to the MTL `map_Kd`.
    pub material: Option<String>,
}

impl Mesh {
    /// A mesh carrying positions only.
    #[must_use]
    pub fn from_positions(positions: impl IntoIterator<Item = [f32; 3]>, faces: Vec<[u32; 3]>) -> Self {
        Self {
            vertices: positions.into_iter().map(Vertex::at).collect(),
            faces,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn positions(&self) -> impl Iterator<Item = [f32; 3]> + '_ {
        self.vertices.iter().map(|v| v.position)
    }

    /// Normals are only usable when every vertex has one.
    #[must_use]
    pub fn has_normals(&self) -> bool {
        !self.vertices.is_empty() && self.vertices.iter().all(|v| v.normal.is_some())
    }

    /// UV of `vertex` in the committed set.
    #[must_use]
    pub fn selected_uv(&self, vertex: usize) -> Option<[f32; 2]> {
        let set = self.uv_set_selected?;
        self.vertices.get(vertex)?.uv_candidates.get(set).copied()
    }

    /// Whether every face index addresses a vertex.
    #[must_use]
    pub fn faces_in_range(&self) -> bool {
        let count = self.vertices.len();
        self.faces
            .iter()
            .flatten()
            .all(|&i| (i as usize) < count)
    }

    /// Axis-aligned bounds of the positions.
    #[must_use]
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let mut positions = self.positions().map(glam::Vec3::from_array);
        let first = positions.next()?;
        let (min, max) = positions.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some((min.to_array(), max.to_array()))
    }
}
