//! Known RRM layout facts, kept as data.
//!
//! Header field offsets and the auxiliary stream layouts observed in real
//! files live here instead of in the extraction code, so a newly discovered
//! variant is a configuration change. Everything is `serde` so a TOML file
//! can override any subset of it.

use serde::{Deserialize, Serialize};

use super::streams::{FieldLayout, Semantic};

/// Header field holding the index-stream byte offset.
pub const INDEX_OFFSET_FIELD: u64 = 0xB0;
/// Header field holding the position-stream byte offset.
pub const POSITION_OFFSET_FIELD: u64 = 0xB4;
/// Positions are 3 x f32.
pub const POSITION_STRIDE: u32 = 12;
/// Largest u32 index accepted before the stream is considered finished.
pub const INDEX_CEILING: u32 = 100_000;

/// Legacy start of the normal+UV interleaved stream.
pub const LEGACY_INTERLEAVED_OFFSET: u64 = 0x20C0;
/// Legacy start of the packed UV block.
pub const LEGACY_PACKED_OFFSET: u64 = 0x31C0;

/// A known auxiliary stream layout that the detector may look for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamLayout {
    /// Stable name used in reports and UV set labels.
    pub name: String,
    pub stride: u32,
    pub fields: Vec<FieldLayout>,
    /// Offsets where this stream has been seen in real files.
    #[serde(default)]
    pub anchors: Vec<u64>,
}

impl StreamLayout {
    /// stride 32: normal (12 B) at +0, UV (8 B) at +24.
    #[must_use]
    pub fn normal_uv_interleaved() -> Self {
        Self {
            name: "normal_uv_interleaved".to_string(),
            stride: 32,
            fields: vec![
                FieldLayout::new(0, Semantic::Normal),
                FieldLayout::new(24, Semantic::Uv),
            ],
            anchors: vec![LEGACY_INTERLEAVED_OFFSET],
        }
    }

    /// stride 16: two UV pairs per vertex.
    #[must_use]
    pub fn packed_uv_pairs() -> Self {
        Self {
            name: "packed_uv_pairs".to_string(),
            stride: 16,
            fields: vec![
                FieldLayout::new(0, Semantic::Uv),
                FieldLayout::new(8, Semantic::Uv),
            ],
            anchors: vec![LEGACY_PACKED_OFFSET],
        }
    }

    #[must_use]
    pub fn provides(&self, semantic: Semantic) -> bool {
        self.fields.iter().any(|f| f.semantic == semantic)
    }
}

/// Header and stream layout of an RRM container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RrmLayout {
    pub index_offset_field: u64,
    pub position_offset_field: u64,
    /// Header field holding a vertex count, if one is known for this variant.
    pub vertex_count_field: Option<u64>,
    pub position_stride: u32,
    pub index_ceiling: u32,
    pub streams: Vec<StreamLayout>,
}

impl Default for RrmLayout {
    fn default() -> Self {
        Self {
            index_offset_field: INDEX_OFFSET_FIELD,
            position_offset_field: POSITION_OFFSET_FIELD,
            vertex_count_field: None,
            position_stride: POSITION_STRIDE,
            index_ceiling: INDEX_CEILING,
            streams: vec![
                StreamLayout::normal_uv_interleaved(),
                StreamLayout::packed_uv_pairs(),
            ],
        }
    }
}
