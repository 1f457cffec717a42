//! Per-vertex stream descriptions.

use serde::{Deserialize, Serialize};

use super::scanner::RawBuffer;
use crate::error::Result;

/// What a field inside a vertex record is believed to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Semantic {
    Position,
    Normal,
    Uv,
}

impl Semantic {
    /// Number of f32 components for this semantic.
    #[must_use]
    pub const fn components(self) -> u32 {
        match self {
            Self::Position | Self::Normal => 3,
            Self::Uv => 2,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::Normal => "normal",
            Self::Uv => "uv",
        }
    }
}

impl std::fmt::Display for Semantic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field inside a fixed-stride record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldLayout {
    /// Offset of the field from the start of the record.
    pub byte_offset: u32,
    /// Width of the field in bytes.
    pub width: u32,
    pub semantic: Semantic,
}

impl FieldLayout {
    #[must_use]
    pub const fn new(byte_offset: u32, semantic: Semantic) -> Self {
        Self {
            byte_offset,
            width: semantic.components() * 4,
            semantic,
        }
    }
}

/// An interleaved stream of fixed-stride per-vertex records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    pub offset: u64,
    pub stride: u32,
    pub fields: Vec<FieldLayout>,
}

impl StreamDescriptor {
    #[must_use]
    pub fn new(offset: u64, stride: u32, fields: Vec<FieldLayout>) -> Self {
        Self {
            offset,
            stride,
            fields,
        }
    }

    /// Bytes covered by `count` records.
    #[must_use]
    pub fn span(&self, count: u32) -> u64 {
        u64::from(self.stride) * u64::from(count)
    }

    /// Half-open byte range covered by `count` records.
    #[must_use]
    pub fn byte_range(&self, count: u32) -> std::ops::Range<u64> {
        self.offset..self.offset.saturating_add(self.span(count))
    }

    /// Whether `count` records fit inside `buffer`.
    #[must_use]
    pub fn fits(&self, buffer: &RawBuffer, count: u32) -> bool {
        buffer.contains(self.offset, self.span(count))
    }

    /// Fields carrying `semantic`, in record order.
    pub fn fields_of(&self, semantic: Semantic) -> impl Iterator<Item = &FieldLayout> {
        self.fields.iter().filter(move |f| f.semantic == semantic)
    }

    #[must_use]
    pub fn provides(&self, semantic: Semantic) -> bool {
        self.fields_of(semantic).next().is_some()
    }

    /// Byte offset of `field` in record `index`.
    #[must_use]
    pub fn field_offset(&self, index: u32, field: &FieldLayout) -> u64 {
        self.offset + u64::from(index) * u64::from(self.stride) + u64::from(field.byte_offset)
    }

    /// # Errors
    /// `OutOfBounds` if the record lies past the end of the buffer.
    pub fn read_vec3(&self, buffer: &RawBuffer, index: u32, field: &FieldLayout) -> Result<[f32; 3]> {
        buffer.read_f32_array::<3>(self.field_offset(index, field))
    }

    /// # Errors
    /// `OutOfBounds` if the record lies past the end of the buffer.
    pub fn read_vec2(&self, buffer: &RawBuffer, index: u32, field: &FieldLayout) -> Result<[f32; 2]> {
        buffer.read_f32_array::<2>(self.field_offset(index, field))
    }
}

/// Whether two half-open byte ranges share any byte.
#[must_use]
pub fn ranges_overlap(a: &std::ops::Range<u64>, b: &std::ops::Range<u64>) -> bool {
    !a.is_empty() && !b.is_empty() && a.start < b.end && b.start < a.end
}
