//! RRM header interpretation.

use serde::Serialize;

use super::layout::RrmLayout;
use super::scanner::RawBuffer;
use super::streams::{FieldLayout, Semantic, StreamDescriptor};
use crate::error::{Error, Result};

/// The fixed-offset fields of an RRM container.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RrmHeader {
    /// Byte offset of the index stream. Its element width is resolved later.
    pub index_offset: u64,
    /// Exclusive end of the bytes the index stream may occupy.
    pub index_region_end: u64,
    /// Positions, 3 x f32 per vertex.
    pub position_stream: StreamDescriptor,
    /// Number of position records that fit before the next stream or the end of the buffer.
    pub position_capacity: u32,
    /// Vertex count stored in the header, when the layout names such a field.
    pub declared_vertex_count: Option<u32>,
}

impl RrmHeader {
    /// Decode the header fields named by `layout`.
    ///
    /// # Errors
    /// `MalformedHeader` if an offset is zero, negative as a signed value, or
    /// leaves no room for a single element; `OutOfBounds` if the buffer is
    /// too short to hold the header fields.
    pub fn read(buffer: &RawBuffer, layout: &RrmLayout) -> Result<Self> {
        let len = buffer.len();
        let raw_index = buffer.read_u32(layout.index_offset_field)?;
        let raw_position = buffer.read_u32(layout.position_offset_field)?;

        let index_offset = validate_offset("index offset", layout.index_offset_field, raw_index, 2, len)?;
        let position_offset = validate_offset(
            "position offset",
            layout.position_offset_field,
            raw_position,
            u64::from(layout.position_stride),
            len,
        )?;

        if index_offset == position_offset {
            return Err(Error::MalformedHeader {
                field: "index offset",
                field_offset: layout.index_offset_field,
                value: raw_index,
                len,
            });
        }

        let declared_vertex_count = layout
            .vertex_count_field
            .map(|field| buffer.read_u32(field))
            .transpose()?;

        let index_region_end = if position_offset > index_offset {
            position_offset
        } else {
            len as u64
        };
        let position_end = if index_offset > position_offset {
            index_offset
        } else {
            len as u64
        };
        let capacity = (position_end - position_offset) / u64::from(layout.position_stride);
        let position_capacity = u32::try_from(capacity).unwrap_or(u32::MAX);

        let position_stream = StreamDescriptor::new(
            position_offset,
            layout.position_stride,
            vec![FieldLayout::new(0, Semantic::Position)],
        );

        tracing::debug!(
            "RRM header: index @ {:#x}, positions @ {:#x} (capacity {}), declared vertices {:?}",
            index_offset,
            position_offset,
            position_capacity,
            declared_vertex_count
        );

        Ok(Self {
            index_offset,
            index_region_end,
            position_stream,
            position_capacity,
            declared_vertex_count,
        })
    }
}

fn validate_offset(
    field: &'static str,
    field_offset: u64,
    value: u32,
    min_room: u64,
    len: usize,
) -> Result<u64> {
    // Sign bit set: negative if the field is really an i32.
    let negative = value & 0x8000_0000 != 0;
    let offset = u64::from(value);
    if value == 0 || negative || offset + min_room > len as u64 {
        return Err(Error::MalformedHeader {
            field,
            field_offset,
            value,
            len,
        });
    }
    Ok(offset)
}
