//! Vertex assembly from resolved streams.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Mesh, UvSetInfo, Vertex};
use crate::error::Result;
use crate::formats::rrm::detect::StreamCandidate;
use crate::formats::rrm::scanner::RawBuffer;
use crate::formats::rrm::streams::{Semantic, StreamDescriptor};

/// Whether identical vertices are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    /// Keep one vertex per index-addressed record.
    #[default]
    Off,
    /// Merge vertices whose position, normal and every UV candidate are bit-identical.
    ExactAttributes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyOptions {
    pub dedup: DedupPolicy,
}

/// Build `vertex_count` vertices from the position stream and the accepted
/// auxiliary streams.
///
/// Every UV field of every stream in `uv_streams` becomes one UV candidate
/// column, in order.
///
/// # Errors
/// `OutOfBounds` if a stream does not hold `vertex_count` records.
pub fn assemble_vertices(
    buffer: &RawBuffer,
    positions: &StreamDescriptor,
    normal: Option<&StreamCandidate>,
    uv_streams: &[StreamCandidate],
    faces: Vec<[u32; 3]>,
    vertex_count: u32,
    options: AssemblyOptions,
) -> Result<Mesh> {
    let position_field = positions.fields_of(Semantic::Position).next().copied();
    let normal_field = normal.and_then(|c| c.descriptor.fields_of(Semantic::Normal).next().copied());

    let uv_columns: Vec<(&StreamDescriptor, _)> = uv_streams
        .iter()
        .flat_map(|c| c.descriptor.fields_of(Semantic::Uv).map(move |f| (&c.descriptor, *f)))
        .collect();
    let uv_sets = uv_streams
        .iter()
        .flat_map(|c| {
            c.descriptor.fields_of(Semantic::Uv).map(move |f| UvSetInfo {
                layout: c.layout.clone(),
                stream_offset: c.descriptor.offset,
                stride: c.descriptor.stride,
                field_offset: f.byte_offset,
                confidence: c.confidence(),
            })
        })
        .collect();

    let mut vertices = Vec::with_capacity(vertex_count as usize);
    for index in 0..vertex_count {
        let position = match &position_field {
            Some(field) => positions.read_vec3(buffer, index, field)?,
            None => buffer.read_f32_array::<3>(positions.offset + u64::from(index) * u64::from(positions.stride))?,
        };
        let normal = match (normal, &normal_field) {
            (Some(candidate), Some(field)) => Some(candidate.descriptor.read_vec3(buffer, index, field)?),
            _ => None,
        };
        let uv_candidates = uv_columns
            .iter()
            .map(|(descriptor, field)| descriptor.read_vec2(buffer, index, field))
            .collect::<Result<Vec<_>>>()?;

        vertices.push(Vertex {
            position,
            normal,
            uv_candidates,
        });
    }

    let mesh = Mesh {
        vertices,
        faces,
        uv_sets,
        uv_set_selected: None,
        material: None,
    };

    Ok(match options.dedup {
        DedupPolicy::Off => mesh,
        DedupPolicy::ExactAttributes => dedup_exact(mesh),
    })
}

/// Bit pattern of every attribute, so `-0.0` and `0.0` (or two NaNs) stay distinct.
fn attribute_key(vertex: &Vertex) -> Vec<u32> {
    let mut key = Vec::with_capacity(7 + vertex.uv_candidates.len() * 2);
    key.extend(vertex.position.map(f32::to_bits));
    match vertex.normal {
        Some(n) => {
            key.push(1);
            key.extend(n.map(f32::to_bits));
        }
        None => key.push(0),
    }
    for uv in &vertex.uv_candidates {
        key.extend(uv.map(f32::to_bits));
    }
    key
}

/// Merge bit-identical vertices and remap faces. Faces are never dropped.
#[must_use]
pub fn dedup_exact(mesh: Mesh) -> Mesh {
    let mut first_index: HashMap<Vec<u32>, u32> = HashMap::with_capacity(mesh.vertices.len());
    let mut remap = Vec::with_capacity(mesh.vertices.len());
    let mut vertices = Vec::new();

    for vertex in mesh.vertices {
        let next = u32::try_from(vertices.len()).unwrap_or(u32::MAX);
        let target = *first_index.entry(attribute_key(&vertex)).or_insert(next);
        if target == next {
            vertices.push(vertex);
        }
        remap.push(target);
    }

    let faces = mesh
        .faces
        .iter()
        .map(|face| face.map(|i| remap.get(i as usize).copied().unwrap_or(i)))
        .collect();

    tracing::debug!("Dedup: {} -> {} vertices", remap.len(), vertices.len());

    Mesh {
        vertices,
        faces,
        ..mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::rrm::detect::{Score, SiteOrigin};
    use crate::formats::rrm::streams::FieldLayout;

    fn floats(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn uv_candidate(offset: u64) -> StreamCandidate {
        StreamCandidate {
            layout: "packed_uv_pairs".to_string(),
            semantic: Semantic::Uv,
            descriptor: StreamDescriptor::new(
                offset,
                16,
                vec![FieldLayout::new(0, Semantic::Uv), FieldLayout::new(8, Semantic::Uv)],
            ),
            origin: SiteOrigin::Anchor,
            score: Score {
                values: 1.0,
                stride: 1.0,
                variation: 1.0,
                confidence: 1.0,
            },
        }
    }

    fn mesh_with_uvs(uvs: [[f32; 2]; 3]) -> Mesh {
        let mut mesh = Mesh::from_positions([[1.0, 2.0, 3.0], [1.0, 2.0, 3.0], [0.0, 0.0, 0.0]], vec![[0, 1, 2]]);
        for (vertex, uv) in mesh.vertices.iter_mut().zip(uvs) {
            vertex.uv_candidates = vec![uv];
        }
        mesh
    }

    #[test]
    fn test_assembles_uv_columns_in_field_order() {
        let mut data = floats(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        data.extend(floats(&[
            0.1, 0.2, 0.3, 0.4, //
            0.5, 0.6, 0.7, 0.8, //
            0.9, 1.0, 1.1, 1.2,
        ]));
        let buffer = RawBuffer::new(data);
        let positions = StreamDescriptor::new(0, 12, vec![FieldLayout::new(0, Semantic::Position)]);

        let mesh = assemble_vertices(
            &buffer,
            &positions,
            None,
            &[uv_candidate(36)],
            vec![[0, 1, 2]],
            3,
            AssemblyOptions::default(),
        )
        .unwrap();

        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.vertices[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(mesh.vertices[2].uv_candidates, vec![[0.9, 1.0], [1.1, 1.2]]);
        assert_eq!(mesh.uv_sets.len(), 2);
        assert_eq!(mesh.uv_sets[1].field_offset, 8);
        assert_eq!(mesh.uv_set_selected, None);
    }

    #[test]
    fn test_short_stream_is_out_of_bounds() {
        let buffer = RawBuffer::new(floats(&[0.0; 6]));
        let positions = StreamDescriptor::new(0, 12, vec![FieldLayout::new(0, Semantic::Position)]);
        let err = assemble_vertices(&buffer, &positions, None, &[], Vec::new(), 3, AssemblyOptions::default())
            .unwrap_err();
        assert_eq!(err.code(), "OutOfBounds");
    }

    #[test]
    fn test_same_position_distinct_uv_is_never_merged() {
        let mesh = mesh_with_uvs([[0.0, 0.0], [0.5, 0.5], [1.0, 1.0]]);
        assert_eq!(dedup_exact(mesh.clone()).vertex_count(), 3);
        assert_eq!(mesh.vertex_count(), 3);
    }

    #[test]
    fn test_exact_duplicates_merge_and_faces_remap() {
        let mesh = mesh_with_uvs([[0.5, 0.5], [0.5, 0.5], [1.0, 1.0]]);
        let merged = dedup_exact(mesh);
        assert_eq!(merged.vertex_count(), 2);
        assert_eq!(merged.faces, vec![[0, 0, 1]]);
        assert!(merged.faces_in_range());
    }

    #[test]
    fn test_signed_zero_is_not_merged() {
        let mut mesh = Mesh::from_positions([[0.0, 0.0, 0.0], [-0.0, 0.0, 0.0]], vec![[0, 1, 1]]);
        mesh.vertices[0].normal = Some([0.0, 0.0, 1.0]);
        mesh.vertices[1].normal = Some([0.0, 0.0, 1.0]);
        assert_eq!(dedup_exact(mesh).vertex_count(), 2);
    }
}
