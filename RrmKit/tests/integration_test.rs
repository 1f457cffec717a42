use rrmkit::prelude::*;
use rrmkit::formats::rrm::{IndexWidth, MINIMAL_MAGIC, extract_indices};
use std::fs;
use tempfile::tempdir;

use ddsfile::{AlphaMode, D3D10ResourceDimension, Dds, DxgiFormat, NewDxgiParams};
use pretty_assertions::assert_eq;

fn put_u32(data: &mut [u8], at: usize, value: u32) {
    data[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

fn put_floats(data: &mut Vec<u8>, values: &[f32]) {
    data.extend(values.iter().flat_map(|f| f.to_le_bytes()));
}

/// Index stream at 200, positions at 300, vertex count stored at 0xB8.
fn quad_container(positions: &[[f32; 3]; 4]) -> Vec<u8> {
    let mut data = vec![0u8; 300];
    put_u32(&mut data, 0xB0, 200);
    put_u32(&mut data, 0xB4, 300);
    put_u32(&mut data, 0xB8, 4);
    for (i, idx) in [0u16, 1, 2, 0, 2, 3].iter().enumerate() {
        data[200 + i * 2..202 + i * 2].copy_from_slice(&idx.to_le_bytes());
    }
    for p in positions {
        put_floats(&mut data, p);
    }
    data
}

const QUAD: [[f32; 3]; 4] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];

fn counted_options() -> ConversionOptions {
    let mut options = ConversionOptions::default();
    options.layout.vertex_count_field = Some(0xB8);
    options
}

/// u16 quad indices at 0xC0, positions at 0xD0, then a 32-byte
/// normal/pad/UV stream. `last` overrides vertex 3 (position, normal, uv);
/// `pad` fills the 12 bytes between normal and UV.
fn interleaved_container(last: ([f32; 3], [f32; 3], [f32; 2]), pad: &[u8]) -> Vec<u8> {
    let mut data = vec![0u8; 0xD0];
    put_u32(&mut data, 0xB0, 0xC0);
    put_u32(&mut data, 0xB4, 0xD0);
    for (i, idx) in [0u16, 1, 2, 0, 2, 3].iter().enumerate() {
        data[0xC0 + i * 2..0xC2 + i * 2].copy_from_slice(&idx.to_le_bytes());
    }

    let mut positions = QUAD;
    let mut normals = [[0.0f32, 0.0, 1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.6, 0.8, 0.0]];
    let mut uvs = [[0.0f32, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
    positions[3] = last.0;
    normals[3] = last.1;
    uvs[3] = last.2;

    for p in &positions {
        put_floats(&mut data, p);
    }
    for (n, uv) in normals.iter().zip(&uvs) {
        put_floats(&mut data, n);
        data.extend_from_slice(pad);
        put_floats(&mut data, uv);
    }
    data
}

fn default_interleaved() -> Vec<u8> {
    interleaved_container(([0.0, 1.0, 0.0], [0.6, 0.8, 0.0], [0.0, 1.0]), &[0xFF; 12])
}

fn rgba_dds(width: u32, height: u32) -> Vec<u8> {
    let dds = Dds::new_dxgi(NewDxgiParams {
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
    let mut out = Vec::new();
    dds.write(&mut out).unwrap();
    out
}

#[test]
fn test_declared_quad_recovers_without_mismatch() {
    let buffer = RawBuffer::new(quad_container(&QUAD));
    let extraction = extract_mesh(&buffer, &counted_options()).unwrap();

    assert_eq!(extraction.indices.stream.element_width, IndexWidth::U16);
    assert_eq!(extraction.indices.declared_vertex_count, Some(4));
    assert_eq!(extraction.mesh.vertex_count(), 4);
    assert_eq!(extraction.mesh.faces, vec![[0, 1, 2], [0, 2, 3]]);
    assert_eq!(extraction.mesh.positions().collect::<Vec<_>>(), QUAD.to_vec());
    assert!(
        !extraction
            .diagnostics
            .iter()
            .any(|d| d.code() == "IndexVertexMismatch")
    );
}

#[test]
fn test_vertex_count_is_max_index_plus_one() {
    let buffer = RawBuffer::new(default_interleaved());
    let extraction = extract_mesh(&buffer, &ConversionOptions::default()).unwrap();
    let max = extraction.mesh.faces.iter().flatten().copied().max().unwrap();
    assert_eq!(extraction.mesh.vertex_count(), max as usize + 1);
    assert!(extraction.mesh.faces_in_range());
}

#[test]
fn test_index_above_u16_range_selects_u32() {
    let index_offset = 0xC0usize;
    let indices: [u32; 9] = [0, 1, 70_000, 1, 2, 70_000, 0, 2, 70_000];
    let position_offset = index_offset + indices.len() * 4;

    let mut data = vec![0u8; position_offset + 70_001 * 12];
    put_u32(&mut data, 0xB0, index_offset as u32);
    put_u32(&mut data, 0xB4, position_offset as u32);
    for (i, v) in indices.iter().enumerate() {
        put_u32(&mut data, index_offset + i * 4, *v);
    }

    let buffer = RawBuffer::new(data);
    let layout = RrmLayout::default();
    let header = RrmHeader::read(&buffer, &layout).unwrap();
    let result = extract_indices(&buffer, &header, layout.index_ceiling).unwrap();

    assert_eq!(result.stream.element_width, IndexWidth::U32);
    assert_eq!(result.vertex_count, 70_001);
    assert_eq!(result.faces.len(), 3);
}

#[test]
fn test_minimal_container_round_trip() {
    let mesh = rrmkit::mesh::Mesh::from_positions(
        [[1.5, -2.25, 3.0], [0.0, 1e-7, -0.0], [123.456, 7.0, -8.5]],
        vec![[0, 1, 2]],
    );
    let bytes = mesh_to_container(&mesh).unwrap();
    assert_eq!(&bytes[..8], &MINIMAL_MAGIC);

    let (back, diagnostics) = container_to_mesh(&RawBuffer::new(bytes), &ConversionOptions::default()).unwrap();
    assert!(diagnostics.is_empty());
    let bits = |m: &Mesh| -> Vec<[u32; 3]> { m.positions().map(|p| p.map(f32::to_bits)).collect() };
    assert_eq!(bits(&back), bits(&mesh));
}

#[test]
fn test_interleaved_streams_recovered() {
    let buffer = RawBuffer::new(default_interleaved());
    let extraction = extract_mesh(&buffer, &ConversionOptions::default()).unwrap();
    let mesh = &extraction.mesh;

    assert_eq!(mesh.vertex_count(), 4);
    assert!(mesh.has_normals());
    assert_eq!(mesh.vertices[3].normal, Some([0.6, 0.8, 0.0]));
    assert!(!mesh.uv_sets.is_empty());
    assert_eq!(mesh.uv_sets[0].layout, "normal_uv_interleaved");
    assert_eq!(mesh.vertices[2].uv_candidates[0], [1.0, 1.0]);
    assert_eq!(mesh.uv_set_selected, None);

    let selected = extraction.select_uv(Some(0)).unwrap();
    assert_eq!(selected.mesh.selected_uv(1), Some([1.0, 0.0]));
}

#[test]
fn test_tangent_padding_does_not_add_uv_sets() {
    let tangent: Vec<u8> = [0.8f32, 0.6, 0.0].iter().flat_map(|f| f.to_le_bytes()).collect();
    let buffer = RawBuffer::new(interleaved_container(([0.0, 1.0, 0.0], [0.6, 0.8, 0.0], [0.0, 1.0]), &tangent));
    let extraction = extract_mesh(&buffer, &ConversionOptions::default()).unwrap();
    let mesh = &extraction.mesh;

    assert_eq!(mesh.uv_sets.len(), 1);
    assert_eq!(mesh.uv_sets[0].layout, "normal_uv_interleaved");
    assert_eq!(mesh.uv_sets[0].field_offset, 24);
    assert_eq!(mesh.vertices[0].uv_candidates, vec![[0.0, 0.0]]);
    assert_eq!(mesh.vertices[3].normal, Some([0.6, 0.8, 0.0]));
}

#[test]
fn test_uv_set_out_of_range() {
    let buffer = RawBuffer::new(default_interleaved());
    let options = ConversionOptions {
        uv_set: Some(99),
        ..ConversionOptions::default()
    };
    let err = extract_mesh(&buffer, &options).unwrap_err();
    assert_eq!(err.code(), "UvSetOutOfRange");
}

#[test]
fn test_dedup_keeps_distinct_uvs_and_merges_exact_copies() {
    let exact = ConversionOptions {
        assembly: rrmkit::mesh::AssemblyOptions {
            dedup: DedupPolicy::ExactAttributes,
        },
        ..ConversionOptions::default()
    };

    // Vertex 3 shares vertex 0's position and normal but not its UV.
    let distinct_uv = RawBuffer::new(interleaved_container(([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0]), &[0xFF; 12]));
    assert_eq!(extract_mesh(&distinct_uv, &ConversionOptions::default()).unwrap().mesh.vertex_count(), 4);
    assert_eq!(extract_mesh(&distinct_uv, &exact).unwrap().mesh.vertex_count(), 4);

    // Vertex 3 is a full copy of vertex 0.
    let copy = RawBuffer::new(interleaved_container(([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]), &[0xFF; 12]));
    assert_eq!(extract_mesh(&copy, &ConversionOptions::default()).unwrap().mesh.vertex_count(), 4);
    let merged = extract_mesh(&copy, &exact).unwrap().mesh;
    assert_eq!(merged.vertex_count(), 3);
    assert!(merged.faces_in_range());
}

#[test]
fn test_detection_is_deterministic() {
    let buffer = RawBuffer::new(default_interleaved());
    let options = ConversionOptions::default();
    let a = extract_mesh(&buffer, &options).unwrap();
    let b = extract_mesh(&buffer, &options).unwrap();
    assert_eq!(a.detection, b.detection);
    assert_eq!(a.mesh, b.mesh);
    assert_eq!(
        serde_json::to_string(&a.diagnostics).unwrap(),
        serde_json::to_string(&b.diagnostics).unwrap()
    );
}

#[test]
fn test_convert_rrm_to_obj_with_texture() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("model.rrm");
    fs::write(&input, default_interleaved()).unwrap();
    fs::write(dir.path().join("model.dds"), rgba_dds(4, 4)).unwrap();

    let out = dir.path().join("out").join("model.obj");
    let options = ConversionOptions {
        uv_set: Some(0),
        ..ConversionOptions::default()
    };
    let report = convert_rrm_to_obj(&input, &out, &options, true).unwrap();

    assert_eq!(report.vertices, 4);
    assert_eq!(report.faces, 2);
    assert!(matches!(report.texture, Some(TextureAction::Transcoded { .. })));

    let obj = fs::read_to_string(&out).unwrap();
    assert!(obj.contains("mtllib model.mtl"));
    assert_eq!(obj.lines().filter(|l| l.starts_with("v ")).count(), 4);
    assert_eq!(obj.lines().filter(|l| l.starts_with("vn ")).count(), 4);
    assert_eq!(obj.lines().filter(|l| l.starts_with("vt ")).count(), 4);
    assert!(obj.contains("f 1/1/1 2/2/2 3/3/3"));

    let mtl = fs::read_to_string(dir.path().join("out").join("model.mtl")).unwrap();
    assert!(mtl.contains("map_Kd model.png"));
    assert!(dir.path().join("out").join("model.png").is_file());
}

#[test]
fn test_convert_obj_to_rrm_copies_sidecars() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("crate.obj");
    fs::write(&input, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
    fs::write(dir.path().join("crate.png"), b"png").unwrap();

    let output = dir.path().join("out").join("crate.rrm");
    let report = convert_obj_to_rrm(&input, &output, true).unwrap();
    assert_eq!(report.vertices, 3);
    assert_eq!(report.sidecars.len(), 1);

    let bytes = fs::read(&output).unwrap();
    let (mesh, _) = container_to_mesh(&RawBuffer::new(bytes), &ConversionOptions::default()).unwrap();
    assert_eq!(
        mesh.positions().collect::<Vec<_>>(),
        vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
    );
    assert_eq!(fs::read(dir.path().join("out").join("crate.png")).unwrap(), b"png");
}

#[test]
fn test_empty_obj_is_rejected_with_file_context() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("empty.obj");
    fs::write(&input, "# nothing here\n").unwrap();
    let err = convert_obj_to_rrm(&input, &dir.path().join("empty.rrm"), false).unwrap_err();
    assert_eq!(err.code(), "NoVertices");
    assert!(err.to_string().contains("empty.obj"));
}

#[test]
fn test_uv_variants_written_per_set() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("model.rrm");
    fs::write(&input, default_interleaved()).unwrap();

    let out = dir.path().join("variants");
    let written = rrmkit::converter::export_uv_variants(&input, &out, &ConversionOptions::default(), false).unwrap();
    assert!(!written.is_empty());
    assert_eq!(written[0], out.join("model_uv0.obj"));
    for path in &written {
        assert!(fs::read_to_string(path).unwrap().contains("vt "));
    }
}

#[test]
fn test_batch_counts_failures_and_continues() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    for i in 1..=5 {
        let mut data = quad_container(&QUAD);
        if i == 3 {
            put_u32(&mut data, 0xB0, 0);
        }
        fs::write(input.path().join(format!("model_{i}.rrm")), data).unwrap();
    }

    let options = BatchOptions {
        jobs: Some(2),
        ..BatchOptions::new(BatchMode::ToMesh)
    };
    let result = batch_convert(input.path(), output.path(), &options, &counted_options(), |_| {}).unwrap();

    assert_eq!(result.success_count, 4);
    assert_eq!(result.fail_count, 1);
    assert_eq!(result.exit_code(), 1);
    assert_eq!(result.outcomes.len(), 5);

    let failures: Vec<_> = result.failures().collect();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].input.ends_with("model_3.rrm"));
    assert_eq!(failures[0].error.as_ref().unwrap().code, "MalformedHeader");

    for i in [1, 2, 4, 5] {
        assert!(output.path().join(format!("model_{i}.obj")).is_file());
    }
    assert!(!output.path().join("model_3.obj").exists());
}

#[test]
fn test_batch_to_container() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    fs::write(input.path().join("a.obj"), "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
    fs::write(input.path().join("b.obj"), "v 0 0 1\nv 1 0 1\nv 0 1 1\nf 1 2 3\n").unwrap();

    let result = batch_convert(
        input.path(),
        output.path(),
        &BatchOptions::new(BatchMode::ToContainer),
        &ConversionOptions::default(),
        |_| {},
    )
    .unwrap();

    assert_eq!(result.exit_code(), 0);
    for name in ["a.rrm", "b.rrm"] {
        let bytes = fs::read(output.path().join(name)).unwrap();
        assert!(rrmkit::formats::rrm::is_minimal_container(&bytes));
    }
}

#[test]
fn test_inspect_report_serializes() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("model.rrm");
    fs::write(&input, default_interleaved()).unwrap();

    let report = rrmkit::converter::inspect_container(&input, &ConversionOptions::default()).unwrap();
    assert_eq!(report.faces, 2);
    let json: serde_json::Value = serde_json::to_value(&report).unwrap();
    assert_eq!(json["indices"]["vertex_count"], 4);
    assert!(json["rankings"].as_array().is_some_and(|r| r.len() == 3));
}
