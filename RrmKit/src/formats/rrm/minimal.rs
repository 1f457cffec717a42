//! Minimal round-trip container.
//!
//! Layout: 8-byte magic `RRMEXTR\0`, u32 vertex count, then `count` records
//! of 3 x f32 positions, all little-endian. Faces, normals and UVs are not
//! stored.

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use super::scanner::RawBuffer;
use crate::error::{Error, Result};
use crate::mesh::Mesh;

pub const MINIMAL_MAGIC: [u8; 8] = *b"RRMEXTR\0";
const HEADER_LEN: u64 = 12;
const RECORD_LEN: u64 = 12;

/// Whether `data` starts with the minimal container magic.
#[must_use]
pub fn is_minimal_container(data: &[u8]) -> bool {
    data.starts_with(&MINIMAL_MAGIC)
}

/// Write `mesh` positions in the minimal layout.
///
/// # Errors
/// `InvalidContainer` if the mesh has more vertices than a u32 can count,
/// or any I/O error from `writer`.
pub fn write_minimal<W: Write>(writer: &mut W, mesh: &Mesh) -> Result<()> {
    let count = u32::try_from(mesh.vertex_count()).map_err(|_| Error::InvalidContainer {
        message: format!("{} vertices do not fit a u32 count", mesh.vertex_count()),
    })?;

    writer.write_all(&MINIMAL_MAGIC)?;
    writer.write_u32::<LittleEndian>(count)?;
    for [x, y, z] in mesh.positions() {
        writer.write_f32::<LittleEndian>(x)?;
        writer.write_f32::<LittleEndian>(y)?;
        writer.write_f32::<LittleEndian>(z)?;
    }
    Ok(())
}

/// Serialize `mesh` to an in-memory minimal container.
///
/// # Errors
/// See [`write_minimal`].
pub fn write_minimal_container(mesh: &Mesh) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(12 + 12 * mesh.vertex_count());
    write_minimal(&mut out, mesh)?;
    Ok(out)
}

/// Read a minimal container back into a positions-only mesh.
///
/// # Errors
/// `InvalidContainer` on a wrong magic or a length that does not match the
/// stored count.
pub fn read_minimal_container(buffer: &RawBuffer) -> Result<Mesh> {
    if !is_minimal_container(buffer.as_bytes()) {
        return Err(Error::InvalidContainer {
            message: "missing RRMEXTR magic".to_string(),
        });
    }
    let count = buffer.read_u32(8).map_err(|_| Error::InvalidContainer {
        message: "truncated before vertex count".to_string(),
    })?;

    let expected = HEADER_LEN + RECORD_LEN * u64::from(count);
    if buffer.len() as u64 != expected {
        return Err(Error::InvalidContainer {
            message: format!(
                "{count} vertices need {expected} bytes, found {}",
                buffer.len()
            ),
        });
    }

    let positions = (0..u64::from(count))
        .map(|i| buffer.read_f32_array::<3>(HEADER_LEN + i * RECORD_LEN))
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!("Minimal container: {} vertices", count);
    Ok(Mesh::from_positions(positions, Vec::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let mesh = Mesh::from_positions([[1.0, 2.0, 3.0]], Vec::new());
        let bytes = write_minimal_container(&mesh).unwrap();
        assert_eq!(bytes.len(), 24);
        assert_eq!(&bytes[..8], b"RRMEXTR\0");
        assert_eq!(&bytes[8..12], &1u32.to_le_bytes());
        assert_eq!(&bytes[12..16], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[20..24], &3.0f32.to_le_bytes());
    }

    #[test]
    fn test_read_back_preserves_bits() {
        let positions = [[0.1, -0.0, 1.0e-30], [f32::MAX, -7.25, 3.0]];
        let mesh = Mesh::from_positions(positions, vec![[0, 1, 1]]);
        let bytes = write_minimal_container(&mesh).unwrap();
        let back = read_minimal_container(&RawBuffer::new(bytes)).unwrap();

        let bits = |m: &Mesh| m.positions().map(|p| p.map(f32::to_bits)).collect::<Vec<_>>();
        assert_eq!(bits(&back), bits(&mesh));
        assert!(back.faces.is_empty());
    }

    #[test]
    fn test_rejects_bad_magic_and_length() {
        let err = read_minimal_container(&RawBuffer::new(b"NOTMAGIC\0\0\0\0".to_vec())).unwrap_err();
        assert_eq!(err.code(), "InvalidContainer");

        let mut bytes = write_minimal_container(&Mesh::from_positions([[0.0; 3]; 2], Vec::new())).unwrap();
        bytes.pop();
        let err = read_minimal_container(&RawBuffer::new(bytes)).unwrap_err();
        assert_eq!(err.code(), "InvalidContainer");

        let err = read_minimal_container(&RawBuffer::new(MINIMAL_MAGIC.to_vec())).unwrap_err();
        assert_eq!(err.code(), "InvalidContainer");
    }
}
