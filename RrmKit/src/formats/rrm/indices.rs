//! Index stream decoding and face reconstruction.
//!
//! The header gives the index stream's offset but neither its element width
//! nor its length. Both u16 and u32 readings are decoded. An element above
//! the index ceiling ends a reading; an element within the ceiling that
//! addresses no stored vertex cannot be reconciled and rejects the reading.
//! The surviving reading that best matches the declared vertex count (or,
//! without one, looks most like a triangle list) wins.

use std::cmp::Ordering;

use serde::Serialize;

use super::diagnostics::Diagnostic;
use super::header::RrmHeader;
use super::scanner::RawBuffer;
use crate::error::{Error, Result};

/// Width of one index element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum IndexWidth {
    U16,
    U32,
}

impl IndexWidth {
    #[must_use]
    pub const fn bytes(self) -> u32 {
        match self {
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }
}

/// The resolved index stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexStream {
    pub offset: u64,
    pub element_width: IndexWidth,
    /// Number of elements kept (always a multiple of three).
    pub count: u32,
}

impl IndexStream {
    /// Exclusive end of the bytes used by the kept elements.
    #[must_use]
    pub fn end(&self) -> u64 {
        self.offset + u64::from(self.count) * u64::from(self.element_width.bytes())
    }
}

/// How one element width fared.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidthTrial {
    pub width: IndexWidth,
    pub indices: usize,
    pub max_index: Option<u32>,
    pub penalty: Option<f32>,
    pub rejected: Option<String>,
}

/// Faces and vertex count recovered from the index stream.
#[derive(Debug, Clone)]
pub struct IndexExtraction {
    pub stream: IndexStream,
    pub faces: Vec<[u32; 3]>,
    /// `max(index) + 1`.
    pub vertex_count: u32,
    pub declared_vertex_count: Option<u32>,
    pub trials: Vec<WidthTrial>,
    pub diagnostics: Vec<Diagnostic>,
}

// Weights of the structural penalty.
const UNREFERENCED_WEIGHT: f32 = 0.5;
const REMAINDER_PENALTY: f32 = 0.25;

/// Where and why a reading stopped before the end of the index region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Stop {
    offset: u64,
    value: u32,
    /// Within the ceiling but past the stored vertices.
    unreconciled: bool,
}

struct Decoded {
    values: Vec<u32>,
    stop: Option<Stop>,
}

struct Interpretation {
    width: IndexWidth,
    values: Vec<u32>,
    stop: Option<Stop>,
    decoded: usize,
    remainder: usize,
    max: u32,
    penalty: f32,
}

impl Interpretation {
    fn face_count(&self) -> usize {
        self.values.len() / 3
    }

    fn distance_to(&self, declared: u32) -> u64 {
        (u64::from(self.max) + 1).abs_diff(u64::from(declared))
    }
}

/// Decode the index stream described by `header`.
///
/// # Errors
/// `InvalidIndexStream` if neither width yields at least one triangle, or
/// every width hits an index that addresses no stored vertex.
pub fn extract_indices(
    buffer: &RawBuffer,
    header: &RrmHeader,
    index_ceiling: u32,
) -> Result<IndexExtraction> {
    let mut trials = Vec::with_capacity(2);
    let mut accepted = Vec::with_capacity(2);

    for width in [IndexWidth::U16, IndexWidth::U32] {
        let decoded = decode(buffer, header, width, index_ceiling)?;
        match interpret(width, decoded, header.position_capacity) {
            Ok(interp) => {
                trials.push(WidthTrial {
                    width,
                    indices: interp.values.len(),
                    max_index: Some(interp.max),
                    penalty: Some(interp.penalty),
                    rejected: None,
                });
                accepted.push(interp);
            }
            Err(reason) => trials.push(WidthTrial {
                width,
                indices: 0,
                max_index: None,
                penalty: None,
                rejected: Some(reason),
            }),
        }
    }

    let declared = header.declared_vertex_count;
    let Some(best) = accepted
        .into_iter()
        .min_by(|a, b| compare(a, b, declared))
    else {
        let message = trials
            .iter()
            .map(|t| format!("{:?}: {}", t.width, t.rejected.as_deref().unwrap_or("rejected")))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(Error::InvalidIndexStream {
            offset: header.index_offset,
            message,
        });
    };

    let mut diagnostics = Vec::new();
    if let Some(stop) = best.stop {
        diagnostics.push(Diagnostic::IndexStreamTruncated {
            offset: stop.offset,
            value: stop.value,
        });
    }
    if best.remainder > 0 {
        diagnostics.push(Diagnostic::NonTriangleListIndexCount {
            count: best.values.len() + best.remainder,
            dropped: best.remainder,
        });
    }

    let vertex_count = best.max + 1;
    if let Some(declared) = declared {
        if declared != vertex_count {
            diagnostics.push(Diagnostic::IndexVertexMismatch {
                declared,
                derived: vertex_count,
            });
        }
    }

    for diagnostic in &diagnostics {
        tracing::warn!("{diagnostic}");
    }
    tracing::debug!(
        "Index stream @ {:#x}: {:?}, {} of {} decoded indices kept, {} vertices",
        header.index_offset,
        best.width,
        best.values.len(),
        best.decoded,
        vertex_count
    );

    let faces = best
        .values
        .chunks_exact(3)
        .map(|t| [t[0], t[1], t[2]])
        .collect();

    Ok(IndexExtraction {
        stream: IndexStream {
            offset: header.index_offset,
            element_width: best.width,
            count: u32::try_from(best.values.len()).unwrap_or(u32::MAX),
        },
        faces,
        vertex_count,
        declared_vertex_count: declared,
        trials,
        diagnostics,
    })
}

/// Read elements until one cannot be a vertex index.
fn decode(buffer: &RawBuffer, header: &RrmHeader, width: IndexWidth, index_ceiling: u32) -> Result<Decoded> {
    let step = u64::from(width.bytes());
    let mut values = Vec::new();
    let mut offset = header.index_offset;

    while offset + step <= header.index_region_end {
        let value = match width {
            IndexWidth::U16 => u32::from(buffer.read_u16(offset)?),
            IndexWidth::U32 => buffer.read_u32(offset)?,
        };
        if value > index_ceiling || value >= header.position_capacity {
            let stop = Stop {
                offset,
                value,
                unreconciled: value <= index_ceiling,
            };
            return Ok(Decoded {
                values,
                stop: (value != 0).then_some(stop),
            });
        }
        values.push(value);
        offset += step;
    }

    Ok(Decoded { values, stop: None })
}

fn interpret(width: IndexWidth, decoded: Decoded, capacity: u32) -> std::result::Result<Interpretation, String> {
    let Decoded { mut values, stop } = decoded;
    if let Some(stop) = stop.filter(|s| s.unreconciled) {
        return Err(format!(
            "index {} at {:#x} addresses no stored vertex (capacity {capacity})",
            stop.value, stop.offset
        ));
    }

    let decoded = values.len();
    trim_padding(&mut values);

    let remainder = values.len() % 3;
    values.truncate(values.len() - remainder);

    if values.is_empty() {
        return Err(if decoded == 0 {
            "first element does not address a stored vertex".to_string()
        } else {
            format!("{decoded} elements decoded but no complete triangle")
        });
    }

    let max = values.iter().copied().max().unwrap_or(0);
    let penalty = structural_penalty(&values, max, remainder);

    Ok(Interpretation {
        width,
        values,
        stop,
        decoded,
        remainder,
        max,
        penalty,
    })
}

/// Drop trailing zero padding, keeping zeros that complete the last triangle.
fn trim_padding(values: &mut Vec<u32>) {
    let total = values.len();
    let meaningful = values.iter().rposition(|&v| v != 0).map_or(0, |p| p + 1);
    let aligned = meaningful.div_ceil(3) * 3;
    values.truncate(if aligned <= total { aligned } else { meaningful });
}

#[allow(clippy::cast_precision_loss)]
fn structural_penalty(values: &[u32], max: u32, remainder: usize) -> f32 {
    let faces = values.len() / 3;
    let degenerate = values
        .chunks_exact(3)
        .filter(|t| t[0] == t[1] || t[1] == t[2] || t[0] == t[2])
        .count();

    let mut referenced = vec![false; max as usize + 1];
    for &v in values {
        referenced[v as usize] = true;
    }
    let distinct = referenced.iter().filter(|&&r| r).count();
    let unreferenced = 1.0 - distinct as f32 / referenced.len() as f32;

    let mut penalty = degenerate as f32 / faces as f32 + UNREFERENCED_WEIGHT * unreferenced;
    if remainder > 0 {
        penalty += REMAINDER_PENALTY;
    }
    penalty
}

fn compare(a: &Interpretation, b: &Interpretation, declared: Option<u32>) -> Ordering {
    let by_declared = declared.map_or(Ordering::Equal, |d| a.distance_to(d).cmp(&b.distance_to(d)));
    by_declared
        .then_with(|| a.penalty.total_cmp(&b.penalty))
        .then_with(|| b.face_count().cmp(&a.face_count()))
        .then_with(|| a.width.cmp(&b.width))
}
