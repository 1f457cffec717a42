//! Non-fatal findings produced while recovering a mesh.

use serde::Serialize;

use super::streams::Semantic;

/// Something suspicious that did not stop the conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum Diagnostic {
    /// No candidate for a stream role reached the acceptance threshold.
    LowConfidenceStream {
        semantic: Semantic,
        best_confidence: Option<f32>,
        threshold: f32,
        /// Whether the best sub-threshold candidate was used anyway.
        used_anyway: bool,
    },
    /// The two best candidates for a role scored the same.
    AmbiguousStream {
        semantic: Semantic,
        layout: String,
        offsets: Vec<u64>,
        confidence: f32,
    },
    /// The header's vertex count disagrees with `max(index) + 1`.
    IndexVertexMismatch { declared: u32, derived: u32 },
    /// Index decoding stopped on an element above the index ceiling before
    /// the end of the index region.
    IndexStreamTruncated { offset: u64, value: u32 },
    /// The index stream does not split into whole triangles.
    NonTriangleListIndexCount { count: usize, dropped: usize },
    /// Some UV candidates are NaN or infinite.
    NonFiniteUv { uv_set: usize, count: usize },
}

impl Diagnostic {
    /// Stable identifier of the diagnostic kind.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::LowConfidenceStream { .. } => "LowConfidenceStream",
            Self::AmbiguousStream { .. } => "AmbiguousStream",
            Self::IndexVertexMismatch { .. } => "IndexVertexMismatch",
            Self::IndexStreamTruncated { .. } => "IndexStreamTruncated",
            Self::NonTriangleListIndexCount { .. } => "NonTriangleListIndexCount",
            Self::NonFiniteUv { .. } => "NonFiniteUv",
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LowConfidenceStream {
                semantic,
                best_confidence,
                threshold,
                used_anyway,
            } => {
                match best_confidence {
                    Some(c) => write!(f, "no {semantic} stream above {threshold:.2} (best {c:.3})")?,
                    None => write!(f, "no {semantic} stream candidates")?,
                }
                if *used_anyway {
                    write!(f, ", using best candidate anyway")?;
                }
                Ok(())
            }
            Self::AmbiguousStream {
                semantic,
                layout,
                offsets,
                confidence,
            } => {
                let offsets: Vec<String> = offsets.iter().map(|o| format!("{o:#x}")).collect();
                write!(
                    f,
                    "ambiguous {semantic} stream ({layout}): offsets {} tie at {confidence:.3}",
                    offsets.join(", ")
                )
            }
            Self::IndexVertexMismatch { declared, derived } => write!(
                f,
                "header declares {declared} vertices but indices reference {derived}; using {derived}"
            ),
            Self::IndexStreamTruncated { offset, value } => write!(
                f,
                "index stream ends at {offset:#x} on element {value}; rest of the index region ignored"
            ),
            Self::NonTriangleListIndexCount { count, dropped } => write!(
                f,
                "{count} indices is not a triangle list; dropped trailing {dropped}"
            ),
            Self::NonFiniteUv { uv_set, count } => {
                write!(f, "UV set {uv_set} has {count} non-finite coordinates")
            }
        }
    }
}
