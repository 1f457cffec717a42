//! Staged RRM -> mesh extraction.
//!
//! Each stage consumes the previous one, so the order
//! header -> stream scan -> indices -> vertices is enforced by the types:
//!
//! ```no_run
//! use rrmkit::converter::{ConversionOptions, Pipeline};
//! use rrmkit::formats::rrm::RawBuffer;
//!
//! let buffer = RawBuffer::new(std::fs::read("caha000.rrm")?);
//! let options = ConversionOptions::default();
//! let extraction = Pipeline::new(&buffer, &options)
//!     .read_header()?
//!     .scan_streams()
//!     .extract_indices()?
//!     .assemble()?;
//! println!("{} vertices", extraction.mesh.vertex_count());
//! # Ok::<(), rrmkit::Error>(())
//! ```

use serde::Serialize;

use super::options::ConversionOptions;
use crate::error::Result;
use crate::formats::rrm::{
    DetectionReport, Diagnostic, IndexExtraction, RawBuffer, RrmHeader, StreamDetector, StreamScan,
};
use crate::mesh::uv::non_finite_diagnostics;
use crate::mesh::{Mesh, assemble_vertices, select_uv_set};

/// Entry point of the extraction stages.
pub struct Pipeline<'a> {
    buffer: &'a RawBuffer,
    options: &'a ConversionOptions,
}

/// Header decoded.
pub struct HeaderRead<'a> {
    buffer: &'a RawBuffer,
    options: &'a ConversionOptions,
    header: RrmHeader,
}

/// Float runs found; the vertex count is still unknown.
pub struct StreamsScanned<'a> {
    buffer: &'a RawBuffer,
    options: &'a ConversionOptions,
    header: RrmHeader,
    scan: StreamScan,
}

/// Faces and the true vertex count recovered.
pub struct IndicesExtracted<'a> {
    buffer: &'a RawBuffer,
    options: &'a ConversionOptions,
    header: RrmHeader,
    scan: StreamScan,
    indices: IndexExtraction,
}

/// Result of a complete extraction.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub header: RrmHeader,
    pub indices: IndexSummary,
    pub detection: DetectionReport,
    pub mesh: Mesh,
    pub diagnostics: Vec<Diagnostic>,
}

/// The index stage without the face list (which lives in the mesh).
#[derive(Debug, Clone, Serialize)]
pub struct IndexSummary {
    pub stream: crate::formats::rrm::IndexStream,
    pub vertex_count: u32,
    pub declared_vertex_count: Option<u32>,
    pub trials: Vec<crate::formats::rrm::indices::WidthTrial>,
}

impl<'a> Pipeline<'a> {
    #[must_use]
    pub fn new(buffer: &'a RawBuffer, options: &'a ConversionOptions) -> Self {
        Self { buffer, options }
    }

    /// # Errors
    /// `MalformedHeader` or `OutOfBounds`.
    pub fn read_header(self) -> Result<HeaderRead<'a>> {
        let header = RrmHeader::read(self.buffer, &self.options.layout)?;
        Ok(HeaderRead {
            buffer: self.buffer,
            options: self.options,
            header,
        })
    }
}

impl<'a> HeaderRead<'a> {
    #[must_use]
    pub fn header(&self) -> &RrmHeader {
        &self.header
    }

    #[must_use]
    pub fn scan_streams(self) -> StreamsScanned<'a> {
        let scan = StreamScan::scan(self.buffer, &self.options.detector);
        StreamsScanned {
            buffer: self.buffer,
            options: self.options,
            header: self.header,
            scan,
        }
    }
}

impl<'a> StreamsScanned<'a> {
    #[must_use]
    pub fn scan(&self) -> &StreamScan {
        &self.scan
    }

    /// # Errors
    /// `InvalidIndexStream` if no element width yields a triangle list of
    /// stored vertices.
    pub fn extract_indices(self) -> Result<IndicesExtracted<'a>> {
        let indices = crate::formats::rrm::extract_indices(
            self.buffer,
            &self.header,
            self.options.layout.index_ceiling,
        )?;
        Ok(IndicesExtracted {
            buffer: self.buffer,
            options: self.options,
            header: self.header,
            scan: self.scan,
            indices,
        })
    }
}

impl IndicesExtracted<'_> {
    #[must_use]
    pub fn indices(&self) -> &IndexExtraction {
        &self.indices
    }

    /// Rank stream candidates for the recovered vertex count and build the mesh.
    ///
    /// # Errors
    /// `OutOfBounds` if an accepted stream is shorter than the vertex count.
    pub fn assemble(self) -> Result<Extraction> {
        let options = self.options;
        let vertex_count = self.indices.vertex_count;

        let detection = StreamDetector::new(&options.layout, &options.detector).rank(
            self.buffer,
            &self.scan,
            &self.header,
            &self.indices.stream,
            vertex_count,
        )?;
        let resolved = detection.resolve(&options.layout, &options.detector, options.allow_low_confidence);

        let IndexExtraction {
            stream,
            faces,
            vertex_count,
            declared_vertex_count,
            trials,
            diagnostics: index_diagnostics,
        } = self.indices;

        let mesh = assemble_vertices(
            self.buffer,
            &self.header.position_stream,
            resolved.normal.as_ref(),
            &resolved.uv,
            faces,
            vertex_count,
            options.assembly,
        )?;

        let mut diagnostics = index_diagnostics;
        diagnostics.extend(resolved.diagnostics);
        let uv_diagnostics = non_finite_diagnostics(&mesh);
        for diagnostic in &uv_diagnostics {
            tracing::warn!("{diagnostic}");
        }
        diagnostics.extend(uv_diagnostics);

        tracing::debug!(
            "Assembled {} vertices, {} faces, {} UV sets",
            mesh.vertex_count(),
            mesh.faces.len(),
            mesh.uv_sets.len()
        );

        Ok(Extraction {
            header: self.header,
            indices: IndexSummary {
                stream,
                vertex_count,
                declared_vertex_count,
                trials,
            },
            detection,
            mesh,
            diagnostics,
        })
    }
}

impl Extraction {
    /// Commit to UV candidate `index`, if one is given.
    ///
    /// # Errors
    /// `UvSetOutOfRange` if the mesh has no such candidate.
    pub fn select_uv(mut self, index: Option<usize>) -> Result<Self> {
        if let Some(index) = index {
            self.mesh = select_uv_set(&self.mesh, index)?;
        }
        Ok(self)
    }
}

/// Run every stage on `buffer` and apply `options.uv_set`.
///
/// # Errors
/// Any stage error.
pub fn extract_mesh(buffer: &RawBuffer, options: &ConversionOptions) -> Result<Extraction> {
    Pipeline::new(buffer, options)
        .read_header()?
        .scan_streams()
        .extract_indices()?
        .assemble()?
        .select_uv(options.uv_set)
}
