//! # RrmKit
//!
//! Recovery tools for the undocumented RRM model container.
//!
//! RRM files carry no schema. The header only reliably names the index and
//! position streams; normals and UVs are found by scoring candidate byte
//! sites, and the true vertex count comes from the index stream.
//!
//! ## Supported Conversions
//!
//! - **RRM -> OBJ/MTL** - staged recovery with ranked stream candidates
//! - **OBJ -> RRM** - positions-only `RRMEXTR` container
//! - **DDS -> PNG** - texture sidecars for the exported OBJ
//! - **Batch** - whole directories on a worker pool
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use rrmkit::converter::{ConversionOptions, convert_rrm_to_obj};
//!
//! let options = ConversionOptions::default();
//! let report = convert_rrm_to_obj(Path::new("caha000.rrm"), Path::new("out/caha000.obj"), &options, true)?;
//! println!("{} vertices, {} diagnostics", report.vertices, report.diagnostics.len());
//! # Ok::<(), rrmkit::Error>(())
//! ```
//!
//! ### Batch Conversion
//!
//! ```no_run
//! use std::path::Path;
//! use rrmkit::batch::{BatchMode, BatchOptions, batch_convert};
//! use rrmkit::converter::ConversionOptions;
//!
//! let result = batch_convert(
//!     Path::new("models/"),
//!     Path::new("out/"),
//!     &BatchOptions::new(BatchMode::ToMesh),
//!     &ConversionOptions::default(),
//!     |_| {},
//! )?;
//! println!("{} converted, {} failed", result.success_count, result.fail_count);
//! # Ok::<(), rrmkit::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `rrmkit` command-line binary

pub mod batch;
pub mod converter;
pub mod error;
pub mod formats;
pub mod mesh;
pub mod texture;

pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::formats::rrm::{
        Diagnostic, RawBuffer, RrmHeader, RrmLayout, StreamCandidate, StreamScorer,
    };
    pub use crate::mesh::{DedupPolicy, Mesh, UvSetInfo, Vertex};

    pub use crate::converter::{
        ConversionOptions, ConversionReport, Extraction, Pipeline, container_to_mesh,
        convert_obj_to_rrm, convert_rrm_to_obj, extract_mesh, mesh_to_container,
    };
    pub use crate::batch::{BatchMode, BatchOptions, BatchResult, batch_convert};
    pub use crate::texture::{TextureAction, convert_dds_to_png};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
