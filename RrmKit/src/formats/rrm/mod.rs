//! RRM container recovery.
//!
//! The container's schema is undocumented. The stages below recover a mesh
//! from byte layout alone, leaf first:
//!
//! - [`scanner`] - bounds-checked little-endian reads
//! - [`header`] - fixed-offset header fields
//! - [`indices`] - index width, triangle list and true vertex count
//! - [`detect`] - ranked normal/UV stream candidates
//! - [`minimal`] - the `RRMEXTR` round-trip layout

pub mod detect;
pub mod diagnostics;
pub mod header;
pub mod indices;
pub mod layout;
pub mod minimal;
pub mod scanner;
pub mod streams;

pub use detect::{
    DetectionReport, DetectorConfig, EnvelopeScorer, StreamCandidate, StreamDetector, StreamScan,
    StreamScorer,
};
pub use diagnostics::Diagnostic;
pub use header::RrmHeader;
pub use indices::{IndexExtraction, IndexStream, IndexWidth, extract_indices};
pub use layout::{RrmLayout, StreamLayout};
pub use minimal::{
    MINIMAL_MAGIC, is_minimal_container, read_minimal_container, write_minimal_container,
};
pub use scanner::RawBuffer;
pub use streams::{FieldLayout, Semantic, StreamDescriptor};
