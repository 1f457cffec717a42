//! Error types for `RrmKit`

use std::path::PathBuf;

use thiserror::Error;

/// The error type for `RrmKit` operations.
///
/// Every variant here is fatal for the file being converted. Non-fatal
/// findings are reported as [`crate::formats::rrm::Diagnostic`] instead.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An error that happened while converting a specific file.
    #[error("{path}: {source}")]
    InFile {
        /// The file being converted.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: Box<Error>,
    },

    // ==================== RRM Container Errors ====================
    /// A read went past the end of the buffer.
    #[error("read of {width} bytes at offset {offset:#x} is out of bounds (buffer is {len} bytes)")]
    OutOfBounds {
        /// Byte offset of the read.
        offset: u64,
        /// Width of the read in bytes.
        width: usize,
        /// Length of the buffer.
        len: usize,
    },

    /// A header field holds an offset that cannot point into the buffer.
    #[error("malformed header: {field} at {field_offset:#x} is {value:#x} (buffer is {len} bytes)")]
    MalformedHeader {
        /// Which header field is invalid.
        field: &'static str,
        /// Where the field lives in the header.
        field_offset: u64,
        /// The raw value read from the field.
        value: u32,
        /// Length of the buffer.
        len: usize,
    },

    /// Neither u16 nor u32 decoding produced a usable triangle list, or
    /// every reading references a vertex that is not stored.
    #[error("invalid index stream at {offset:#x}: {message}")]
    InvalidIndexStream {
        /// Byte offset of the index stream.
        offset: u64,
        /// Why each interpretation was rejected.
        message: String,
    },

    /// A minimal round-trip container is truncated or has the wrong magic.
    #[error("invalid minimal container: {message}")]
    InvalidContainer {
        /// Description of what is invalid.
        message: String,
    },

    // ==================== Mesh Errors ====================
    /// The requested UV candidate set does not exist.
    #[error("UV set {index} out of range ({available} candidate sets available)")]
    UvSetOutOfRange {
        /// The requested set.
        index: usize,
        /// Number of candidate sets on the mesh.
        available: usize,
    },

    /// An OBJ file could not be parsed.
    #[error("OBJ parse error: {message}")]
    ObjParse {
        /// Description of the problem.
        message: String,
    },

    /// The input mesh has no vertices to write.
    #[error("no vertices found in {0}")]
    NoVertices(String),

    // ==================== Texture Errors ====================
    /// Failed to parse or decode a DDS texture.
    #[error("DDS error: {0}")]
    DdsError(String),

    /// Failed to encode PNG image.
    #[error("failed to encode PNG: {message}")]
    PngEncodeFailed {
        /// The encoding error message.
        message: String,
    },

    // ==================== Configuration Errors ====================
    /// A configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    // ==================== Batch Errors ====================
    /// The worker pool could not be started.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),

    // ==================== File System Errors ====================
    /// Directory traversal error.
    #[error("directory walk error: {0}")]
    WalkDirError(String),
}

impl Error {
    /// Stable identifier of the error kind, used in batch reports.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Error::Io(_) => "Io",
            Error::InFile { source, .. } => source.code(),
            Error::OutOfBounds { .. } => "OutOfBounds",
            Error::MalformedHeader { .. } => "MalformedHeader",
            Error::InvalidIndexStream { .. } => "InvalidIndexStream",
            Error::InvalidContainer { .. } => "InvalidContainer",
            Error::UvSetOutOfRange { .. } => "UvSetOutOfRange",
            Error::ObjParse { .. } => "ObjParse",
            Error::NoVertices(_) => "NoVertices",
            Error::DdsError(_) => "DdsError",
            Error::PngEncodeFailed { .. } => "PngEncodeFailed",
            Error::Config(_) => "Config",
            Error::ThreadPool(_) => "ThreadPool",
            Error::WalkDirError(_) => "WalkDirError",
        }
    }

    /// Attach the identity of the file being converted.
    #[must_use]
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        match self {
            already @ Error::InFile { .. } => already,
            other => Error::InFile {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }
}

impl From<rayon::ThreadPoolBuildError> for Error {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        Error::ThreadPool(err.to_string())
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::WalkDirError(err.to_string())
    }
}

/// A specialized Result type for `RrmKit` operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_sees_through_file_context() {
        let err = Error::MalformedHeader {
            field: "index offset",
            field_offset: 0xB0,
            value: 0,
            len: 64,
        }
        .in_file("model.rrm");

        assert_eq!(err.code(), "MalformedHeader");
        assert!(err.to_string().starts_with("model.rrm: malformed header"));
    }

    #[test]
    fn test_in_file_does_not_nest() {
        let err = Error::NoVertices("a.obj".to_string())
            .in_file("a.obj")
            .in_file("b.obj");
        match err {
            Error::InFile { path, source } => {
                assert_eq!(path, PathBuf::from("a.obj"));
                assert!(matches!(*source, Error::NoVertices(_)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
