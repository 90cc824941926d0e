//! Error types for mesh parsing.

use thiserror::Error;

/// Errors that can occur while decoding an STL buffer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Buffer is shorter than the 84-byte binary STL preamble.
    #[error("STL buffer too small: {len} bytes (need at least 84)")]
    BufferTooSmall {
        /// Length of the rejected buffer.
        len: usize,
    },

    /// Neither the binary nor the ASCII decoder found a single vertex.
    #[error("no vertices found in STL data")]
    NoVertices,

    /// Too few vertices to form a single triangle.
    #[error("STL data has {vertices} vertices, not enough for a triangle")]
    NoTriangles {
        /// Number of vertices found.
        vertices: usize,
    },
}

/// Result type for mesh operations.
pub type Result<T> = std::result::Result<T, ParseError>;
