//! Error types.
//!
//! Insertion and traversal never fail; errors only come from building
//! geometry that would be malformed and from loading configuration.

use thiserror::Error;

/// Geometry rejected before it reaches a scene database.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// A polygon needs at least three vertices.
    #[error("polygon has {0} vertices, at least 3 are required")]
    TooFewVertices(usize),

    /// A per-vertex attribute array does not match the vertex count.
    #[error("{attribute} count {found} does not match vertex count {expected}")]
    AttributeCountMismatch {
        /// Name of the attribute ("normal", "texcoord").
        attribute: &'static str,
        /// Number of vertices in the polygon.
        expected: usize,
        /// Number of attribute values supplied.
        found: usize,
    },

    /// The vertices do not span a plane (collinear or coincident).
    #[error("polygon vertices do not define a plane")]
    DegeneratePlane,
}

/// Configuration loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// A value is outside its allowed range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
