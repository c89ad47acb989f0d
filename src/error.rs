//! Error types shared across the crate.
//!
//! Contract violations (extending a search before choosing a start, asking for the path
//! to an undiscovered vertex, popping an empty queue) panic instead; the variants here
//! cover conditions a caller can reasonably observe and report.

use core::fmt;

use crate::graph::VertexId;

/// The error type for graph construction, configuration and search failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A tentative distance no longer fits in [`Distance`](crate::paths::Distance).
    DistanceOverflow {
        /// The vertex whose candidate distance overflowed.
        vertex: VertexId,
    },
    /// An edge points at a vertex id outside `[0, vertex_count)`.
    EdgeOutOfBounds {
        /// Source of the offending edge.
        start: VertexId,
        /// Target of the offending edge.
        end: VertexId,
        /// Number of vertices in the graph.
        vertex_count: usize,
    },
    /// No weight function is registered under this name.
    UnknownWeigher(String),
    /// A line of the textual graph format could not be parsed.
    ParseGraph {
        /// One-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },
    /// An image file could not be decoded.
    ParseImage(String),
    /// A configuration value is invalid.
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DistanceOverflow { vertex } => {
                write!(f, "distance to vertex {vertex} overflowed")
            }
            Self::EdgeOutOfBounds {
                start,
                end,
                vertex_count,
            } => write!(
                f,
                "edge {start}->{end} is out of bounds for vertex_count={vertex_count}"
            ),
            Self::UnknownWeigher(name) => write!(f, "unknown weigher `{name}`"),
            Self::ParseGraph { line, message } => {
                write!(f, "graph text line {line}: {message}")
            }
            Self::ParseImage(message) => write!(f, "invalid image: {message}"),
            Self::Config(message) => write!(f, "invalid configuration: {message}"),
        }
    }
}

impl std::error::Error for Error {}

/// Convenience alias for results carrying [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = Error::EdgeOutOfBounds {
            start: 1,
            end: 9,
            vertex_count: 4,
        };
        assert_eq!(err.to_string(), "edge 1->9 is out of bounds for vertex_count=4");
        assert_eq!(
            Error::UnknownWeigher("sobel".into()).to_string(),
            "unknown weigher `sobel`"
        );
    }

    #[test]
    fn test_converts_into_anyhow() {
        let err: anyhow::Error = Error::DistanceOverflow { vertex: 3 }.into();
        assert!(err.downcast_ref::<Error>().is_some());
    }
}
