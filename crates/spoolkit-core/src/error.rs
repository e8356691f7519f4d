//! Error handling for the Spoolkit pipeline.
//!
//! Four error kinds cover the whole pipeline: broken thread chains,
//! segments that cannot be projected onto the ring, malformed sliced
//! G-code, and plain I/O failures. All of them abort the merge for the
//! affected component or run; none are downgraded to best-effort output.

use thiserror::Error;

use crate::geometry::Point3;

/// Pipeline error type.
#[derive(Error, Debug)]
pub enum Error {
    /// The thread segments do not form a connected chain from the origin.
    #[error("thread segment {index} is not connected: no endpoint matches {expected}")]
    Connectivity {
        /// Index of the offending element in the input list.
        index: usize,
        /// The chain point the segment was expected to touch.
        expected: Point3,
    },

    /// A segment cannot be projected onto the ring, or is degenerate.
    #[error("thread segment {index}: {reason}")]
    Geometry {
        /// Index of the offending element in the input list.
        index: usize,
        /// What went wrong geometrically.
        reason: String,
    },

    /// Sliced G-code is missing an expected anchor line during normalization.
    #[error("component '{component}': {reason}")]
    Format {
        /// Display name of the component being normalized.
        component: String,
        /// What was missing or misplaced.
        reason: String,
    },

    /// I/O error reading component G-code or writing the merged output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Construct a format error for a named component.
    pub fn format(component: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Format {
            component: component.into(),
            reason: reason.into(),
        }
    }

    /// Construct a geometry error for a segment index.
    pub fn geometry(index: usize, reason: impl Into<String>) -> Self {
        Self::Geometry {
            index,
            reason: reason.into(),
        }
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;
