//! # Spoolkit G-code
//!
//! Text-stream processing for sliced G-code: per-component layer
//! normalization, multi-tool merge scheduling, and atomic output writing.
//!
//! The normalizer strips slicer boilerplate, repairs fan-speed and
//! positioning continuity at layer boundaries, guarantees a deterministic
//! extrusion reset per layer, and tags layers with `;LAYER:<n>` markers.
//! The merger interleaves the tagged component streams layer by layer and
//! splices thread feed blocks in under the `T1` tool selector.

pub mod document;
pub mod edit;
pub mod merger;
pub mod normalizer;
pub mod writer;

pub use document::LayerDocument;
pub use edit::EditScript;
pub use merger::{merge, MergeSettings, MergedDocument};
pub use normalizer::{normalize, NormalizerSettings};
pub use writer::write_document;
