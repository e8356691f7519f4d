//! # Spoolkit Core
//!
//! Core types and error handling for Spoolkit.
//! Provides the geometry data model shared by the thread-path solver and the
//! G-code merge pipeline: 3D points and segments, thread paths with anchor
//! gaps, the ring feed geometry, and the emitted rotation commands.

pub mod command;
pub mod error;
pub mod geometry;

pub use command::{FeedCommand, RotationCommand};
pub use error::{Error, Result};
pub use geometry::{PathElement, Point3, RingGeometry, Segment, ThreadPath, COORD_DECIMALS};
