//! # Spoolkit Solver
//!
//! Converts a selected set of 3D thread segments into feed commands for the
//! rotating ring mechanism. Two stages:
//!
//! 1. **Orderer** - orients the raw segment list into a single directed
//!    chain anchored at the thread origin, with anchor gaps preserved.
//! 2. **Ring solver** - projects each segment onto the ring circle, picks
//!    the outward spool point, and emits one rotation/feed command per
//!    segment plus a lock block per gap.

pub mod orderer;
pub mod ring;

pub use orderer::order_path;
pub use ring::{RingSolver, SolverParameters};
