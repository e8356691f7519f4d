//! # Spoolkit
//!
//! Converts an embedded thread path into motion instructions for a rotating
//! thread-feed ring and merges them with the sliced G-code of the printed
//! body and its anchor inserts into one continuous multi-tool print job.
//!
//! ## Architecture
//!
//! Spoolkit is organized as a workspace with multiple crates:
//!
//! 1. **spoolkit-core** - geometry data model, feed commands, pipeline errors
//! 2. **spoolkit-solver** - segment ordering and ring rotation solving
//! 3. **spoolkit-gcode** - layer normalization, merge scheduling, output writing
//! 4. **spoolkit-settings** - configuration and persistence
//! 5. **spoolkit** - the binary that wires the pipeline together
//!
//! The pipeline is synchronous and single-threaded: ordering, solving,
//! per-component normalization, and merging are sequential transformations
//! over in-memory geometry and text. The only blocking operations are file
//! I/O and the optional external slicer invocation.

pub mod job;
pub mod slicer;

pub use spoolkit_core::{
    Error, PathElement, Point3, Result, RingGeometry, RotationCommand, Segment, ThreadPath,
};
pub use spoolkit_gcode::{
    merge, normalize, write_document, LayerDocument, MergeSettings, MergedDocument,
    NormalizerSettings,
};
pub use spoolkit_settings::{Config, SettingsPersistence};
pub use spoolkit_solver::{order_path, RingSolver, SolverParameters};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    Ok(())
}
