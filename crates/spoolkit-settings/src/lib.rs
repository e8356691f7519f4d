//! Spoolkit Settings Crate
//!
//! Handles pipeline configuration and settings persistence: the ring feed
//! mechanism geometry, print/normalization parameters, and the external
//! slicer invocation flags.

pub mod config;
pub mod error;
pub mod persistence;

pub use config::{Config, PrintSettings, RingSettings, SlicerSettings};
pub use error::{Result, SettingsError};
pub use persistence::SettingsPersistence;
