//! Configuration for the thread-embedding pipeline.
//!
//! Organized into logical sections:
//! - Ring settings (feed mechanism geometry and motion)
//! - Print settings (layer pitch, temperatures, repair feed rates)
//! - Slicer settings (external slicer executable and its fixed flags)
//!
//! Files are stored as TOML or JSON in platform-specific directories.

use serde::{Deserialize, Serialize};
use spoolkit_core::RingGeometry;
use std::path::{Path, PathBuf};

use crate::error::{Result, SettingsError};

/// Ring feed mechanism settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RingSettings {
    /// Ring center offset on both bed axes (mm).
    pub center: f64,
    /// Ring radius (mm).
    pub radius: f64,
    /// Feed steps per full rotation.
    pub steps_per_circle: f64,
    /// Ring angle at job start (degrees).
    pub initial_angle_deg: f64,
    /// Feed rate for thread moves (mm/min).
    pub feed_rate: f64,
    /// Over-rotation of the anchor lock blocks (steps).
    pub lock_steps: f64,
}

impl Default for RingSettings {
    fn default() -> Self {
        Self {
            center: 117.5,
            radius: 100.0,
            steps_per_circle: 142.5,
            initial_angle_deg: -90.0,
            feed_rate: 800.0,
            lock_steps: 5.0,
        }
    }
}

impl RingSettings {
    /// The solver-facing geometry, with the angle in radians.
    pub fn geometry(&self) -> RingGeometry {
        RingGeometry {
            center: self.center,
            radius: self.radius,
            steps_per_circle: self.steps_per_circle,
            initial_angle: self.initial_angle_deg.to_radians(),
        }
    }
}

/// Print and normalization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintSettings {
    /// Layer thickness (mm); also maps thread heights to layer indices.
    pub layer_thickness: f64,
    /// Nozzle temperature (°C).
    pub nozzle_temp: u32,
    /// Bed temperature (°C).
    pub bed_temp: u32,
    /// Retraction length for synthesized resets (mm).
    pub retract_length: f64,
    /// Feed rate for synthesized retract moves (mm/min).
    pub retract_feed_rate: f64,
    /// Feed rate for synthesized travel moves (mm/min).
    pub travel_feed_rate: f64,
}

impl Default for PrintSettings {
    fn default() -> Self {
        Self {
            layer_thickness: 0.2,
            nozzle_temp: 200,
            bed_temp: 60,
            retract_length: 2.0,
            retract_feed_rate: 2400.0,
            travel_feed_rate: 7800.0,
        }
    }
}

/// External slicer invocation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlicerSettings {
    /// Path to the slicer console executable.
    pub executable: PathBuf,
    /// Filament diameter flag (mm).
    pub filament_diameter: f64,
    /// Nozzle diameter flag (mm).
    pub nozzle_diameter: f64,
    /// Number of skirt loops (0 disables the skirt).
    pub skirts: u32,
    /// Brim width (mm, 0 disables the brim).
    pub brim_width: f64,
    /// Whether the slicer may auto-arrange parts on the bed.
    pub auto_arrange: bool,
}

impl Default for SlicerSettings {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("slic3r-console"),
            filament_diameter: 1.75,
            nozzle_diameter: 0.4,
            skirts: 0,
            brim_width: 0.0,
            auto_arrange: false,
        }
    }
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ring feed mechanism.
    pub ring: RingSettings,
    /// Print and normalization parameters.
    pub print: PrintSettings,
    /// External slicer invocation.
    pub slicer: SlicerSettings,
}

impl Config {
    /// Create new config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML).
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::LoadError(format!("failed to read config file: {}", e)))?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content)?
        } else {
            return Err(SettingsError::LoadError(
                "config file must be .json or .toml".to_string(),
            ));
        };

        config.validate()?;
        Ok(config)
    }

    /// Save config to file (JSON or TOML).
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        self.validate()?;

        let content = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::to_string_pretty(self)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::to_string_pretty(self)
                .map_err(|e| SettingsError::SaveError(format!("serialization failed: {}", e)))?
        } else {
            return Err(SettingsError::SaveError(
                "config file must be .json or .toml".to_string(),
            ));
        };

        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("failed to write config file: {}", e)))?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.ring.radius <= 0.0 {
            return Err(SettingsError::InvalidSetting {
                key: "ring.radius".into(),
                reason: "must be positive".into(),
            });
        }
        if self.ring.steps_per_circle <= 0.0 {
            return Err(SettingsError::InvalidSetting {
                key: "ring.steps_per_circle".into(),
                reason: "must be positive".into(),
            });
        }
        if self.ring.lock_steps < 0.0 {
            return Err(SettingsError::InvalidSetting {
                key: "ring.lock_steps".into(),
                reason: "must not be negative".into(),
            });
        }
        if self.print.layer_thickness <= 0.0 || self.print.layer_thickness > 1.0 {
            return Err(SettingsError::InvalidSetting {
                key: "print.layer_thickness".into(),
                reason: "must be between 0 and 1mm".into(),
            });
        }
        if self.print.retract_length < 0.0 {
            return Err(SettingsError::InvalidSetting {
                key: "print.retract_length".into(),
                reason: "must not be negative".into(),
            });
        }
        Ok(())
    }
}
