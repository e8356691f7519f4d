//! External slicer invocation.
//!
//! Solids are exported to mesh files by the CAD side; this wrapper runs the
//! slicer console over one mesh with the fixed flag set the pipeline
//! expects: the configured layer height and temperatures, filament and
//! nozzle diameters, no skirt, no brim, and no auto-arrangement. The
//! resulting G-code file is what the normalizer consumes.

use anyhow::{bail, Context};
use std::path::Path;
use std::process::Command;
use tracing::info;

use spoolkit_settings::Config;

/// Slice one mesh file into G-code at `output`.
pub fn slice_component(config: &Config, mesh: &Path, output: &Path) -> anyhow::Result<()> {
    let slicer = &config.slicer;
    let mut command = Command::new(&slicer.executable);
    command
        .arg(mesh)
        .args(["--layer-height", &config.print.layer_thickness.to_string()])
        .args(["--temperature", &config.print.nozzle_temp.to_string()])
        .args(["--bed-temperature", &config.print.bed_temp.to_string()])
        .args(["--filament-diameter", &slicer.filament_diameter.to_string()])
        .args(["--nozzle-diameter", &slicer.nozzle_diameter.to_string()])
        .args(["--skirts", &slicer.skirts.to_string()])
        .args(["--brim-width", &slicer.brim_width.to_string()]);
    if !slicer.auto_arrange {
        command.arg("--dont-arrange");
    }
    command.arg("--output").arg(output);

    info!(mesh = %mesh.display(), output = %output.display(), "invoking slicer");
    let status = command
        .status()
        .with_context(|| format!("failed to run slicer {}", slicer.executable.display()))?;
    if !status.success() {
        bail!(
            "slicer exited with status {} for {}",
            status,
            mesh.display()
        );
    }
    Ok(())
}
