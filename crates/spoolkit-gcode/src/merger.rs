//! Merge scheduling: interleave component layers and thread feed blocks.
//!
//! Components print in lock-step by layer index under the `T0` tool. At
//! every layer containing a thread crossing, the corresponding run of thread
//! feed commands is spliced in under `T1`, then printing resumes. Thread
//! commands operate on the separate `T1` extrusion axis, so splices never
//! disturb the printing tool's extrusion state; only the tool selector
//! changes.

use serde::{Deserialize, Serialize};
use spoolkit_core::{Error, Result, Segment, ThreadPath};
use tracing::{debug, info};

use crate::document::LayerDocument;

/// Settings for the merge scheduler.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MergeSettings {
    /// Printed layer thickness (mm); converts crossing heights to layers.
    pub layer_thickness: f64,
    /// Nozzle temperature for the header (°C).
    pub nozzle_temp: u32,
    /// Bed temperature for the header (°C).
    pub bed_temp: u32,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            layer_thickness: 0.2,
            nozzle_temp: 200,
            bed_temp: 60,
        }
    }
}

/// The final merged print job.
#[derive(Debug, Clone)]
pub struct MergedDocument {
    lines: Vec<String>,
}

impl MergedDocument {
    /// All lines of the job in order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Consume the document into its lines.
    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

/// Merge the normalized body, anchors, and thread runs into one job.
///
/// `thread_runs` holds the rendered feed block for each run of the path, in
/// order. The scheduler derives each run's crossing layer from the path's
/// segment heights and `layer_thickness`.
pub fn merge(
    body: &LayerDocument,
    anchors: &[LayerDocument],
    path: &ThreadPath,
    thread_runs: &[Vec<String>],
    settings: &MergeSettings,
) -> Result<MergedDocument> {
    let runs = path.runs();
    if runs.len() != thread_runs.len() {
        return Err(Error::format(
            "thread feed",
            format!(
                "{} rendered blocks for {} thread runs",
                thread_runs.len(),
                runs.len()
            ),
        ));
    }

    let total_layers = anchors
        .iter()
        .map(LayerDocument::layer_count)
        .chain(std::iter::once(body.layer_count()))
        .max()
        .unwrap_or(0);

    let crossings = crossing_layers(&runs, settings.layer_thickness, total_layers)?;
    debug!(?crossings, total_layers, "merge schedule");

    let mut out = header(settings);
    let mut next_run = 0usize;

    for layer in 1..=total_layers {
        if let Some(lines) = body.layer(layer) {
            out.extend_from_slice(lines);
        }
        for anchor in anchors {
            if let Some(lines) = anchor.layer(layer) {
                out.push(";anchor".to_string());
                out.extend_from_slice(lines);
            }
        }
        while next_run < crossings.len() && crossings[next_run] == layer {
            splice_thread_run(&mut out, &thread_runs[next_run], next_run == 0);
            next_run += 1;
        }
    }

    out.extend(footer());
    info!(
        layers = total_layers,
        splices = thread_runs.len(),
        lines = out.len(),
        "merged print job"
    );
    Ok(MergedDocument { lines: out })
}

/// The crossing layer of each run, ascending.
///
/// A run's crossing height is the largest non-zero endpoint Z of its
/// segments; origin-adjacent zero-height segments contribute nothing. The
/// layer index is `floor(height / layer_thickness)`, clamped to the printed
/// range.
fn crossing_layers(
    runs: &[Vec<Segment>],
    layer_thickness: f64,
    total_layers: usize,
) -> Result<Vec<usize>> {
    let mut crossings = Vec::with_capacity(runs.len());
    for (index, run) in runs.iter().enumerate() {
        let height = run
            .iter()
            .flat_map(|segment| [segment.start.z, segment.end.z])
            .filter(|z| *z > 1e-9)
            .fold(0.0f64, f64::max);
        // The epsilon absorbs division noise when a crossing sits exactly
        // on a layer boundary.
        let layer = ((height / layer_thickness + 1e-9).floor() as usize)
            .max(1)
            .min(total_layers.max(1));
        if let Some(&previous) = crossings.last() {
            if layer < previous {
                return Err(Error::geometry(
                    index,
                    format!(
                        "thread crossing layers are not ascending ({} after {})",
                        layer, previous
                    ),
                ));
            }
        }
        crossings.push(layer);
    }
    Ok(crossings)
}

/// Splice one thread run under the thread tool selector.
fn splice_thread_run(out: &mut Vec<String>, run: &[String], first: bool) {
    out.push("T1 ; change tool to Extruder 2".to_string());
    if first {
        // Assume 12 o'clock is E2=0.
        out.push("G92 E0 ; set the current filament position to E2=0".to_string());
        out.push("G0 Y0 ; Move bed to 0".to_string());
    }
    out.extend_from_slice(run);
    out.push("T0 ; change back to normal extruder".to_string());
}

/// Fixed machine-initialization header.
fn header(settings: &MergeSettings) -> Vec<String> {
    let stamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    vec![
        format!(
            "; generated by spoolkit {} on {}",
            env!("CARGO_PKG_VERSION"),
            stamp
        ),
        "G28 ; home all axes".to_string(),
        format!("M140 S{} ; set bed temperature", settings.bed_temp),
        format!("M104 S{} ; set nozzle temperature", settings.nozzle_temp),
        format!("M109 S{} ; wait for nozzle temperature", settings.nozzle_temp),
        "G90 ; absolute positioning".to_string(),
        "G92 E0 ; zero extrusion".to_string(),
    ]
}

/// Fixed shutdown footer.
fn footer() -> Vec<String> {
    vec![
        "M107 ; fan off".to_string(),
        "M104 S0 ; nozzle off".to_string(),
        "M140 S0 ; bed off".to_string(),
        "G28 X0 Y0 ; home X and Y".to_string(),
        "M84 ; disable motors".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use spoolkit_core::Point3;

    fn seg(a: [f64; 3], b: [f64; 3]) -> Segment {
        Segment::new(Point3::from(a), Point3::from(b))
    }

    #[test]
    fn test_crossing_layers_floor_and_clamp() {
        let runs = vec![
            vec![seg([0.0, 0.0, 0.0], [10.0, 0.0, 0.6])],
            vec![seg([10.0, 0.0, 0.6], [10.0, 10.0, 1.1])],
        ];
        let crossings = crossing_layers(&runs, 0.2, 5).unwrap();
        assert_eq!(crossings, vec![3, 5]);
    }

    #[test]
    fn test_zero_height_run_crosses_after_first_layer() {
        let runs = vec![vec![seg([0.0, 0.0, 0.0], [10.0, 0.0, 0.0])]];
        let crossings = crossing_layers(&runs, 0.2, 5).unwrap();
        assert_eq!(crossings, vec![1]);
    }

    #[test]
    fn test_descending_crossings_are_rejected() {
        let runs = vec![
            vec![seg([0.0, 0.0, 0.0], [10.0, 0.0, 1.0])],
            vec![seg([10.0, 0.0, 1.0], [10.0, 10.0, 0.4])],
        ];
        assert!(crossing_layers(&runs, 0.2, 10).is_err());
    }
}
