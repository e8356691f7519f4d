//! Job description and pipeline driver.
//!
//! A job file is the JSON handoff from the CAD-side selection step: the
//! thread origin, the selected segments (with `null` entries marking anchor
//! gaps), the sliced component files, and the output path.

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use spoolkit_core::{Point3, Segment};
use spoolkit_gcode::{merge, normalize, write_document, MergeSettings, NormalizerSettings};
use spoolkit_settings::Config;
use spoolkit_solver::{order_path, RingSolver, SolverParameters};

/// One thread job: geometry plus the sliced component files to merge.
#[derive(Debug, Clone, Deserialize)]
pub struct JobDescription {
    /// Thread origin point.
    pub origin: [f64; 3],
    /// Selected segments in selection order; `null` marks an anchor gap.
    pub segments: Vec<Option<[[f64; 3]; 2]>>,
    /// Sliced G-code of the printed body.
    pub body: PathBuf,
    /// Sliced G-code of each anchor insert.
    #[serde(default)]
    pub anchors: Vec<PathBuf>,
    /// Where to write the merged job.
    pub output: PathBuf,
}

impl JobDescription {
    /// Load a job description from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read job file {}", path.display()))?;
        let job: Self = serde_json::from_str(&content)
            .with_context(|| format!("invalid job file {}", path.display()))?;
        Ok(job)
    }

    fn raw_segments(&self) -> Vec<Option<Segment>> {
        self.segments
            .iter()
            .map(|entry| {
                entry.map(|[start, end]| Segment::new(Point3::from(start), Point3::from(end)))
            })
            .collect()
    }
}

/// Run the whole pipeline for one job.
pub fn run(job: &JobDescription, config: &Config) -> anyhow::Result<()> {
    info!(
        segments = job.segments.len(),
        anchors = job.anchors.len(),
        "starting thread merge job"
    );

    // Geometry: order the selection, solve it against the ring.
    let path = order_path(job.raw_segments(), Point3::from(job.origin))?;
    let solver = RingSolver::new(SolverParameters {
        geometry: config.ring.geometry(),
        feed_rate: config.ring.feed_rate,
        lock_steps: config.ring.lock_steps,
    });
    let commands = solver.solve(&path)?;
    let thread_runs = solver.render_runs(&commands);

    // Text: normalize every component, then merge.
    let normalizer = NormalizerSettings {
        retract_length: config.print.retract_length,
        retract_feed_rate: config.print.retract_feed_rate,
        travel_feed_rate: config.print.travel_feed_rate,
    };
    let body = normalize(&read_component(&job.body)?, "body", &normalizer)?;
    let mut anchors = Vec::with_capacity(job.anchors.len());
    for (i, anchor_path) in job.anchors.iter().enumerate() {
        let name = format!("anchor-{}", i + 1);
        anchors.push(normalize(&read_component(anchor_path)?, &name, &normalizer)?);
    }

    let merged = merge(
        &body,
        &anchors,
        &path,
        &thread_runs,
        &MergeSettings {
            layer_thickness: config.print.layer_thickness,
            nozzle_temp: config.print.nozzle_temp,
            bed_temp: config.print.bed_temp,
        },
    )?;

    write_document(&job.output, &merged)?;
    info!(output = %job.output.display(), "thread merge job finished");
    Ok(())
}

fn read_component(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read component G-code {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_description_parses_gaps() {
        let json = r#"{
            "origin": [0, 0, 0],
            "segments": [
                [[0, 0, 0], [10, 0, 0]],
                null,
                [[10, 0, 0], [10, 10, 0]]
            ],
            "body": "body.gcode",
            "anchors": ["anchor1.gcode"],
            "output": "merged.gcode"
        }"#;

        let job: JobDescription = serde_json::from_str(json).unwrap();
        let raw = job.raw_segments();
        assert_eq!(raw.len(), 3);
        assert!(raw[0].is_some());
        assert!(raw[1].is_none());
        assert_eq!(job.anchors.len(), 1);
    }

    #[test]
    fn test_anchors_default_to_empty() {
        let json = r#"{
            "origin": [0, 0, 0],
            "segments": [],
            "body": "body.gcode",
            "output": "merged.gcode"
        }"#;
        let job: JobDescription = serde_json::from_str(json).unwrap();
        assert!(job.anchors.is_empty());
    }
}
