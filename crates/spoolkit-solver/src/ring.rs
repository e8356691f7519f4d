//! Ring rotation solving: project thread segments onto the feed ring.
//!
//! Each segment is treated as an infinite line in the XY plane and
//! intersected with the ring circle. Of the two intersection candidates the
//! one farther from the segment start is the outward spool point, consistent
//! with thread unspooling away from the object. The angle to that point,
//! relative to the previous ring angle, converts into a relative feed delta
//! in steps; the feed height is the segment's Z interpolated at the spool
//! point.

use serde::{Deserialize, Serialize};
use spoolkit_core::{
    Error, FeedCommand, PathElement, Result, RingGeometry, RotationCommand, Segment, ThreadPath,
};
use std::f64::consts::PI;
use tracing::debug;

/// Parameters for the ring rotation solver.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SolverParameters {
    /// Ring geometry (center, radius, steps, starting angle).
    pub geometry: RingGeometry,
    /// Feed rate for emitted thread moves (mm/min).
    pub feed_rate: f64,
    /// Over-rotation magnitude of the anchor lock blocks (steps).
    pub lock_steps: f64,
}

impl Default for SolverParameters {
    fn default() -> Self {
        Self {
            geometry: RingGeometry::default(),
            feed_rate: 800.0,
            lock_steps: 5.0,
        }
    }
}

/// Solver for converting an ordered [`ThreadPath`] into ring commands.
pub struct RingSolver {
    params: SolverParameters,
}

impl RingSolver {
    /// Create a new solver with the given parameters.
    pub fn new(params: SolverParameters) -> Self {
        Self { params }
    }

    /// Solve every element of the path into a rotation command.
    ///
    /// The ring angle chains through the sequence: each feed command starts
    /// from the angle the previous one left the ring in. This chained angle
    /// is the solver's only mutable state, so repeated calls over the same
    /// path produce identical sequences.
    pub fn solve(&self, path: &ThreadPath) -> Result<Vec<RotationCommand>> {
        let mut commands = Vec::with_capacity(path.elements().len());
        let mut theta = self.params.geometry.initial_angle;
        let mut last_steps = 0.0f64;

        for (index, element) in path.elements().iter().enumerate() {
            match element {
                PathElement::Segment(segment) => {
                    let feed = self.solve_segment(segment, theta, index)?;
                    theta = feed.theta_after;
                    last_steps = feed.steps;
                    commands.push(RotationCommand::Feed(feed));
                }
                PathElement::Gap => {
                    // Lock direction follows the last feed; a gap before any
                    // feed locks in the positive direction.
                    let steps = if last_steps < 0.0 {
                        -self.params.lock_steps
                    } else {
                        self.params.lock_steps
                    };
                    commands.push(RotationCommand::Lock { steps });
                }
            }
        }

        debug!(commands = commands.len(), "solved thread path");
        Ok(commands)
    }

    /// Solve one segment against the ring circle.
    fn solve_segment(&self, segment: &Segment, theta: f64, index: usize) -> Result<FeedCommand> {
        let h = self.params.geometry.center;
        let r = self.params.geometry.radius;

        if segment.is_degenerate() {
            return Err(Error::geometry(index, "zero-length segment"));
        }
        if segment.xy_degenerate() {
            return Err(Error::geometry(
                index,
                "segment has no XY extent to project onto the ring",
            ));
        }

        let (x1, y1, z1) = (segment.start.x, segment.start.y, segment.start.z);
        let (x2, y2, z2) = (segment.end.x, segment.end.y, segment.end.z);

        // Intersect the segment's infinite XY line with the ring circle.
        let candidates = if x2 != x1 {
            // y = la*x + lb against the circle centered at (h, h).
            let la = (y2 - y1) / (x2 - x1);
            let lb = -la * x1 + y1;
            let qa = 1.0 + la * la;
            let qb = 2.0 * la * (lb - h) - 2.0 * h;
            let qc = (lb - h) * (lb - h) + h * h - r * r;
            let root = discriminant_root(qa, qb, qc, index)?;
            let p1x = (-qb - root) / (2.0 * qa);
            let p2x = (-qb + root) / (2.0 * qa);
            [(p1x, la * p1x + lb), (p2x, la * p2x + lb)]
        } else {
            // The line is x = x1; solve for y directly.
            let qa = 1.0;
            let qb = -2.0 * h;
            let qc = h * h + (x1 - h) * (x1 - h) - r * r;
            let root = discriminant_root(qa, qb, qc, index)?;
            [(x1, (-qb - root) / 2.0), (x1, (-qb + root) / 2.0)]
        };

        // The outward spool point is the candidate farther from the start.
        let d1 = (candidates[0].0 - x1) * (candidates[0].0 - x1)
            + (candidates[0].1 - y1) * (candidates[0].1 - y1);
        let d2 = (candidates[1].0 - x1) * (candidates[1].0 - x1)
            + (candidates[1].1 - y1) * (candidates[1].1 - y1);
        let (sx, sy) = if d1 > d2 { candidates[0] } else { candidates[1] };

        // Feed height: Z interpolated along whichever axis varies.
        let z = if x2 != x1 {
            let a = (z2 - z1) / (x2 - x1);
            a * sx + (-a * x1 + z1)
        } else {
            let a = (z2 - z1) / (y2 - y1);
            a * sy + (-a * y1 + z1)
        };

        // Target angle around the ring center; the arctangent needs a half
        // turn added on the left side of the ring to land in the correct
        // quadrant. Firmware calibration relies on this exact rule.
        let mut t_theta = ((sy - h) / (sx - h)).atan();
        if sx - h < 0.0 {
            t_theta += PI;
        }

        let d_theta = t_theta - theta;
        // Invert the sign: positive steps rotate the ring clockwise.
        let steps = round_steps(-d_theta / (2.0 * PI) * self.params.geometry.steps_per_circle);

        debug!(
            index,
            steps,
            z,
            theta = t_theta.to_degrees(),
            "solved segment"
        );

        Ok(FeedCommand {
            steps,
            z,
            candidates,
            spool_point: (sx, sy),
            theta_before: theta,
            theta_after: t_theta,
        })
    }

    /// Render a command sequence as G-code lines, one block per command.
    pub fn render(&self, commands: &[RotationCommand]) -> Vec<String> {
        let mut lines = Vec::new();
        for command in commands {
            match command {
                RotationCommand::Feed(feed) => self.render_feed(feed, &mut lines),
                RotationCommand::Lock { steps } => self.render_lock(*steps, &mut lines),
            }
        }
        lines
    }

    /// Render the command sequence grouped into runs.
    ///
    /// A lock block terminates the run it anchors, so each returned group
    /// corresponds to one run of the thread path and is spliced into the
    /// merged job as a unit.
    pub fn render_runs(&self, commands: &[RotationCommand]) -> Vec<Vec<String>> {
        let mut runs: Vec<Vec<String>> = Vec::new();
        let mut current: Vec<String> = Vec::new();
        let mut current_has_feed = false;

        for command in commands {
            match command {
                RotationCommand::Feed(feed) => {
                    self.render_feed(feed, &mut current);
                    current_has_feed = true;
                }
                RotationCommand::Lock { steps } => {
                    if current_has_feed {
                        self.render_lock(*steps, &mut current);
                        runs.push(std::mem::take(&mut current));
                        current_has_feed = false;
                    } else if let Some(last) = runs.last_mut() {
                        // Doubled gap: the extra lock re-anchors the run
                        // that was just closed.
                        self.render_lock(*steps, last);
                    } else {
                        self.render_lock(*steps, &mut current);
                    }
                }
            }
        }
        if !current.is_empty() {
            runs.push(current);
        }
        runs
    }

    fn render_feed(&self, feed: &FeedCommand, lines: &mut Vec<String>) {
        let [(p1x, p1y), (p2x, p2y)] = feed.candidates;
        let (sx, sy) = feed.spool_point;
        lines.push(format!(
            ";Spool points: (({},{}),({},{}))",
            p1x, p1y, p2x, p2y
        ));
        lines.push(format!(";Target spool points: ({},{})", sx, sy));
        lines.push(format!(
            ";Theta, tTheta, dTheta: ({},{},{})",
            feed.theta_before.to_degrees(),
            feed.theta_after.to_degrees(),
            (feed.theta_after - feed.theta_before).to_degrees()
        ));
        lines.push(format!(
            "G1 E{} Z{:.3} F{}",
            feed.steps, feed.z, self.params.feed_rate
        ));
    }

    fn render_lock(&self, steps: f64, lines: &mut Vec<String>) {
        lines.push(";anchor".to_string());
        lines.push(format!("G1 E{} F{}", steps, self.params.feed_rate));
        lines.push(format!("G1 E{} F{}", -steps, self.params.feed_rate));
    }
}

/// Square root of the quadratic discriminant, or a geometry error when the
/// line misses the ring circle.
fn discriminant_root(qa: f64, qb: f64, qc: f64, index: usize) -> Result<f64> {
    let discriminant = qb * qb - 4.0 * qa * qc;
    if discriminant < 0.0 {
        return Err(Error::geometry(
            index,
            "segment line does not reach the ring circle",
        ));
    }
    Ok(discriminant.sqrt())
}

/// Round a feed delta to two decimals of a step.
fn round_steps(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use spoolkit_core::Point3;

    fn solver() -> RingSolver {
        RingSolver::new(SolverParameters::default())
    }

    fn path(elements: Vec<PathElement>) -> ThreadPath {
        ThreadPath::new(elements)
    }

    #[test]
    fn test_diameter_candidates_are_endpoints() {
        // A segment on the horizontal diameter: candidates must be the two
        // diameter endpoints, and the farther one from the start is x=h+r.
        let h = 117.5;
        let r = 100.0;
        let segment = Segment::new(Point3::new(h - r, h, 0.0), Point3::new(h + r, h, 5.0));
        let commands = solver()
            .solve(&path(vec![PathElement::Segment(segment)]))
            .unwrap();

        let feed = commands[0].as_feed().unwrap();
        assert!((feed.candidates[0].0 - (h - r)).abs() < 1e-9);
        assert!((feed.candidates[1].0 - (h + r)).abs() < 1e-9);
        assert!((feed.spool_point.0 - (h + r)).abs() < 1e-9);
        assert!((feed.spool_point.1 - h).abs() < 1e-9);
        // Z interpolates to the segment end height at the far endpoint.
        assert!((feed.z - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_line_missing_ring_is_geometry_error() {
        // The line y=0 passes 117.5mm from the ring center; radius is 100.
        let segment = Segment::new(Point3::origin(), Point3::new(10.0, 0.0, 2.0));
        let err = solver()
            .solve(&path(vec![PathElement::Segment(segment)]))
            .unwrap_err();
        assert!(matches!(err, Error::Geometry { index: 0, .. }));
    }

    #[test]
    fn test_segment_without_xy_extent_is_rejected() {
        let segment = Segment::new(Point3::new(100.0, 100.0, 0.0), Point3::new(100.0, 100.0, 5.0));
        let err = solver()
            .solve(&path(vec![PathElement::Segment(segment)]))
            .unwrap_err();
        assert!(matches!(err, Error::Geometry { index: 0, .. }));
    }

    #[test]
    fn test_lock_direction_follows_last_feed() {
        let h = 117.5;
        let r = 100.0;
        // The target angle is ahead of the starting angle here, so the
        // inverted feed delta comes out negative.
        let segment = Segment::new(Point3::new(h - r, h, 0.0), Point3::new(h + r, h, 0.0));
        let commands = solver()
            .solve(&path(vec![PathElement::Segment(segment), PathElement::Gap]))
            .unwrap();

        let feed_steps = commands[0].as_feed().unwrap().steps;
        match commands[1] {
            RotationCommand::Lock { steps } => {
                assert_eq!(steps.signum(), feed_steps.signum());
                assert!((steps.abs() - 5.0).abs() < 1e-9);
            }
            _ => panic!("expected lock command"),
        }
    }

    #[test]
    fn test_render_runs_groups_at_locks() {
        let h = 117.5;
        let r = 100.0;
        let s1 = Segment::new(Point3::new(h - r, h, 0.0), Point3::new(h + r, h, 2.0));
        let s2 = Segment::new(Point3::new(h + r, h, 2.0), Point3::new(h - r, h, 4.0));
        let commands = solver()
            .solve(&path(vec![
                PathElement::Segment(s1),
                PathElement::Gap,
                PathElement::Segment(s2),
            ]))
            .unwrap();

        let runs = solver().render_runs(&commands);
        assert_eq!(runs.len(), 2);
        // First run ends with the anchor lock pair.
        assert_eq!(runs[0].iter().filter(|l| *l == ";anchor").count(), 1);
        assert!(runs[0].last().unwrap().starts_with("G1 E"));
        assert_eq!(runs[1].iter().filter(|l| *l == ";anchor").count(), 0);
    }

    #[test]
    fn test_steps_round_to_two_decimals() {
        assert_eq!(round_steps(-35.625001), -35.63);
        assert_eq!(round_steps(1.004), 1.0);
    }
}
