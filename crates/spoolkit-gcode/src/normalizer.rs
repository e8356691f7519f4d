//! Layer normalization of sliced component G-code.
//!
//! Raw slicer output for one component is cleaned into a predictable
//! per-layer shape: startup and shutdown boilerplate stripped, every layer
//! carrying an explicit fan state, a positioning move, and an extrusion
//! reset directly after the layer change, and a `;LAYER:<n>` marker before
//! each layer. A document that already satisfies an invariant passes the
//! corresponding repair untouched.
//!
//! Any missing anchor line (no layer changes, no reset, nothing to borrow a
//! position from) fails the whole component; the merge never runs on a
//! half-normalized document.

use serde::{Deserialize, Serialize};
use spoolkit_core::{Error, Result};
use tracing::info;

use crate::document::{
    is_extrusion_reset, is_fan_marker, is_layer_change, is_positioning_move,
    layer_change_indices, parse_move, rewrite_extrusion, LayerDocument,
};
use crate::edit::EditScript;

/// Settings for the repair passes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NormalizerSettings {
    /// Retraction length for synthesized reset triplets (mm).
    pub retract_length: f64,
    /// Feed rate for synthesized retract/re-prime moves (mm/min).
    pub retract_feed_rate: f64,
    /// Feed rate for synthesized positioning moves (mm/min).
    pub travel_feed_rate: f64,
}

impl Default for NormalizerSettings {
    fn default() -> Self {
        Self {
            retract_length: 2.0,
            retract_feed_rate: 2400.0,
            travel_feed_rate: 7800.0,
        }
    }
}

/// How many lines after a layer change the positioning move may sit in.
const POSITIONING_WINDOW: usize = 3;

/// Normalize one component's raw G-code into a layer-tagged document.
pub fn normalize(
    raw: &str,
    component: &str,
    settings: &NormalizerSettings,
) -> Result<LayerDocument> {
    let lines: Vec<String> = raw
        .lines()
        .map(|line| line.trim_end_matches('\r').to_string())
        .collect();

    let mut lines = strip_header(lines, component)?;
    strip_footer(&mut lines, component)?;

    let fan_edits = repair_fan_state(&mut lines);
    let positioning_edits = repair_positioning(&mut lines, component, settings)?;
    let reset_edits = repair_extrusion_resets(&mut lines, component, settings)?;

    let (lines, spans) = tag_layers(lines);
    info!(
        component,
        layers = spans.len(),
        fan_edits,
        positioning_edits,
        reset_edits,
        "normalized component"
    );

    Ok(LayerDocument::new(component.to_string(), lines, spans))
}

/// Drop slicer startup boilerplate: everything before the second
/// layer-change line, plus the stale retraction/reset pair right after it.
fn strip_header(lines: Vec<String>, component: &str) -> Result<Vec<String>> {
    let changes = layer_change_indices(&lines);
    if changes.len() < 2 {
        return Err(Error::format(
            component,
            format!(
                "expected at least two layer-change lines in slicer output, found {}",
                changes.len()
            ),
        ));
    }
    let second = changes[1];
    if lines.len() < second + 3 {
        return Err(Error::format(
            component,
            "slicer output ends right after a layer change",
        ));
    }

    let mut out = Vec::with_capacity(lines.len() - second - 2);
    out.push(lines[second].clone());
    out.extend(lines[second + 3..].iter().cloned());
    Ok(out)
}

/// Drop slicer shutdown boilerplate: everything after the last extrusion
/// reset.
fn strip_footer(lines: &mut Vec<String>, component: &str) -> Result<()> {
    let last_reset = lines
        .iter()
        .rposition(|line| is_extrusion_reset(line))
        .ok_or_else(|| Error::format(component, "no extrusion reset in slicer output"))?;
    lines.truncate(last_reset + 1);
    Ok(())
}

/// Give every layer an explicit fan state directly after its layer change.
///
/// The first layer is forced to fan-off; later layers copy the most recent
/// marker forward. Layers that already carry a marker in that slot are left
/// alone. Returns the number of edits.
fn repair_fan_state(lines: &mut Vec<String>) -> usize {
    let mut script = EditScript::new();
    let mut last_fan: Option<String> = None;
    let mut first_layer = true;
    // Index of a first-layer marker overridden to M107, so the stale text
    // does not leak into the copy-forward state.
    let mut overridden: Option<usize> = None;

    for i in 0..lines.len() {
        if is_fan_marker(&lines[i]) {
            last_fan = if overridden == Some(i) {
                Some("M107".to_string())
            } else {
                Some(lines[i].clone())
            };
            continue;
        }
        if !is_layer_change(&lines[i]) {
            continue;
        }

        let existing = lines.get(i + 1).filter(|line| is_fan_marker(line));
        if first_layer {
            match existing {
                Some(line) if line.trim_start().starts_with("M107") => {}
                Some(_) => {
                    script.replace(i + 1, "M107");
                    overridden = Some(i + 1);
                }
                None => script.insert(i + 1, "M107"),
            }
            first_layer = false;
        } else if existing.is_none() {
            let marker = last_fan.clone().unwrap_or_else(|| "M107".to_string());
            script.insert(i + 1, marker.clone());
            last_fan = Some(marker);
        }
    }

    let edits = script.len();
    script.apply(lines);
    edits
}

/// Guarantee a positioning move near the start of every layer.
///
/// If none sits within the window after the layer change, the nearest one
/// later in the layer is promoted; a layer with none at all gets one
/// synthesized from the last extruding move before it.
fn repair_positioning(
    lines: &mut Vec<String>,
    component: &str,
    settings: &NormalizerSettings,
) -> Result<usize> {
    let mut script = EditScript::new();
    let changes = layer_change_indices(lines);

    for (k, &ci) in changes.iter().enumerate() {
        let next = changes.get(k + 1).copied().unwrap_or(lines.len());
        let window_end = (ci + 1 + POSITIONING_WINDOW).min(next);
        if (ci + 1..window_end).any(|i| is_positioning_move(&lines[i])) {
            continue;
        }

        // The fan repair has already run, so the marker occupies the line
        // after the change and the positioning slot is the one after that.
        let slot = ci + 2;
        if let Some(j) = (window_end..next).find(|&i| is_positioning_move(&lines[i])) {
            script.delete(j);
            script.insert(slot, lines[j].clone());
        } else {
            let borrowed = (0..ci).rev().find_map(|i| {
                parse_move(&lines[i]).and_then(|words| match (words.x, words.y, words.e) {
                    (Some(x), Some(y), Some(_)) => Some((x, y)),
                    _ => None,
                })
            });
            match borrowed {
                Some((x, y)) => script.insert(
                    slot,
                    format!("G1 X{:.3} Y{:.3} F{:.0}", x, y, settings.travel_feed_rate),
                ),
                None => {
                    return Err(Error::format(
                        component,
                        format!(
                            "layer {}: no positioning move and no prior extruding move to borrow a position from",
                            k + 1
                        ),
                    ));
                }
            }
        }
    }

    let edits = script.len();
    script.apply(lines);
    Ok(edits)
}

/// Guarantee an extrusion reset at the start of every layer.
///
/// A mis-ordered reset inside the layer is moved to directly follow the
/// positioning move. A missing reset inserts a retract/reset/re-prime
/// triplet and renumbers the remainder of the layer so cumulative extrusion
/// matches the un-edited document. Layers are materialized one at a time so
/// each capture sees the previous layer's repaired state.
fn repair_extrusion_resets(
    lines: &mut Vec<String>,
    component: &str,
    settings: &NormalizerSettings,
) -> Result<usize> {
    let mut total_edits = 0usize;
    let mut k = 0usize;

    loop {
        let changes = layer_change_indices(lines);
        if k >= changes.len() {
            break;
        }
        let ci = changes[k];
        let next = changes.get(k + 1).copied().unwrap_or(lines.len());

        let jp = (ci + 1..next)
            .find(|&i| is_positioning_move(&lines[i]))
            .ok_or_else(|| {
                Error::format(
                    component,
                    format!("layer {}: positioning move missing after repair", k + 1),
                )
            })?;
        let slot = jp + 1;

        let mut script = EditScript::new();
        match (ci + 1..next).find(|&i| is_extrusion_reset(&lines[i])) {
            Some(j) if j == slot => {}
            Some(j) => {
                script.delete(j);
                script.insert(slot, "G92 E0");
            }
            None => {
                // Counter state entering this layer: zero at the last reset,
                // otherwise the last E value seen.
                let offset = (0..ci)
                    .rev()
                    .find_map(|i| {
                        if is_extrusion_reset(&lines[i]) {
                            return Some(0.0);
                        }
                        parse_move(&lines[i]).and_then(|words| words.e)
                    })
                    .unwrap_or(0.0);

                let retract = settings.retract_length;
                let feed = settings.retract_feed_rate;
                script.insert_all(
                    slot,
                    vec![
                        format!("G1 E{:.5} F{:.0}", offset - retract, feed),
                        "G92 E0".to_string(),
                        format!("G1 E{:.5} F{:.0}", retract, feed),
                    ],
                );

                let shift = offset - retract;
                for i in slot..next {
                    if is_extrusion_reset(&lines[i]) {
                        break;
                    }
                    if let Some(e) = parse_move(&lines[i]).and_then(|words| words.e) {
                        script.replace(i, rewrite_extrusion(&lines[i], e - shift));
                    }
                }
            }
        }

        total_edits += script.len();
        script.apply(lines);
        k += 1;
    }

    Ok(total_edits)
}

/// Insert a `;LAYER:<n>` marker before every layer change and compute the
/// layer spans of the final line vector.
fn tag_layers(mut lines: Vec<String>) -> (Vec<String>, Vec<std::ops::Range<usize>>) {
    let changes = layer_change_indices(&lines);
    let mut script = EditScript::new();
    for (n, &ci) in changes.iter().enumerate() {
        script.insert(ci, format!(";LAYER:{}", n + 1));
    }
    script.apply(&mut lines);

    let mut spans = Vec::with_capacity(changes.len());
    for n in 0..changes.len() {
        let start = changes[n] + n;
        let end = changes
            .get(n + 1)
            .map(|&c| c + n + 1)
            .unwrap_or(lines.len());
        spans.push(start..end);
    }
    (lines, spans)
}
