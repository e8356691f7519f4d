//! G-code line classification and the layer-tagged document model.
//!
//! The dialect is the linear, absolute-positioning one produced by the
//! slicing collaborator: `G0`/`G1` moves with `X`/`Y`/`Z`/`E`/`F` words,
//! `G92 E0` extrusion resets, `M106`/`M107` fan markers, and `;` comments.

use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

/// Word values extracted from a motion line.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveWords {
    /// X target, if present.
    pub x: Option<f64>,
    /// Y target, if present.
    pub y: Option<f64>,
    /// Z target, if present.
    pub z: Option<f64>,
    /// Extrusion target, if present.
    pub e: Option<f64>,
    /// Feed rate, if present.
    pub f: Option<f64>,
}

fn word_regex() -> &'static Regex {
    static WORD_REGEX: OnceLock<Regex> = OnceLock::new();
    WORD_REGEX.get_or_init(|| {
        Regex::new(r"([XYZEF])(-?[0-9]+\.?[0-9]*)").expect("invalid regex pattern")
    })
}

/// Strip the trailing comment from a line.
pub fn strip_comment(line: &str) -> &str {
    match line.find(';') {
        Some(at) => &line[..at],
        None => line,
    }
}

/// Whether a line is a `G0`/`G1` motion command.
pub fn is_move(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("G1 ") || t.starts_with("G0 ") || t == "G1" || t == "G0"
}

/// Parse the axis words of a motion line, ignoring any comment.
pub fn parse_move(line: &str) -> Option<MoveWords> {
    if !is_move(line) {
        return None;
    }
    let mut words = MoveWords::default();
    for caps in word_regex().captures_iter(strip_comment(line)) {
        let value: f64 = caps[2].parse().ok()?;
        match &caps[1] {
            "X" => words.x = Some(value),
            "Y" => words.y = Some(value),
            "Z" => words.z = Some(value),
            "E" => words.e = Some(value),
            "F" => words.f = Some(value),
            _ => {}
        }
    }
    Some(words)
}

/// Whether a line is a layer-change move (begins with the height-change
/// motion token).
pub fn is_layer_change(line: &str) -> bool {
    line.trim_start().starts_with("G1 Z")
}

/// Whether a line sets the part-cooling fan on or off.
pub fn is_fan_marker(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("M106") || t.starts_with("M107")
}

/// Whether a line resets the extrusion axis to zero.
pub fn is_extrusion_reset(line: &str) -> bool {
    line.trim_start().starts_with("G92 E0")
}

/// Whether a line is a positioning move: X/Y target with a feed rate and no
/// extrusion.
pub fn is_positioning_move(line: &str) -> bool {
    match parse_move(line) {
        Some(words) => {
            words.x.is_some() && words.y.is_some() && words.f.is_some() && words.e.is_none()
        }
        None => false,
    }
}

/// Indices of all layer-change lines.
pub fn layer_change_indices(lines: &[String]) -> Vec<usize> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| is_layer_change(line))
        .map(|(i, _)| i)
        .collect()
}

/// Rewrite the E word of a motion line with a new value.
pub fn rewrite_extrusion(line: &str, value: f64) -> String {
    static E_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = E_REGEX
        .get_or_init(|| Regex::new(r"E-?[0-9]+\.?[0-9]*").expect("invalid regex pattern"));
    regex.replace(line, format!("E{:.5}", value)).into_owned()
}

/// A normalized, layer-tagged component document.
///
/// Lines are cleaned of slicer header/footer boilerplate; every layer starts
/// with a `;LAYER:<n>` marker and indices are contiguous from 1.
#[derive(Debug, Clone)]
pub struct LayerDocument {
    component: String,
    lines: Vec<String>,
    spans: Vec<Range<usize>>,
}

impl LayerDocument {
    /// Build a document from tagged lines and their layer spans.
    pub(crate) fn new(component: String, lines: Vec<String>, spans: Vec<Range<usize>>) -> Self {
        Self {
            component,
            lines,
            spans,
        }
    }

    /// Display name of the component.
    pub fn component(&self) -> &str {
        &self.component
    }

    /// All cleaned lines, markers included.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of layers.
    pub fn layer_count(&self) -> usize {
        self.spans.len()
    }

    /// The lines of layer `index` (1-based), marker included.
    pub fn layer(&self, index: usize) -> Option<&[String]> {
        if index == 0 {
            return None;
        }
        self.spans
            .get(index - 1)
            .map(|span| &self.lines[span.clone()])
    }
}
