use spoolkit_gcode::{normalize, NormalizerSettings};

fn settings() -> NormalizerSettings {
    NormalizerSettings::default()
}

/// A small but realistic slicer document: startup boilerplate with one
/// priming layer change, two content layers, and a shutdown sequence ending
/// in a retract/reset pair.
fn raw_body() -> String {
    [
        "; generated by Slic3r",
        "G21 ; set units to millimeters",
        "M107",
        "G28 ; home",
        "G1 Z0.300 F7800.000",
        "G1 X5.000 Y5.000 F7800.000",
        "G1 Z0.500 F7800.000",
        "G1 E-2.00000 F2400.00000",
        "G92 E0",
        "G1 X10.000 Y10.000 F7800.000",
        "G92 E0",
        "G1 X20.000 Y10.000 E1.50000 F1800.000",
        "M106 S255",
        "G1 Z0.700 F7800.000",
        "G1 X10.000 Y10.000 F7800.000",
        "G92 E0",
        "G1 X20.000 Y20.000 E1.20000 F1800.000",
        "G92 E0",
        "M104 S0",
        "G28 X0",
        "M84",
    ]
    .join("\n")
}

#[test]
fn test_normalize_cleans_and_tags() {
    let doc = normalize(&raw_body(), "body", &settings()).unwrap();

    let expected: Vec<String> = [
        ";LAYER:1",
        "G1 Z0.500 F7800.000",
        "M107",
        "G1 X10.000 Y10.000 F7800.000",
        "G92 E0",
        "G1 X20.000 Y10.000 E1.50000 F1800.000",
        "M106 S255",
        ";LAYER:2",
        "G1 Z0.700 F7800.000",
        "M106 S255",
        "G1 X10.000 Y10.000 F7800.000",
        "G92 E0",
        "G1 X20.000 Y20.000 E1.20000 F1800.000",
        "G92 E0",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    assert_eq!(doc.lines(), expected.as_slice());
    assert_eq!(doc.layer_count(), 2);
    assert_eq!(doc.layer(1).unwrap()[0], ";LAYER:1");
    assert_eq!(doc.layer(2).unwrap()[1], "G1 Z0.700 F7800.000");
}

#[test]
fn test_marker_count_matches_layer_changes() {
    let doc = normalize(&raw_body(), "body", &settings()).unwrap();

    let markers = doc
        .lines()
        .iter()
        .filter(|l| l.starts_with(";LAYER:"))
        .count();
    let changes = doc
        .lines()
        .iter()
        .filter(|l| l.starts_with("G1 Z"))
        .count();
    assert_eq!(markers, changes);
    assert_eq!(markers, doc.layer_count());
}

#[test]
fn test_equipped_document_needs_no_repairs() {
    // Every layer already carries fan marker, positioning move, and reset
    // in canonical order; only stripping and tagging may touch it.
    let raw = [
        "; header",
        "G1 Z0.300 F7800.000",
        "G1 X5.000 Y5.000 F7800.000",
        "G1 Z0.500 F7800.000",
        "G1 E-2.00000 F2400.00000",
        "G92 E0",
        "M107",
        "G1 X10.000 Y10.000 F7800.000",
        "G92 E0",
        "G1 X20.000 Y10.000 E1.00000 F1800.000",
        "G1 Z0.700 F7800.000",
        "M106 S200",
        "G1 X10.000 Y10.000 F7800.000",
        "G92 E0",
        "G1 X20.000 Y20.000 E1.00000 F1800.000",
        "G92 E0",
        "M84",
    ]
    .join("\n");

    let doc = normalize(&raw, "body", &settings()).unwrap();

    let expected: Vec<String> = [
        ";LAYER:1",
        "G1 Z0.500 F7800.000",
        "M107",
        "G1 X10.000 Y10.000 F7800.000",
        "G92 E0",
        "G1 X20.000 Y10.000 E1.00000 F1800.000",
        ";LAYER:2",
        "G1 Z0.700 F7800.000",
        "M106 S200",
        "G1 X10.000 Y10.000 F7800.000",
        "G92 E0",
        "G1 X20.000 Y20.000 E1.00000 F1800.000",
        "G92 E0",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    assert_eq!(doc.lines(), expected.as_slice());
}

#[test]
fn test_travel_only_layer_gets_synthesized_position() {
    let raw = [
        "; header",
        "G1 Z0.300 F7800.000",
        "G1 X5.000 Y5.000 F7800.000",
        "G1 Z0.500 F7800.000",
        "G1 E-2.00000 F2400.00000",
        "G92 E0",
        "M107",
        "G1 X10.000 Y10.000 F7800.000",
        "G92 E0",
        "G1 X12.500 Y8.000 E1.00000 F1800.000",
        // Second layer has no positioning move at all.
        "G1 Z0.700 F7800.000",
        "G92 E0",
        "G92 E0",
        "M84",
    ]
    .join("\n");

    let doc = normalize(&raw, "body", &settings()).unwrap();
    let layer2 = doc.layer(2).unwrap();
    assert_eq!(layer2[0], ";LAYER:2");
    assert_eq!(layer2[1], "G1 Z0.700 F7800.000");
    assert_eq!(layer2[2], "M107");
    // Borrowed from the last extruding move of layer 1.
    assert_eq!(layer2[3], "G1 X12.500 Y8.000 F7800");
    assert_eq!(layer2[4], "G92 E0");
}

#[test]
fn test_too_few_layer_changes_is_an_error() {
    let raw = "G21\nG1 Z0.300 F7800.000\nG92 E0\n";
    let err = normalize(raw, "anchor-1", &settings()).unwrap_err();
    assert!(err.to_string().contains("anchor-1"));
    assert!(err.to_string().contains("layer-change"));
}

#[test]
fn test_missing_reset_is_an_error() {
    let raw = [
        "G1 Z0.300 F7800.000",
        "G1 X5.000 Y5.000 F7800.000",
        "G1 Z0.500 F7800.000",
        "stale",
        "stale",
        "G1 X10.000 Y10.000 F7800.000",
    ]
    .join("\n");
    let err = normalize(&raw, "body", &settings()).unwrap_err();
    assert!(err.to_string().contains("extrusion reset"));
}
