use spoolkit_core::{PathElement, Point3, RingGeometry, Segment, ThreadPath};
use spoolkit_solver::{order_path, RingSolver, SolverParameters};

fn seg(a: [f64; 3], b: [f64; 3]) -> Segment {
    Segment::new(a.into(), b.into())
}

fn reference_solver() -> RingSolver {
    RingSolver::new(SolverParameters {
        geometry: RingGeometry {
            center: 117.5,
            radius: 100.0,
            steps_per_circle: 142.5,
            initial_angle: (-90.0f64).to_radians(),
        },
        feed_rate: 800.0,
        lock_steps: 5.0,
    })
}

#[test]
fn test_two_segment_chain_end_to_end() {
    // Two chained segments near the bed center: one varying in X, one
    // vertical in X. Both must reach the ring and chain their angles.
    let origin = Point3::new(100.0, 100.0, 0.0);
    let path = order_path(
        vec![
            Some(seg([100.0, 100.0, 0.0], [110.0, 100.0, 2.0])),
            Some(seg([110.0, 100.0, 2.0], [110.0, 110.0, 2.0])),
        ],
        origin,
    )
    .unwrap();

    let commands = reference_solver().solve(&path).unwrap();
    assert_eq!(commands.len(), 2);

    let first = commands[0].as_feed().unwrap();
    let second = commands[1].as_feed().unwrap();

    // Chained angle state: the second command starts where the first ended.
    assert_eq!(first.theta_after, second.theta_before);

    // No discontinuity beyond the true geometric turn between the segments.
    let turn = (second.theta_after - second.theta_before).abs();
    assert!(turn < std::f64::consts::PI);

    // The second segment is horizontal at z=2; its feed height is exact.
    assert!((second.z - 2.0).abs() < 1e-9);
}

#[test]
fn test_solver_is_deterministic() {
    let path = order_path(
        vec![
            Some(seg([100.0, 100.0, 0.0], [110.0, 100.0, 2.0])),
            None,
            Some(seg([110.0, 100.0, 2.0], [110.0, 110.0, 2.0])),
        ],
        Point3::new(100.0, 100.0, 0.0),
    )
    .unwrap();

    let solver = reference_solver();
    let first = solver.solve(&path).unwrap();
    let second = solver.solve(&path).unwrap();
    assert_eq!(first, second);

    let rendered_first = solver.render(&first);
    let rendered_second = solver.render(&second);
    assert_eq!(rendered_first, rendered_second);
}

#[test]
fn test_rendered_feed_block_shape() {
    let h = 117.5;
    let r = 100.0;
    let path = ThreadPath::new(vec![PathElement::Segment(seg(
        [h - r, h, 0.0],
        [h + r, h, 5.0],
    ))]);

    let solver = reference_solver();
    let commands = solver.solve(&path).unwrap();
    let lines = solver.render(&commands);

    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with(";Spool points: (("));
    assert!(lines[1].starts_with(";Target spool points: ("));
    assert!(lines[2].starts_with(";Theta, tTheta, dTheta: ("));
    assert!(lines[3].starts_with("G1 E"));
    assert!(lines[3].ends_with("F800"));
    assert!(lines[3].contains("Z5.000"));
}

#[test]
fn test_gap_renders_anchor_lock_pair() {
    let h = 117.5;
    let r = 100.0;
    let path = ThreadPath::new(vec![
        PathElement::Segment(seg([h - r, h, 0.0], [h + r, h, 2.0])),
        PathElement::Gap,
    ]);

    let solver = reference_solver();
    let commands = solver.solve(&path).unwrap();
    let lines = solver.render(&commands);

    let anchor_at = lines.iter().position(|l| l == ";anchor").unwrap();
    let lock = &lines[anchor_at + 1];
    let unlock = &lines[anchor_at + 2];
    assert!(lock.starts_with("G1 E"));
    assert!(unlock.starts_with("G1 E"));
    // The pair cancels out: same magnitude, opposite signs.
    assert_eq!(lock.contains("E-"), !unlock.contains("E-"));
}

#[test]
fn test_geometry_error_aborts_whole_solve() {
    // Second segment's line misses the ring circle; the solve must fail,
    // not emit a truncated command list.
    let path = ThreadPath::new(vec![
        PathElement::Segment(seg([17.5, 117.5, 0.0], [217.5, 117.5, 2.0])),
        PathElement::Segment(seg([300.0, 400.0, 2.0], [310.0, 400.0, 2.0])),
    ]);

    let result = reference_solver().solve(&path);
    assert!(result.is_err());
}
