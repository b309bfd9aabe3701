use vizij_spline_core::{
    AddMethod, CompactSpline, CurveValueType, Range, SegmentIndex, SplineError,
    UncompressedNode, ANGLE_RANGE,
};

const NODE_X_PRECISION: f32 = 0.0001;
const NODE_Y_PRECISION: f32 = 0.0001;
const DERIVATIVE_PRECISION: f32 = 0.01;

// Never the right segment, so lookups exercise the binary search.
const FAR_GUESS: u16 = 10_000;

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn short_spline() -> CompactSpline<'static> {
    let mut spline = CompactSpline::new();
    spline.init(Range::new(0.0, 1.0), 0.01).unwrap();
    for (x, y) in [(0.0, 0.1), (1.0, 0.4), (4.0, 0.2), (40.0, 0.2), (100.0, 1.0)] {
        spline
            .add_node(x, y, 0.0, AddMethod::AddWithoutModification)
            .unwrap();
    }
    spline
}

const UNCOMPRESSED: &[UncompressedNode] = &[
    UncompressedNode::new(0.0, 0.0, 0.0),
    UncompressedNode::new(1.0, 0.5, 0.03),
    UncompressedNode::new(1.5, 0.6, 0.02),
    UncompressedNode::new(3.0, 0.0, -0.04),
];

const UNIFORM: &[UncompressedNode] = &[
    UncompressedNode::new(0.0, 0.0, 0.0),
    UncompressedNode::new(1.0, 0.5, 0.03),
    UncompressedNode::new(2.0, 0.6, 0.02),
    UncompressedNode::new(3.0, 0.0, -0.04),
    UncompressedNode::new(4.0, 0.03, -0.02),
    UncompressedNode::new(5.0, 0.9, -0.1),
];

fn check_nodes(spline: &CompactSpline<'_>, nodes: &[UncompressedNode]) {
    assert_eq!(spline.num_nodes() as usize, nodes.len());
    for (i, n) in nodes.iter().enumerate() {
        let i = i as u16;
        approx(spline.node_x(i), n.x, NODE_X_PRECISION);
        approx(spline.node_y(i), n.y, NODE_Y_PRECISION);
        approx(spline.node_derivative(i), n.derivative, DERIVATIVE_PRECISION);
    }
}

#[test]
fn in_place_creation_stays_inside_its_bytes() {
    const FILL: u8 = 0xAB;
    const MAX_NODES: usize = 3;
    let mut buffer = [FILL; 1024];
    let size = CompactSpline::size(MAX_NODES);
    assert!(size < buffer.len());

    let mut spline = CompactSpline::create_in_place(MAX_NODES, &mut buffer).unwrap();
    assert_eq!(spline.max_nodes(), 3);
    assert_eq!(spline.num_nodes(), 0);

    spline.init(ANGLE_RANGE, 1.0).unwrap();
    for i in 0..MAX_NODES {
        spline
            .add_node(i as f32, 0.0, 0.0, AddMethod::AddWithoutModification)
            .unwrap();
    }
    assert_eq!(spline.num_nodes(), 3);
    assert_eq!(spline.as_bytes().len(), size);
    spline.destroy();

    assert!(buffer[size..].iter().all(|&b| b == FILL));
}

#[test]
fn in_place_rejects_short_buffer() {
    let mut buffer = [0u8; 20];
    assert_eq!(
        CompactSpline::create_in_place(3, &mut buffer).unwrap_err(),
        SplineError::BufferTooSmall {
            required: 34,
            available: 20
        }
    );
}

#[test]
fn in_place_spline_can_be_reopened() {
    let mut buffer = vec![0u8; CompactSpline::size(UNCOMPRESSED.len())];
    CompactSpline::create_from_nodes_in_place(UNCOMPRESSED, &mut buffer)
        .unwrap()
        .destroy();

    let reopened = CompactSpline::open_in_place(&mut buffer).unwrap();
    check_nodes(&reopened, UNCOMPRESSED);
    reopened.destroy();

    buffer[12] = 9; // num_nodes past max_nodes
    assert!(matches!(
        CompactSpline::open_in_place(&mut buffer),
        Err(SplineError::CorruptBuffer { .. })
    ));
}

#[test]
fn index_for_x_before() {
    let s = short_spline();
    assert_eq!(s.index_for_x(-1.0, FAR_GUESS), SegmentIndex::Before);
}

#[test]
fn index_for_x_within_half_grain_of_start() {
    let s = short_spline();
    assert_eq!(s.index_for_x(-0.0001, FAR_GUESS), SegmentIndex::Within(0));
    assert_eq!(s.index_for_x(-0.004, FAR_GUESS), SegmentIndex::Within(0));
}

#[test]
fn index_for_x_more_than_half_grain_before_start() {
    let s = short_spline();
    // X rounds to the nearest grain, so 1.1 grains before the start is Before.
    assert_eq!(s.index_for_x(-0.011, FAR_GUESS), SegmentIndex::Before);
}

#[test]
fn index_for_x_after() {
    let s = short_spline();
    assert_eq!(s.index_for_x(101.0, FAR_GUESS), SegmentIndex::After);
}

#[test]
fn index_for_x_just_after_end() {
    let s = short_spline();
    assert_eq!(
        s.index_for_x(100.0001, FAR_GUESS),
        SegmentIndex::Within(s.last_segment_index())
    );
}

#[test]
fn index_for_x_at_start_and_end() {
    let s = short_spline();
    assert_eq!(s.index_for_x(0.0, FAR_GUESS), SegmentIndex::Within(0));
    assert_eq!(
        s.index_for_x(100.0, FAR_GUESS),
        SegmentIndex::Within(s.last_segment_index())
    );
    assert_eq!(
        s.index_for_x(99.9999, FAR_GUESS),
        SegmentIndex::Within(s.last_segment_index())
    );
}

#[test]
fn index_for_x_more_than_a_grain_before_end() {
    let s = short_spline();
    assert_eq!(s.index_for_x(99.99, FAR_GUESS), SegmentIndex::Within(3));
}

#[test]
fn index_for_x_in_middle() {
    let s = short_spline();
    assert_eq!(s.index_for_x(1.0, FAR_GUESS), SegmentIndex::Within(1));
    assert_eq!(s.index_for_x(1.1, FAR_GUESS), SegmentIndex::Within(1));
    assert_eq!(s.index_for_x(4.1, FAR_GUESS), SegmentIndex::Within(2));
}

#[test]
fn index_for_x_uses_guess_and_successor() {
    let s = short_spline();
    assert_eq!(s.index_for_x(2.0, 1), SegmentIndex::Within(1));
    assert_eq!(s.index_for_x(5.0, 1), SegmentIndex::Within(2));
    // A wrong guess still finds the right segment.
    assert_eq!(s.index_for_x(50.0, 0), SegmentIndex::Within(3));
    assert_eq!(s.index_for_x(0.5, 3), SegmentIndex::Within(0));
}

#[test]
fn segment_for_x_clamps_sentinels() {
    let s = short_spline();
    assert_eq!(s.segment_for_x(-5.0, FAR_GUESS), 0);
    assert_eq!(s.segment_for_x(500.0, FAR_GUESS), 3);
}

#[test]
fn y_slow_at_nodes() {
    let s = short_spline();
    for i in 0..s.num_nodes() {
        approx(s.node_y(i), s.y_calculated_slowly(s.node_x(i)), NODE_Y_PRECISION);
    }
}

#[test]
fn short_spline_accessors() {
    let s = short_spline();
    assert_eq!(s.num_nodes(), 5);
    assert_eq!(s.last_node_index(), 4);
    assert_eq!(s.last_segment_index(), 3);
    approx(s.start_x(), 0.0, NODE_X_PRECISION);
    approx(s.end_x(), 100.0, NODE_X_PRECISION);
    approx(s.length_x(), 100.0, NODE_X_PRECISION);
    approx(s.start_y(), 0.1, NODE_Y_PRECISION);
    approx(s.end_y(), 1.0, NODE_Y_PRECISION);
    assert_eq!(s.range_y(), Range::new(0.0, 1.0));
    let init = s.cubic_init_at(1);
    approx(init.width_x, 3.0, NODE_X_PRECISION);
}

#[test]
fn bulk_ys_start_and_end() {
    let s = short_spline();
    for num_ys in 2..5usize {
        let mut ys = [0.0f32; 5];
        let mut derivatives = [0.0f32; 5];
        let delta_x = s.end_x() / (num_ys - 1) as f32;
        CompactSpline::bulk_ys(
            std::slice::from_ref(&s),
            0.0,
            delta_x,
            num_ys,
            &mut ys,
            Some(&mut derivatives),
        );
        approx(ys[0], s.start_y(), NODE_Y_PRECISION);
        approx(ys[num_ys - 1], s.end_y(), NODE_Y_PRECISION);
        approx(derivatives[0], s.start_derivative(), NODE_Y_PRECISION);
        approx(
            derivatives[num_ys - 1],
            s.end_derivative(),
            DERIVATIVE_PRECISION,
        );
    }
}

#[test]
fn bulk_ys_match_slow_evaluation() {
    const MAX_BULK_YS: usize = 27;
    let s = short_spline();
    for num_ys in 2..MAX_BULK_YS - 6 {
        let mut ys = [0.0f32; MAX_BULK_YS];
        let mut derivatives = [0.0f32; MAX_BULK_YS];
        let delta_x = s.end_x() / (num_ys - 1) as f32;
        let start_x = -3.0 * delta_x;
        let num_points = num_ys + 6;
        s.ys(start_x, delta_x, num_points, &mut ys, Some(&mut derivatives));

        let mut x = start_x;
        for j in 0..num_points {
            approx(s.y_calculated_slowly(x), ys[j], NODE_Y_PRECISION);
            approx(
                s.calculated_slowly(x, CurveValueType::Derivative),
                derivatives[j],
                DERIVATIVE_PRECISION,
            );
            x += delta_x;
        }
    }
}

#[test]
fn bulk_ys_interleave_parallel_splines() {
    let short = short_spline();
    let other = CompactSpline::create_from_nodes(UNIFORM).unwrap();
    let splines = [short.clone(), other];
    let num_ys = 11;
    let delta_x = 0.5;
    let mut ys = vec![0.0f32; num_ys * 2];
    CompactSpline::bulk_ys(&splines, 0.0, delta_x, num_ys, &mut ys, None);

    let mut x = 0.0f32;
    for j in 0..num_ys {
        approx(ys[2 * j], splines[0].y_calculated_slowly(x), NODE_Y_PRECISION);
        approx(ys[2 * j + 1], splines[1].y_calculated_slowly(x), NODE_Y_PRECISION);
        x += delta_x;
    }
}

#[test]
fn bulk_ys_packed_vec3() {
    const NUM_YS: usize = 16;
    let short = short_spline();
    let splines = [short.clone(), short.clone(), short];
    let mut ys = [[f32::NAN; 3]; NUM_YS];
    let delta_x = splines[0].end_x() / (NUM_YS - 1) as f32;
    CompactSpline::bulk_ys_packed(&splines, 0.0, delta_x, NUM_YS, &mut ys);

    for y in ys {
        assert!(y[0].is_finite());
        assert_eq!(y[0], y[1]);
        assert_eq!(y[1], y[2]);
    }
}

#[test]
fn create_from_nodes_keeps_nodes() {
    let spline = CompactSpline::create_from_nodes(UNCOMPRESSED).unwrap();
    check_nodes(&spline, UNCOMPRESSED);
    spline.destroy();
}

#[test]
fn create_from_nodes_in_place_keeps_nodes() {
    let mut buffer = [0u8; 1024];
    assert!(buffer.len() >= CompactSpline::size(UNCOMPRESSED.len()));
    let spline = CompactSpline::create_from_nodes_in_place(UNCOMPRESSED, &mut buffer).unwrap();
    check_nodes(&spline, UNCOMPRESSED);
}

#[test]
fn create_from_uniform_spline_reproduces_nodes() {
    let uniform = CompactSpline::create_from_nodes(UNIFORM).unwrap();
    let spline = CompactSpline::create_from_spline(&uniform, UNIFORM.len()).unwrap();
    check_nodes(&spline, UNIFORM);
}

#[test]
fn create_from_uniform_spline_in_place_reproduces_nodes() {
    let mut uniform_buffer = [0u8; 1024];
    let mut buffer = [0u8; 1024];
    let uniform = CompactSpline::create_from_nodes_in_place(UNIFORM, &mut uniform_buffer).unwrap();
    let spline =
        CompactSpline::create_from_spline_in_place(&uniform, UNIFORM.len(), &mut buffer).unwrap();
    check_nodes(&spline, UNIFORM);
}

#[test]
fn resampling_follows_the_source_curve() {
    let source = short_spline();
    let dense = CompactSpline::create_from_spline(&source, 201).unwrap();
    assert_eq!(dense.num_nodes(), 201);
    approx(dense.end_x(), source.end_x(), NODE_X_PRECISION);
    for i in 0..=40 {
        let x = i as f32 * 2.5;
        approx(dense.y_calculated_slowly(x), source.y_calculated_slowly(x), 0.01);
    }
}

#[test]
fn resampling_needs_two_nodes() {
    let source = short_spline();
    assert!(matches!(
        CompactSpline::create_from_spline(&source, 1),
        Err(SplineError::InvalidCapacity { .. })
    ));
}

#[test]
fn recommended_granularity_reaches_last_x() {
    let g = CompactSpline::recommend_x_granularity(3.0);
    approx(g * 65535.0, 3.0, 1e-5);
    assert_eq!(CompactSpline::recommend_x_granularity(0.0), 1.0);
}
