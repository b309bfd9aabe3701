//! Mid-node placement for splitting one misbehaving cubic into two.
//!
//! A Hermite cubic whose curvature flips sign inside its segment tends to
//! swing past its end values. We replace it with two pieces that are each
//! exactly quadratic: a quadratic has constant curvature, and when its end
//! slopes share a sign it is monotonic, so it stays between its end values.
//!
//! For a mid node at `m` with slope `sm`, C1 continuity of the two quadratic
//! pieces requires
//!
//! ```text
//! 2 (y1 - y0) = s0 m + sm w + s1 (w - m)
//! ```
//!
//! We first try `m = w / 2`. If the resulting `sm` would run against the
//! segment direction, we pin `sm = 0` and solve for `m` instead.

use crate::compact_spline::UncompressedNode;
use crate::curve::{CubicCurve, CubicInit};
use crate::range::Range;

/// Mid node, relative to the segment start, that splits `init` into two
/// well-behaved cubics. `None` when the single cubic already has uniform
/// curvature, or when no split keeps the mid node strictly inside.
pub fn calculate_dual_cubic_mid_node(init: &CubicInit) -> Option<UncompressedNode> {
    let curve = CubicCurve::new(init);
    if curve.uniform_curvature(&Range::new(0.0, init.width_x)) {
        return None;
    }

    let w = init.width_x;
    let y0 = init.start_y;
    let s0 = init.start_derivative;
    let s1 = init.end_derivative;
    let dy = init.end_y - y0;

    let half = 0.5 * w;
    let mid_slope = 2.0 * dy / w - 0.5 * (s0 + s1);
    if mid_slope * dy >= 0.0 {
        return Some(UncompressedNode {
            x: half,
            y: y0 + 0.5 * (s0 + mid_slope) * half,
            derivative: mid_slope,
        });
    }

    let slope_gap = s0 - s1;
    if slope_gap.abs() <= f32::EPSILON * (s0.abs() + s1.abs()) {
        return None;
    }
    let x = (2.0 * dy - s1 * w) / slope_gap;
    if !(x > 0.0 && x < w) {
        return None;
    }
    Some(UncompressedNode {
        x,
        y: y0 + 0.5 * s0 * x,
        derivative: 0.0,
    })
}
