//! Short waypoint lists used to build splines on the fly.
//!
//! A target is up to three nodes of (value, velocity, time). Time 0 means
//! "now": a node at time 0 overrides the current value and velocity.
//! `CompactSpline::create_from_target` turns a target into a spline that
//! starts at the current value and passes through every node.

use crate::compact_spline::{AddMethod, CompactSpline};
use crate::error::SplineError;
use crate::range::{ModularDirection, Range};
use crate::Result;
use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Most nodes a target can hold.
pub const MAX_TARGET_NODES: usize = 3;

/// One waypoint of a target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetNode {
    pub value: f32,
    #[serde(default)]
    pub velocity: f32,
    pub time: f32,
    /// Path taken to `value` on modular channels.
    #[serde(default)]
    pub direction: ModularDirection,
}

impl TargetNode {
    pub const fn new(value: f32, velocity: f32, time: f32, direction: ModularDirection) -> Self {
        Self {
            value,
            velocity,
            time,
            direction,
        }
    }
}

/// Up to `MAX_TARGET_NODES` waypoints with strictly increasing times.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Target1f {
    nodes: ArrayVec<TargetNode, MAX_TARGET_NODES>,
}

impl Target1f {
    /// Checked construction from arbitrary nodes.
    pub fn from_nodes(nodes: &[TargetNode]) -> Result<Self> {
        let invalid = |reason: String| SplineError::InvalidTarget { reason };
        if nodes.len() > MAX_TARGET_NODES {
            return Err(invalid(format!(
                "{} nodes; at most {MAX_TARGET_NODES} allowed",
                nodes.len()
            )));
        }
        let mut previous: Option<f32> = None;
        for n in nodes {
            if !(n.time >= 0.0 && n.time.is_finite()) {
                return Err(invalid(format!("node time {}", n.time)));
            }
            if previous.is_some_and(|t| n.time <= t) {
                return Err(invalid(format!("node time {} not increasing", n.time)));
            }
            previous = Some(n.time);
        }
        Ok(Self {
            nodes: nodes.iter().copied().collect(),
        })
    }

    fn with(nodes: &[TargetNode]) -> Self {
        Self {
            nodes: nodes.iter().copied().take(MAX_TARGET_NODES).collect(),
        }
    }

    /// Set the current value and velocity without moving.
    pub fn current(current_value: f32, current_velocity: f32) -> Self {
        Self::with(&[TargetNode::new(
            current_value,
            current_velocity,
            0.0,
            ModularDirection::Closest,
        )])
    }

    /// Move from wherever we are to `target_value` over `target_time`.
    pub fn target(
        target_value: f32,
        target_velocity: f32,
        target_time: f32,
        direction: ModularDirection,
    ) -> Self {
        Self::with(&[TargetNode::new(
            target_value,
            target_velocity,
            target_time,
            direction,
        )])
    }

    /// Jump to the current value, then move to the target.
    pub fn current_to_target(
        current_value: f32,
        current_velocity: f32,
        target_value: f32,
        target_velocity: f32,
        target_time: f32,
        direction: ModularDirection,
    ) -> Self {
        Self::with(&[
            TargetNode::new(current_value, current_velocity, 0.0, ModularDirection::Closest),
            TargetNode::new(target_value, target_velocity, target_time, direction),
        ])
    }

    /// Move from the current value to the target at one constant velocity.
    pub fn current_to_target_const_velocity(
        current_value: f32,
        target_value: f32,
        target_time: f32,
    ) -> Self {
        let velocity = if target_time > 0.0 {
            (target_value - current_value) / target_time
        } else {
            0.0
        };
        Self::with(&[
            TargetNode::new(current_value, velocity, 0.0, ModularDirection::Direct),
            TargetNode::new(target_value, velocity, target_time, ModularDirection::Direct),
        ])
    }

    /// Move to one target, then on to a second.
    pub fn target_to_target(
        target_value: f32,
        target_velocity: f32,
        target_time: f32,
        third_value: f32,
        third_velocity: f32,
        third_time: f32,
    ) -> Self {
        Self::with(&[
            TargetNode::new(
                target_value,
                target_velocity,
                target_time,
                ModularDirection::Closest,
            ),
            TargetNode::new(
                third_value,
                third_velocity,
                third_time,
                ModularDirection::Closest,
            ),
        ])
    }

    /// Jump to the current value, then visit two targets.
    #[allow(clippy::too_many_arguments)]
    pub fn current_to_target_to_target(
        current_value: f32,
        current_velocity: f32,
        target_value: f32,
        target_velocity: f32,
        target_time: f32,
        third_value: f32,
        third_velocity: f32,
        third_time: f32,
    ) -> Self {
        Self::with(&[
            TargetNode::new(current_value, current_velocity, 0.0, ModularDirection::Closest),
            TargetNode::new(
                target_value,
                target_velocity,
                target_time,
                ModularDirection::Closest,
            ),
            TargetNode::new(
                third_value,
                third_velocity,
                third_time,
                ModularDirection::Closest,
            ),
        ])
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, index: usize) -> &TargetNode {
        &self.nodes[index]
    }

    pub fn nodes(&self) -> &[TargetNode] {
        &self.nodes
    }

    /// Smallest range holding every node value.
    pub fn value_range(&self) -> Range {
        Range::covers(self.nodes.iter().map(|n| n.value))
    }

    /// Time of the last node, or zero for an empty target.
    pub fn end_time(&self) -> f32 {
        self.nodes.last().map_or(0.0, |n| n.time)
    }
}

/// One `Target1f` per dimension.
#[derive(Clone, Debug, PartialEq)]
pub struct TargetN<const D: usize> {
    targets: [Target1f; D],
}

impl<const D: usize> Default for TargetN<D> {
    fn default() -> Self {
        Self {
            targets: std::array::from_fn(|_| Target1f::default()),
        }
    }
}

impl<const D: usize> TargetN<D> {
    pub fn from_fn(f: impl FnMut(usize) -> Target1f) -> Self {
        Self {
            targets: std::array::from_fn(f),
        }
    }

    pub fn targets(&self) -> &[Target1f; D] {
        &self.targets
    }

    /// Latest end time over all dimensions.
    pub fn end_time(&self) -> f32 {
        self.targets
            .iter()
            .fold(0.0f32, |t, target| t.max(target.end_time()))
    }
}

impl<const D: usize> Index<usize> for TargetN<D> {
    type Output = Target1f;

    fn index(&self, index: usize) -> &Target1f {
        &self.targets[index]
    }
}

impl<const D: usize> IndexMut<usize> for TargetN<D> {
    fn index_mut(&mut self, index: usize) -> &mut Target1f {
        &mut self.targets[index]
    }
}

/// Bridges external vector types to plain float arrays.
pub trait VectorConverter<const D: usize>: Sized {
    fn from_floats(values: [f32; D]) -> Self;
    fn to_floats(&self) -> [f32; D];
}

impl<const D: usize> VectorConverter<D> for [f32; D] {
    fn from_floats(values: [f32; D]) -> Self {
        values
    }

    fn to_floats(&self) -> [f32; D] {
        *self
    }
}

/// Value shapes a target can be built for: `f32` builds a `Target1f`,
/// `[f32; D]` builds a `TargetN<D>`.
pub trait TargetValue: Copy {
    type Target;
    const DIMENSIONS: usize;

    fn component(&self, dimension: usize) -> f32;
    fn assemble(f: impl FnMut(usize) -> Target1f) -> Self::Target;
}

impl TargetValue for f32 {
    type Target = Target1f;
    const DIMENSIONS: usize = 1;

    fn component(&self, _dimension: usize) -> f32 {
        *self
    }

    fn assemble(mut f: impl FnMut(usize) -> Target1f) -> Target1f {
        f(0)
    }
}

impl<const D: usize> TargetValue for [f32; D] {
    type Target = TargetN<D>;
    const DIMENSIONS: usize = D;

    fn component(&self, dimension: usize) -> f32 {
        self[dimension]
    }

    fn assemble(f: impl FnMut(usize) -> Target1f) -> TargetN<D> {
        TargetN::from_fn(f)
    }
}

/// Builds targets of any `TargetValue` shape, one dimension at a time.
pub struct TargetBuilder;

impl TargetBuilder {
    pub fn current<V: TargetValue>(current_value: V, current_velocity: V) -> V::Target {
        V::assemble(|i| {
            Target1f::current(current_value.component(i), current_velocity.component(i))
        })
    }

    pub fn target<V: TargetValue>(
        target_value: V,
        target_velocity: V,
        target_time: f32,
        direction: ModularDirection,
    ) -> V::Target {
        V::assemble(|i| {
            Target1f::target(
                target_value.component(i),
                target_velocity.component(i),
                target_time,
                direction,
            )
        })
    }

    pub fn current_to_target<V: TargetValue>(
        current_value: V,
        current_velocity: V,
        target_value: V,
        target_velocity: V,
        target_time: f32,
        direction: ModularDirection,
    ) -> V::Target {
        V::assemble(|i| {
            Target1f::current_to_target(
                current_value.component(i),
                current_velocity.component(i),
                target_value.component(i),
                target_velocity.component(i),
                target_time,
                direction,
            )
        })
    }

    pub fn current_to_target_const_velocity<V: TargetValue>(
        current_value: V,
        target_value: V,
        target_time: f32,
    ) -> V::Target {
        V::assemble(|i| {
            Target1f::current_to_target_const_velocity(
                current_value.component(i),
                target_value.component(i),
                target_time,
            )
        })
    }
}

impl CompactSpline<'static> {
    /// Spline from the current state through every node of `target`.
    ///
    /// With `modular` set, each node is reached from the previous value along
    /// its `direction`, and spline values keep accumulating past the range
    /// ends instead of wrapping. Bind the result with
    /// `ModularDirection::Direct` to play those values back as written.
    pub fn create_from_target(
        start_value: f32,
        start_velocity: f32,
        target: &Target1f,
        modular: Option<Range>,
    ) -> Result<Self> {
        let mut start = TargetNode::new(start_value, start_velocity, 0.0, ModularDirection::Direct);
        let mut rest = target.nodes();
        if let Some((first, tail)) = rest.split_first() {
            if first.time <= 0.0 {
                start.value = first.value;
                start.velocity = first.velocity;
                rest = tail;
            }
        }

        let mut points = Vec::with_capacity(rest.len() + 1);
        points.push((start.time, start.value, start.velocity));
        let mut previous = start.value;
        for n in rest {
            let value = match modular {
                Some(range) => previous + range.mod_diff(previous, n.value, n.direction),
                None => n.value,
            };
            points.push((n.time, value, n.velocity));
            previous = value;
        }

        let y_range = Range::covers(points.iter().map(|p| p.1));
        let end_time = points.last().map_or(0.0, |p| p.0);
        let mut spline = Self::create(points.len() * 2)?;
        spline.init(y_range, Self::recommend_x_granularity(end_time))?;
        for (time, value, velocity) in points {
            spline.add_node(time, value, velocity, AddMethod::EnsureCubicWellBehaved)?;
        }
        log::debug!(
            "spline from target: {} nodes over [0, {end_time}], y [{}, {}]",
            spline.num_nodes(),
            y_range.start(),
            y_range.end()
        );
        Ok(spline)
    }
}
