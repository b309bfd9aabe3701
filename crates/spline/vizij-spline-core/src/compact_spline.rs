//! Compact, fixed-capacity splines.
//!
//! A spline is a header plus an array of quantized nodes, serialized into a
//! single byte buffer of exactly [`CompactSpline::size`] bytes:
//!
//! ```text
//! offset  size  field
//!      0     4  y_range.start   (f32, little-endian)
//!      4     4  y_range.end     (f32)
//!      8     4  x_granularity   (f32)
//!     12     2  num_nodes       (u16)
//!     14     2  max_nodes       (u16)
//!     16   6*n  nodes           (x: u16, y: u16, angle: i16)
//! ```
//!
//! The buffer is either owned by the spline or borrowed from the caller, so
//! splines can live in caller-managed memory. Nothing is ever written past
//! `size(max_nodes)`.

use crate::bulk_evaluator::{BulkSplineEvaluator, SplinePlayback};
use crate::config::Config;
use crate::curve::{CubicCurve, CubicInit, CurveValueType};
use crate::dual_cubic::calculate_dual_cubic_mid_node;
use crate::error::SplineError;
use crate::quantize::{self, CompactSplineNode, XGrain, MAX_X_GRAIN};
use crate::range::Range;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};

/// Index of a node or segment within a spline.
pub type CompactSplineIndex = u16;

/// Capacity of splines created with `CompactSpline::new`.
pub const DEFAULT_MAX_NODES: CompactSplineIndex = 7;

/// Guess that never matches, forcing a binary search.
pub const NO_GUESS: CompactSplineIndex = CompactSplineIndex::MAX;

const HEADER_SIZE: usize = 16;
const OFFSET_Y_START: usize = 0;
const OFFSET_Y_END: usize = 4;
const OFFSET_GRANULARITY: usize = 8;
const OFFSET_NUM_NODES: usize = 12;
const OFFSET_MAX_NODES: usize = 14;

/// Plain node used to describe a spline before quantization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UncompressedNode {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub derivative: f32,
}

impl UncompressedNode {
    pub const fn new(x: f32, y: f32, derivative: f32) -> Self {
        Self { x, y, derivative }
    }
}

/// Result of [`CompactSpline::index_for_x`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SegmentIndex {
    /// X is before the first node.
    Before,
    /// X lies in the segment starting at this node.
    Within(CompactSplineIndex),
    /// X is past the last node.
    After,
}

impl SegmentIndex {
    /// The segment index, if X is inside the spline.
    pub fn within(self) -> Option<CompactSplineIndex> {
        match self {
            SegmentIndex::Within(i) => Some(i),
            _ => None,
        }
    }
}

/// What `add_node` may do to keep the curve between its node values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddMethod {
    /// Store exactly the node given.
    AddWithoutModification,
    /// Insert a mid node first when the segment's cubic would change
    /// curvature and so swing past its end values.
    #[default]
    EnsureCubicWellBehaved,
}

#[derive(Debug)]
enum SplineBuffer<'a> {
    Owned(Box<[u8]>),
    Borrowed(&'a mut [u8]),
}

impl Deref for SplineBuffer<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            SplineBuffer::Owned(bytes) => bytes,
            SplineBuffer::Borrowed(bytes) => bytes,
        }
    }
}

impl DerefMut for SplineBuffer<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        match self {
            SplineBuffer::Owned(bytes) => bytes,
            SplineBuffer::Borrowed(bytes) => bytes,
        }
    }
}

/// Spline of quantized nodes with a fixed capacity.
///
/// `'a` is the lifetime of a caller-provided buffer; splines that own their
/// memory are `CompactSpline<'static>`.
#[derive(Debug)]
pub struct CompactSpline<'a> {
    y_range: Range,
    x_granularity: f32,
    num_nodes: CompactSplineIndex,
    max_nodes: CompactSplineIndex,
    buffer: SplineBuffer<'a>,
}

impl Clone for CompactSpline<'_> {
    /// The copy always owns its memory.
    fn clone(&self) -> Self {
        Self {
            y_range: self.y_range,
            x_granularity: self.x_granularity,
            num_nodes: self.num_nodes,
            max_nodes: self.max_nodes,
            buffer: SplineBuffer::Owned(self.buffer.to_vec().into_boxed_slice()),
        }
    }
}

impl Default for CompactSpline<'static> {
    fn default() -> Self {
        Self::new()
    }
}

fn checked_capacity(max_nodes: usize) -> Result<CompactSplineIndex> {
    CompactSplineIndex::try_from(max_nodes).map_err(|_| SplineError::InvalidCapacity { max_nodes })
}

fn read_f32(bytes: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

impl CompactSpline<'static> {
    /// Empty spline with `DEFAULT_MAX_NODES` capacity. Call `init` before
    /// adding nodes.
    pub fn new() -> Self {
        Self::with_max_nodes(DEFAULT_MAX_NODES)
    }

    /// Empty spline with the capacity from `config`.
    pub fn with_config(config: &Config) -> Self {
        Self::with_max_nodes(config.default_max_nodes)
    }

    /// Empty spline that owns room for `max_nodes` nodes.
    pub fn create(max_nodes: usize) -> Result<Self> {
        Ok(Self::with_max_nodes(checked_capacity(max_nodes)?))
    }

    fn with_max_nodes(max_nodes: CompactSplineIndex) -> Self {
        let bytes = vec![0u8; Self::size(max_nodes as usize)].into_boxed_slice();
        Self::format(SplineBuffer::Owned(bytes), max_nodes)
    }

    /// Owned spline through `nodes`, added without modification. The y range
    /// is the tightest range holding every node and the granularity is the
    /// finest that can reach the last node.
    pub fn create_from_nodes(nodes: &[UncompressedNode]) -> Result<Self> {
        let mut spline = Self::create(nodes.len())?;
        spline.fill_from_nodes(nodes)?;
        Ok(spline)
    }

    /// Owned spline resampled from `source` at `max_nodes` evenly spaced x
    /// values.
    pub fn create_from_spline(source: &CompactSpline<'_>, max_nodes: usize) -> Result<Self> {
        let nodes = Self::resample(source, max_nodes)?;
        Self::create_from_nodes(&nodes)
    }
}

impl<'a> CompactSpline<'a> {
    /// Exact number of bytes a spline with `max_nodes` capacity occupies.
    pub const fn size(max_nodes: usize) -> usize {
        HEADER_SIZE + max_nodes * CompactSplineNode::SIZE
    }

    /// Empty spline living in `buffer`. Only the first `size(max_nodes)`
    /// bytes are used.
    pub fn create_in_place(max_nodes: usize, buffer: &'a mut [u8]) -> Result<Self> {
        let max = checked_capacity(max_nodes)?;
        let required = Self::size(max_nodes);
        if buffer.len() < required {
            return Err(SplineError::BufferTooSmall {
                required,
                available: buffer.len(),
            });
        }
        let (bytes, _) = buffer.split_at_mut(required);
        Ok(Self::format(SplineBuffer::Borrowed(bytes), max))
    }

    /// In-place counterpart of `create_from_nodes`.
    pub fn create_from_nodes_in_place(
        nodes: &[UncompressedNode],
        buffer: &'a mut [u8],
    ) -> Result<Self> {
        let mut spline = Self::create_in_place(nodes.len(), buffer)?;
        spline.fill_from_nodes(nodes)?;
        Ok(spline)
    }

    /// In-place counterpart of `create_from_spline`.
    pub fn create_from_spline_in_place(
        source: &CompactSpline<'_>,
        max_nodes: usize,
        buffer: &'a mut [u8],
    ) -> Result<Self> {
        let nodes = Self::resample(source, max_nodes)?;
        Self::create_from_nodes_in_place(&nodes, buffer)
    }

    /// Reattach to a spline previously built in `buffer`.
    pub fn open_in_place(buffer: &'a mut [u8]) -> Result<Self> {
        if buffer.len() < HEADER_SIZE {
            return Err(SplineError::BufferTooSmall {
                required: HEADER_SIZE,
                available: buffer.len(),
            });
        }
        let y_range = Range::new(
            read_f32(buffer, OFFSET_Y_START),
            read_f32(buffer, OFFSET_Y_END),
        );
        let x_granularity = read_f32(buffer, OFFSET_GRANULARITY);
        let num_nodes = read_u16(buffer, OFFSET_NUM_NODES);
        let max_nodes = read_u16(buffer, OFFSET_MAX_NODES);

        let required = Self::size(max_nodes as usize);
        if buffer.len() < required {
            return Err(SplineError::BufferTooSmall {
                required,
                available: buffer.len(),
            });
        }
        let corrupt = |reason: String| SplineError::CorruptBuffer { reason };
        if num_nodes > max_nodes {
            return Err(corrupt(format!(
                "{num_nodes} nodes exceed capacity {max_nodes}"
            )));
        }
        if !(x_granularity.is_finite() && x_granularity > 0.0) {
            return Err(corrupt(format!("x granularity {x_granularity}")));
        }
        if !(y_range.start().is_finite() && y_range.end().is_finite() && y_range.valid()) {
            return Err(corrupt(format!(
                "y range [{}, {}]",
                y_range.start(),
                y_range.end()
            )));
        }

        let (bytes, _) = buffer.split_at_mut(required);
        let spline = Self {
            y_range,
            x_granularity,
            num_nodes,
            max_nodes,
            buffer: SplineBuffer::Borrowed(bytes),
        };
        for i in 1..num_nodes {
            if spline.node(i).x <= spline.node(i - 1).x {
                return Err(corrupt(format!("node {i} does not increase in x")));
            }
        }
        Ok(spline)
    }

    fn format(buffer: SplineBuffer<'a>, max_nodes: CompactSplineIndex) -> Self {
        let mut spline = Self {
            y_range: Range::point(0.0),
            x_granularity: 1.0,
            num_nodes: 0,
            max_nodes,
            buffer,
        };
        spline.write_header();
        spline
    }

    /// Release the spline. A borrowed buffer keeps its bytes, so it can be
    /// reopened with `open_in_place`.
    pub fn destroy(self) {}

    /// Reset to zero nodes with new quantization parameters.
    pub fn init(&mut self, y_range: Range, x_granularity: f32) -> Result<()> {
        if !(x_granularity.is_finite() && x_granularity > 0.0) {
            return Err(SplineError::InvalidGranularity {
                granularity: x_granularity,
            });
        }
        if !(y_range.start().is_finite() && y_range.end().is_finite() && y_range.valid()) {
            return Err(SplineError::InvalidRange {
                start: y_range.start(),
                end: y_range.end(),
            });
        }
        self.y_range = y_range;
        self.x_granularity = x_granularity;
        self.num_nodes = 0;
        self.write_header();
        Ok(())
    }

    /// Append a node. `x` must quantize to a grain past the last node's.
    pub fn add_node(&mut self, x: f32, y: f32, derivative: f32, method: AddMethod) -> Result<()> {
        let grain = self.checked_grain(x)?;
        if self.num_nodes >= self.max_nodes {
            return Err(SplineError::CapacityExceeded {
                max_nodes: self.max_nodes,
            });
        }

        let y = if self.y_range.contains(y) {
            y
        } else {
            let clamped = self.y_range.clamp(y);
            log::warn!(
                "node y {y} outside [{}, {}]; clamped to {clamped}",
                self.y_range.start(),
                self.y_range.end()
            );
            clamped
        };

        if method == AddMethod::EnsureCubicWellBehaved && self.num_nodes > 0 {
            self.insert_mid_node_if_needed(grain, y, derivative);
        }

        let node = CompactSplineNode {
            x: grain,
            y: quantize::quantize_y(y, &self.y_range),
            angle: quantize::quantize_derivative(derivative),
        };
        self.push_node(node);
        Ok(())
    }

    /// `add_node` for each of `nodes`, in order.
    pub fn add_uncompressed_nodes(
        &mut self,
        nodes: &[UncompressedNode],
        method: AddMethod,
    ) -> Result<()> {
        for n in nodes {
            self.add_node(n.x, n.y, n.derivative, method)?;
        }
        Ok(())
    }

    fn checked_grain(&self, x: f32) -> Result<XGrain> {
        let grain =
            quantize::quantize_x(x, self.x_granularity).ok_or(SplineError::XOutOfRange {
                x,
                max_x: quantize::dequantize_x(MAX_X_GRAIN, self.x_granularity),
            })?;
        if let Some(last) = self.last_node() {
            if grain <= last.x {
                return Err(SplineError::NonIncreasingX {
                    x,
                    previous_x: last.x(self.x_granularity),
                });
            }
        }
        Ok(grain)
    }

    fn insert_mid_node_if_needed(&mut self, grain: XGrain, y: f32, derivative: f32) {
        let Some(last) = self.last_node() else {
            return;
        };
        let start_x = last.x(self.x_granularity);
        let init = CubicInit::new(
            last.y(&self.y_range),
            last.derivative(),
            y,
            derivative,
            quantize::dequantize_x(grain, self.x_granularity) - start_x,
        );
        let Some(mid) = calculate_dual_cubic_mid_node(&init) else {
            return;
        };
        let mid_grain = match quantize::quantize_x(start_x + mid.x, self.x_granularity) {
            Some(g) if g > last.x && g < grain => g,
            _ => return,
        };
        if usize::from(self.num_nodes) + 2 > usize::from(self.max_nodes) {
            log::warn!(
                "no room for a mid node at x {}; segment may overshoot",
                start_x + mid.x
            );
            return;
        }
        self.push_node(CompactSplineNode {
            x: mid_grain,
            y: quantize::quantize_y(mid.y, &self.y_range),
            angle: quantize::quantize_derivative(mid.derivative),
        });
    }

    fn fill_from_nodes(&mut self, nodes: &[UncompressedNode]) -> Result<()> {
        let last = nodes.last().ok_or(SplineError::EmptyNodes)?;
        let y_range = Range::covers(nodes.iter().map(|n| n.y));
        self.init(y_range, Self::recommend_x_granularity(last.x))?;
        self.add_uncompressed_nodes(nodes, AddMethod::AddWithoutModification)?;
        log::debug!(
            "spline from {} nodes: x [0, {}], y [{}, {}]",
            nodes.len(),
            last.x,
            y_range.start(),
            y_range.end()
        );
        Ok(())
    }

    fn resample(source: &CompactSpline<'_>, max_nodes: usize) -> Result<Vec<UncompressedNode>> {
        if source.is_empty() {
            return Err(SplineError::EmptyNodes);
        }
        if max_nodes < 2 {
            return Err(SplineError::InvalidCapacity { max_nodes });
        }
        let start_x = source.start_x();
        let end_x = source.end_x();
        let width = end_x - start_x;
        let last = max_nodes - 1;
        let count = if width > 0.0 { max_nodes } else { 1 };

        let mut guess = 0;
        let nodes: Vec<UncompressedNode> = (0..count)
            .map(|i| {
                let x = if i == last {
                    end_x
                } else {
                    start_x + width * i as f32 / last as f32
                };
                guess = source.segment_for_x(x, guess);
                let cubic = source.segment_cubic(guess);
                let cubic_x = x - source.node_x(guess);
                UncompressedNode::new(x, cubic.evaluate(cubic_x), cubic.derivative(cubic_x))
            })
            .collect();
        log::debug!(
            "resampled {} nodes into {count} over x [{start_x}, {end_x}]",
            source.num_nodes()
        );
        Ok(nodes)
    }

    /// Finest granularity whose largest grain still reaches `max_x`.
    pub fn recommend_x_granularity(max_x: f32) -> f32 {
        if max_x > 0.0 && max_x.is_finite() {
            max_x / MAX_X_GRAIN as f32
        } else {
            1.0
        }
    }

    fn push_node(&mut self, node: CompactSplineNode) {
        let offset = HEADER_SIZE + self.num_nodes as usize * CompactSplineNode::SIZE;
        node.write_to(&mut self.buffer[offset..offset + CompactSplineNode::SIZE]);
        self.num_nodes += 1;
        let num = self.num_nodes.to_le_bytes();
        self.buffer[OFFSET_NUM_NODES..OFFSET_NUM_NODES + 2].copy_from_slice(&num);
    }

    fn write_header(&mut self) {
        let bytes = &mut self.buffer;
        bytes[OFFSET_Y_START..OFFSET_Y_START + 4]
            .copy_from_slice(&self.y_range.start().to_le_bytes());
        bytes[OFFSET_Y_END..OFFSET_Y_END + 4].copy_from_slice(&self.y_range.end().to_le_bytes());
        bytes[OFFSET_GRANULARITY..OFFSET_GRANULARITY + 4]
            .copy_from_slice(&self.x_granularity.to_le_bytes());
        bytes[OFFSET_NUM_NODES..OFFSET_NUM_NODES + 2]
            .copy_from_slice(&self.num_nodes.to_le_bytes());
        bytes[OFFSET_MAX_NODES..OFFSET_MAX_NODES + 2]
            .copy_from_slice(&self.max_nodes.to_le_bytes());
    }

    /// The serialized spline: exactly `size(max_nodes)` bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// True when the spline lives in a caller-provided buffer.
    pub fn is_in_place(&self) -> bool {
        matches!(self.buffer, SplineBuffer::Borrowed(_))
    }

    /// Raw quantized node.
    ///
    /// # Panics
    /// When `index >= num_nodes()`.
    pub fn node(&self, index: CompactSplineIndex) -> CompactSplineNode {
        assert!(
            index < self.num_nodes,
            "node {index} out of {} nodes",
            self.num_nodes
        );
        let offset = HEADER_SIZE + index as usize * CompactSplineNode::SIZE;
        CompactSplineNode::read_from(&self.buffer[offset..offset + CompactSplineNode::SIZE])
    }

    fn last_node(&self) -> Option<CompactSplineNode> {
        self.num_nodes.checked_sub(1).map(|i| self.node(i))
    }

    fn grain(&self, index: CompactSplineIndex) -> f32 {
        self.node(index).x as f32
    }

    pub fn node_x(&self, index: CompactSplineIndex) -> f32 {
        self.node(index).x(self.x_granularity)
    }

    pub fn node_y(&self, index: CompactSplineIndex) -> f32 {
        self.node(index).y(&self.y_range)
    }

    pub fn node_derivative(&self, index: CompactSplineIndex) -> f32 {
        self.node(index).derivative()
    }

    /// The dequantized node.
    pub fn uncompressed_node(&self, index: CompactSplineIndex) -> UncompressedNode {
        UncompressedNode::new(
            self.node_x(index),
            self.node_y(index),
            self.node_derivative(index),
        )
    }

    pub fn start_x(&self) -> f32 {
        if self.is_empty() {
            0.0
        } else {
            self.node_x(0)
        }
    }

    pub fn end_x(&self) -> f32 {
        self.last_node().map_or(0.0, |n| n.x(self.x_granularity))
    }

    pub fn start_y(&self) -> f32 {
        if self.is_empty() {
            0.0
        } else {
            self.node_y(0)
        }
    }

    pub fn end_y(&self) -> f32 {
        self.last_node().map_or(0.0, |n| n.y(&self.y_range))
    }

    pub fn start_derivative(&self) -> f32 {
        if self.is_empty() {
            0.0
        } else {
            self.node_derivative(0)
        }
    }

    pub fn end_derivative(&self) -> f32 {
        self.last_node().map_or(0.0, |n| n.derivative())
    }

    pub fn range_x(&self) -> Range {
        Range::new(self.start_x(), self.end_x())
    }

    pub fn range_y(&self) -> Range {
        self.y_range
    }

    pub fn length_x(&self) -> f32 {
        self.end_x() - self.start_x()
    }

    pub fn x_granularity(&self) -> f32 {
        self.x_granularity
    }

    pub fn num_nodes(&self) -> CompactSplineIndex {
        self.num_nodes
    }

    pub fn max_nodes(&self) -> CompactSplineIndex {
        self.max_nodes
    }

    pub fn is_empty(&self) -> bool {
        self.num_nodes == 0
    }

    pub fn last_node_index(&self) -> CompactSplineIndex {
        self.num_nodes.saturating_sub(1)
    }

    /// Index of the final segment. Zero for splines with fewer than two
    /// nodes.
    pub fn last_segment_index(&self) -> CompactSplineIndex {
        self.num_nodes.saturating_sub(2)
    }

    /// Segment containing `x`, or a sentinel when `x` is outside the spline.
    ///
    /// `x` is rounded to the nearest grain first, so values within half a
    /// granularity of a node count as on the node. A grain exactly on the
    /// last node maps to the last segment. The segments at `guess` and
    /// `guess + 1` are tried before falling back to a binary search.
    pub fn index_for_x(&self, x: f32, guess: CompactSplineIndex) -> SegmentIndex {
        let Some(last) = self.num_nodes.checked_sub(1) else {
            return SegmentIndex::Before;
        };
        let grain = (x / self.x_granularity).round();
        if grain < self.grain(0) {
            return SegmentIndex::Before;
        }
        let last_grain = self.grain(last);
        if grain > last_grain {
            return SegmentIndex::After;
        }
        if grain == last_grain {
            return SegmentIndex::Within(self.last_segment_index());
        }

        // Here `grain(0) <= grain < grain(last)`, so one of segments
        // 0..last contains it.
        let contains = |i: CompactSplineIndex| {
            i < last && self.grain(i) <= grain && grain < self.grain(i + 1)
        };
        if contains(guess) {
            return SegmentIndex::Within(guess);
        }
        if let Some(next) = guess.checked_add(1) {
            if contains(next) {
                return SegmentIndex::Within(next);
            }
        }

        let mut lo: CompactSplineIndex = 0;
        let mut hi = last;
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            if self.grain(mid) <= grain {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        SegmentIndex::Within(lo)
    }

    /// Like `index_for_x`, but clamps the sentinels to the first and last
    /// segments, whose cubics are extrapolated outside the spline.
    pub fn segment_for_x(&self, x: f32, guess: CompactSplineIndex) -> CompactSplineIndex {
        match self.index_for_x(x, guess) {
            SegmentIndex::Before => 0,
            SegmentIndex::Within(i) => i,
            SegmentIndex::After => self.last_segment_index(),
        }
    }

    /// Hermite data for the segment starting at node `index`.
    ///
    /// # Panics
    /// When `index + 1 >= num_nodes()`.
    pub fn cubic_init_at(&self, index: CompactSplineIndex) -> CubicInit {
        let start = self.node(index);
        let end = self.node(index + 1);
        CubicInit::new(
            start.y(&self.y_range),
            start.derivative(),
            end.y(&self.y_range),
            end.derivative(),
            quantize::dequantize_x(end.x - start.x, self.x_granularity),
        )
    }

    /// Cubic for the segment starting at node `index`, with x = 0 at that
    /// node. A single-node spline yields the line through its node.
    pub fn segment_cubic(&self, index: CompactSplineIndex) -> CubicCurve {
        match self.num_nodes {
            0 => CubicCurve::default(),
            1 => CubicCurve::from_coeffs(0.0, 0.0, self.node_derivative(0), self.node_y(0)),
            _ => CubicCurve::new(&self.cubic_init_at(index)),
        }
    }

    /// Reference evaluation of `value_type` at `x`, through a fresh search.
    pub fn calculated_slowly(&self, x: f32, value_type: CurveValueType) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let index = self.segment_for_x(x, NO_GUESS);
        self.segment_cubic(index)
            .value(x - self.node_x(index), value_type)
    }

    pub fn y_calculated_slowly(&self, x: f32) -> f32 {
        self.calculated_slowly(x, CurveValueType::Value)
    }

    /// Sample this spline alone; see `bulk_ys`.
    pub fn ys(
        &self,
        start_x: f32,
        delta_x: f32,
        num_ys: usize,
        ys: &mut [f32],
        derivatives: Option<&mut [f32]>,
    ) {
        Self::bulk_ys(
            std::slice::from_ref(self),
            start_x,
            delta_x,
            num_ys,
            ys,
            derivatives,
        );
    }

    /// Sample `num_ys` evenly spaced x values from every spline in `splines`.
    ///
    /// Output is interleaved: sample `j` of spline `s` lands at
    /// `ys[j * splines.len() + s]`.
    ///
    /// # Panics
    /// When an output slice holds fewer than `num_ys * splines.len()` values.
    pub fn bulk_ys(
        splines: &[CompactSpline<'_>],
        start_x: f32,
        delta_x: f32,
        num_ys: usize,
        ys: &mut [f32],
        mut derivatives: Option<&mut [f32]>,
    ) {
        let stride = splines.len();
        let required = num_ys * stride;
        assert!(ys.len() >= required, "ys holds {} of {required}", ys.len());
        if let Some(d) = derivatives.as_deref() {
            assert!(
                d.len() >= required,
                "derivatives hold {} of {required}",
                d.len()
            );
        }

        let mut evaluator = Self::sampling_evaluator(splines, start_x);
        for j in 0..num_ys {
            let row = j * stride;
            ys[row..row + stride].copy_from_slice(evaluator.ys(0, stride));
            if let Some(d) = derivatives.as_deref_mut() {
                d[row..row + stride].copy_from_slice(evaluator.derivatives(0, stride));
            }
            evaluator.advance_frame(delta_x);
        }
    }

    /// `bulk_ys` for `D` parallel splines, one `[f32; D]` per sample.
    ///
    /// # Panics
    /// When `ys` holds fewer than `num_ys` samples.
    pub fn bulk_ys_packed<const D: usize>(
        splines: &[CompactSpline<'_>; D],
        start_x: f32,
        delta_x: f32,
        num_ys: usize,
        ys: &mut [[f32; D]],
    ) {
        assert!(ys.len() >= num_ys, "ys holds {} of {num_ys}", ys.len());
        let mut evaluator = Self::sampling_evaluator(&splines[..], start_x);
        for sample in ys.iter_mut().take(num_ys) {
            sample.copy_from_slice(evaluator.ys(0, D));
            evaluator.advance_frame(delta_x);
        }
    }

    fn sampling_evaluator<'s>(
        splines: &'s [CompactSpline<'s>],
        start_x: f32,
    ) -> BulkSplineEvaluator<'s> {
        let mut evaluator = BulkSplineEvaluator::new();
        evaluator.set_num_indices(splines.len());
        let playback = SplinePlayback {
            start_x,
            ..SplinePlayback::default()
        };
        evaluator.set_splines(0, splines, &playback);
        evaluator
    }
}
