//! Many spline playback cursors advanced together.
//!
//! Each slot follows one borrowed `CompactSpline`. Per frame, a slot moves
//! its x, finds its segment starting from the segment it was in last frame,
//! and rebuilds its cubic only when the segment changed. Values and
//! derivatives are kept in contiguous arrays so a block of slots can be read
//! as one vector.

use crate::compact_spline::{CompactSpline, CompactSplineIndex};
use crate::config::Config;
use crate::curve::{CubicCurve, CubicInit};
use crate::range::{ModularDirection, Range};
use crate::target::VectorConverter;
use serde::{Deserialize, Serialize};

/// How a slot plays its spline.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplinePlayback {
    /// Initial x, and the start of the loop when `repeat` is set.
    pub start_x: f32,
    /// Added to every y after scaling.
    pub y_offset: f32,
    /// Multiplies y and every derivative.
    pub y_scale: f32,
    /// Multiplies the x advance of every frame.
    pub playback_rate: f32,
    /// Loop back to `start_x` after the spline's last node.
    pub repeat: bool,
}

impl Default for SplinePlayback {
    fn default() -> Self {
        Self {
            start_x: 0.0,
            y_offset: 0.0,
            y_scale: 1.0,
            playback_rate: 1.0,
            repeat: false,
        }
    }
}

#[derive(Clone, Debug, Default)]
struct Cursor<'a> {
    spline: Option<&'a CompactSpline<'a>>,
    playback: SplinePlayback,
    x: f32,
    segment: CompactSplineIndex,
    cubic: CubicCurve,
    cubic_start_x: f32,
}

#[derive(Clone, Copy, Debug, Default)]
struct Domain {
    modular: Option<Range>,
    direction: ModularDirection,
}

/// Fixed set of playback slots over borrowed splines.
#[derive(Clone, Debug, Default)]
pub struct BulkSplineEvaluator<'a> {
    cursors: Vec<Cursor<'a>>,
    domains: Vec<Domain>,
    ys: Vec<f32>,
    derivatives: Vec<f32>,
    cubic_rebuilds: u64,
}

impl<'a> BulkSplineEvaluator<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluator with slot storage reserved per `config.initial_indices`.
    pub fn with_config(config: &Config) -> Self {
        let n = config.initial_indices;
        Self {
            cursors: Vec::with_capacity(n),
            domains: Vec::with_capacity(n),
            ys: Vec::with_capacity(n),
            derivatives: Vec::with_capacity(n),
            cubic_rebuilds: 0,
        }
    }

    pub fn num_indices(&self) -> usize {
        self.cursors.len()
    }

    /// Resize to `num_indices` slots. Slots below both the old and new sizes
    /// keep their state; new slots start unbound.
    pub fn set_num_indices(&mut self, num_indices: usize) {
        self.cursors.resize_with(num_indices, Cursor::default);
        self.domains.resize(num_indices, Domain::default());
        self.ys.resize(num_indices, 0.0);
        self.derivatives.resize(num_indices, 0.0);
    }

    /// Bind slots `start..start + splines.len()` to `splines`, reset their x
    /// to `playback.start_x` and seed their segments.
    ///
    /// # Panics
    /// When the slots run past `num_indices()`.
    pub fn set_splines(
        &mut self,
        start: usize,
        splines: &'a [CompactSpline<'a>],
        playback: &SplinePlayback,
    ) {
        self.check_block(start, splines.len());
        for (offset, spline) in splines.iter().enumerate() {
            self.bind(start + offset, spline, playback);
        }
    }

    /// Bind one slot; see `set_splines`.
    pub fn set_spline(
        &mut self,
        index: usize,
        spline: &'a CompactSpline<'a>,
        playback: &SplinePlayback,
    ) {
        self.check_block(index, 1);
        self.bind(index, spline, playback);
    }

    fn bind(&mut self, index: usize, spline: &'a CompactSpline<'a>, playback: &SplinePlayback) {
        let cursor = &mut self.cursors[index];
        cursor.spline = Some(spline);
        cursor.playback = *playback;
        cursor.x = wrap_x(spline, playback, playback.start_x);
        cursor.segment = spline.segment_for_x(cursor.x, 0);
        self.rebuild_cubic(index);
        self.refresh_value(index);
    }

    /// Unbind slots and drop their modular ranges. Their values read as zero.
    pub fn clear_splines(&mut self, start: usize, count: usize) {
        self.check_block(start, count);
        for index in start..start + count {
            self.cursors[index] = Cursor::default();
            self.domains[index] = Domain::default();
            self.ys[index] = 0.0;
            self.derivatives[index] = 0.0;
        }
    }

    /// Treat y values of these slots as modular in `range`, interpolating
    /// each segment along the shortest path. An empty or invalid range, such
    /// as `INVALID_RANGE`, makes the slots plain again.
    pub fn set_y_ranges(&mut self, start: usize, count: usize, range: Range) {
        self.set_y_ranges_with_direction(start, count, range, ModularDirection::Closest);
    }

    /// `set_y_ranges` with an explicit path around the range.
    pub fn set_y_ranges_with_direction(
        &mut self,
        start: usize,
        count: usize,
        range: Range,
        direction: ModularDirection,
    ) {
        self.check_block(start, count);
        for index in start..start + count {
            self.domains[index] = Domain {
                modular: (range.valid() && range.length() > 0.0).then_some(range),
                direction,
            };
            if self.cursors[index].spline.is_some() {
                self.rebuild_cubic(index);
                self.refresh_value(index);
            }
        }
    }

    /// Move every bound slot forward by `delta_x` times its playback rate.
    pub fn advance_frame(&mut self, delta_x: f32) {
        for index in 0..self.cursors.len() {
            let cursor = &mut self.cursors[index];
            let Some(spline) = cursor.spline else {
                continue;
            };
            let step = delta_x * cursor.playback.playback_rate;
            if step == 0.0 {
                continue;
            }
            cursor.x = wrap_x(spline, &cursor.playback, cursor.x + step);
            self.seek(index);
        }
    }

    /// Jump slot `index` to `x`.
    pub fn set_x(&mut self, index: usize, x: f32) {
        let cursor = &mut self.cursors[index];
        let Some(spline) = cursor.spline else {
            return;
        };
        cursor.x = wrap_x(spline, &cursor.playback, x);
        self.seek(index);
    }

    pub fn set_playback_rate(&mut self, index: usize, playback_rate: f32) {
        self.cursors[index].playback.playback_rate = playback_rate;
    }

    fn seek(&mut self, index: usize) {
        let cursor = &mut self.cursors[index];
        let Some(spline) = cursor.spline else {
            return;
        };
        let segment = spline.segment_for_x(cursor.x, cursor.segment);
        if segment != cursor.segment {
            log::trace!("slot {index}: segment {} -> {segment}", cursor.segment);
            cursor.segment = segment;
            self.rebuild_cubic(index);
        }
        self.refresh_value(index);
    }

    fn rebuild_cubic(&mut self, index: usize) {
        let cursor = &mut self.cursors[index];
        let Some(spline) = cursor.spline else {
            return;
        };
        let domain = self.domains[index];
        let mut cubic = match domain.modular {
            Some(range) if spline.num_nodes() >= 2 => {
                let init = spline.cubic_init_at(cursor.segment);
                let start_y = range.normalize_wild_value(init.start_y);
                let end_y = start_y + range.mod_diff(init.start_y, init.end_y, domain.direction);
                CubicCurve::new(&CubicInit {
                    start_y,
                    end_y,
                    ..init
                })
            }
            Some(range) => {
                let mut cubic = spline.segment_cubic(cursor.segment);
                cubic.set_coeff(0, range.normalize_wild_value(cubic.coeff(0)));
                cubic
            }
            None => spline.segment_cubic(cursor.segment),
        };
        cubic.scale_up(cursor.playback.y_scale);
        cubic.shift_up(cursor.playback.y_offset);
        cursor.cubic = cubic;
        cursor.cubic_start_x = if spline.is_empty() {
            spline.start_x()
        } else {
            spline.node_x(cursor.segment)
        };
        self.cubic_rebuilds += 1;
    }

    fn refresh_value(&mut self, index: usize) {
        let cursor = &self.cursors[index];
        let cubic_x = cursor.x - cursor.cubic_start_x;
        let y = cursor.cubic.evaluate(cubic_x);
        self.ys[index] = match self.domains[index].modular {
            Some(range) => range.normalize_wild_value(y),
            None => y,
        };
        self.derivatives[index] = cursor.cubic.derivative(cubic_x);
    }

    fn check_block(&self, start: usize, count: usize) {
        assert!(
            start + count <= self.cursors.len(),
            "slots {start}..{} out of {}",
            start + count,
            self.cursors.len()
        );
    }

    pub fn x(&self, index: usize) -> f32 {
        self.cursors[index].x
    }

    pub fn y(&self, index: usize) -> f32 {
        self.ys[index]
    }

    pub fn derivative(&self, index: usize) -> f32 {
        self.derivatives[index]
    }

    /// Cubic of the current segment, with y scale and offset applied.
    pub fn cubic(&self, index: usize) -> &CubicCurve {
        &self.cursors[index].cubic
    }

    /// X relative to the start of the current cubic.
    pub fn cubic_x(&self, index: usize) -> f32 {
        let cursor = &self.cursors[index];
        cursor.x - cursor.cubic_start_x
    }

    pub fn source_spline(&self, index: usize) -> Option<&'a CompactSpline<'a>> {
        self.cursors[index].spline
    }

    pub fn playback(&self, index: usize) -> &SplinePlayback {
        &self.cursors[index].playback
    }

    /// Values of `count` consecutive slots.
    pub fn ys(&self, start: usize, count: usize) -> &[f32] {
        &self.ys[start..start + count]
    }

    /// Derivatives of `count` consecutive slots.
    pub fn derivatives(&self, start: usize, count: usize) -> &[f32] {
        &self.derivatives[start..start + count]
    }

    /// `D` consecutive slot values as an external vector type.
    pub fn vector_value<V: VectorConverter<D>, const D: usize>(&self, start: usize) -> V {
        let mut values = [0.0; D];
        values.copy_from_slice(self.ys(start, D));
        V::from_floats(values)
    }

    /// `D` consecutive slot derivatives as an external vector type.
    pub fn vector_derivative<V: VectorConverter<D>, const D: usize>(&self, start: usize) -> V {
        let mut values = [0.0; D];
        values.copy_from_slice(self.derivatives(start, D));
        V::from_floats(values)
    }

    pub fn end_x(&self, index: usize) -> f32 {
        self.cursors[index].spline.map_or(0.0, |s| s.end_x())
    }

    /// Distance left to the last node. Zero when unbound.
    pub fn x_remaining(&self, index: usize) -> f32 {
        let cursor = &self.cursors[index];
        cursor.spline.map_or(0.0, |s| s.end_x() - cursor.x)
    }

    pub fn is_valid(&self, index: usize) -> bool {
        self.cursors[index].spline.is_some()
    }

    /// True when slot `index` has played past its last node and will not
    /// loop. Unbound slots are finished.
    pub fn is_finished(&self, index: usize) -> bool {
        let cursor = &self.cursors[index];
        match cursor.spline {
            Some(spline) => !cursor.playback.repeat && cursor.x >= spline.end_x(),
            None => true,
        }
    }

    /// Number of times any slot has rebuilt its cubic.
    pub fn num_cubic_rebuilds(&self) -> u64 {
        self.cubic_rebuilds
    }
}

/// Fold `x` back into `[start_x, end_x]` for repeating playback.
fn wrap_x(spline: &CompactSpline<'_>, playback: &SplinePlayback, x: f32) -> f32 {
    if !playback.repeat {
        return x;
    }
    let loop_start = playback.start_x;
    let end_x = spline.end_x();
    let length = end_x - loop_start;
    if length <= 0.0 || (loop_start..=end_x).contains(&x) {
        return x;
    }
    loop_start + (x - loop_start).rem_euclid(length)
}
