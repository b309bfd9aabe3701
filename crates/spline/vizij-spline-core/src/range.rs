//! Closed intervals on the number line.
//!
//! `Range` is used for spline value ranges (quantization bounds), spline
//! x-extents, and modular value ranges (e.g. angles in `(-pi, pi]`). The
//! modular helpers treat a range as the half-open interval `(start, end]`.

use core::f32::consts::PI;
use serde::{Deserialize, Serialize};

/// In modular arithmetic there are two paths from one value to another: the
/// direct one and the one that wraps around. This selects between them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModularDirection {
    /// Shortest path, whichever way it goes.
    #[default]
    Closest,
    /// Longest path, whichever way it goes.
    Farthest,
    /// Path that increases the value.
    Positive,
    /// Path that decreases the value.
    Negative,
    /// Plain subtraction, no wrapping.
    Direct,
}

/// Interval `[start, end]`. Valid when `start <= end`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Range {
    start: f32,
    end: f32,
}

/// Normalized range for angles in radians.
pub const ANGLE_RANGE: Range = Range::new(-PI, PI);

/// A range that contains nothing. Used as "not modular" by callers that store
/// a plain `Range`.
pub const INVALID_RANGE: Range = Range::new(1.0, 0.0);

impl Range {
    pub const fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }

    /// Range containing exactly one value.
    pub const fn point(x: f32) -> Self {
        Self { start: x, end: x }
    }

    /// Range with the lower of `a` and `b` as start.
    pub fn create_valid(a: f32, b: f32) -> Self {
        Self::new(a.min(b), a.max(b))
    }

    /// The most empty range possible; `include()` on it yields a point.
    pub const fn empty() -> Self {
        Self::new(f32::INFINITY, f32::NEG_INFINITY)
    }

    /// Smallest range covering every value of `values`.
    /// Returns `Range::empty()` for an empty iterator.
    pub fn covers<I: IntoIterator<Item = f32>>(values: I) -> Self {
        values
            .into_iter()
            .fold(Self::empty(), |range, x| range.include(x))
    }

    #[inline]
    pub fn start(&self) -> f32 {
        self.start
    }

    #[inline]
    pub fn end(&self) -> f32 {
        self.end
    }

    /// True when the range contains at least one number.
    #[inline]
    pub fn valid(&self) -> bool {
        self.start <= self.end
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.end - self.start
    }

    #[inline]
    pub fn middle(&self) -> f32 {
        0.5 * (self.start + self.end)
    }

    #[inline]
    pub fn clamp(&self, x: f32) -> f32 {
        x.max(self.start).min(self.end)
    }

    /// `percent` of 0 returns start, 1 returns end. Not clamped.
    #[inline]
    pub fn lerp(&self, percent: f32) -> f32 {
        self.start + (self.end - self.start) * percent
    }

    /// Inverse of `lerp`. Not clamped.
    #[inline]
    pub fn percent(&self, x: f32) -> f32 {
        (x - self.start) / self.length()
    }

    /// Inclusive on both ends.
    #[inline]
    pub fn contains(&self, x: f32) -> bool {
        self.start <= x && x <= self.end
    }

    /// `(start, end]`
    #[inline]
    pub fn contains_excluding_start(&self, x: f32) -> bool {
        self.start < x && x <= self.end
    }

    /// Distance from `x` to the range; zero when inside.
    #[inline]
    pub fn distance_from(&self, x: f32) -> f32 {
        (x - self.clamp(x)).abs()
    }

    /// Range `percent` longer, grown equally on both sides.
    pub fn lengthen(&self, percent: f32) -> Self {
        let extra = self.length() * percent * 0.5;
        Self::new(self.start - extra, self.end + extra)
    }

    /// Smallest range containing both `self` and `x`.
    pub fn include(&self, x: f32) -> Self {
        Self::new(self.start.min(x), self.end.max(x))
    }

    pub fn intersect(a: &Range, b: &Range) -> Range {
        Range::new(a.start.max(b.start), a.end.min(b.end))
    }

    pub fn union(a: &Range, b: &Range) -> Range {
        Range::new(a.start.min(b.start), a.end.max(b.end))
    }

    /// `length()` if `x` is at or below start, `-length()` if above end, else 0.
    #[inline]
    pub fn modular_adjustment(&self, x: f32) -> f32 {
        if x <= self.start {
            self.length()
        } else if x > self.end {
            -self.length()
        } else {
            0.0
        }
    }

    /// Bring `x` into `(start, end]` with one adjustment.
    /// `x` must already be within one length of the range.
    #[inline]
    pub fn normalize(&self, x: f32) -> f32 {
        let normalized = x + self.modular_adjustment(x);
        debug_assert!(
            self.contains_excluding_start(normalized),
            "{x} is more than one length outside [{}, {}]",
            self.start,
            self.end
        );
        normalized
    }

    /// Bring `x` into `(start, end]` by repeated adjustment. Falls back to
    /// `normalize_wild_value` if `x` is many lengths away.
    pub fn normalize_close_value(&self, mut x: f32) -> f32 {
        const MAX_ADJUSTMENTS: usize = 4;

        let below = x <= self.start;
        let above = x > self.end;
        if !below && !above {
            return x;
        }

        let length = self.length();
        for _ in 0..MAX_ADJUSTMENTS {
            x += if below { length } else { -length };
            if self.contains_excluding_start(x) {
                return x;
            }
        }
        self.normalize_wild_value(x)
    }

    /// Bring any `x` into `(start, end]`.
    pub fn normalize_wild_value(&self, x: f32) -> f32 {
        let length = self.length();
        if length <= 0.0 {
            return self.start;
        }
        let whole_units = ((x - self.start) / length).floor();
        let close = x - whole_units * length;
        // Float error can leave `close` on the wrong side of a bound.
        let normalized = close + self.modular_adjustment(close);
        normalized.max(self.start).min(self.end)
    }

    /// Shortest signed difference from `a` to `b`, in `(-length/2, length/2]`.
    pub fn mod_diff_close(&self, a: f32, b: f32) -> f32 {
        let length = self.length();
        if length <= 0.0 {
            return b - a;
        }
        let half = 0.5 * length;
        let diff = (b - a).rem_euclid(length);
        if diff > half {
            diff - length
        } else {
            diff
        }
    }

    /// Longest signed difference from `a` to `b`.
    pub fn mod_diff_far(&self, a: f32, b: f32) -> f32 {
        let close = self.mod_diff_close(a, b);
        if close >= 0.0 {
            close - self.length()
        } else {
            close + self.length()
        }
    }

    /// Non-negative difference from `a` to `b`.
    pub fn mod_diff_positive(&self, a: f32, b: f32) -> f32 {
        let close = self.mod_diff_close(a, b);
        if close >= 0.0 {
            close
        } else {
            close + self.length()
        }
    }

    /// Non-positive difference from `a` to `b`.
    pub fn mod_diff_negative(&self, a: f32, b: f32) -> f32 {
        let close = self.mod_diff_close(a, b);
        if close > 0.0 {
            close - self.length()
        } else {
            close
        }
    }

    /// Difference from `a` to `b` following `direction`.
    pub fn mod_diff(&self, a: f32, b: f32, direction: ModularDirection) -> f32 {
        match direction {
            ModularDirection::Closest => self.mod_diff_close(a, b),
            ModularDirection::Farthest => self.mod_diff_far(a, b),
            ModularDirection::Positive => self.mod_diff_positive(a, b),
            ModularDirection::Negative => self.mod_diff_negative(a, b),
            ModularDirection::Direct => b - a,
        }
    }
}

impl From<[f32; 2]> for Range {
    fn from(v: [f32; 2]) -> Self {
        Range::new(v[0], v[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity_and_length() {
        assert!(Range::new(0.0, 1.0).valid());
        assert!(Range::point(3.0).valid());
        assert!(!INVALID_RANGE.valid());
        assert_eq!(Range::new(-2.0, 3.0).length(), 5.0);
        assert_eq!(Range::empty().include(4.0), Range::point(4.0));
    }

    #[test]
    fn covers_collects_extremes() {
        let r = Range::covers([0.3, -1.0, 2.5, 0.0]);
        assert_eq!(r, Range::new(-1.0, 2.5));
    }

    #[test]
    fn lengthen_grows_both_sides() {
        let r = Range::new(0.0, 1.0).lengthen(0.1);
        assert!((r.start() + 0.05).abs() < 1e-6);
        assert!((r.end() - 1.05).abs() < 1e-6);
    }

    #[test]
    fn normalize_wraps_into_half_open_range() {
        let r = Range::new(0.0, 10.0);
        assert_eq!(r.normalize(0.0), 10.0);
        assert_eq!(r.normalize(10.0), 10.0);
        assert_eq!(r.normalize(12.0), 2.0);
        assert_eq!(r.normalize(-3.0), 7.0);
        assert_eq!(r.normalize_close_value(25.0), 5.0);
        assert!((r.normalize_wild_value(-1234.5) - 5.5).abs() < 1e-3);
    }

    #[test]
    fn mod_diff_directions() {
        let r = Range::new(0.0, 10.0);
        assert_eq!(r.mod_diff(1.0, 9.0, ModularDirection::Closest), -2.0);
        assert_eq!(r.mod_diff(1.0, 9.0, ModularDirection::Farthest), 8.0);
        assert_eq!(r.mod_diff(1.0, 9.0, ModularDirection::Positive), 8.0);
        assert_eq!(r.mod_diff(1.0, 9.0, ModularDirection::Negative), -2.0);
        assert_eq!(r.mod_diff(1.0, 9.0, ModularDirection::Direct), 8.0);
        assert_eq!(r.mod_diff(9.0, 1.0, ModularDirection::Closest), 2.0);
    }

    #[test]
    fn angle_closest_difference_crosses_pi() {
        let a = 0.9 * PI;
        let b = -0.9 * PI;
        let diff = ANGLE_RANGE.mod_diff_close(a, b);
        assert!((diff - 0.2 * PI).abs() < 1e-5);
    }
}
