//! Cubic polynomial segments built from Hermite endpoint data.
//!
//! A segment is described by the value and slope at both ends plus its width:
//! `CubicInit`. `CubicCurve` stores the resulting coefficients and evaluates
//! the value and all three derivatives at any x. Outside `[0, width_x]` the
//! polynomial is simply extrapolated.

use crate::range::Range;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// 2^22: the precision of an f32 significand we trust.
pub const EPSILON_PRECISION: f32 = (1u32 << 22) as f32;
pub const EPSILON_SCALE: f32 = 1.0 / EPSILON_PRECISION;

/// Which derivative order to evaluate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveValueType {
    #[default]
    Value,
    Derivative,
    SecondDerivative,
    ThirdDerivative,
}

/// Start and end values and derivatives of a cubic. Start is x = 0, end is
/// x = `width_x`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CubicInit {
    pub start_y: f32,
    pub start_derivative: f32,
    pub end_y: f32,
    pub end_derivative: f32,
    pub width_x: f32,
}

impl CubicInit {
    pub const fn new(
        start_y: f32,
        start_derivative: f32,
        end_y: f32,
        end_derivative: f32,
        width_x: f32,
    ) -> Self {
        Self {
            start_y,
            start_derivative,
            end_y,
            end_derivative,
            width_x,
        }
    }
}

/// `c[3] * x^3 + c[2] * x^2 + c[1] * x + c[0]`
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CubicCurve {
    c: [f32; 4],
}

impl CubicCurve {
    pub const NUM_COEFF: usize = 4;

    /// Hermite-to-polynomial conversion.
    ///
    /// # Panics
    /// When `init.width_x` is not positive.
    pub fn new(init: &CubicInit) -> Self {
        assert!(
            init.width_x > 0.0,
            "cubic width must be positive, got {}",
            init.width_x
        );
        // f(x) = dx^3 + cx^2 + bx + a
        //   a = y0, b = s0
        //   c = (3(y1 - y0)/w - 2s0 - s1) / w
        //   d = (2(y0 - y1)/w + s0 + s1) / w^2
        let w_inv = init.width_x.recip();
        let dy = init.end_y - init.start_y;
        let s0 = init.start_derivative;
        let s1 = init.end_derivative;
        Self {
            c: [
                init.start_y,
                s0,
                (3.0 * dy * w_inv - 2.0 * s0 - s1) * w_inv,
                (-2.0 * dy * w_inv + s0 + s1) * w_inv * w_inv,
            ],
        }
    }

    /// Build from coefficients, highest power first.
    pub const fn from_coeffs(c3: f32, c2: f32, c1: f32, c0: f32) -> Self {
        Self {
            c: [c0, c1, c2, c3],
        }
    }

    #[inline]
    pub fn evaluate(&self, x: f32) -> f32 {
        ((self.c[3] * x + self.c[2]) * x + self.c[1]) * x + self.c[0]
    }

    #[inline]
    pub fn derivative(&self, x: f32) -> f32 {
        (3.0 * self.c[3] * x + 2.0 * self.c[2]) * x + self.c[1]
    }

    #[inline]
    pub fn second_derivative(&self, x: f32) -> f32 {
        6.0 * self.c[3] * x + 2.0 * self.c[2]
    }

    /// Constant for a cubic; `x` is accepted for symmetry with the others.
    #[inline]
    pub fn third_derivative(&self, _x: f32) -> f32 {
        6.0 * self.c[3]
    }

    /// Evaluate the requested derivative order at `x`.
    pub fn value(&self, x: f32, value_type: CurveValueType) -> f32 {
        match value_type {
            CurveValueType::Value => self.evaluate(x),
            CurveValueType::Derivative => self.derivative(x),
            CurveValueType::SecondDerivative => self.second_derivative(x),
            CurveValueType::ThirdDerivative => self.third_derivative(x),
        }
    }

    /// Make `x_shift` the new x = 0.
    pub fn shift_left(&mut self, x_shift: f32) {
        let [c0, c1, c2, c3] = self.c;
        let s = x_shift;
        self.c = [
            ((c3 * s + c2) * s + c1) * s + c0,
            (3.0 * c3 * s + 2.0 * c2) * s + c1,
            3.0 * c3 * s + c2,
            c3,
        ];
    }

    pub fn shift_right(&mut self, x_shift: f32) {
        self.shift_left(-x_shift);
    }

    pub fn shift_up(&mut self, y_offset: f32) {
        self.c[0] += y_offset;
    }

    pub fn scale_up(&mut self, y_scale: f32) {
        for c in &mut self.c {
            *c *= y_scale;
        }
    }

    /// True if the second derivative keeps one sign over `x_limits`.
    /// Values below `epsilon()` count as zero, which matches either sign.
    pub fn uniform_curvature(&self, x_limits: &Range) -> bool {
        let epsilon = self.epsilon() * x_limits.length().abs().max(1.0);
        let start = self.second_derivative(x_limits.start());
        let end = self.second_derivative(x_limits.end());
        if start.abs() <= epsilon || end.abs() <= epsilon {
            return true;
        }
        (start > 0.0) == (end > 0.0)
    }

    /// Magnitude below which values are float noise for this curve.
    pub fn epsilon(&self) -> f32 {
        self.c.iter().fold(0.0f32, |m, c| m.max(c.abs())) * EPSILON_SCALE
    }

    /// Coefficient of x to the `i`th power.
    #[inline]
    pub fn coeff(&self, i: usize) -> f32 {
        self.c[i]
    }

    pub fn set_coeff(&mut self, i: usize, coeff: f32) {
        self.c[i] = coeff;
    }

    /// Equation text, for debugging.
    pub fn text(&self) -> String {
        let mut s = String::new();
        let _ = write!(
            s,
            "{}x^3 + {}x^2 + {}x + {}",
            self.c[3], self.c[2], self.c[1], self.c[0]
        );
        s
    }
}
