//! Fixed-width codecs for spline nodes.
//!
//! X is an unsigned count of `x_granularity` units. Y is an unsigned rung
//! spanning the spline's y range. The derivative is stored as the angle of
//! its tangent, so that both gentle and steep slopes keep useful precision.

use crate::range::Range;
use core::f32::consts::FRAC_PI_2;

/// X in units of the spline's granularity.
pub type XGrain = u16;
/// Y as a rung between the bottom and top of the spline's y range.
pub type YRung = u16;
/// `atan(derivative)` scaled to the 16-bit signed range.
pub type QuantizedAngle = i16;

pub const MAX_X_GRAIN: XGrain = u16::MAX;
pub const MAX_Y_RUNG: YRung = u16::MAX;
pub const MAX_ANGLE: QuantizedAngle = i16::MAX;
pub const MIN_ANGLE: QuantizedAngle = -i16::MAX;

// 2^15 units per quarter turn, so `MAX_ANGLE` lands just short of pi/2 and
// decodes to a large but finite slope.
const ANGLE_SCALE: f32 = 32768.0 / FRAC_PI_2;
const ANGLE_SCALE_INV: f32 = FRAC_PI_2 / 32768.0;

/// Nearest grain to `x`, or `None` when `x` is negative or too far out.
#[inline]
pub fn quantize_x(x: f32, x_granularity: f32) -> Option<XGrain> {
    let grain = (x / x_granularity).round();
    if grain >= 0.0 && grain <= MAX_X_GRAIN as f32 {
        Some(grain as XGrain)
    } else {
        None
    }
}

#[inline]
pub fn dequantize_x(grain: XGrain, x_granularity: f32) -> f32 {
    grain as f32 * x_granularity
}

/// Nearest rung to `y`. Values outside `y_range` clamp to the end rungs.
#[inline]
pub fn quantize_y(y: f32, y_range: &Range) -> YRung {
    let length = y_range.length();
    if length <= 0.0 {
        return 0;
    }
    let rung = ((y - y_range.start()) / length * MAX_Y_RUNG as f32).round();
    rung.clamp(0.0, MAX_Y_RUNG as f32) as YRung
}

#[inline]
pub fn dequantize_y(rung: YRung, y_range: &Range) -> f32 {
    y_range.lerp(rung as f32 / MAX_Y_RUNG as f32)
}

#[inline]
pub fn quantize_derivative(derivative: f32) -> QuantizedAngle {
    let angle = (derivative.atan() * ANGLE_SCALE).round();
    angle.clamp(MIN_ANGLE as f32, MAX_ANGLE as f32) as QuantizedAngle
}

#[inline]
pub fn dequantize_derivative(angle: QuantizedAngle) -> f32 {
    (angle as f32 * ANGLE_SCALE_INV).tan()
}

/// One node as stored in a spline buffer: 6 bytes, little-endian, no padding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompactSplineNode {
    pub x: XGrain,
    pub y: YRung,
    pub angle: QuantizedAngle,
}

impl CompactSplineNode {
    pub const SIZE: usize = 6;

    pub fn new(x: XGrain, y: YRung, angle: QuantizedAngle) -> Self {
        Self { x, y, angle }
    }

    /// Encode real values. `None` when `x` has no grain.
    pub fn quantize(
        x: f32,
        y: f32,
        derivative: f32,
        x_granularity: f32,
        y_range: &Range,
    ) -> Option<Self> {
        Some(Self {
            x: quantize_x(x, x_granularity)?,
            y: quantize_y(y, y_range),
            angle: quantize_derivative(derivative),
        })
    }

    #[inline]
    pub fn x(&self, x_granularity: f32) -> f32 {
        dequantize_x(self.x, x_granularity)
    }

    #[inline]
    pub fn y(&self, y_range: &Range) -> f32 {
        dequantize_y(self.y, y_range)
    }

    #[inline]
    pub fn derivative(&self) -> f32 {
        dequantize_derivative(self.angle)
    }

    /// `bytes` must hold at least `SIZE` bytes.
    pub fn write_to(&self, bytes: &mut [u8]) {
        bytes[0..2].copy_from_slice(&self.x.to_le_bytes());
        bytes[2..4].copy_from_slice(&self.y.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.angle.to_le_bytes());
    }

    /// `bytes` must hold at least `SIZE` bytes.
    pub fn read_from(bytes: &[u8]) -> Self {
        Self {
            x: u16::from_le_bytes([bytes[0], bytes[1]]),
            y: u16::from_le_bytes([bytes[2], bytes[3]]),
            angle: i16::from_le_bytes([bytes[4], bytes[5]]),
        }
    }
}
