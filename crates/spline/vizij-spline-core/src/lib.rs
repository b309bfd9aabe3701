//! Vizij Spline Core
//!
//! Compact quantized splines and a bulk evaluator that plays many of them at
//! once. Splines are built from raw nodes, by resampling another spline, from
//! short targets, or from a JSON asset; the evaluator then advances every
//! channel by a shared delta each frame.

pub mod asset;
pub mod bulk_evaluator;
pub mod compact_spline;
pub mod config;
pub mod curve;
pub mod dual_cubic;
pub mod error;
pub mod quantize;
pub mod range;
pub mod target;

// Re-exports for consumers
pub use asset::{parse_spline_asset_json, SplineAsset, SplineChannel};
pub use bulk_evaluator::{BulkSplineEvaluator, SplinePlayback};
pub use compact_spline::{
    AddMethod, CompactSpline, CompactSplineIndex, SegmentIndex, UncompressedNode,
    DEFAULT_MAX_NODES, NO_GUESS,
};
pub use config::Config;
pub use curve::{CubicCurve, CubicInit, CurveValueType};
pub use error::SplineError;
pub use range::{ModularDirection, Range, ANGLE_RANGE, INVALID_RANGE};
pub use target::{Target1f, TargetBuilder, TargetN, TargetNode, TargetValue, VectorConverter};

/// Result alias for fallible construction and loading.
pub type Result<T> = std::result::Result<T, SplineError>;
