//! Core configuration for vizij-spline-core.

use serde::{Deserialize, Serialize};

/// Capacity defaults and feature flags.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Node capacity used by `CompactSpline::new`.
    pub default_max_nodes: u16,

    /// Slot capacity reserved by `BulkSplineEvaluator::with_config`.
    pub initial_indices: usize,

    /// Feature flags (placeholder; future: simd).
    pub features: Features,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Features {
    /// Reserved for future toggles.
    pub reserved0: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_max_nodes: crate::compact_spline::DEFAULT_MAX_NODES,
            initial_indices: 0,
            features: Features::default(),
        }
    }
}
