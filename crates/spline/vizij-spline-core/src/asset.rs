use serde::{Deserialize, Serialize};

use crate::bulk_evaluator::{BulkSplineEvaluator, SplinePlayback};
use crate::compact_spline::{AddMethod, CompactSpline, UncompressedNode};
use crate::error::SplineError;
use crate::range::{Range, INVALID_RANGE};
use crate::Result;

/// Named set of spline channels, as exported by asset tooling.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SplineAsset {
    #[serde(default)]
    pub name: String,
    pub channels: Vec<SplineChannel>,
}

/// One animated channel: its nodes plus how to play them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SplineChannel {
    pub id: String,
    pub nodes: Vec<UncompressedNode>,
    /// Quantization range; the nodes' own extent when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_range: Option<[f32; 2]>,
    /// X quantization step; the finest that reaches the last node when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_granularity: Option<f32>,
    /// Value range for angle-like channels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modular_range: Option<[f32; 2]>,
    #[serde(default)]
    pub playback: SplinePlayback,
}

/// Public API: parse a spline asset from JSON and validate every channel.
///
/// Notes:
/// - Node x values are in the asset's time unit and must start at or after 0
///   and strictly increase.
/// - `derivative` defaults to 0 when a node omits it.
/// - `playback` fields default individually (scale 1, offset 0, rate 1).
pub fn parse_spline_asset_json(s: &str) -> Result<SplineAsset> {
    let asset: SplineAsset = serde_json::from_str(s)?;
    asset.validate()?;
    log::debug!(
        "parsed spline asset '{}' with {} channels",
        asset.name,
        asset.channels.len()
    );
    Ok(asset)
}

impl SplineAsset {
    /// Basic validation of every channel.
    pub fn validate(&self) -> Result<()> {
        self.channels.iter().try_for_each(SplineChannel::validate)
    }

    pub fn channel(&self, id: &str) -> Option<&SplineChannel> {
        self.channels.iter().find(|c| c.id == id)
    }

    /// One owned spline per channel, in channel order.
    pub fn build_splines(&self) -> Result<Vec<CompactSpline<'static>>> {
        self.channels.iter().map(SplineChannel::build_spline).collect()
    }

    /// Bind `splines` (built by `build_splines`) to slots `start..` of
    /// `evaluator`, with each channel's playback and modular range.
    ///
    /// # Panics
    /// When the evaluator has too few slots or `splines` does not match the
    /// channels.
    pub fn bind<'a>(
        &self,
        evaluator: &mut BulkSplineEvaluator<'a>,
        start: usize,
        splines: &'a [CompactSpline<'a>],
    ) {
        assert_eq!(
            splines.len(),
            self.channels.len(),
            "one spline per channel"
        );
        for (offset, (channel, spline)) in self.channels.iter().zip(splines).enumerate() {
            let index = start + offset;
            let range = channel.modular_range().unwrap_or(INVALID_RANGE);
            evaluator.set_y_ranges(index, 1, range);
            evaluator.set_spline(index, spline, &channel.playback);
        }
    }
}

impl SplineChannel {
    fn parse_error(&self, reason: impl std::fmt::Display) -> SplineError {
        SplineError::Parse {
            reason: format!("channel '{}': {reason}", self.id),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let first = self.nodes.first().ok_or_else(|| self.parse_error("no nodes"))?;
        if !(first.x >= 0.0) {
            return Err(self.parse_error(format!("first x {} is negative", first.x)));
        }
        for pair in self.nodes.windows(2) {
            if !(pair[1].x > pair[0].x) {
                return Err(self.parse_error(format!(
                    "x {} does not follow {}",
                    pair[1].x, pair[0].x
                )));
            }
        }
        if let Some([lo, hi]) = self.y_range {
            if !(lo <= hi) {
                return Err(self.parse_error(format!("y_range [{lo}, {hi}]")));
            }
        }
        if let Some([lo, hi]) = self.modular_range {
            if !(lo < hi) {
                return Err(self.parse_error(format!("modular_range [{lo}, {hi}]")));
            }
        }
        Ok(())
    }

    /// Owned spline holding exactly this channel's nodes.
    pub fn build_spline(&self) -> Result<CompactSpline<'static>> {
        if self.y_range.is_none() && self.x_granularity.is_none() {
            return CompactSpline::create_from_nodes(&self.nodes);
        }
        let last = self.nodes.last().ok_or(SplineError::EmptyNodes)?;
        let y_range = self
            .y_range
            .map(Range::from)
            .unwrap_or_else(|| Range::covers(self.nodes.iter().map(|n| n.y)));
        let granularity = self
            .x_granularity
            .unwrap_or_else(|| CompactSpline::recommend_x_granularity(last.x));
        let mut spline = CompactSpline::create(self.nodes.len())?;
        spline.init(y_range, granularity)?;
        spline.add_uncompressed_nodes(&self.nodes, AddMethod::AddWithoutModification)?;
        Ok(spline)
    }

    pub fn modular_range(&self) -> Option<Range> {
        self.modular_range.map(Range::from)
    }

    pub fn playback(&self) -> &SplinePlayback {
        &self.playback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_channel_uses_defaults() {
        let json = r#"{ "channels": [ { "id": "a", "nodes": [ {"x": 0, "y": 1}, {"x": 2, "y": 3} ] } ] }"#;
        let asset = parse_spline_asset_json(json).unwrap();
        let channel = asset.channel("a").unwrap();
        assert_eq!(channel.playback, SplinePlayback::default());
        assert_eq!(channel.nodes[1].derivative, 0.0);
        assert!(channel.modular_range().is_none());
    }

    #[test]
    fn rejects_unordered_nodes() {
        let json = r#"{ "channels": [ { "id": "a", "nodes": [ {"x": 1, "y": 0}, {"x": 1, "y": 1} ] } ] }"#;
        let err = parse_spline_asset_json(json).unwrap_err();
        assert_eq!(err.category(), "parse");
        assert!(err.to_string().contains("channel 'a'"));
    }

    #[test]
    fn rejects_empty_channel() {
        let json = r#"{ "channels": [ { "id": "empty", "nodes": [] } ] }"#;
        assert!(parse_spline_asset_json(json).is_err());
    }
}
