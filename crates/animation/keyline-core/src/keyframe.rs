//! Keyframes and the interchange shape used by external (de)serializers.

use serde::{Deserialize, Serialize};

use crate::channel::ChannelKind;
use crate::ids::KeyframeId;
use crate::value::{Axis, DataPoint, EvalMode, ExpressionEvaluator};

/// Interpolation mode of a keyframe (applies to the segment it bounds).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    #[default]
    Linear,
    #[serde(alias = "catmull_rom")]
    CatmullRom,
    Step,
    Bezier,
}

/// A timestamped control point owned by one channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub id: KeyframeId,
    pub time: f64,
    pub channel: ChannelKind,
    pub data_points: Vec<DataPoint>,
    #[serde(default)]
    pub interpolation: Interpolation,
    /// Scale only: x, y and z are edited together.
    #[serde(default)]
    pub uniform: bool,
}

impl Keyframe {
    /// New keyframe holding the channel's default value.
    pub fn new(channel: ChannelKind, time: f64) -> Self {
        Self {
            id: KeyframeId::new(),
            time,
            channel,
            data_points: vec![channel.default_data_point()],
            interpolation: Interpolation::Linear,
            uniform: false,
        }
    }

    pub fn with_data_points(mut self, data_points: Vec<DataPoint>) -> Self {
        self.data_points = data_points;
        self
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    #[inline]
    pub fn last_data_point_index(&self) -> usize {
        self.data_points.len().saturating_sub(1)
    }

    /// Which data point applies for a query at `time`: the first at or before
    /// the keyframe's own time, the last one after it.
    pub fn data_point_index_at(&self, time: f64, epsilon: f64) -> usize {
        if self.time > time || (self.time - time).abs() <= epsilon {
            0
        } else {
            self.last_data_point_index()
        }
    }

    /// Evaluate one axis of a data point; out-of-range indices clamp to the last.
    pub fn value(
        &self,
        axis: Axis,
        data_point: usize,
        mode: EvalMode,
        evaluator: &dyn ExpressionEvaluator,
        time: f64,
    ) -> f64 {
        let idx = data_point.min(self.last_data_point_index());
        self.data_points
            .get(idx)
            .map(|dp| dp.evaluate(axis, mode, evaluator, time))
            .unwrap_or(0.0)
    }

    /// Value this keyframe contributes as the left end of a segment.
    #[inline]
    pub fn outgoing(
        &self,
        axis: Axis,
        mode: EvalMode,
        evaluator: &dyn ExpressionEvaluator,
        time: f64,
    ) -> f64 {
        self.value(axis, self.last_data_point_index(), mode, evaluator, time)
    }

    /// Value this keyframe contributes as the right end of a segment.
    #[inline]
    pub fn incoming(
        &self,
        axis: Axis,
        mode: EvalMode,
        evaluator: &dyn ExpressionEvaluator,
        time: f64,
    ) -> f64 {
        self.value(axis, 0, mode, evaluator, time)
    }

    /// First data point carrying an asset path.
    pub fn cue_file(&self) -> Option<&str> {
        self.data_points.first().and_then(DataPoint::asset)
    }

    /// Convert to the interchange shape.
    pub fn to_data(&self) -> KeyframeData {
        KeyframeData {
            id: Some(self.id),
            channel: ChannelRef::Name(self.channel.name().to_string()),
            time: self.time,
            data_points: self.data_points.clone(),
            interpolation: self.interpolation,
            uniform: self.uniform,
        }
    }
}

/// Channel reference as it arrives from the outside: by name or by position
/// in the animator's channel list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelRef {
    Index(usize),
    Name(String),
}

impl From<ChannelKind> for ChannelRef {
    fn from(kind: ChannelKind) -> Self {
        ChannelRef::Name(kind.name().to_string())
    }
}

/// Interchange shape consumed by animation file readers and writers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyframeData {
    #[serde(default, rename = "uuid", skip_serializing_if = "Option::is_none")]
    pub id: Option<KeyframeId>,
    pub channel: ChannelRef,
    pub time: f64,
    #[serde(default)]
    pub data_points: Vec<DataPoint>,
    #[serde(default)]
    pub interpolation: Interpolation,
    #[serde(default)]
    pub uniform: bool,
}

impl KeyframeData {
    /// Build a keyframe on a resolved channel.
    pub fn into_keyframe(self, channel: ChannelKind) -> Keyframe {
        let data_points = if self.data_points.is_empty() {
            vec![channel.default_data_point()]
        } else {
            self.data_points
        };
        Keyframe {
            id: self.id.unwrap_or_default(),
            time: self.time,
            channel,
            data_points,
            interpolation: self.interpolation,
            uniform: self.uniform,
        }
    }
}
