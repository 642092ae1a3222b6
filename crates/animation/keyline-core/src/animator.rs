//! Animators: the channel sets driving one target.
//!
//! Bone and null-object animators drive a scene node looked up by id; the
//! effect animator is a per-animation singleton carrying cue channels. Each
//! kind has a fixed channel list (see [`AnimatorKind::channels`]).

use hashbrown::HashMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::channel::{Channel, ChannelKind};
use crate::config::Config;
use crate::error::TimelineError;
use crate::ids::{AnimatorId, KeyframeId, NodeId};
use crate::interp::functions::round_to;
use crate::interp::{self, InterpolationOptions};
use crate::keyframe::{ChannelRef, Keyframe, KeyframeData};
use crate::value::{Axis, Component, DataPoint, EvalMode, ExpressionEvaluator};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimatorKind {
    Bone,
    NullObject,
    Effect,
}

impl AnimatorKind {
    /// Channels of this kind, in display order.
    pub const fn channels(self) -> &'static [ChannelKind] {
        match self {
            AnimatorKind::Bone => &[
                ChannelKind::Rotation,
                ChannelKind::Position,
                ChannelKind::Scale,
            ],
            AnimatorKind::NullObject => &[ChannelKind::Position],
            AnimatorKind::Effect => &[
                ChannelKind::Particle,
                ChannelKind::Sound,
                ChannelKind::Timeline,
            ],
        }
    }

    #[inline]
    pub fn drives_node(self) -> bool {
        !matches!(self, AnimatorKind::Effect)
    }
}

/// Keyframes created and removed by one mutating operation, for undo capture.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeyframeEdit {
    pub created: Vec<Keyframe>,
    pub removed: Vec<Keyframe>,
}

impl KeyframeEdit {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.removed.is_empty()
    }

    pub fn merge(&mut self, other: KeyframeEdit) {
        self.created.extend(other.created);
        self.removed.extend(other.removed);
    }
}

/// Explicit value for a new keyframe.
#[derive(Clone, Debug, PartialEq)]
pub enum FillValue {
    /// One value per axis.
    Vector([f64; 3]),
    /// The same component on every axis.
    Uniform(Component),
    /// Full data point list.
    DataPoints(Vec<DataPoint>),
}

/// Result of [`Animator::get_or_make_keyframe`].
#[derive(Clone, Debug, PartialEq)]
pub struct KeyframeLookup {
    /// Existing keyframe found at the playhead, if any.
    pub before: Option<KeyframeId>,
    /// Keyframe to edit: `before` or a freshly frozen one.
    pub result: KeyframeId,
    pub edit: KeyframeEdit,
}

/// Last resolved value per channel and axis.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LastValues {
    values: HashMap<ChannelKind, [Option<f64>; 3]>,
}

impl LastValues {
    #[inline]
    pub fn record(&mut self, channel: ChannelKind, axis: Axis, value: f64) {
        self.values.entry(channel).or_default()[axis.index()] = Some(value);
    }

    #[inline]
    pub fn axis(&self, channel: ChannelKind, axis: Axis) -> Option<f64> {
        self.values.get(&channel).and_then(|v| v[axis.index()])
    }

    /// All three axes, if each has been resolved at least once.
    pub fn get(&self, channel: ChannelKind) -> Option<[f64; 3]> {
        let v = self.values.get(&channel)?;
        Some([v[0]?, v[1]?, v[2]?])
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[derive(Clone, Debug)]
pub struct Animator {
    id: AnimatorId,
    kind: AnimatorKind,
    target: Option<NodeId>,
    name: String,
    channels: HashMap<ChannelKind, Channel>,
    muted: HashMap<ChannelKind, bool>,
    pub(crate) selected: bool,
    pub expanded: bool,
    last_values: LastValues,
    /// Number of keyframes created since construction, used by the UI to detect edits.
    revision: u64,
}

impl Animator {
    fn with_kind(id: AnimatorId, kind: AnimatorKind, target: Option<NodeId>, name: String) -> Self {
        let channels = kind
            .channels()
            .iter()
            .map(|&c| (c, Channel::new(c)))
            .collect();
        let muted = kind.channels().iter().map(|&c| (c, false)).collect();
        Self {
            id,
            kind,
            target,
            name,
            channels,
            muted,
            selected: false,
            expanded: false,
            last_values: LastValues::default(),
            revision: 0,
        }
    }

    /// Animator for a bone; shares the bone's id.
    pub fn bone(node: NodeId, name: impl Into<String>) -> Self {
        Self::with_kind(node.into(), AnimatorKind::Bone, Some(node), name.into())
    }

    /// Animator for a free-floating null object; shares the node's id.
    pub fn null_object(node: NodeId, name: impl Into<String>) -> Self {
        Self::with_kind(node.into(), AnimatorKind::NullObject, Some(node), name.into())
    }

    /// The global effects track of an animation.
    pub fn effects() -> Self {
        Self::with_kind(AnimatorId::new(), AnimatorKind::Effect, None, "Effects".into())
    }

    #[inline]
    pub fn id(&self) -> AnimatorId {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> AnimatorKind {
        self.kind
    }

    #[inline]
    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    /// Name stored on the animator; prefer [`Animator::display_name`] when a scene is at hand.
    #[inline]
    pub fn stored_name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[inline]
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[inline]
    pub fn channel_kinds(&self) -> &'static [ChannelKind] {
        self.kind.channels()
    }

    #[inline]
    pub fn channel(&self, kind: ChannelKind) -> Option<&Channel> {
        self.channels.get(&kind)
    }

    #[inline]
    pub fn channel_mut(&mut self, kind: ChannelKind) -> Option<&mut Channel> {
        self.channels.get_mut(&kind)
    }

    /// Keyframes of every channel, channel by channel in display order.
    pub fn keyframes(&self) -> impl Iterator<Item = &Keyframe> + '_ {
        self.kind
            .channels()
            .iter()
            .filter_map(|c| self.channels.get(c))
            .flat_map(|c| c.keyframes().iter())
    }

    pub fn keyframe(&self, id: KeyframeId) -> Option<&Keyframe> {
        self.channels.values().find_map(|c| c.get(id))
    }

    pub fn keyframe_mut(&mut self, id: KeyframeId) -> Option<&mut Keyframe> {
        self.channels.values_mut().find_map(|c| c.get_mut(id))
    }

    pub fn remove_keyframe(&mut self, id: KeyframeId) -> Option<Keyframe> {
        self.channels.values_mut().find_map(|c| c.remove(id))
    }

    #[inline]
    pub fn is_muted(&self, channel: ChannelKind) -> bool {
        self.muted.get(&channel).copied().unwrap_or(false)
    }

    pub fn set_muted(&mut self, channel: ChannelKind, muted: bool) {
        if let Some(m) = self.muted.get_mut(&channel) {
            *m = muted;
        }
    }

    /// Flip a channel's mute flag; returns the new state.
    pub fn toggle_muted(&mut self, channel: ChannelKind) -> bool {
        let muted = !self.is_muted(channel);
        self.set_muted(channel, muted);
        muted
    }

    #[inline]
    pub fn last_values(&self) -> &LastValues {
        &self.last_values
    }

    /// Resolve an external channel reference against this animator's channel list.
    pub fn resolve_channel(&self, channel: &ChannelRef) -> Option<ChannelKind> {
        let kind = match channel {
            ChannelRef::Index(i) => self.kind.channels().get(*i).copied(),
            ChannelRef::Name(name) => ChannelKind::from_name(name),
        }?;
        self.channels.contains_key(&kind).then_some(kind)
    }

    /// Load a keyframe from the interchange shape, keeping its time as given.
    /// Unknown channels are skipped with `Ok(None)`.
    pub fn add_keyframe(&mut self, data: KeyframeData) -> Result<Option<KeyframeId>, TimelineError> {
        let Some(kind) = self.resolve_channel(&data.channel) else {
            debug!(
                "animator {}: ignoring keyframe for unknown channel {:?}",
                self.id, data.channel
            );
            return Ok(None);
        };
        let keyframe = data.into_keyframe(kind);
        let channel = self
            .channels
            .get_mut(&kind)
            .ok_or(TimelineError::ChannelImmutable { channel: kind })?;
        let id = channel.push(keyframe)?;
        self.revision += 1;
        Ok(Some(id))
    }

    /// Resolve a channel at `time`, caching the result as the last computed value.
    pub fn interpolate(
        &mut self,
        channel: ChannelKind,
        time: f64,
        opts: &InterpolationOptions<'_>,
    ) -> Option<[f64; 3]> {
        let value = interp::interpolate(self.channels.get(&channel)?.keyframes(), time, opts)?;
        for axis in Axis::ALL {
            self.last_values.record(channel, axis, value[axis.index()]);
        }
        Some(value)
    }

    /// Single-axis variant of [`Animator::interpolate`].
    pub fn interpolate_axis(
        &mut self,
        channel: ChannelKind,
        time: f64,
        axis: Axis,
        opts: &InterpolationOptions<'_>,
    ) -> Option<f64> {
        let value =
            interp::interpolate_axis(self.channels.get(&channel)?.keyframes(), time, axis, opts)?;
        self.last_values.record(channel, axis, value);
        Some(value)
    }

    /// Existing keyframe within `epsilon` of `time` on `channel`.
    pub fn find_keyframe_near(
        &self,
        channel: ChannelKind,
        time: f64,
        epsilon: f64,
    ) -> Option<&Keyframe> {
        self.channels.get(&channel)?.find_near(time, epsilon)
    }

    /// Place a new keyframe on `channel` at `time` (snapped).
    ///
    /// Without a value a transform channel freezes its current interpolated
    /// pose into the keyframe; other channels start from their default value.
    /// Keyframes within the replace epsilon of the new one are removed and
    /// reported. Returns `Ok(None)` when this animator has no such channel.
    pub fn create_keyframe(
        &mut self,
        channel: ChannelKind,
        time: f64,
        value: Option<FillValue>,
        cfg: &Config,
        evaluator: &dyn ExpressionEvaluator,
    ) -> Result<Option<KeyframeEdit>, TimelineError> {
        if !self.channels.contains_key(&channel) {
            debug!("animator {}: no channel '{channel}'", self.id);
            return Ok(None);
        }
        if !time.is_finite() {
            return Err(TimelineError::InvalidTime { time });
        }
        if !channel.spec().mutable {
            return Err(TimelineError::ChannelImmutable { channel });
        }
        let time = cfg.snap_time(time);
        let mut keyframe = Keyframe::new(channel, time);
        match value {
            Some(value) => apply_fill(&mut keyframe, value),
            None if channel.is_transform() => self.freeze_into(&mut keyframe, cfg, evaluator),
            None => {}
        }

        let ch = self
            .channels
            .get_mut(&channel)
            .ok_or(TimelineError::ChannelImmutable { channel })?;
        let (id, removed) = ch.insert_replacing(keyframe, cfg.replace_epsilon())?;
        let created = ch.get(id).cloned().into_iter().collect();
        self.revision += 1;
        Ok(Some(KeyframeEdit { created, removed }))
    }

    /// The keyframe at the playhead for editing: an existing one within half a
    /// step, otherwise a newly frozen keyframe.
    pub fn get_or_make_keyframe(
        &mut self,
        channel: ChannelKind,
        time: f64,
        cfg: &Config,
        evaluator: &dyn ExpressionEvaluator,
    ) -> Result<Option<KeyframeLookup>, TimelineError> {
        if let Some(existing) = self.find_keyframe_near(channel, time, cfg.replace_epsilon()) {
            return Ok(Some(KeyframeLookup {
                before: Some(existing.id),
                result: existing.id,
                edit: KeyframeEdit::default(),
            }));
        }
        let Some(edit) = self.create_keyframe(channel, time, None, cfg, evaluator)? else {
            return Ok(None);
        };
        let Some(result) = edit.created.first().map(|k| k.id) else {
            return Ok(None);
        };
        Ok(Some(KeyframeLookup {
            before: None,
            result,
            edit,
        }))
    }

    /// Fill a transform keyframe from the channel's current interpolation at its time.
    fn freeze_into(&mut self, keyframe: &mut Keyframe, cfg: &Config, evaluator: &dyn ExpressionEvaluator) {
        let channel = keyframe.channel;
        let opts = InterpolationOptions::from_config(cfg, EvalMode::Get, evaluator);
        if let Some(mut values) = self.interpolate(channel, keyframe.time, &opts) {
            if cfg.round_frozen_values {
                let digits = channel.rounding_digits();
                for v in values.iter_mut() {
                    *v = round_to(*v, digits);
                }
            }
            keyframe.data_points = vec![DataPoint::xyz(values[0], values[1], values[2])];
        }

        let Some(closest) = self.channels.get(&channel).and_then(|c| c.closest(keyframe.time)) else {
            return;
        };
        keyframe.interpolation = closest.interpolation;
        if channel == ChannelKind::Scale {
            keyframe.uniform = closest.uniform
                && closest.data_points.first().is_some_and(|dp| {
                    dp.x.is_some() && dp.x == dp.y && dp.x == dp.z
                });
        }
    }
}

fn apply_fill(keyframe: &mut Keyframe, value: FillValue) {
    match value {
        FillValue::Vector([x, y, z]) => keyframe.data_points = vec![DataPoint::xyz(x, y, z)],
        FillValue::Uniform(c) => keyframe.data_points = vec![DataPoint::uniform(c)],
        FillValue::DataPoints(points) if !points.is_empty() => keyframe.data_points = points,
        FillValue::DataPoints(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframe::Interpolation;
    use crate::value::NumericOnly;

    fn bone() -> Animator {
        Animator::bone(NodeId::new(), "arm")
    }

    #[test]
    fn channel_sets_are_fixed_per_kind() {
        assert_eq!(bone().channel_kinds().len(), 3);
        assert!(Animator::null_object(NodeId::new(), "ik")
            .channel(ChannelKind::Rotation)
            .is_none());
        assert!(Animator::effects().channel(ChannelKind::Sound).is_some());
    }

    #[test]
    fn unknown_channel_is_a_no_op() {
        let mut a = bone();
        let data = KeyframeData {
            id: None,
            channel: ChannelRef::Name("sound".into()),
            time: 1.0,
            data_points: vec![],
            interpolation: Interpolation::Linear,
            uniform: false,
        };
        assert_eq!(a.add_keyframe(data).unwrap(), None);
        let edit = a
            .create_keyframe(ChannelKind::Particle, 0.0, None, &Config::default(), &NumericOnly)
            .unwrap();
        assert!(edit.is_none());
        assert_eq!(a.keyframes().count(), 0);
    }

    #[test]
    fn channel_index_follows_display_order() {
        let a = Animator::effects();
        assert_eq!(a.resolve_channel(&ChannelRef::Index(1)), Some(ChannelKind::Sound));
        assert_eq!(a.resolve_channel(&ChannelRef::Index(3)), None);
    }

    #[test]
    fn timeline_channel_rejects_user_keyframes() {
        let mut a = Animator::effects();
        let err = a
            .create_keyframe(ChannelKind::Timeline, 0.0, None, &Config::default(), &NumericOnly)
            .unwrap_err();
        assert_eq!(err, TimelineError::ChannelImmutable { channel: ChannelKind::Timeline });
    }

    #[test]
    fn toggle_mute_reports_new_state() {
        let mut a = bone();
        assert!(a.toggle_muted(ChannelKind::Scale));
        assert!(a.is_muted(ChannelKind::Scale));
        assert!(!a.toggle_muted(ChannelKind::Scale));
    }

    #[test]
    fn freezing_scale_rounds_to_four_digits() {
        let mut a = bone();
        let cfg = Config {
            snapping: 0.0,
            ..Config::default()
        };
        a.create_keyframe(
            ChannelKind::Scale,
            0.0,
            Some(FillValue::Vector([1.0, 1.0, 1.0])),
            &cfg,
            &NumericOnly,
        )
        .unwrap();
        a.create_keyframe(
            ChannelKind::Scale,
            3.0,
            Some(FillValue::Vector([2.0, 2.0, 2.0])),
            &cfg,
            &NumericOnly,
        )
        .unwrap();
        let edit = a
            .create_keyframe(ChannelKind::Scale, 1.0, None, &cfg, &NumericOnly)
            .unwrap()
            .unwrap();
        let dp = &edit.created[0].data_points[0];
        assert_eq!(dp.x, Some(Component::Number(1.3333)));
    }

    #[test]
    fn last_values_track_the_latest_query() {
        let mut a = bone();
        let cfg = Config::default();
        a.create_keyframe(
            ChannelKind::Position,
            0.0,
            Some(FillValue::Vector([4.0, 5.0, 6.0])),
            &cfg,
            &NumericOnly,
        )
        .unwrap();
        assert_eq!(a.last_values().get(ChannelKind::Position), None);
        a.interpolate(ChannelKind::Position, 2.0, &InterpolationOptions::default());
        assert_eq!(a.last_values().get(ChannelKind::Position), Some([4.0, 5.0, 6.0]));
    }
}
