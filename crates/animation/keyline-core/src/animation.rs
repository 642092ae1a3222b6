//! Animations (a set of animators) and the editing session around them.

use hashbrown::HashMap;
use log::{debug, warn};

use crate::animator::{Animator, AnimatorKind, FillValue, KeyframeEdit, KeyframeLookup};
use crate::channel::ChannelKind;
use crate::config::Config;
use crate::error::TimelineError;
use crate::events::{EventQueue, TimelineEvent};
use crate::ids::{AnimatorId, KeyframeId, NodeId};
use crate::interp::InterpolationOptions;
use crate::keyframe::Keyframe;
use crate::ports::{IkSolver, SceneGraph};
use crate::transform::DisplayOutcome;
use crate::value::ExpressionEvaluator;

#[derive(Clone, Debug)]
pub struct Animation {
    pub name: String,
    /// Length in seconds; grows to cover the latest keyframe.
    pub length: f64,
    pub looping: bool,
    animators: HashMap<AnimatorId, Animator>,
    effects: Option<AnimatorId>,
}

impl Animation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            length: 0.0,
            looping: false,
            animators: HashMap::new(),
            effects: None,
        }
    }

    pub fn animators(&self) -> impl Iterator<Item = &Animator> + '_ {
        self.animators.values()
    }

    #[inline]
    pub fn animator(&self, id: AnimatorId) -> Option<&Animator> {
        self.animators.get(&id)
    }

    #[inline]
    pub fn animator_mut(&mut self, id: AnimatorId) -> Option<&mut Animator> {
        self.animators.get_mut(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.animators.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.animators.is_empty()
    }

    /// Insert an animator, replacing one with the same id. An effect animator
    /// becomes this animation's effects track.
    pub fn insert_animator(&mut self, animator: Animator) -> AnimatorId {
        let id = animator.id();
        if animator.kind() == AnimatorKind::Effect {
            if let Some(old) = self.effects.replace(id) {
                if old != id {
                    self.animators.remove(&old);
                }
            }
        }
        self.animators.insert(id, animator);
        self.update_length();
        id
    }

    pub fn remove_animator(&mut self, id: AnimatorId) -> Option<Animator> {
        if self.effects == Some(id) {
            self.effects = None;
        }
        self.animators.remove(&id)
    }

    /// Animator for a bone node, created on first use.
    pub fn bone_animator(&mut self, node: NodeId, name: &str) -> &mut Animator {
        self.animators
            .entry(node.into())
            .or_insert_with(|| Animator::bone(node, name))
    }

    /// Animator for a null object, created on first use.
    pub fn null_object_animator(&mut self, node: NodeId, name: &str) -> &mut Animator {
        self.animators
            .entry(node.into())
            .or_insert_with(|| Animator::null_object(node, name))
    }

    pub fn effects(&self) -> Option<&Animator> {
        self.effects.and_then(|id| self.animators.get(&id))
    }

    /// The effects track, created on first use.
    pub fn effects_mut(&mut self) -> &mut Animator {
        let id = match self.effects {
            Some(id) if self.animators.contains_key(&id) => id,
            _ => {
                let animator = Animator::effects();
                let id = animator.id();
                self.animators.insert(id, animator);
                self.effects = Some(id);
                id
            }
        };
        self.animators
            .entry(id)
            .or_insert_with(Animator::effects)
    }

    /// Find a keyframe anywhere in the animation.
    pub fn keyframe(&self, id: KeyframeId) -> Option<(AnimatorId, &Keyframe)> {
        self.animators
            .values()
            .find_map(|a| a.keyframe(id).map(|k| (a.id(), k)))
    }

    /// Extend `length` to cover the latest keyframe.
    pub fn update_length(&mut self) {
        let latest = self
            .animators
            .values()
            .flat_map(|a| a.keyframes())
            .map(|k| k.time)
            .fold(0.0_f64, f64::max);
        if latest > self.length {
            self.length = latest;
        }
    }

    /// Drop node-driving animators whose target node no longer exists.
    pub fn prune_missing(&mut self, scene: &dyn SceneGraph, events: &mut EventQueue) -> Vec<AnimatorId> {
        let missing: Vec<AnimatorId> = self
            .animators
            .values()
            .filter(|a| a.kind().drives_node() && a.resolve_target(scene).is_none())
            .map(Animator::id)
            .collect();
        for id in &missing {
            self.prune(*id, events);
        }
        missing
    }

    fn prune(&mut self, id: AnimatorId, events: &mut EventQueue) {
        if let Some(animator) = self.animators.remove(&id) {
            warn!(
                "animator '{}' lost its target node; removing it from '{}'",
                animator.stored_name(),
                self.name
            );
            if let Some(node) = animator.target() {
                events.push(TimelineEvent::AnimatorPruned { animator: id, node });
            }
        }
    }

    /// Display every node-driving animator at `time`, pruning those whose
    /// target vanished. The effects track is driven by the cue dispatcher.
    pub fn display_frame(
        &mut self,
        scene: &mut dyn SceneGraph,
        mut ik: Option<&mut dyn IkSolver>,
        time: f64,
        multiplier: f64,
        opts: &InterpolationOptions<'_>,
        events: &mut EventQueue,
    ) {
        let mut missing = Vec::new();
        for animator in self.animators.values_mut() {
            let outcome = animator.display_frame(
                scene,
                ik.as_mut().map(|ik| &mut **ik as &mut dyn IkSolver),
                time,
                multiplier,
                opts,
            );
            if outcome == DisplayOutcome::TargetMissing {
                missing.push(animator.id());
            }
        }
        for id in missing {
            self.prune(id, events);
        }
    }
}

/// Editing state shared by the timeline UI: playhead, selection and the
/// active channel. One session edits one animation at a time.
#[derive(Debug, Default)]
pub struct EditSession {
    pub config: Config,
    pub(crate) time: f64,
    selected_animator: Option<AnimatorId>,
    selected_keyframes: Vec<(AnimatorId, KeyframeId)>,
    /// Channel the keyframe toolbar currently targets.
    pub active_channel: Option<ChannelKind>,
    pub(crate) events: EventQueue,
}

impl EditSession {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Move the playhead without snapping; returns the previous time.
    pub fn set_time(&mut self, time: f64) -> Result<f64, TimelineError> {
        if !time.is_finite() {
            return Err(TimelineError::InvalidTime { time });
        }
        let old = std::mem::replace(&mut self.time, time.max(0.0));
        Ok(old)
    }

    #[inline]
    pub fn selected_animator(&self) -> Option<AnimatorId> {
        self.selected_animator
    }

    #[inline]
    pub fn selected_keyframes(&self) -> &[(AnimatorId, KeyframeId)] {
        &self.selected_keyframes
    }

    #[inline]
    pub fn events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    #[inline]
    pub fn events(&self) -> &[TimelineEvent] {
        self.events.peek()
    }

    pub fn drain_events(&mut self) -> Vec<TimelineEvent> {
        self.events.drain()
    }

    /// Make `keyframe` the only selected keyframe.
    pub fn select_keyframe(&mut self, animator: AnimatorId, keyframe: KeyframeId) {
        self.selected_keyframes.clear();
        self.selected_keyframes.push((animator, keyframe));
        self.events.push(TimelineEvent::KeyframeSelected { keyframe });
    }

    /// Add `keyframe` to the selection.
    pub fn extend_selection(&mut self, animator: AnimatorId, keyframe: KeyframeId) {
        if !self.selected_keyframes.iter().any(|(_, k)| *k == keyframe) {
            self.selected_keyframes.push((animator, keyframe));
            self.events.push(TimelineEvent::KeyframeSelected { keyframe });
        }
    }

    pub fn clear_selection(&mut self, animation: &mut Animation) {
        for animator in animation.animators.values_mut() {
            animator.selected = false;
        }
        self.selected_animator = None;
        self.selected_keyframes.clear();
        self.events.push(TimelineEvent::SelectionCleared);
    }

    /// Select an animator.
    ///
    /// Node-driving animators need a live, unlocked target; the node is
    /// selected in the scene unless `node_already_selected`. Bones warn when
    /// another bone shares their name. If no selected keyframe belongs to the
    /// animator, the keyframe on the active channel nearest the playhead
    /// (within the selection tolerance) is selected. Returns whether the
    /// animator was selected.
    pub fn select_animator(
        &mut self,
        animation: &mut Animation,
        id: AnimatorId,
        scene: &mut dyn SceneGraph,
        node_already_selected: bool,
    ) -> bool {
        let Some(animator) = animation.animators.get(&id) else {
            return false;
        };
        let kind = animator.kind();
        let mut target = None;
        if kind.drives_node() {
            let Some(node_id) = animator.resolve_target(scene) else {
                debug!("animator {id}: target missing; not selecting");
                return false;
            };
            if scene.node(node_id).is_some_and(|n| n.locked()) {
                debug!("animator {id}: target locked; not selecting");
                return false;
            }
            target = Some(node_id);
        }

        for a in animation.animators.values_mut() {
            a.selected = false;
        }

        if let Some(node_id) = target {
            if !node_already_selected {
                scene.select_node(node_id);
            }
            if kind == AnimatorKind::Bone {
                self.check_duplicate_names(scene, node_id);
            }
        }

        let Some(animator) = animation.animators.get_mut(&id) else {
            return false;
        };
        animator.selected = true;
        animator.expanded = true;
        self.selected_animator = Some(id);
        self.events.push(TimelineEvent::AnimatorSelected { animator: id });

        let owns_selection = self.selected_keyframes.first().is_some_and(|(a, _)| *a == id);
        if !owns_selection {
            if let Some(channel) = self.active_channel {
                let nearest = animator.channel(channel).and_then(|c| {
                    c.keyframes()
                        .iter()
                        .rev()
                        .find(|k| (k.time - self.time).abs() < self.config.selection_tolerance)
                        .map(|k| k.id)
                });
                if let Some(keyframe) = nearest {
                    self.select_keyframe(id, keyframe);
                }
            }
        }
        true
    }

    fn check_duplicate_names(&mut self, scene: &dyn SceneGraph, node_id: NodeId) {
        let Some(name) = scene.node(node_id).map(|n| n.name().to_string()) else {
            return;
        };
        if scene.nodes_named(&name).iter().any(|other| *other != node_id) {
            warn!("multiple bones are named '{name}'; animations target them ambiguously");
            self.events.push(TimelineEvent::DuplicateTargetName { name });
        }
    }

    /// Create a keyframe at `time` (the playhead when `None`), optionally
    /// selecting it. Replaced keyframes leave the selection.
    #[allow(clippy::too_many_arguments)]
    pub fn create_keyframe(
        &mut self,
        animation: &mut Animation,
        animator: AnimatorId,
        channel: ChannelKind,
        value: Option<FillValue>,
        time: Option<f64>,
        select: bool,
        evaluator: &dyn ExpressionEvaluator,
    ) -> Result<Option<KeyframeEdit>, TimelineError> {
        let time = time.unwrap_or(self.time);
        let Some(a) = animation.animator_mut(animator) else {
            return Err(TimelineError::AnimatorNotFound {
                animator_id: animator.to_string(),
            });
        };
        let Some(edit) = a.create_keyframe(channel, time, value, &self.config, evaluator)? else {
            return Ok(None);
        };
        animation.update_length();
        self.forget_removed(&edit);
        if select {
            if let Some(created) = edit.created.first() {
                self.select_keyframe(animator, created.id);
            }
        }
        Ok(Some(edit))
    }

    /// The keyframe under the playhead on `channel`, frozen into existence if needed.
    pub fn get_or_make_keyframe(
        &mut self,
        animation: &mut Animation,
        animator: AnimatorId,
        channel: ChannelKind,
        evaluator: &dyn ExpressionEvaluator,
    ) -> Result<Option<KeyframeLookup>, TimelineError> {
        let Some(a) = animation.animator_mut(animator) else {
            return Err(TimelineError::AnimatorNotFound {
                animator_id: animator.to_string(),
            });
        };
        let lookup = a.get_or_make_keyframe(channel, self.time, &self.config, evaluator)?;
        if let Some(lookup) = &lookup {
            animation.update_length();
            self.forget_removed(&lookup.edit);
        }
        Ok(lookup)
    }

    pub fn remove_keyframe(
        &mut self,
        animation: &mut Animation,
        keyframe: KeyframeId,
    ) -> Result<KeyframeEdit, TimelineError> {
        let removed = animation
            .animators
            .values_mut()
            .find_map(|a| a.remove_keyframe(keyframe))
            .ok_or_else(|| TimelineError::KeyframeNotFound {
                keyframe_id: keyframe.to_string(),
            })?;
        let edit = KeyframeEdit {
            created: Vec::new(),
            removed: vec![removed],
        };
        self.forget_removed(&edit);
        Ok(edit)
    }

    /// Flip a channel's mute flag; `None` when the animator does not exist.
    pub fn toggle_muted(
        &mut self,
        animation: &mut Animation,
        animator: AnimatorId,
        channel: ChannelKind,
    ) -> Option<bool> {
        let a = animation.animator_mut(animator)?;
        a.channel(channel)?;
        let muted = a.toggle_muted(channel);
        self.events.push(TimelineEvent::MuteToggled {
            animator,
            channel,
            muted,
        });
        Some(muted)
    }

    fn forget_removed(&mut self, edit: &KeyframeEdit) {
        if edit.removed.is_empty() {
            return;
        }
        self.selected_keyframes
            .retain(|(_, k)| !edit.removed.iter().any(|r| r.id == *k));
    }
}
