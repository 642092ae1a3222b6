//! Notifications for UI and undo collaborators.
//!
//! The session queues events as they happen; hosts drain them after each
//! operation or tick and re-render accordingly.

use serde::{Deserialize, Serialize};

use crate::channel::ChannelKind;
use crate::ids::{AnimatorId, KeyframeId, NodeId};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum TimelineEvent {
    AnimatorSelected {
        animator: AnimatorId,
    },
    KeyframeSelected {
        keyframe: KeyframeId,
    },
    SelectionCleared,
    /// Two or more bones share the selected animator's target name.
    DuplicateTargetName {
        name: String,
    },
    /// An animator whose target node vanished was dropped.
    AnimatorPruned {
        animator: AnimatorId,
        node: NodeId,
    },
    MuteToggled {
        animator: AnimatorId,
        channel: ChannelKind,
        muted: bool,
    },
    PlaybackStarted {
        time: f64,
    },
    PlaybackPaused {
        time: f64,
    },
    PlaybackStopped,
    TimeChanged {
        old_time: f64,
        new_time: f64,
    },
    /// Playback wrapped at the end of a looping animation.
    Looped,
    SoundTriggered {
        keyframe: KeyframeId,
        file: String,
        offset: f64,
    },
}

/// FIFO of pending events.
#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    events: Vec<TimelineEvent>,
}

impl EventQueue {
    #[inline]
    pub fn push(&mut self, event: TimelineEvent) {
        self.events.push(event);
    }

    #[inline]
    pub fn drain(&mut self) -> Vec<TimelineEvent> {
        std::mem::take(&mut self.events)
    }

    #[inline]
    pub fn peek(&self) -> &[TimelineEvent] {
        &self.events
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
