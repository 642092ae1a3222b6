//! Error types for timeline editing.
//!
//! Routine conditions (unknown channel, missing scene node, empty channel,
//! missing asset) are not errors: they surface as `None` or a skipped frame.
//! `TimelineError` is reserved for contract violations the caller can act on.

use serde::{Deserialize, Serialize};

use crate::channel::ChannelKind;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum TimelineError {
    /// Time value is NaN or infinite.
    #[error("Invalid time value: {time}")]
    InvalidTime { time: f64 },

    /// The channel does not accept user-created keyframes.
    #[error("Channel '{channel}' is not mutable")]
    ChannelImmutable { channel: ChannelKind },

    /// The channel already holds its maximum number of keyframes.
    #[error("Channel '{channel}' is full ({capacity} keyframes)")]
    ChannelFull {
        channel: ChannelKind,
        capacity: usize,
    },

    /// A keyframe carries more data points than its channel allows.
    #[error("Keyframe on '{channel}' has {count} data points (max {max})")]
    TooManyDataPoints {
        channel: ChannelKind,
        count: usize,
        max: usize,
    },

    /// Keyframe lookup by id failed.
    #[error("Keyframe not found: {keyframe_id}")]
    KeyframeNotFound { keyframe_id: String },

    /// Animator lookup by id failed.
    #[error("Animator not found: {animator_id}")]
    AnimatorNotFound { animator_id: String },
}

impl TimelineError {
    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidTime { .. } | Self::TooManyDataPoints { .. } => "validation",
            Self::ChannelImmutable { .. } | Self::ChannelFull { .. } => "channel",
            Self::KeyframeNotFound { .. } | Self::AnimatorNotFound { .. } => "data",
        }
    }
}
