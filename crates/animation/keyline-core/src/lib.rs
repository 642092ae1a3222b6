//! Keyline core: keyframe timeline animators (engine-agnostic)
//!
//! This crate defines the channel data model, the interpolation engine that
//! resolves a channel at any playhead time, transform display for bones and
//! null objects, and cue dispatch for sound and particle effects. Scene graph,
//! IK, audio and particle systems are reached through the traits in [`ports`].

pub mod animation;
pub mod animator;
pub mod channel;
pub mod config;
pub mod cue;
pub mod error;
pub mod events;
pub mod ids;
pub mod interp;
pub mod keyframe;
pub mod playback;
pub mod ports;
pub mod transform;
pub mod value;

// Re-exports for hosts (editor UI, viewers)
pub use animation::{Animation, EditSession};
pub use animator::{Animator, AnimatorKind, FillValue, KeyframeEdit, KeyframeLookup, LastValues};
pub use channel::{Channel, ChannelKind, ChannelSpec};
pub use config::Config;
pub use cue::{CueClock, CueDispatcher};
pub use error::TimelineError;
pub use events::{EventQueue, TimelineEvent};
pub use ids::{AnimatorId, KeyframeId, NodeId};
pub use interp::{interpolate, interpolate_axis, InterpolationOptions, Resolution};
pub use keyframe::{ChannelRef, Interpolation, Keyframe, KeyframeData};
pub use playback::Playback;
pub use ports::{
    AudioBackend, EmitterHandle, EmitterParent, HostPorts, IkSolver, ParticleBackend,
    PlayRequest, Rotation, SceneGraph, SceneNode, SoundHandle,
};
pub use transform::DisplayOutcome;
pub use value::{Axis, Component, DataPoint, EvalMode, ExpressionEvaluator, NumericOnly};

/// Result alias for fallible timeline operations.
pub type Result<T> = core::result::Result<T, TimelineError>;
