//! Collaborator interfaces the core calls through.
//!
//! Hosts implement these for their scene graph, IK solver, audio and particle
//! systems. Every lookup may come back empty; absence is a normal state.

use crate::ids::NodeId;
use crate::value::ExpressionEvaluator;

/// Rotation handed to a scene node.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Rotation {
    /// Euler angles in degrees (x, y, z).
    EulerDegrees([f64; 3]),
    /// Quaternion (x, y, z, w).
    Quaternion([f64; 4]),
}

/// A node of the host scene graph.
pub trait SceneNode {
    fn name(&self) -> &str;

    /// Locked nodes cannot be selected through their animator.
    fn locked(&self) -> bool {
        false
    }

    fn has_renderable_mesh(&self) -> bool;

    /// Add a rotation offset, in radians per axis.
    fn apply_rotation(&mut self, radians: [f64; 3]);

    /// Add a position offset.
    fn apply_position(&mut self, offset: [f64; 3]);

    /// Multiply the current scale per axis.
    fn apply_scale(&mut self, factors: [f64; 3]);

    /// Bone name this node drives through IK (null objects only).
    fn ik_target(&self) -> Option<&str> {
        None
    }
}

/// The host scene graph, addressed by node id.
pub trait SceneGraph {
    fn node(&self, id: NodeId) -> Option<&dyn SceneNode>;

    fn node_mut(&mut self, id: NodeId) -> Option<&mut dyn SceneNode>;

    /// Mark a node selected in the host (outliner selection).
    fn select_node(&mut self, id: NodeId);

    /// Ids of all bone-like nodes carrying `name`.
    fn nodes_named(&self, name: &str) -> Vec<NodeId>;

    /// Parent of a node; `None` at the root.
    fn parent(&self, id: NodeId) -> Option<NodeId>;

    fn world_position(&self, id: NodeId) -> Option<[f64; 3]>;

    /// Locator node by name, used to attach particle emitters.
    fn locator_named(&self, name: &str) -> Option<NodeId>;

    /// Reset every animated node to its rest pose before layering animations.
    fn reset_pose(&mut self) {}
}

/// Black-box IK solver.
pub trait IkSolver {
    /// Solve `chain` (root first) towards `target`; returns per-bone rotations.
    fn solve_chain(&mut self, chain: &[NodeId], target: [f64; 3]) -> Vec<(NodeId, Rotation)>;
}

/// Handle of a started sound.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct SoundHandle(pub u64);

/// Parameters for starting a sound.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlayRequest {
    pub rate: f64,
    pub volume: f64,
    /// Start offset into the clip, in seconds.
    pub offset: f64,
}

pub trait AudioBackend {
    /// Clip duration in seconds; `None` when the file does not resolve.
    fn duration(&self, file: &str) -> Option<f64>;

    /// Start playback; `None` when the file does not resolve.
    fn play(&mut self, file: &str, request: PlayRequest) -> Option<SoundHandle>;

    /// Stop and unload a playing sound.
    fn stop(&mut self, handle: SoundHandle);
}

/// Handle of a live particle emitter.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct EmitterHandle(pub u64);

/// Where an emitter lives in the scene.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EmitterParent {
    Locator(NodeId),
    Entity,
}

pub trait ParticleBackend {
    /// Whether the effect file resolves to a loaded effect.
    fn has_effect(&self, file: &str) -> bool;

    fn spawn_emitter(&mut self, file: &str) -> Option<EmitterHandle>;

    fn attach(&mut self, emitter: EmitterHandle, parent: EmitterParent);

    /// Jump the emitter's simulation clock to `elapsed` seconds.
    fn seek(&mut self, emitter: EmitterHandle, elapsed: f64);

    fn remove_emitter(&mut self, _emitter: EmitterHandle) {}
}

/// Every collaborator a frame needs, borrowed for one call.
pub struct HostPorts<'a> {
    pub scene: &'a mut dyn SceneGraph,
    pub ik: Option<&'a mut dyn IkSolver>,
    pub audio: &'a mut dyn AudioBackend,
    pub particles: &'a mut dyn ParticleBackend,
    pub evaluator: &'a dyn ExpressionEvaluator,
}
