//! Applying transform channels to scene nodes.
//!
//! Bone and null-object animators look their node up by id on every frame;
//! nothing here holds on to a node between calls. Axis conventions: rotation
//! negates x and y, position negates x, scale multiplies.

use log::trace;

use crate::animator::{Animator, AnimatorKind};
use crate::channel::ChannelKind;
use crate::ids::NodeId;
use crate::interp::InterpolationOptions;
use crate::ports::{IkSolver, Rotation, SceneGraph, SceneNode};

/// Smallest scale factor written to a node; zero would collapse it irreversibly.
pub const MIN_SCALE_FACTOR: f64 = 0.00001;

/// Outcome of one [`Animator::display_frame`] call.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DisplayOutcome {
    Rendered,
    /// Target present but not renderable (no mesh), or not a node-driving animator.
    Skipped,
    /// Target node no longer exists; the owner should prune this animator.
    TargetMissing,
}

/// Euler angles (radians, x/y/z) of a unit quaternion `[x, y, z, w]` in ZYX order.
pub fn quaternion_to_euler_zyx(q: [f64; 4]) -> [f64; 3] {
    let [x, y, z, w] = q;
    let (xx, yy, zz) = (x * x, y * y, z * z);
    let m11 = 1.0 - 2.0 * (yy + zz);
    let m12 = 2.0 * (x * y - w * z);
    let m21 = 2.0 * (x * y + w * z);
    let m22 = 1.0 - 2.0 * (xx + zz);
    let m31 = 2.0 * (x * z - w * y);
    let m32 = 2.0 * (y * z + w * x);
    let m33 = 1.0 - 2.0 * (xx + yy);

    let ey = (-m31.clamp(-1.0, 1.0)).asin();
    if m31.abs() < 0.999_999_9 {
        [m32.atan2(m33), ey, m21.atan2(m11)]
    } else {
        // Gimbal lock: fold x into z.
        [0.0, ey, (-m12).atan2(m22)]
    }
}

/// Add a rotation to `node`, scaled by `multiplier`.
pub fn display_rotation(node: &mut dyn SceneNode, rotation: Rotation, multiplier: f64) {
    let radians = match rotation {
        Rotation::EulerDegrees(d) => [d[0].to_radians(), d[1].to_radians(), d[2].to_radians()],
        Rotation::Quaternion(q) => quaternion_to_euler_zyx(q),
    };
    node.apply_rotation([
        -radians[0] * multiplier,
        -radians[1] * multiplier,
        radians[2] * multiplier,
    ]);
}

/// Add a position offset to `node`, scaled by `multiplier`.
pub fn display_position(node: &mut dyn SceneNode, value: [f64; 3], multiplier: f64) {
    node.apply_position([
        -value[0] * multiplier,
        value[1] * multiplier,
        value[2] * multiplier,
    ]);
}

/// Multiply the scale of `node` by `1 + (v - 1) * multiplier` per axis.
pub fn display_scale(node: &mut dyn SceneNode, value: [f64; 3], multiplier: f64) {
    node.apply_scale(value.map(|v| scale_factor(v, multiplier)));
}

#[inline]
fn scale_factor(value: f64, multiplier: f64) -> f64 {
    let f = 1.0 + (value - 1.0) * multiplier;
    if f == 0.0 || f.is_nan() {
        MIN_SCALE_FACTOR
    } else {
        f
    }
}

impl Animator {
    /// Live target node id, or `None` when the node no longer exists.
    pub fn resolve_target(&self, scene: &dyn SceneGraph) -> Option<NodeId> {
        let id = self.target()?;
        scene.node(id).map(|_| id)
    }

    /// Whether this animator can draw this frame: its node exists and has a mesh.
    pub fn should_render(&self, scene: &dyn SceneGraph) -> bool {
        if !self.kind().drives_node() {
            return false;
        }
        self.target()
            .and_then(|id| scene.node(id))
            .is_some_and(|node| node.has_renderable_mesh())
    }

    /// Name of the live target, falling back to the stored name.
    pub fn display_name(&self, scene: &dyn SceneGraph) -> String {
        self.target()
            .and_then(|id| scene.node(id))
            .map(|node| node.name().to_string())
            .unwrap_or_else(|| self.stored_name().to_string())
    }

    /// Apply every unmuted transform channel at `time` to the target node.
    ///
    /// Null objects with an IK target also hand their chain to `ik` after
    /// their position is applied.
    pub fn display_frame(
        &mut self,
        scene: &mut dyn SceneGraph,
        ik: Option<&mut dyn IkSolver>,
        time: f64,
        multiplier: f64,
        opts: &InterpolationOptions<'_>,
    ) -> DisplayOutcome {
        if !self.kind().drives_node() {
            return DisplayOutcome::Skipped;
        }
        let Some(node_id) = self.resolve_target(scene) else {
            return DisplayOutcome::TargetMissing;
        };
        if !self.should_render(scene) {
            return DisplayOutcome::Skipped;
        }

        for &channel in self.channel_kinds() {
            if self.is_muted(channel) {
                continue;
            }
            let Some(value) = self.interpolate(channel, time, opts) else {
                continue;
            };
            let Some(node) = scene.node_mut(node_id) else {
                return DisplayOutcome::TargetMissing;
            };
            match channel {
                ChannelKind::Rotation => {
                    display_rotation(node, Rotation::EulerDegrees(value), multiplier)
                }
                ChannelKind::Position => display_position(node, value, multiplier),
                ChannelKind::Scale => display_scale(node, value, multiplier),
                _ => {}
            }
        }

        if self.kind() == AnimatorKind::NullObject && !self.is_muted(ChannelKind::Position) {
            if let Some(ik) = ik {
                display_ik(scene, ik, node_id);
            }
        }
        DisplayOutcome::Rendered
    }
}

/// Solve the chain between a null object's IK target bone and the null
/// object's parent, then apply the solver's rotations.
fn display_ik(scene: &mut dyn SceneGraph, ik: &mut dyn IkSolver, null_object: NodeId) {
    let Some(target_name) = scene
        .node(null_object)
        .and_then(|n| n.ik_target())
        .map(str::to_string)
    else {
        return;
    };
    let Some(target) = scene.nodes_named(&target_name).into_iter().next() else {
        return;
    };

    let stop = scene.parent(null_object);
    let mut chain = Vec::new();
    let mut current = scene.parent(target);
    while current != stop {
        let Some(bone) = current else { break };
        chain.push(bone);
        current = scene.parent(bone);
    }
    chain.reverse();
    if chain.is_empty() {
        return;
    }
    let Some(goal) = scene.world_position(null_object) else {
        return;
    };

    trace!("ik chain of {} bones towards {goal:?}", chain.len());
    for (bone, rotation) in ik.solve_chain(&chain, goal) {
        if let Some(node) = scene.node_mut(bone) {
            display_rotation(node, rotation, 1.0);
        }
    }
}
