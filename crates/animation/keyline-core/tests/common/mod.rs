#![allow(dead_code)]

use std::collections::{HashMap, HashSet};

use keyline_core::{
    AudioBackend, EmitterHandle, EmitterParent, HostPorts, IkSolver, NodeId, NumericOnly,
    ParticleBackend, PlayRequest, Rotation, SceneGraph, SceneNode, SoundHandle,
};

pub const EPS: f64 = 1e-9;

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

pub fn approx3(a: [f64; 3], b: [f64; 3]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| approx(*x, *y))
}

#[derive(Debug, Clone)]
pub struct FakeNode {
    pub name: String,
    pub locked: bool,
    pub mesh: bool,
    pub locator: bool,
    pub parent: Option<NodeId>,
    pub world: [f64; 3],
    pub ik_target: Option<String>,
    pub rotation: [f64; 3],
    pub position: [f64; 3],
    pub scale: [f64; 3],
}

impl FakeNode {
    fn new(name: &str, parent: Option<NodeId>) -> Self {
        Self {
            name: name.to_string(),
            locked: false,
            mesh: true,
            locator: false,
            parent,
            world: [0.0; 3],
            ik_target: None,
            rotation: [0.0; 3],
            position: [0.0; 3],
            scale: [1.0; 3],
        }
    }
}

impl SceneNode for FakeNode {
    fn name(&self) -> &str {
        &self.name
    }
    fn locked(&self) -> bool {
        self.locked
    }
    fn has_renderable_mesh(&self) -> bool {
        self.mesh
    }
    fn apply_rotation(&mut self, radians: [f64; 3]) {
        for i in 0..3 {
            self.rotation[i] += radians[i];
        }
    }
    fn apply_position(&mut self, offset: [f64; 3]) {
        for i in 0..3 {
            self.position[i] += offset[i];
        }
    }
    fn apply_scale(&mut self, factors: [f64; 3]) {
        for i in 0..3 {
            self.scale[i] *= factors[i];
        }
    }
    fn ik_target(&self) -> Option<&str> {
        self.ik_target.as_deref()
    }
}

#[derive(Debug, Default)]
pub struct FakeScene {
    pub nodes: HashMap<NodeId, FakeNode>,
    pub selected: Vec<NodeId>,
    pub resets: usize,
}

impl FakeScene {
    pub fn add_bone(&mut self, name: &str, parent: Option<NodeId>) -> NodeId {
        let id = NodeId::new();
        self.nodes.insert(id, FakeNode::new(name, parent));
        id
    }

    pub fn add_locator(&mut self, name: &str) -> NodeId {
        let id = self.add_bone(name, None);
        if let Some(n) = self.nodes.get_mut(&id) {
            n.locator = true;
            n.mesh = false;
        }
        id
    }

    pub fn get(&self, id: NodeId) -> &FakeNode {
        &self.nodes[&id]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut FakeNode {
        self.nodes.get_mut(&id).unwrap()
    }
}

impl SceneGraph for FakeScene {
    fn node(&self, id: NodeId) -> Option<&dyn SceneNode> {
        self.nodes.get(&id).map(|n| n as &dyn SceneNode)
    }
    fn node_mut(&mut self, id: NodeId) -> Option<&mut dyn SceneNode> {
        self.nodes.get_mut(&id).map(|n| n as &mut dyn SceneNode)
    }
    fn select_node(&mut self, id: NodeId) {
        self.selected.push(id);
    }
    fn nodes_named(&self, name: &str) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, n)| !n.locator && n.name == name)
            .map(|(id, _)| *id)
            .collect()
    }
    fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }
    fn world_position(&self, id: NodeId) -> Option<[f64; 3]> {
        self.nodes.get(&id).map(|n| n.world)
    }
    fn locator_named(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, n)| n.locator && n.name == name)
            .map(|(id, _)| *id)
    }
    fn reset_pose(&mut self) {
        self.resets += 1;
        for n in self.nodes.values_mut() {
            n.rotation = [0.0; 3];
            n.position = [0.0; 3];
            n.scale = [1.0; 3];
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeAudio {
    pub durations: HashMap<String, f64>,
    pub played: Vec<(String, PlayRequest, SoundHandle)>,
    pub stopped: Vec<SoundHandle>,
    next: u64,
}

impl FakeAudio {
    pub fn with_clip(mut self, file: &str, duration: f64) -> Self {
        self.durations.insert(file.to_string(), duration);
        self
    }
}

impl AudioBackend for FakeAudio {
    fn duration(&self, file: &str) -> Option<f64> {
        self.durations.get(file).copied()
    }
    fn play(&mut self, file: &str, request: PlayRequest) -> Option<SoundHandle> {
        if !self.durations.contains_key(file) {
            return None;
        }
        self.next += 1;
        let handle = SoundHandle(self.next);
        self.played.push((file.to_string(), request, handle));
        Some(handle)
    }
    fn stop(&mut self, handle: SoundHandle) {
        self.stopped.push(handle);
    }
}

#[derive(Debug, Default)]
pub struct FakeParticles {
    pub effects: HashSet<String>,
    pub spawned: Vec<(EmitterHandle, String)>,
    pub parents: HashMap<EmitterHandle, EmitterParent>,
    pub seeks: Vec<(EmitterHandle, f64)>,
    pub removed: Vec<EmitterHandle>,
    next: u64,
}

impl FakeParticles {
    pub fn with_effect(mut self, file: &str) -> Self {
        self.effects.insert(file.to_string());
        self
    }
}

impl ParticleBackend for FakeParticles {
    fn has_effect(&self, file: &str) -> bool {
        self.effects.contains(file)
    }
    fn spawn_emitter(&mut self, file: &str) -> Option<EmitterHandle> {
        self.next += 1;
        let handle = EmitterHandle(self.next);
        self.spawned.push((handle, file.to_string()));
        Some(handle)
    }
    fn attach(&mut self, emitter: EmitterHandle, parent: EmitterParent) {
        self.parents.insert(emitter, parent);
    }
    fn seek(&mut self, emitter: EmitterHandle, elapsed: f64) {
        self.seeks.push((emitter, elapsed));
    }
    fn remove_emitter(&mut self, emitter: EmitterHandle) {
        self.removed.push(emitter);
    }
}

/// Records every chain and answers with a fixed 10 degree z rotation per bone.
#[derive(Debug, Default)]
pub struct FakeIk {
    pub calls: Vec<(Vec<NodeId>, [f64; 3])>,
}

impl IkSolver for FakeIk {
    fn solve_chain(&mut self, chain: &[NodeId], target: [f64; 3]) -> Vec<(NodeId, Rotation)> {
        self.calls.push((chain.to_vec(), target));
        chain
            .iter()
            .map(|id| (*id, Rotation::EulerDegrees([0.0, 0.0, 10.0])))
            .collect()
    }
}

/// Owns one of each fake and lends them out as [`HostPorts`].
#[derive(Debug, Default)]
pub struct Host {
    pub scene: FakeScene,
    pub ik: FakeIk,
    pub audio: FakeAudio,
    pub particles: FakeParticles,
}

impl Host {
    pub fn ports(&mut self) -> HostPorts<'_> {
        HostPorts {
            scene: &mut self.scene,
            ik: Some(&mut self.ik),
            audio: &mut self.audio,
            particles: &mut self.particles,
            evaluator: &NumericOnly,
        }
    }
}
