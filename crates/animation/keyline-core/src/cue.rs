//! Cue dispatch for the effect animator.
//!
//! Sounds are one-shot: a sound keyframe fires when the playhead is about to
//! cross it (within one display frame at the current speed) and is then
//! cooled down for a short wall-clock interval so that a second tick landing
//! in the same window does not fire it again. Particles are idempotent: every
//! passed particle keyframe owns one emitter per data point, and each frame
//! seeks that emitter to the time elapsed since the keyframe.

use std::time::Duration;

use hashbrown::HashMap;
use log::debug;

use crate::animator::Animator;
use crate::channel::ChannelKind;
use crate::config::Config;
use crate::events::{EventQueue, TimelineEvent};
use crate::ids::KeyframeId;
use crate::ports::{
    AudioBackend, EmitterHandle, EmitterParent, ParticleBackend, PlayRequest, SceneGraph,
    SoundHandle,
};

/// Clock readings for one dispatch call.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CueClock {
    /// Playhead time in seconds.
    pub time: f64,
    /// Playback speed in percent.
    pub speed_percent: f64,
    /// Monotonic wall-clock reading used for cooldowns.
    pub wall_clock: Duration,
}

/// Playback parameters for a sound at the given speed and volume.
pub fn play_request(speed_percent: f64, volume_percent: f64, offset: f64) -> PlayRequest {
    PlayRequest {
        rate: (speed_percent / 100.0).clamp(0.1, 4.0),
        volume: (volume_percent / 100.0).clamp(0.0, 1.0),
        offset,
    }
}

#[derive(Debug, Default)]
pub struct CueDispatcher {
    /// Keyframe -> wall-clock instant its cooldown ends.
    cooldowns: HashMap<KeyframeId, Duration>,
    emitters: HashMap<(KeyframeId, usize), EmitterHandle>,
    playing: Vec<SoundHandle>,
}

impl CueDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn in_cooldown(&self, keyframe: KeyframeId, wall_clock: Duration) -> bool {
        self.cooldowns
            .get(&keyframe)
            .is_some_and(|until| *until > wall_clock)
    }

    /// Sounds started and not yet ended or stopped.
    #[inline]
    pub fn playing_sounds(&self) -> &[SoundHandle] {
        &self.playing
    }

    #[inline]
    pub fn emitter(&self, keyframe: KeyframeId, data_point: usize) -> Option<EmitterHandle> {
        self.emitters.get(&(keyframe, data_point)).copied()
    }

    #[inline]
    pub fn emitter_count(&self) -> usize {
        self.emitters.len()
    }

    /// Run one frame of the effect animator: sounds only while playing, particles always.
    #[allow(clippy::too_many_arguments)]
    pub fn display_frame(
        &mut self,
        effects: &Animator,
        clock: CueClock,
        playing: bool,
        cfg: &Config,
        scene: &dyn SceneGraph,
        audio: &mut dyn AudioBackend,
        particles: &mut dyn ParticleBackend,
        events: &mut EventQueue,
    ) {
        if playing {
            self.trigger_sounds(effects, clock, cfg, audio, events);
        }
        self.seek_particles(effects, clock.time, scene, particles);
    }

    /// Fire sound keyframes lying in `[now, now + frame)`.
    pub fn trigger_sounds(
        &mut self,
        effects: &Animator,
        clock: CueClock,
        cfg: &Config,
        audio: &mut dyn AudioBackend,
        events: &mut EventQueue,
    ) {
        if effects.is_muted(ChannelKind::Sound) {
            return;
        }
        let Some(channel) = effects.channel(ChannelKind::Sound) else {
            return;
        };
        self.cooldowns.retain(|_, until| *until > clock.wall_clock);
        let window = cfg.trigger_window(clock.speed_percent);
        for kf in channel.keyframes() {
            let diff = kf.time - clock.time;
            if !(diff >= 0.0 && diff < window) {
                continue;
            }
            let Some(file) = kf.cue_file() else {
                continue;
            };
            if self.in_cooldown(kf.id, clock.wall_clock) {
                continue;
            }
            let request = play_request(clock.speed_percent, cfg.volume_percent, 0.0);
            self.start(kf.id, file, request, clock.wall_clock, cfg, audio, events);
        }
    }

    /// Resume sounds whose keyframe lies behind the playhead but whose clip
    /// would still be audible, starting them at the matching offset.
    pub fn start_previous_sounds(
        &mut self,
        effects: &Animator,
        clock: CueClock,
        cfg: &Config,
        audio: &mut dyn AudioBackend,
        events: &mut EventQueue,
    ) {
        if effects.is_muted(ChannelKind::Sound) {
            return;
        }
        let Some(channel) = effects.channel(ChannelKind::Sound) else {
            return;
        };
        for kf in channel.keyframes() {
            let Some(file) = kf.cue_file() else {
                continue;
            };
            if self.in_cooldown(kf.id, clock.wall_clock) {
                continue;
            }
            let diff = kf.time - clock.time;
            if diff >= 0.0 {
                continue;
            }
            let Some(duration) = audio.duration(file) else {
                debug!("sound '{file}' has no known duration; not resuming");
                continue;
            };
            if duration > -diff {
                let request = play_request(clock.speed_percent, cfg.volume_percent, -diff);
                self.start(kf.id, file, request, clock.wall_clock, cfg, audio, events);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn start(
        &mut self,
        keyframe: KeyframeId,
        file: &str,
        request: PlayRequest,
        wall_clock: Duration,
        cfg: &Config,
        audio: &mut dyn AudioBackend,
        events: &mut EventQueue,
    ) {
        let Some(handle) = audio.play(file, request) else {
            debug!("sound '{file}' did not resolve; skipping cue {keyframe}");
            return;
        };
        debug!(
            "sound cue {keyframe}: '{file}' at offset {:.3}s rate {:.2}",
            request.offset, request.rate
        );
        self.playing.push(handle);
        self.cooldowns.insert(keyframe, wall_clock + cfg.sound_cooldown());
        events.push(TimelineEvent::SoundTriggered {
            keyframe,
            file: file.to_string(),
            offset: request.offset,
        });
    }

    /// Seek (creating on first use) the emitter of every passed particle data point.
    pub fn seek_particles(
        &mut self,
        effects: &Animator,
        time: f64,
        scene: &dyn SceneGraph,
        particles: &mut dyn ParticleBackend,
    ) {
        let Some(channel) = effects.channel(ChannelKind::Particle) else {
            return;
        };
        // Emitters whose keyframe or data point was removed leave the host.
        self.emitters.retain(|&(keyframe, index), emitter| {
            let live = channel
                .get(keyframe)
                .is_some_and(|kf| index < kf.data_points.len());
            if !live {
                debug!("removing emitter of deleted particle cue {keyframe}[{index}]");
                particles.remove_emitter(*emitter);
            }
            live
        });
        if effects.is_muted(ChannelKind::Particle) {
            return;
        }
        for kf in channel.keyframes() {
            let diff = time - kf.time;
            if diff < 0.0 {
                continue;
            }
            for (i, dp) in kf.data_points.iter().enumerate() {
                let Some(file) = dp.asset() else {
                    continue;
                };
                if !particles.has_effect(file) {
                    debug!("particle effect '{file}' not loaded");
                    continue;
                }
                let emitter = match self.emitters.get(&(kf.id, i)) {
                    Some(e) => *e,
                    None => {
                        let Some(e) = particles.spawn_emitter(file) else {
                            continue;
                        };
                        self.emitters.insert((kf.id, i), e);
                        e
                    }
                };
                let parent = dp
                    .locator
                    .as_deref()
                    .filter(|name| !name.is_empty())
                    .and_then(|name| scene.locator_named(name))
                    .map_or(EmitterParent::Entity, EmitterParent::Locator);
                particles.attach(emitter, parent);
                particles.seek(emitter, diff);
            }
        }
    }

    /// Stop every registered sound.
    pub fn stop_all_sounds(&mut self, audio: &mut dyn AudioBackend) {
        for handle in self.playing.drain(..) {
            audio.stop(handle);
        }
    }

    /// Drop a finished sound from the registry; returns whether it was registered.
    pub fn sound_ended(&mut self, handle: SoundHandle) -> bool {
        let before = self.playing.len();
        self.playing.retain(|h| *h != handle);
        self.playing.len() != before
    }

    /// Remove every emitter, e.g. when the animation is unloaded.
    pub fn clear_emitters(&mut self, particles: &mut dyn ParticleBackend) {
        for (_, emitter) in self.emitters.drain() {
            particles.remove_emitter(emitter);
        }
    }
}
