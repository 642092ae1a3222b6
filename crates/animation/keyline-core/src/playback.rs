//! Tick-driven playback.
//!
//! The playhead lives on the [`EditSession`]. Each tick renders every animator
//! plus the effects track at the playhead, then advances it by one display
//! frame at the current speed, wrapping or pausing at the end of the animation.

use std::time::Duration;

use log::debug;

use crate::animation::{Animation, EditSession};
use crate::cue::{CueClock, CueDispatcher};
use crate::error::TimelineError;
use crate::events::TimelineEvent;
use crate::interp::InterpolationOptions;
use crate::ports::{HostPorts, IkSolver};
use crate::value::EvalMode;

#[derive(Debug)]
pub struct Playback {
    playing: bool,
    /// Playback speed in percent.
    pub speed_percent: f64,
    cues: CueDispatcher,
}

impl Default for Playback {
    fn default() -> Self {
        Self {
            playing: false,
            speed_percent: 100.0,
            cues: CueDispatcher::new(),
        }
    }
}

impl Playback {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    #[inline]
    pub fn cues(&self) -> &CueDispatcher {
        &self.cues
    }

    #[inline]
    pub fn cues_mut(&mut self) -> &mut CueDispatcher {
        &mut self.cues
    }

    fn clock(&self, session: &EditSession, wall_clock: Duration) -> CueClock {
        CueClock {
            time: session.time,
            speed_percent: self.speed_percent,
            wall_clock,
        }
    }

    /// Start playing from the playhead, resuming sounds already under way.
    /// A finished, non-looping animation restarts from zero.
    pub fn start(
        &mut self,
        animation: &Animation,
        session: &mut EditSession,
        host: &mut HostPorts<'_>,
        wall_clock: Duration,
    ) {
        if self.playing {
            return;
        }
        if !animation.looping && animation.length > 0.0 && session.time >= animation.length {
            session.time = 0.0;
        }
        self.playing = true;
        if let Some(effects) = animation.effects() {
            let clock = self.clock(session, wall_clock);
            self.cues.start_previous_sounds(
                effects,
                clock,
                &session.config,
                &mut *host.audio,
                &mut session.events,
            );
        }
        session.events.push(TimelineEvent::PlaybackStarted { time: session.time });
    }

    /// Pause at the playhead and silence running sounds.
    pub fn pause(&mut self, session: &mut EditSession, host: &mut HostPorts<'_>) {
        if !self.playing {
            return;
        }
        self.playing = false;
        self.cues.stop_all_sounds(&mut *host.audio);
        session.events.push(TimelineEvent::PlaybackPaused { time: session.time });
    }

    /// Stop, rewind to zero and show the first frame.
    pub fn stop(
        &mut self,
        animation: &mut Animation,
        session: &mut EditSession,
        host: &mut HostPorts<'_>,
        wall_clock: Duration,
    ) {
        self.playing = false;
        self.cues.stop_all_sounds(&mut *host.audio);
        let old = std::mem::replace(&mut session.time, 0.0);
        if old != 0.0 {
            session.events.push(TimelineEvent::TimeChanged {
                old_time: old,
                new_time: 0.0,
            });
        }
        session.events.push(TimelineEvent::PlaybackStopped);
        self.display(animation, session, host, wall_clock);
    }

    /// Scrub to `time` (snapped to the timeline grid) and show that frame.
    /// While playing, running sounds restart from their offset at the new time.
    pub fn set_time(
        &mut self,
        animation: &mut Animation,
        session: &mut EditSession,
        time: f64,
        host: &mut HostPorts<'_>,
        wall_clock: Duration,
    ) -> Result<(), TimelineError> {
        if !time.is_finite() {
            return Err(TimelineError::InvalidTime { time });
        }
        let new_time = session.config.snap_time(time);
        let old_time = std::mem::replace(&mut session.time, new_time);
        session.events.push(TimelineEvent::TimeChanged { old_time, new_time });
        if self.playing {
            self.cues.stop_all_sounds(&mut *host.audio);
            if let Some(effects) = animation.effects() {
                let clock = self.clock(session, wall_clock);
                self.cues.start_previous_sounds(
                    effects,
                    clock,
                    &session.config,
                    &mut *host.audio,
                    &mut session.events,
                );
            }
        }
        self.display(animation, session, host, wall_clock);
        Ok(())
    }

    /// Render the frame at the playhead, then advance it by one display frame.
    /// Returns whether playback is still running.
    ///
    /// A sound keyed at the start time, or at zero after a loop wrap, fires on
    /// the first tick that renders it.
    pub fn tick(
        &mut self,
        animation: &mut Animation,
        session: &mut EditSession,
        host: &mut HostPorts<'_>,
        wall_clock: Duration,
    ) -> bool {
        if !self.playing {
            return false;
        }
        self.display(animation, session, host, wall_clock);

        let step = session.config.trigger_window(self.speed_percent);
        session.time += step;
        if animation.length > 0.0 && session.time >= animation.length {
            if animation.looping {
                debug!("'{}' looped at {:.3}s", animation.name, session.time);
                session.time = 0.0;
                session.events.push(TimelineEvent::Looped);
            } else {
                session.time = animation.length;
                self.display(animation, session, host, wall_clock);
                self.pause(session, host);
                return false;
            }
        }
        true
    }

    /// Render the current frame: reset the pose, layer node animators, then
    /// dispatch cues (sounds fire only while playing).
    pub fn display(
        &mut self,
        animation: &mut Animation,
        session: &mut EditSession,
        host: &mut HostPorts<'_>,
        wall_clock: Duration,
    ) {
        let opts = InterpolationOptions::from_config(&session.config, EvalMode::Get, host.evaluator);
        host.scene.reset_pose();
        animation.display_frame(
            &mut *host.scene,
            host.ik.as_mut().map(|ik| &mut **ik as &mut dyn IkSolver),
            session.time,
            1.0,
            &opts,
            &mut session.events,
        );
        if let Some(effects) = animation.effects() {
            let clock = self.clock(session, wall_clock);
            self.cues.display_frame(
                effects,
                clock,
                self.playing,
                &session.config,
                &*host.scene,
                &mut *host.audio,
                &mut *host.particles,
                &mut session.events,
            );
        }
    }

    /// Drop every emitter and silence sounds, e.g. before switching animations.
    pub fn unload(&mut self, host: &mut HostPorts<'_>) {
        self.playing = false;
        self.cues.stop_all_sounds(&mut *host.audio);
        self.cues.clear_emitters(&mut *host.particles);
    }
}
