//! Per-entity playback and blend state.
//!
//! The state machine stores which clip is active, how far along it is, and
//! the frozen parameters of the previous clip while a cross-fade is in
//! flight. Policy checks (interruptibility) belong to the controller; this
//! type only records the flag.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::clip::{Clip, LoopMode};
use crate::error::AnimError;
use crate::Result;

/// Lifecycle phase of one entity's playback.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum PlaybackPhase {
    #[default]
    Idle,
    Playing,
    Paused,
    /// A Once clip reached its end; time is frozen at the clip length.
    Finished,
}

impl PlaybackPhase {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Finished => "finished",
        }
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }

    #[inline]
    pub fn can_pause(&self) -> bool {
        matches!(self, Self::Playing)
    }

    #[inline]
    pub fn can_resume(&self) -> bool {
        matches!(self, Self::Paused)
    }
}

/// Pose parameters of the outgoing clip, captured at the transition.
#[derive(Clone, Debug)]
pub struct BlendSnapshot {
    pub clip: Arc<Clip>,
    /// Elapsed seconds at the moment of transition.
    pub elapsed: f32,
    pub speed: f32,
}

impl BlendSnapshot {
    /// Timeline position of the outgoing clip after `blend_elapsed` seconds
    /// of cross-fade. The captured parameters are frozen; the outgoing
    /// timeline itself keeps advancing at its captured speed.
    #[inline]
    pub fn time_at(&self, blend_elapsed: f32) -> f32 {
        self.elapsed + blend_elapsed * self.speed
    }
}

/// An in-flight cross-fade toward the current clip.
#[derive(Clone, Debug)]
pub struct Blend {
    pub snapshot: BlendSnapshot,
    /// Wall-clock seconds since the transition; never scaled by playback
    /// speed, so fades take the same real time at any speed.
    pub elapsed: f32,
    pub duration: f32,
}

impl Blend {
    /// Mix factor toward the incoming clip, in [0, 1].
    #[inline]
    pub fn alpha(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }
}

/// Outcome of one `advance` step.
#[derive(Clone, Copy, Debug, Default)]
pub struct Advance {
    /// Elapsed seconds before this step, for marker-crossing detection.
    pub previous_elapsed: f32,
    /// Elapsed seconds after this step, before any loop fold or end clamp.
    /// Paired with `previous_elapsed` this is the exact interval travelled.
    pub new_elapsed: f32,
    /// A Once clip reached its end on this step.
    pub finished_now: bool,
    /// The cross-fade completed on this step.
    pub blend_finished: bool,
}

/// Mutable per-entity playback state, owned by that entity's animator.
#[derive(Clone, Debug)]
pub struct PlaybackState {
    phase: PlaybackPhase,
    clip: Option<Arc<Clip>>,
    elapsed: f32,
    speed: f32,
    interruptible: bool,
    blend: Option<Blend>,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            phase: PlaybackPhase::Idle,
            clip: None,
            elapsed: 0.0,
            speed: 1.0,
            interruptible: true,
            blend: None,
        }
    }
}

impl PlaybackState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when a new clip may take over: nothing active, the active clip
    /// is interruptible, or it already finished.
    #[inline]
    pub fn can_interrupt(&self) -> bool {
        match self.phase {
            PlaybackPhase::Idle | PlaybackPhase::Finished => true,
            PlaybackPhase::Playing | PlaybackPhase::Paused => self.interruptible,
        }
    }

    /// Switch to `clip`, snapshotting the outgoing clip into the blend-from
    /// fields when something was active. Callers check `can_interrupt`
    /// first. Non-positive speed is rejected, never clamped.
    pub fn play(
        &mut self,
        clip: Arc<Clip>,
        speed: f32,
        interruptible: bool,
        blend_duration: f32,
    ) -> Result<()> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(AnimError::InvalidSpeed { speed });
        }
        let outgoing = match self.phase {
            PlaybackPhase::Idle => None,
            _ => self.clip.take(),
        };
        self.blend = outgoing.and_then(|prev| {
            (blend_duration > 0.0).then(|| Blend {
                snapshot: BlendSnapshot {
                    clip: prev,
                    elapsed: self.elapsed,
                    speed: self.speed,
                },
                elapsed: 0.0,
                duration: blend_duration,
            })
        });
        self.clip = Some(clip);
        self.elapsed = 0.0;
        self.speed = speed;
        self.interruptible = interruptible;
        self.phase = PlaybackPhase::Playing;
        Ok(())
    }

    /// Freeze time; elapsed and blend timers stay untouched while paused.
    pub fn pause(&mut self) {
        if self.phase.can_pause() {
            self.phase = PlaybackPhase::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.phase.can_resume() {
            self.phase = PlaybackPhase::Playing;
        }
    }

    /// Clear every field back to empty. Pose reset is the controller's job.
    pub fn stop(&mut self) {
        *self = Self::default();
    }

    /// Advance timers by `dt` seconds of wall-clock time.
    ///
    /// Stored clip time stays bounded: looped time folds back into one
    /// cycle and Hold time clamps at the clip length, so f32 keeps its
    /// resolution over arbitrarily long sessions. The returned `Advance`
    /// carries the raw pre-fold interval for marker detection.
    pub fn advance(&mut self, dt: f32) -> Advance {
        let mut out = Advance {
            previous_elapsed: self.elapsed,
            new_elapsed: self.elapsed,
            ..Default::default()
        };
        let Some(clip) = self.clip.as_ref() else {
            return out;
        };
        if self.phase == PlaybackPhase::Playing {
            self.elapsed += dt * self.speed;
            out.new_elapsed = self.elapsed;
            match clip.loop_mode {
                LoopMode::Once => {
                    if self.elapsed >= clip.length {
                        self.elapsed = clip.length;
                        self.phase = PlaybackPhase::Finished;
                        out.finished_now = true;
                    }
                }
                LoopMode::Loop => {
                    if clip.length > 0.0 && self.elapsed >= clip.length {
                        self.elapsed = self.elapsed.rem_euclid(clip.length);
                    }
                }
                LoopMode::Hold => {
                    if self.elapsed > clip.length {
                        self.elapsed = clip.length;
                    }
                }
            }
        }
        if self.phase != PlaybackPhase::Paused {
            if let Some(blend) = self.blend.as_mut() {
                blend.elapsed += dt;
                if blend.elapsed >= blend.duration {
                    self.blend = None;
                    out.blend_finished = true;
                }
            }
        }
        out
    }

    #[inline]
    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    #[inline]
    pub fn clip(&self) -> Option<&Arc<Clip>> {
        self.clip.as_ref()
    }

    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    #[inline]
    pub fn blend(&self) -> Option<&Blend> {
        self.blend.as_ref()
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.phase.is_playing()
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.phase == PlaybackPhase::Finished
    }
}
