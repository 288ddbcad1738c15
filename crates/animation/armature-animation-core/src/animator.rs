//! Animator: per-entity facade over playback state, sampling, blending and
//! FK composition, stepped synchronously once per host tick.
//!
//! Methods:
//! - new, play, play_by_name, pause, resume, stop
//! - update (advance → sample → blend → compose → record), drive (update + sinks)
//! - bone_transform queries and transient per-bone overrides

use std::sync::Arc;

use log::debug;

use crate::clip::{Clip, LoopMode};
use crate::config::Config;
use crate::error::AnimError;
use crate::fk::{blend_transforms, BoneTransform, Pose};
use crate::math::{quat_from_euler_deg, QUAT_IDENTITY, VEC3_ONE, VEC3_ZERO};
use crate::model::Model;
use crate::outputs::{AnimEvent, BoneChange, TickOutputs};
use crate::playback::{Advance, PlaybackPhase, PlaybackState};
use crate::registry;
use crate::rig::BoneId;
use crate::sampling::{normalize_time, sample_rotation, sample_vector};
use crate::sink::{EventSink, TransformSink};
use crate::Result;

/// Drives one animated entity. Owns that entity's playback state and pose
/// buffers; shares the immutable model with every other entity playing the
/// same asset.
#[derive(Debug)]
pub struct Animator {
    name: String,
    model: Arc<Model>,
    cfg: Config,
    state: PlaybackState,
    pose: Pose,

    // Scratch reused across ticks.
    locals: Vec<BoneTransform>,
    fade_locals: Vec<BoneTransform>,

    // Per-tick outputs.
    outputs: TickOutputs,
    pending_events: Vec<AnimEvent>,
    reset_queued: bool,
    fresh_playback: bool,
}

impl Animator {
    /// Create an animator named `name` (the entity context reported to
    /// event sinks) over `model`.
    pub fn new(model: Arc<Model>, name: impl Into<String>, cfg: Config) -> Self {
        let bones = model.rig.len();
        let mut outputs = TickOutputs::default();
        outputs.changes.reserve(cfg.change_capacity.max(bones));
        Self {
            name: name.into(),
            pose: Pose::new(bones),
            locals: vec![BoneTransform::IDENTITY; bones],
            fade_locals: vec![BoneTransform::IDENTITY; bones],
            outputs,
            pending_events: Vec::new(),
            reset_queued: false,
            fresh_playback: false,
            state: PlaybackState::new(),
            model,
            cfg,
        }
    }

    /// Switch playback to `clip` at `speed`. While a non-interruptible clip
    /// is active and unfinished the call is ignored without error; that is
    /// caller-facing policy, not a failure.
    pub fn play(&mut self, clip: Arc<Clip>, speed: f32, interruptible: bool) -> Result<()> {
        if !self.state.can_interrupt() {
            debug!(
                "animator {:?}: play {:?} ignored, current clip is not interruptible",
                self.name, clip.name
            );
            return Ok(());
        }
        let name = clip.name.clone();
        self.state
            .play(clip, speed, interruptible, self.cfg.blend_duration)?;
        self.fresh_playback = true;
        self.reset_queued = false;
        self.pending_events
            .push(AnimEvent::PlaybackStarted { clip: name });
        Ok(())
    }

    /// Look the clip up on the model by case-insensitive name, then `play`.
    /// Unknown names fail without touching playback state.
    pub fn play_by_name(&mut self, name: &str, speed: f32, interruptible: bool) -> Result<()> {
        let clip = self
            .model
            .clip_by_name(name)
            .cloned()
            .ok_or_else(|| AnimError::ClipNotFound {
                name: name.to_string(),
            })?;
        self.play(clip, speed, interruptible)
    }

    pub fn pause(&mut self) {
        self.state.pause();
    }

    pub fn resume(&mut self) {
        self.state.resume();
    }

    /// Halt playback and clear all state. With `reset_pose` the pose
    /// snaps back to rest and the next tick pushes the identity transform
    /// for every bone so the host follows.
    pub fn stop(&mut self, reset_pose: bool) {
        if let Some(clip) = self.state.clip() {
            debug!("animator {:?}: stop {:?}", self.name, clip.name);
        }
        self.state.stop();
        self.fresh_playback = false;
        self.pending_events.clear();
        if reset_pose {
            self.pose.set_identity();
            self.reset_queued = true;
        }
    }

    /// Step the animator by `dt` seconds, producing this tick's outputs.
    pub fn update(&mut self, dt: f32) -> &TickOutputs {
        self.outputs.clear();
        self.drain_pending_events();

        let was_live = self.state.phase() == PlaybackPhase::Playing;
        let advance = self.state.advance(dt);

        let Some(clip) = self.state.clip().cloned() else {
            // Idle. A queued reset still pushes the rest pose once.
            if self.reset_queued {
                self.reset_queued = false;
                self.record_changes();
            }
            return &self.outputs;
        };

        // 1) Evaluate the current clip's local pose at the new elapsed time.
        let t = normalize_time(self.state.elapsed(), clip.length, clip.loop_mode);
        Self::sample_pose(&self.model, &clip, t, &mut self.locals);

        // 2) Cross-fade from the outgoing snapshot while a blend is running.
        if let Some(blend) = self.state.blend() {
            let snap = &blend.snapshot;
            let snap_t = normalize_time(
                snap.time_at(blend.elapsed),
                snap.clip.length,
                snap.clip.loop_mode,
            );
            Self::sample_pose(&self.model, &snap.clip, snap_t, &mut self.fade_locals);
            let alpha = blend.alpha();
            for (local, from) in self.locals.iter_mut().zip(&self.fade_locals) {
                *local = blend_transforms(from, local, alpha);
            }
        }

        // 3) Compose world transforms, restoring authored rotations from
        //    the registry (the bone's own value stands in for un-stripped
        //    assets).
        let model_key = self.model.key.as_str();
        self.pose.compose(&self.model.rig, &self.locals, &|bone| {
            registry::global()
                .correction_quat(model_key, bone.id)
                .unwrap_or_else(|| quat_from_euler_deg(bone.rotation_deg))
        });
        self.record_changes();

        // 4) Lifecycle and marker events for this step.
        if advance.finished_now {
            self.push_event(AnimEvent::PlaybackEnded {
                clip: clip.name.clone(),
                clip_time: self.state.elapsed(),
            });
        }
        if advance.blend_finished {
            self.push_event(AnimEvent::BlendFinished {
                clip: clip.name.clone(),
            });
        }
        if was_live {
            self.emit_marker_crossings(&clip, &advance);
            self.fresh_playback = false;
        }

        &self.outputs
    }

    /// Step once and forward this tick's outputs into host sinks.
    pub fn drive(
        &mut self,
        dt: f32,
        transforms: &mut dyn TransformSink,
        events: &mut dyn EventSink,
    ) {
        self.update(dt);
        for change in &self.outputs.changes {
            transforms.apply(change.bone, &change.transform);
        }
        for event in &self.outputs.events {
            events.notify(&self.name, event);
        }
    }

    /// Shift the vertical component of every resolved translation, in both
    /// the queryable pose and this tick's recorded changes. Compensates for
    /// proxy anchor differences; authored pivot data is untouched, and the
    /// next update recomputes, so callers re-apply it every tick.
    pub fn adjust_all_translations_y(&mut self, offset: f32) {
        self.pose.adjust_translations_y(offset);
        for change in &mut self.outputs.changes {
            change.transform.translation[1] += offset;
        }
    }

    /// Resolved transform from the last tick. `None` for bone ids outside
    /// the rig.
    #[inline]
    pub fn bone_transform(&self, bone: BoneId) -> Option<&BoneTransform> {
        self.pose.get(bone)
    }

    /// Transient override of one bone's resolved rotation; recomputed away
    /// on the next update. Unknown bones return false.
    pub fn set_bone_rotation(&mut self, bone: BoneId, rotation: [f32; 4]) -> bool {
        self.pose.set_rotation(bone, rotation)
    }

    pub fn set_bone_translation(&mut self, bone: BoneId, translation: [f32; 3]) -> bool {
        self.pose.set_translation(bone, translation)
    }

    pub fn set_bone_scale(&mut self, bone: BoneId, scale: [f32; 3]) -> bool {
        self.pose.set_scale(bone, scale)
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    /// The clip currently driving this entity, if any.
    #[inline]
    pub fn current(&self) -> Option<&Arc<Clip>> {
        self.state.clip()
    }

    #[inline]
    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    #[inline]
    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Outputs recorded by the most recent update.
    #[inline]
    pub fn outputs(&self) -> &TickOutputs {
        &self.outputs
    }

    /// Evaluate every track of `clip` at normalized time `t` into `out`,
    /// identity for untracked bones. Track bone ids outside the rig are
    /// skipped, the lenient policy for mismatched assets.
    fn sample_pose(model: &Model, clip: &Clip, t: f32, out: &mut Vec<BoneTransform>) {
        let looped = clip.loop_mode == LoopMode::Loop;
        out.clear();
        out.resize(model.rig.len(), BoneTransform::IDENTITY);
        for (bone, track) in &clip.tracks {
            let Some(slot) = out.get_mut(bone.index()) else {
                continue;
            };
            slot.translation = sample_vector(&track.position, t, clip.length, looped, VEC3_ZERO);
            slot.rotation = sample_rotation(&track.rotation, t, clip.length, looped, QUAT_IDENTITY);
            slot.scale = sample_vector(&track.scale, t, clip.length, looped, VEC3_ONE);
        }
    }

    fn record_changes(&mut self) {
        for bone in self.model.rig.bones() {
            if let Some(t) = self.pose.get(bone.id) {
                self.outputs.push_change(BoneChange {
                    bone: bone.id,
                    transform: *t,
                });
            }
        }
    }

    /// Fire MarkerCrossed for every marker whose time falls inside the
    /// interval travelled by this step, at most once per marker. The first
    /// live step after a transition includes the interval's left edge so a
    /// marker at t=0 fires. Works on the step's raw pre-fold interval; the
    /// stored elapsed has already been folded back into one cycle.
    fn emit_marker_crossings(&mut self, clip: &Clip, step: &Advance) {
        if clip.markers.is_empty() || clip.length <= 0.0 {
            return;
        }
        let prev = normalize_time(step.previous_elapsed, clip.length, clip.loop_mode);
        let now = normalize_time(step.new_elapsed, clip.length, clip.loop_mode);
        let laps = if clip.loop_mode == LoopMode::Loop {
            (step.new_elapsed / clip.length).floor() - (step.previous_elapsed / clip.length).floor()
        } else {
            0.0
        };
        let include_start = self.fresh_playback;
        for marker in &clip.markers {
            let t = marker.time;
            let crossed = if laps >= 2.0 {
                // The step spanned at least one full iteration.
                true
            } else if laps >= 1.0 {
                t > prev || t <= now || (include_start && t >= prev)
            } else if include_start {
                t >= prev && t <= now
            } else {
                t > prev && t <= now
            };
            if crossed {
                self.push_event(AnimEvent::MarkerCrossed {
                    script: marker.script.clone(),
                    channel: marker.channel.clone(),
                    clip_time: t,
                });
            }
        }
    }

    fn drain_pending_events(&mut self) {
        for event in std::mem::take(&mut self.pending_events) {
            self.push_event(event);
        }
    }

    fn push_event(&mut self, event: AnimEvent) {
        if self.outputs.events.len() >= self.cfg.max_events_per_tick {
            debug!(
                "animator {:?}: event budget exhausted, dropping {:?}",
                self.name, event
            );
            return;
        }
        self.outputs.push_event(event);
    }
}
