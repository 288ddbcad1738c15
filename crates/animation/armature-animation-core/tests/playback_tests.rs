use std::sync::Arc;

use approx::assert_abs_diff_eq;
use armature_animation_core::{
    clip::{BoneTrack, Clip, EventMarker, LoopMode, VectorKeyframe},
    error::AnimError,
    fk::BoneTransform,
    model::Model,
    outputs::AnimEvent,
    rig::BoneId,
    sink::{EventSink, TransformSink},
    Animator, Config,
};
use armature_test_fixtures::build;

fn soldier() -> Arc<Model> {
    Arc::new(build::soldier_model())
}

fn animator() -> Animator {
    Animator::new(soldier(), "hero", Config::default())
}

fn hips_y(anim: &Animator) -> f32 {
    anim.bone_transform(BoneId(0))
        .map(|t| t.translation[1])
        .unwrap_or(f32::NAN)
}

fn count_markers(events: &[AnimEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, AnimEvent::MarkerCrossed { .. }))
        .count()
}

/// Constant pose clip holding the hips one unit up, for cross-fade ramps.
fn pose_high_clip() -> Clip {
    let mut clip = Clip::new("PoseHigh", 1.0, LoopMode::Loop);
    let mut track = BoneTrack::default();
    track.position.push(VectorKeyframe::new(0.0, [0.0, 1.0, 0.0]));
    clip.tracks.push((BoneId(0), track));
    clip
}

/// it should deliver PlaybackStarted on the first update after play
#[test]
fn started_event_arrives_on_the_next_tick() {
    let mut anim = animator();
    anim.play_by_name("Walk", 1.0, true).unwrap();
    assert!(anim.outputs().is_empty());

    let out = anim.update(0.1);
    assert!(out
        .events
        .iter()
        .any(|e| matches!(e, AnimEvent::PlaybackStarted { clip } if clip == "Walk")));
}

/// it should clamp a Once clip at its end and hold the final pose
#[test]
fn once_clip_finishes_and_holds_its_last_pose() {
    let mut anim = animator();
    anim.play_by_name("Wave", 1.0, true).unwrap();

    anim.update(0.3);
    assert!(anim.is_playing());
    assert_abs_diff_eq!(anim.state().elapsed(), 0.3, epsilon = 1e-6);

    let out = anim.update(0.3);
    assert!(out.events.iter().any(
        |e| matches!(e, AnimEvent::PlaybackEnded { clip, clip_time }
            if clip == "Wave" && (*clip_time - 0.5).abs() < 1e-6)
    ));
    assert!(anim.is_finished());
    assert_abs_diff_eq!(anim.state().elapsed(), 0.5, epsilon = 1e-6);

    // The held pose keeps streaming out, without repeating the event.
    let first_held = anim.update(0.5).changes.clone();
    assert_eq!(first_held.len(), 4);
    let second = anim.update(0.5);
    assert!(second.events.is_empty());
    assert_eq!(second.changes, first_held);
}

/// it should ignore interrupts while a non-interruptible clip is active
#[test]
fn non_interruptible_playback_ignores_interrupts() {
    let mut anim = animator();
    anim.play_by_name("Wave", 1.0, false).unwrap();
    anim.play_by_name("Walk", 1.0, true).unwrap();
    assert_eq!(anim.current().map(|c| c.name.as_str()), Some("Wave"));

    // Only the surviving clip announces itself.
    let out = anim.update(0.1);
    let started: Vec<_> = out
        .events
        .iter()
        .filter(|e| matches!(e, AnimEvent::PlaybackStarted { .. }))
        .collect();
    assert_eq!(started.len(), 1);
    assert!(matches!(
        started[0],
        AnimEvent::PlaybackStarted { clip } if clip == "Wave"
    ));

    // Finishing lifts the guard.
    anim.update(0.6);
    assert!(anim.is_finished());
    anim.play_by_name("Walk", 1.0, true).unwrap();
    assert_eq!(anim.current().map(|c| c.name.as_str()), Some("Walk"));
}

/// it should start a cross-fade when interrupting and report its completion
#[test]
fn interrupting_starts_a_cross_fade() {
    let mut anim = animator();
    anim.play_by_name("Walk", 1.0, true).unwrap();
    anim.update(0.25);
    assert!(anim.state().blend().is_none());

    anim.play_by_name("Wave", 1.0, true).unwrap();
    let blend = anim.state().blend().unwrap();
    assert_abs_diff_eq!(blend.duration, 0.3, epsilon = 1e-6);
    assert_abs_diff_eq!(blend.snapshot.elapsed, 0.25, epsilon = 1e-6);

    anim.update(0.2);
    assert!(anim.state().blend().is_some());
    let out = anim.update(0.2).clone();
    assert!(anim.state().blend().is_none());
    assert!(out
        .events
        .iter()
        .any(|e| matches!(e, AnimEvent::BlendFinished { clip } if clip == "Wave")));
}

/// it should mix outgoing and incoming poses at a wall-clock alpha
#[test]
fn cross_fade_mixes_at_wall_clock_alpha() {
    let mut anim = animator();
    anim.play_by_name("Walk", 2.0, true).unwrap();
    anim.update(0.25);
    assert_abs_diff_eq!(hips_y(&anim), 1.0, epsilon = 1e-5);

    anim.play_by_name("Wave", 1.0, true).unwrap();

    // Zero-length step: the fade has not begun, the outgoing pose stands.
    anim.update(0.0);
    assert_abs_diff_eq!(hips_y(&anim), 1.0, epsilon = 1e-5);

    // Halfway through the fade the outgoing clip has kept advancing at its
    // own captured speed: walk at 0.5 + 0.15 * 2.0 = 0.8 puts the hips at
    // 0.4, mixed at alpha 0.5 with the incoming rest pose.
    anim.update(0.15);
    assert_abs_diff_eq!(hips_y(&anim), 0.2, epsilon = 1e-4);

    anim.update(0.15);
    assert!(anim.state().blend().is_none());
    assert_abs_diff_eq!(hips_y(&anim), 0.0, epsilon = 1e-5);
}

/// it should ramp the pose monotonically across the fade
#[test]
fn cross_fade_ramps_the_pose_down_monotonically() {
    let mut model = Model::new("soldier-ramp", build::biped_rig());
    model.add_clip(pose_high_clip()).unwrap();
    model.add_clip(build::wave_clip()).unwrap();
    let mut anim = Animator::new(Arc::new(model), "hero", Config::default());

    anim.play_by_name("PoseHigh", 1.0, true).unwrap();
    anim.update(0.1);
    assert_abs_diff_eq!(hips_y(&anim), 1.0, epsilon = 1e-6);

    anim.play_by_name("Wave", 1.0, true).unwrap();
    let mut last = 1.0f32;
    for _ in 0..6 {
        anim.update(0.05);
        let y = hips_y(&anim);
        assert!(y <= last + 1e-6, "pose should fade down, got {y} after {last}");
        last = y;
    }
    assert_abs_diff_eq!(last, 0.0, epsilon = 1e-5);
}

/// it should resolve clip names without regard to ASCII case
#[test]
fn play_by_name_is_case_insensitive() {
    let mut anim = animator();
    anim.play_by_name("wAlK", 1.0, true).unwrap();
    assert_eq!(anim.current().map(|c| c.name.as_str()), Some("Walk"));
}

/// it should leave playback untouched when the clip name is unknown
#[test]
fn unknown_clip_name_leaves_playback_untouched() {
    let mut anim = animator();
    anim.play_by_name("Walk", 1.0, true).unwrap();
    anim.update(0.25);

    let err = anim.play_by_name("Sprint", 1.0, true).unwrap_err();
    assert!(matches!(err, AnimError::ClipNotFound { name } if name == "Sprint"));
    assert_eq!(anim.current().map(|c| c.name.as_str()), Some("Walk"));
    assert_abs_diff_eq!(anim.state().elapsed(), 0.25, epsilon = 1e-6);
}

/// it should reject non-positive speeds before touching any state
#[test]
fn non_positive_speed_is_rejected_up_front() {
    let mut anim = animator();
    for speed in [0.0, -2.0, f32::NAN] {
        let err = anim.play_by_name("Walk", speed, true).unwrap_err();
        assert!(matches!(err, AnimError::InvalidSpeed { .. }));
    }
    assert!(!anim.is_playing());
    assert!(anim.update(0.2).is_empty());
}

/// it should push the rest pose exactly once after stop(reset)
#[test]
fn stop_with_reset_pushes_the_rest_pose_once() {
    let mut anim = animator();
    anim.play_by_name("Walk", 1.0, true).unwrap();
    anim.update(0.25);
    assert_abs_diff_eq!(hips_y(&anim), 0.5, epsilon = 1e-5);

    anim.stop(true);
    assert_eq!(
        anim.bone_transform(BoneId(0)),
        Some(&BoneTransform::IDENTITY)
    );

    let out = anim.update(0.1);
    assert_eq!(out.changes.len(), 4);
    assert!(out
        .changes
        .iter()
        .all(|c| c.transform == BoneTransform::IDENTITY));
    assert!(out.events.is_empty());

    assert!(anim.update(0.1).is_empty());
}

/// it should drop queued start events on stop
#[test]
fn stop_discards_queued_start_events() {
    let mut anim = animator();
    anim.play_by_name("Walk", 1.0, true).unwrap();
    anim.stop(false);
    assert!(anim.update(0.1).events.is_empty());
}

/// it should freeze clip time and the fade timer while paused
#[test]
fn pause_freezes_clip_time_and_blend() {
    let mut anim = animator();
    anim.play_by_name("Walk", 1.0, true).unwrap();
    anim.update(0.25);

    anim.pause();
    let out = anim.update(0.5).clone();
    assert_abs_diff_eq!(anim.state().elapsed(), 0.25, epsilon = 1e-6);
    assert_abs_diff_eq!(hips_y(&anim), 0.5, epsilon = 1e-5);
    assert!(out.events.is_empty());

    anim.resume();
    anim.update(0.25);
    assert_abs_diff_eq!(anim.state().elapsed(), 0.5, epsilon = 1e-6);
    assert_abs_diff_eq!(hips_y(&anim), 1.0, epsilon = 1e-5);

    // A paused fade holds its mix as well.
    let mut fading = animator();
    fading.play_by_name("Walk", 1.0, true).unwrap();
    fading.update(0.25);
    fading.play_by_name("Wave", 1.0, true).unwrap();
    fading.pause();
    fading.update(0.4);
    assert!(fading.state().blend().is_some());
    assert_abs_diff_eq!(hips_y(&fading), 0.5, epsilon = 1e-5);

    fading.resume();
    let out = fading.update(0.3).clone();
    assert!(fading.state().blend().is_none());
    assert!(out
        .events
        .iter()
        .any(|e| matches!(e, AnimEvent::BlendFinished { .. })));
}

/// it should fire a loop marker once per crossing, wrap included
#[test]
fn loop_markers_fire_once_per_crossing() {
    let mut anim = animator();
    anim.play_by_name("Walk", 1.0, true).unwrap();

    let mut crossings = Vec::new();
    for _ in 0..5 {
        let out = anim.update(0.3);
        for event in &out.events {
            if let AnimEvent::MarkerCrossed {
                script,
                channel,
                clip_time,
            } = event
            {
                crossings.push((script.clone(), channel.clone(), *clip_time));
            }
        }
    }

    // The marker at 0.25 falls inside the first step and inside the fifth
    // (0.2..=0.5 after the wrap), nowhere else.
    assert_eq!(crossings.len(), 2);
    for (script, channel, clip_time) in &crossings {
        assert_eq!(script, "step");
        assert_eq!(channel, "footsteps");
        assert_abs_diff_eq!(*clip_time, 0.25, epsilon = 1e-6);
    }
}

/// it should fire a marker at time zero on start and again after each wrap
#[test]
fn marker_at_zero_fires_on_start_and_after_wrap() {
    let mut clip = Clip::new("Cycle", 1.0, LoopMode::Loop);
    clip.markers.push(EventMarker::new(0.0, "loop-start"));
    let mut model = Model::new("soldier-cycle", build::biped_rig());
    model.add_clip(clip).unwrap();
    let mut anim = Animator::new(Arc::new(model), "hero", Config::default());

    anim.play_by_name("Cycle", 1.0, true).unwrap();
    let first = count_markers(&anim.update(0.1).events);
    let second = count_markers(&anim.update(1.0).events);
    assert_eq!(first, 1);
    assert_eq!(second, 1);
}

/// it should fold looped clip time instead of letting it grow without bound
#[test]
fn loop_time_stays_bounded_across_many_cycles() {
    let mut anim = animator();
    anim.play_by_name("Walk", 1.0, true).unwrap();

    // 400 quarter-second steps cover one hundred full cycles. The stored
    // clip time keeps folding back into the first cycle, and the step
    // marker at 0.25 keeps firing once per cycle, on the exact tick.
    let mut crossings = 0;
    for _ in 0..400 {
        let out = anim.update(0.25);
        crossings += count_markers(&out.events);
        assert!(anim.state().elapsed() < 1.0);
    }
    assert_eq!(crossings, 100);
    assert_abs_diff_eq!(anim.state().elapsed(), 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(hips_y(&anim), 0.0, epsilon = 1e-5);
}

/// it should clamp Hold clip time at the clip end and keep the pose there
#[test]
fn hold_clips_freeze_time_at_the_clip_end() {
    let mut clip = Clip::new("Lean", 1.0, LoopMode::Hold);
    let mut track = BoneTrack::default();
    track.position.push(VectorKeyframe::new(0.0, [0.0, 0.0, 0.0]));
    track.position.push(VectorKeyframe::new(1.0, [0.0, 2.0, 0.0]));
    clip.tracks.push((BoneId(0), track));
    let mut model = Model::new("soldier-lean", build::biped_rig());
    model.add_clip(clip).unwrap();
    let mut anim = Animator::new(Arc::new(model), "hero", Config::default());

    anim.play_by_name("Lean", 1.0, true).unwrap();
    for _ in 0..5 {
        anim.update(0.7);
    }
    assert!(anim.is_playing());
    assert_abs_diff_eq!(anim.state().elapsed(), 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(hips_y(&anim), 2.0, epsilon = 1e-5);
}

/// it should cap the events recorded in a single tick
#[test]
fn event_budget_caps_a_single_tick() {
    let mut clip = Clip::new("Busy", 1.0, LoopMode::Loop);
    clip.markers.push(EventMarker::new(0.01, "a"));
    clip.markers.push(EventMarker::new(0.02, "b"));
    clip.markers.push(EventMarker::new(0.03, "c"));
    let mut model = Model::new("soldier-busy", build::biped_rig());
    model.add_clip(clip).unwrap();

    let cfg = Config {
        max_events_per_tick: 2,
        ..Config::default()
    };
    let mut anim = Animator::new(Arc::new(model), "hero", cfg);
    anim.play_by_name("Busy", 1.0, true).unwrap();

    let out = anim.update(0.1);
    assert_eq!(out.events.len(), 2);
    assert!(matches!(&out.events[0], AnimEvent::PlaybackStarted { .. }));
    assert!(matches!(
        &out.events[1],
        AnimEvent::MarkerCrossed { script, .. } if script == "a"
    ));
}

/// it should produce identical outputs for identical update sequences
#[test]
fn matching_updates_yield_identical_outputs() {
    let model = soldier();
    let mut a = Animator::new(Arc::clone(&model), "hero", Config::default());
    let mut b = Animator::new(Arc::clone(&model), "hero", Config::default());

    a.play_by_name("Walk", 1.5, true).unwrap();
    b.play_by_name("Walk", 1.5, true).unwrap();
    for dt in [0.1, 0.016, 0.3, 0.0, 0.25] {
        let out_a = serde_json::to_string(a.update(dt)).unwrap();
        let out_b = serde_json::to_string(b.update(dt)).unwrap();
        assert_eq!(out_a, out_b);
    }
}

#[derive(Default)]
struct TransformRecorder {
    applied: Vec<BoneId>,
}

impl TransformSink for TransformRecorder {
    fn apply(&mut self, bone: BoneId, _transform: &BoneTransform) {
        self.applied.push(bone);
    }
}

#[derive(Default)]
struct EventRecorder {
    seen: Vec<(String, AnimEvent)>,
}

impl EventSink for EventRecorder {
    fn notify(&mut self, entity: &str, event: &AnimEvent) {
        self.seen.push((entity.to_string(), event.clone()));
    }
}

/// it should forward every change and event of a step into the host sinks
#[test]
fn drive_forwards_changes_and_events_to_sinks() {
    let mut anim = animator();
    anim.play_by_name("Walk", 1.0, true).unwrap();

    let mut transforms = TransformRecorder::default();
    let mut events = EventRecorder::default();
    anim.drive(0.3, &mut transforms, &mut events);

    assert_eq!(transforms.applied.len(), 4);
    assert_eq!(events.seen.len(), 2);
    for (entity, _) in &events.seen {
        assert_eq!(entity, "hero");
    }
    assert!(matches!(&events.seen[0].1, AnimEvent::PlaybackStarted { .. }));
    assert!(matches!(&events.seen[1].1, AnimEvent::MarkerCrossed { .. }));
}
