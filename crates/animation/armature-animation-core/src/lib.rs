//! Armature Animation Core (engine-agnostic)
//!
//! Real-time skeletal animation for hierarchical bone models: keyframed
//! clips sampled per tick, cross-fade blending on clip changes, forward
//! kinematics over the rig, and resolved transforms plus semantic events
//! pushed out through host sink traits. Asset loading, rendering and
//! scheduling stay on the host side; this crate does bounded synchronous
//! work per `Animator::update` call.

pub mod animator;
pub mod clip;
pub mod config;
pub mod error;
pub mod fk;
pub mod math;
pub mod model;
pub mod outputs;
pub mod playback;
pub mod registry;
pub mod rig;
pub mod sampling;
pub mod sink;

/// Crate-wide result alias.
pub type Result<T> = core::result::Result<T, error::AnimError>;

// Re-exports for consumers (adapters)
pub use animator::Animator;
pub use clip::{BoneTrack, Clip, EventMarker, Handles, Interp, LoopMode, RotationKeyframe, VectorKeyframe};
pub use config::{Config, DEFAULT_BLEND_DURATION};
pub use error::AnimError;
pub use fk::{blend_transforms, compose_bone, BoneTransform, Pose};
pub use model::Model;
pub use outputs::{AnimEvent, BoneChange, TickOutputs};
pub use playback::{Blend, BlendSnapshot, PlaybackPhase, PlaybackState};
pub use registry::{global as rotation_registry, OriginalRotation, RotationRegistry};
pub use rig::{Bone, BoneId, Rig};
pub use sampling::{normalize_time, sample_rotation, sample_vector};
pub use sink::{EventSink, NullSink, TransformSink};
