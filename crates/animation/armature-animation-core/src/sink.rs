//! Sink traits between the animator and the host engine.
//!
//! The animator pushes resolved transforms and semantic events through these
//! seams. Hosts (scene graphs, proxy entity mappers, test harnesses)
//! implement them over whatever representation they drive.

use crate::fk::BoneTransform;
use crate::outputs::AnimEvent;
use crate::rig::BoneId;

/// Receives the resolved world-relative transform of each mapped bone, once
/// per tick. Implementors decide how a `BoneId` maps onto host entities.
pub trait TransformSink {
    fn apply(&mut self, bone: BoneId, transform: &BoneTransform);
}

/// Receives semantic playback events in the order they occurred within the
/// tick. `entity` is the animator's entity name.
pub trait EventSink {
    fn notify(&mut self, entity: &str, event: &AnimEvent);
}

/// Discards everything it receives. Stands in when one of the two channels
/// is unused.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl TransformSink for NullSink {
    fn apply(&mut self, _bone: BoneId, _transform: &BoneTransform) {}
}

impl EventSink for NullSink {
    fn notify(&mut self, _entity: &str, _event: &AnimEvent) {}
}
