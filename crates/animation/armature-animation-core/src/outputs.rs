//! Output contracts from the animator.
//!
//! Outputs carry only the resolved bone transforms for this tick plus a
//! separate list of semantic events. Engine adapters apply changes to the
//! host scene and transport events.

use serde::{Deserialize, Serialize};

use crate::fk::BoneTransform;
use crate::rig::BoneId;

/// One resolved bone transform for this tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoneChange {
    pub bone: BoneId,
    pub transform: BoneTransform,
}

/// Discrete semantic signals emitted during stepping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum AnimEvent {
    PlaybackStarted {
        clip: String,
    },
    PlaybackEnded {
        clip: String,
        clip_time: f32,
    },
    BlendFinished {
        clip: String,
    },
    MarkerCrossed {
        script: String,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        channel: String,
        clip_time: f32,
    },
}

/// Outputs returned by Animator::update().
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TickOutputs {
    #[serde(default)]
    pub changes: Vec<BoneChange>,
    #[serde(default)]
    pub events: Vec<AnimEvent>,
}

impl TickOutputs {
    #[inline]
    pub fn clear(&mut self) {
        self.changes.clear();
        self.events.clear();
    }

    #[inline]
    pub fn push_change(&mut self, change: BoneChange) {
        self.changes.push(change);
    }

    #[inline]
    pub fn push_event(&mut self, event: AnimEvent) {
        self.events.push(event);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.events.is_empty()
    }
}
