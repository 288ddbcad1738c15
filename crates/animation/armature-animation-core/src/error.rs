//! Error types for the skeletal animation runtime

use serde::{Deserialize, Serialize};

/// Error type for animation operations
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum AnimError {
    /// Clip name not present on the model
    #[error("Clip not found: {name}")]
    ClipNotFound { name: String },

    /// Bone id outside the rig arena
    #[error("Bone not found: {bone} in rig {rig}")]
    BoneNotFound { rig: String, bone: u32 },

    /// Non-positive or non-finite playback speed
    #[error("Invalid playback speed: {speed}")]
    InvalidSpeed { speed: f32 },

    /// Rig failed load-time validation (cycle, dangling parent, bad id)
    #[error("Invalid rig {rig}: {reason}")]
    InvalidRig { rig: String, reason: String },

    /// Clip failed load-time validation
    #[error("Invalid clip {clip}: {reason}")]
    InvalidClip { clip: String, reason: String },

    /// Requested playback transition is not legal from the current phase
    #[error("Invalid playback phase: {current} -> {requested}")]
    InvalidPhase { current: String, requested: String },

    /// Serialization error
    #[error("Serialization error: {reason}")]
    Serialization { reason: String },
}

impl AnimError {
    /// Get error category for logging/metrics
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::ClipNotFound { .. } | Self::BoneNotFound { .. } => "lookup",
            Self::InvalidSpeed { .. } | Self::InvalidRig { .. } | Self::InvalidClip { .. } => {
                "validation"
            }
            Self::InvalidPhase { .. } => "playback",
            Self::Serialization { .. } => "serialization",
        }
    }

    /// Lookup failures leave state untouched and may be retried by the caller.
    #[inline]
    pub fn is_lookup(&self) -> bool {
        matches!(self, Self::ClipNotFound { .. } | Self::BoneNotFound { .. })
    }
}

impl From<serde_json::Error> for AnimError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}
