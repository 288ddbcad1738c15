//! Animation clip data model: per-bone keyframe tracks, event markers, and
//! loop policy. Clips are immutable once constructed and shared read-only
//! (`Arc<Clip>`) across every entity playing them.

use serde::{Deserialize, Serialize};

use crate::rig::BoneId;

/// Interpolation kind of the segment starting at a keyframe.
///
/// Closed set: every evaluator dispatches over exactly these four.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interp {
    #[default]
    Linear,
    Step,
    CatmullRom,
    Bezier,
}

impl Interp {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Step => "step",
            Self::CatmullRom => "catmullrom",
            Self::Bezier => "bezier",
        }
    }
}

impl From<&str> for Interp {
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "step" => Self::Step,
            "catmullrom" => Self::CatmullRom,
            "bezier" => Self::Bezier,
            _ => Self::Linear,
        }
    }
}

/// Per-keyframe Bezier control handles, as offsets from the keyframe value
/// (Euler-degree deltas on rotation keyframes). `in` shapes the arrival at
/// this keyframe, `out` the departure from it. Only Bezier segments read
/// them; a missing side degenerates to the segment endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Handles {
    #[serde(default)]
    #[serde(rename = "in")]
    pub r#in: Option<[f32; 3]>,
    #[serde(default)]
    #[serde(rename = "out")]
    pub out: Option<[f32; 3]>,
}

/// Position or scale keyframe.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VectorKeyframe {
    /// Seconds from clip start.
    pub time: f32,
    pub value: [f32; 3],
    #[serde(default)]
    pub interp: Interp,
    #[serde(default)]
    pub handles: Option<Handles>,
}

impl VectorKeyframe {
    pub fn new(time: f32, value: [f32; 3]) -> Self {
        Self {
            time,
            value,
            interp: Interp::Linear,
            handles: None,
        }
    }

    pub fn with_interp(mut self, interp: Interp) -> Self {
        self.interp = interp;
        self
    }

    pub fn with_handles(mut self, handles: Handles) -> Self {
        self.handles = Some(handles);
        self
    }
}

/// Rotation keyframe: authored Euler degrees plus an optional precomputed
/// quaternion. Evaluation prefers the quaternion and falls back to the
/// Euler value when none is stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotationKeyframe {
    /// Seconds from clip start.
    pub time: f32,
    pub euler_deg: [f32; 3],
    /// Precomputed (x, y, z, w) quaternion for the Euler value.
    #[serde(default)]
    pub quat: Option<[f32; 4]>,
    #[serde(default)]
    pub interp: Interp,
    /// Euler-space deltas, read only by Bezier segments.
    #[serde(default)]
    pub handles: Option<Handles>,
}

impl RotationKeyframe {
    pub fn new(time: f32, euler_deg: [f32; 3]) -> Self {
        Self {
            time,
            euler_deg,
            quat: None,
            interp: Interp::Linear,
            handles: None,
        }
    }

    pub fn with_quat(mut self, quat: [f32; 4]) -> Self {
        self.quat = Some(quat);
        self
    }

    pub fn with_interp(mut self, interp: Interp) -> Self {
        self.interp = interp;
        self
    }

    pub fn with_handles(mut self, handles: Handles) -> Self {
        self.handles = Some(handles);
        self
    }
}

/// Up to three independent keyframe tracks for one bone.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoneTrack {
    #[serde(default)]
    pub position: Vec<VectorKeyframe>,
    #[serde(default)]
    pub rotation: Vec<RotationKeyframe>,
    #[serde(default)]
    pub scale: Vec<VectorKeyframe>,
}

impl BoneTrack {
    pub fn is_empty(&self) -> bool {
        self.position.is_empty() && self.rotation.is_empty() && self.scale.is_empty()
    }
}

/// Discrete trigger point on the clip timeline. The interpolation kind is
/// carried by the asset format but never evaluated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventMarker {
    /// Seconds from clip start.
    pub time: f32,
    /// Script identifier handed to the event sink.
    pub script: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub interp: Interp,
}

impl EventMarker {
    pub fn new(time: f32, script: impl Into<String>) -> Self {
        Self {
            time,
            script: script.into(),
            channel: String::new(),
            interp: Interp::Linear,
        }
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }
}

/// Policy for query times beyond the clip length.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum LoopMode {
    /// Wrap time into [0, length).
    #[default]
    Loop,
    /// Clamp time and keep emitting the last evaluated pose.
    Hold,
    /// Clamp time and let the controller mark playback finished.
    Once,
}

/// A named, immutable animation clip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    /// Lookup key; matching is ASCII-case-insensitive.
    pub name: String,
    /// Total length in seconds (> 0).
    pub length: f32,
    #[serde(default)]
    pub loop_mode: LoopMode,
    /// Per-bone tracks; bones without a pair here hold their rest pose.
    #[serde(default)]
    pub tracks: Vec<(BoneId, BoneTrack)>,
    /// Trigger points ordered by time.
    #[serde(default)]
    pub markers: Vec<EventMarker>,
}

impl Clip {
    pub fn new(name: impl Into<String>, length: f32, loop_mode: LoopMode) -> Self {
        Self {
            name: name.into(),
            length,
            loop_mode,
            tracks: Vec::new(),
            markers: Vec::new(),
        }
    }

    pub fn track(&self, bone: BoneId) -> Option<&BoneTrack> {
        self.tracks.iter().find(|(id, _)| *id == bone).map(|(_, t)| t)
    }

    /// Validate basic invariants (positive finite length, per-track time
    /// ordering within [0, length], marker ordering).
    pub fn validate_basic(&self) -> Result<(), String> {
        if !self.length.is_finite() || self.length <= 0.0 {
            return Err(format!("Clip '{}' length must be > 0 seconds", self.name));
        }
        for (bone, track) in &self.tracks {
            check_times(
                track.position.iter().map(|k| k.time),
                self.length,
                &format!("position track of bone {}", bone.0),
            )?;
            check_times(
                track.rotation.iter().map(|k| k.time),
                self.length,
                &format!("rotation track of bone {}", bone.0),
            )?;
            check_times(
                track.scale.iter().map(|k| k.time),
                self.length,
                &format!("scale track of bone {}", bone.0),
            )?;
        }
        check_times(self.markers.iter().map(|m| m.time), self.length, "markers")?;
        Ok(())
    }
}

fn check_times(times: impl Iterator<Item = f32>, length: f32, what: &str) -> Result<(), String> {
    let mut last = -f32::INFINITY;
    for time in times {
        if !time.is_finite() || time < 0.0 || time > length {
            return Err(format!("Keyframe time must be finite in [0, length] for {what}"));
        }
        if time < last {
            return Err(format!("Keyframe times must be non-decreasing for {what}"));
        }
        last = time;
    }
    Ok(())
}
