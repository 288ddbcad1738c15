//! A model pairs one rig with the clip set authored for it. Clips are held
//! behind `Arc` so every animator playing the model shares the same
//! read-only data.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::clip::Clip;
use crate::error::AnimError;
use crate::rig::Rig;
use crate::Result;

/// Serialized shape of a model. Deserialization goes through `TryFrom` so
/// every clip is re-validated on the way in.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct ModelData {
    key: String,
    rig: Rig,
    #[serde(default)]
    clips: Vec<Clip>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "ModelData", into = "ModelData")]
pub struct Model {
    /// Asset key; also the rotation-registry key for this model.
    pub key: String,
    pub rig: Rig,
    clips: Vec<Arc<Clip>>,
}

impl From<Model> for ModelData {
    fn from(model: Model) -> Self {
        Self {
            key: model.key,
            rig: model.rig,
            clips: model.clips.iter().map(|c| (**c).clone()).collect(),
        }
    }
}

impl TryFrom<ModelData> for Model {
    type Error = AnimError;

    fn try_from(data: ModelData) -> Result<Self> {
        let mut model = Model::new(data.key, data.rig);
        for clip in data.clips {
            model.add_clip(clip)?;
        }
        Ok(model)
    }
}

impl Model {
    pub fn new(key: impl Into<String>, rig: Rig) -> Self {
        Self {
            key: key.into(),
            rig,
            clips: Vec::new(),
        }
    }

    /// Validate and attach a clip.
    pub fn add_clip(&mut self, clip: Clip) -> Result<Arc<Clip>> {
        clip.validate_basic().map_err(|reason| AnimError::InvalidClip {
            clip: clip.name.clone(),
            reason,
        })?;
        let clip = Arc::new(clip);
        self.clips.push(Arc::clone(&clip));
        Ok(clip)
    }

    #[inline]
    pub fn clips(&self) -> &[Arc<Clip>] {
        &self.clips
    }

    /// Look up a clip by name, ASCII-case-insensitively.
    pub fn clip_by_name(&self, name: &str) -> Option<&Arc<Clip>> {
        self.clips.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }
}
