//! Bone rotation registry.
//!
//! Derived renderable formats cannot represent multi-axis rotation, so the
//! authored rotations are stripped when those assets are generated. Asset
//! processing records them here, keyed by model key + bone id, and the FK
//! composer reapplies them at playback time. Population is
//! write-once-per-model-per-bone and read-many; processing and playback may
//! run on different execution contexts, so access goes through an RwLock.

use std::sync::RwLock;

use hashbrown::HashMap;
use log::debug;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::math::quat_from_euler_deg;
use crate::model::Model;
use crate::rig::BoneId;

/// Authored orientation captured before a derived asset strips it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OriginalRotation {
    pub euler_deg: [f32; 3],
    /// Quaternion for `euler_deg`, precomputed at insert.
    pub quat: [f32; 4],
    /// Original rotations of the bone's display elements, in element order.
    #[serde(default)]
    pub elements: Vec<[f32; 3]>,
}

#[derive(Debug, Default)]
pub struct RotationRegistry {
    inner: RwLock<HashMap<String, HashMap<BoneId, OriginalRotation>>>,
}

static GLOBAL: Lazy<RotationRegistry> = Lazy::new(RotationRegistry::default);

/// Process-wide registry shared between asset processing and playback.
/// Hosts must call `clear_model`/`clear` on asset unload or reload.
pub fn global() -> &'static RotationRegistry {
    &GLOBAL
}

impl RotationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a bone's authored rotation. The first write wins; re-inserting
    /// an already-registered bone is a no-op.
    pub fn insert(
        &self,
        model: &str,
        bone: BoneId,
        euler_deg: [f32; 3],
        elements: Vec<[f32; 3]>,
    ) {
        // A poisoned lock only means a writer panicked mid-insert; the map
        // itself stays usable.
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let bones = map.entry(model.to_string()).or_default();
        if bones.contains_key(&bone) {
            debug!("rotation registry: ignoring repopulation of {model}/{}", bone.0);
            return;
        }
        bones.insert(
            bone,
            OriginalRotation {
                euler_deg,
                quat: quat_from_euler_deg(euler_deg),
                elements,
            },
        );
    }

    /// Record every bone of a model in one pass (no element rotations).
    pub fn register_model(&self, model: &Model) {
        for bone in model.rig.bones() {
            self.insert(&model.key, bone.id, bone.rotation_deg, Vec::new());
        }
        debug!(
            "rotation registry: registered {} bones for '{}'",
            model.rig.len(),
            model.key
        );
    }

    pub fn get(&self, model: &str, bone: BoneId) -> Option<OriginalRotation> {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.get(model).and_then(|bones| bones.get(&bone)).cloned()
    }

    /// Correction quaternion for the FK hot path; copies out without
    /// touching the element list.
    #[inline]
    pub fn correction_quat(&self, model: &str, bone: BoneId) -> Option<[f32; 4]> {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.get(model).and_then(|bones| bones.get(&bone)).map(|r| r.quat)
    }

    pub fn contains_model(&self, model: &str) -> bool {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.contains_key(model)
    }

    /// Drop one model's entries (host hook for asset unload/reload).
    pub fn clear_model(&self, model: &str) {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if map.remove(model).is_some() {
            debug!("rotation registry: cleared '{model}'");
        }
    }

    /// Drop everything (host hook for a full asset reload).
    pub fn clear(&self) {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        map.clear();
        debug!("rotation registry: cleared all models");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_get_round_trips() {
        let registry = RotationRegistry::new();
        registry.insert("biped", BoneId(2), [0.0, 45.0, 0.0], vec![[10.0, 0.0, 0.0]]);

        let entry = registry.get("biped", BoneId(2)).unwrap();
        assert_eq!(entry.euler_deg, [0.0, 45.0, 0.0]);
        assert_eq!(entry.elements.len(), 1);
        assert_eq!(
            registry.correction_quat("biped", BoneId(2)),
            Some(entry.quat)
        );
        assert!(registry.get("biped", BoneId(3)).is_none());
        assert!(registry.get("other", BoneId(2)).is_none());
    }

    #[test]
    fn register_model_records_every_bone() {
        use crate::model::Model;
        use crate::rig::{Bone, Rig};

        let rig = Rig::new(
            "pair",
            vec![
                Bone::new(BoneId(0), "root")
                    .with_rotation_deg([0.0, 30.0, 0.0])
                    .with_children(vec![BoneId(1)]),
                Bone::new(BoneId(1), "tip").with_parent(BoneId(0)),
            ],
        )
        .unwrap();
        let model = Model::new("pair", rig);

        let registry = RotationRegistry::new();
        registry.register_model(&model);
        assert!(registry.contains_model("pair"));
        assert_eq!(
            registry.get("pair", BoneId(0)).unwrap().euler_deg,
            [0.0, 30.0, 0.0]
        );
        assert!(registry.get("pair", BoneId(1)).is_some());
    }

    #[test]
    fn first_write_wins() {
        let registry = RotationRegistry::new();
        registry.insert("biped", BoneId(0), [0.0, 90.0, 0.0], Vec::new());
        registry.insert("biped", BoneId(0), [0.0, 0.0, 0.0], Vec::new());
        let entry = registry.get("biped", BoneId(0)).unwrap();
        assert_eq!(entry.euler_deg, [0.0, 90.0, 0.0]);
    }

    #[test]
    fn clear_hooks_scope_by_model() {
        let registry = RotationRegistry::new();
        registry.insert("a", BoneId(0), [1.0, 0.0, 0.0], Vec::new());
        registry.insert("b", BoneId(0), [2.0, 0.0, 0.0], Vec::new());

        registry.clear_model("a");
        assert!(!registry.contains_model("a"));
        assert!(registry.contains_model("b"));

        registry.clear();
        assert!(!registry.contains_model("b"));
    }

    #[test]
    fn concurrent_population_is_safe() {
        let registry = std::sync::Arc::new(RotationRegistry::new());
        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let registry = std::sync::Arc::clone(&registry);
                std::thread::spawn(move || {
                    let model = format!("model-{worker}");
                    for bone in 0..32 {
                        registry.insert(&model, BoneId(bone), [bone as f32, 0.0, 0.0], Vec::new());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        for worker in 0..4 {
            let model = format!("model-{worker}");
            assert!(registry.contains_model(&model));
            assert!(registry.get(&model, BoneId(31)).is_some());
        }
    }
}
