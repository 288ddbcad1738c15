//! Bone hierarchy: an arena of bones with a cached parents-first traversal
//! order. Structural validation happens once at load; the runtime assumes an
//! acyclic, fully linked hierarchy afterwards.

use serde::{Deserialize, Serialize};

use crate::error::AnimError;
use crate::Result;

/// Stable bone identifier; indexes the rig's bone arena.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoneId(pub u32);

impl BoneId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

fn default_visible() -> bool {
    true
}

/// A named node in the skeletal hierarchy.
///
/// `rotation_deg` is the authored orientation in degrees. Derived asset
/// formats strip it; playback restores it through the rotation registry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bone {
    pub id: BoneId,
    pub name: String,
    /// Rotation origin in the parent's local frame.
    #[serde(default)]
    pub pivot: [f32; 3],
    /// Authored rotation in degrees; may be non-axis-aligned.
    #[serde(default)]
    pub rotation_deg: [f32; 3],
    #[serde(default)]
    pub parent: Option<BoneId>,
    /// Ordered child ids; must agree with the children's `parent` fields.
    #[serde(default)]
    pub children: Vec<BoneId>,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

impl Bone {
    pub fn new(id: BoneId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            pivot: [0.0; 3],
            rotation_deg: [0.0; 3],
            parent: None,
            children: Vec::new(),
            visible: true,
        }
    }

    pub fn with_pivot(mut self, pivot: [f32; 3]) -> Self {
        self.pivot = pivot;
        self
    }

    pub fn with_rotation_deg(mut self, rotation_deg: [f32; 3]) -> Self {
        self.rotation_deg = rotation_deg;
        self
    }

    pub fn with_parent(mut self, parent: BoneId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_children(mut self, children: Vec<BoneId>) -> Self {
        self.children = children;
        self
    }
}

/// Wire form of a rig: the authored bone list without derived state.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct RigData {
    name: String,
    bones: Vec<Bone>,
}

/// An immutable bone arena plus its cached topological traversal order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RigData", into = "RigData")]
pub struct Rig {
    pub name: String,
    bones: Vec<Bone>,
    topo: Vec<BoneId>,
}

impl Rig {
    /// Validate the authored hierarchy and cache the traversal order.
    ///
    /// Bone ids must be dense arena indices; parent and child links must be
    /// bidirectionally consistent. A cyclic graph is fatal here so playback
    /// never has to re-check it.
    pub fn new(name: impl Into<String>, bones: Vec<Bone>) -> Result<Self> {
        let name = name.into();
        let invalid = |reason: String| AnimError::InvalidRig {
            rig: name.clone(),
            reason,
        };

        for (idx, bone) in bones.iter().enumerate() {
            if bone.id.index() != idx {
                return Err(invalid(format!(
                    "bone '{}' has id {} but sits at arena index {}",
                    bone.name, bone.id.0, idx
                )));
            }
        }
        for bone in &bones {
            if let Some(parent) = bone.parent {
                if parent == bone.id {
                    return Err(invalid(format!("bone '{}' is its own parent", bone.name)));
                }
                let Some(parent_bone) = bones.get(parent.index()) else {
                    return Err(invalid(format!(
                        "bone '{}' references missing parent {}",
                        bone.name, parent.0
                    )));
                };
                if !parent_bone.children.contains(&bone.id) {
                    return Err(invalid(format!(
                        "bone '{}' is absent from the children of '{}'",
                        bone.name, parent_bone.name
                    )));
                }
            }
            for &child in &bone.children {
                let linked = bones
                    .get(child.index())
                    .map(|c| c.parent == Some(bone.id))
                    .unwrap_or(false);
                if !linked {
                    return Err(invalid(format!(
                        "child {} of bone '{}' does not link back",
                        child.0, bone.name
                    )));
                }
            }
        }

        // Roots first, then children as their parents resolve. Every bone
        // has at most one parent, so anything a root cannot reach sits on a
        // cycle.
        let mut topo = Vec::with_capacity(bones.len());
        let mut placed = vec![false; bones.len()];
        for bone in &bones {
            if bone.parent.is_none() {
                topo.push(bone.id);
                placed[bone.id.index()] = true;
            }
        }
        let mut cursor = 0;
        while cursor < topo.len() {
            let current = topo[cursor];
            cursor += 1;
            for &child in &bones[current.index()].children {
                if !placed[child.index()] {
                    topo.push(child);
                    placed[child.index()] = true;
                }
            }
        }
        if topo.len() != bones.len() {
            return Err(invalid("cycle in parent/child graph".to_string()));
        }

        Ok(Self { name, bones, topo })
    }

    #[inline]
    pub fn get(&self, id: BoneId) -> Option<&Bone> {
        self.bones.get(id.index())
    }

    pub fn bone_by_name(&self, name: &str) -> Option<&Bone> {
        self.bones.iter().find(|b| b.name == name)
    }

    #[inline]
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// Parents-before-children order, computed once at load.
    #[inline]
    pub fn topo_order(&self) -> &[BoneId] {
        &self.topo
    }
}

impl From<Rig> for RigData {
    fn from(rig: Rig) -> Self {
        Self {
            name: rig.name,
            bones: rig.bones,
        }
    }
}

impl TryFrom<RigData> for Rig {
    type Error = AnimError;

    fn try_from(data: RigData) -> Result<Self> {
        Rig::new(data.name, data.bones)
    }
}
