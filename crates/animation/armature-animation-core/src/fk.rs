//! Forward kinematics: compose evaluated bone-local poses through the
//! parent chain into world-relative transforms, one parents-first pass per
//! tick.

use serde::{Deserialize, Serialize};

use crate::math::{
    add_vec3, lerp_vec3, mul_vec3, quat_mul, rotate_vec3, slerp_quat, sub_vec3, QUAT_IDENTITY,
    VEC3_ONE, VEC3_ZERO,
};
use crate::rig::{Bone, BoneId, Rig};

/// Translation/rotation/scale triple. Serves both as the evaluated
/// bone-local pose and as the resolved transform handed to proxy mappers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoneTransform {
    pub translation: [f32; 3],
    /// Quaternion (x, y, z, w).
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

impl BoneTransform {
    pub const IDENTITY: Self = Self {
        translation: VEC3_ZERO,
        rotation: QUAT_IDENTITY,
        scale: VEC3_ONE,
    };
}

impl Default for BoneTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Mix two poses channel-wise: lerp on translation and scale, slerp on
/// rotation. `alpha` = 1 selects `to` entirely.
#[inline]
pub fn blend_transforms(from: &BoneTransform, to: &BoneTransform, alpha: f32) -> BoneTransform {
    BoneTransform {
        translation: lerp_vec3(from.translation, to.translation, alpha),
        rotation: slerp_quat(from.rotation, to.rotation, alpha),
        scale: lerp_vec3(from.scale, to.scale, alpha),
    }
}

/// Resolve one bone against its already-resolved parent.
///
/// The local motion rotates and scales about the bone's pivot:
/// `p' = anim_t + pivot + R·(S ⊙ (p − pivot))` with
/// `R = anim_rot ∘ correction` (the authored rotation is the base frame,
/// the animated rotation turns on top of it). Folding the pivot into the
/// translation keeps the chain in plain TRS form; scale composes
/// component-wise, so non-uniform parent scale does not shear children.
pub fn compose_bone(
    pivot: [f32; 3],
    local: &BoneTransform,
    correction: [f32; 4],
    parent: Option<&BoneTransform>,
) -> BoneTransform {
    let rotation = quat_mul(local.rotation, correction);
    let spun = rotate_vec3(rotation, mul_vec3(local.scale, pivot));
    let translation = sub_vec3(add_vec3(local.translation, pivot), spun);
    match parent {
        None => BoneTransform {
            translation,
            rotation,
            scale: local.scale,
        },
        Some(p) => BoneTransform {
            translation: add_vec3(
                p.translation,
                rotate_vec3(p.rotation, mul_vec3(p.scale, translation)),
            ),
            rotation: quat_mul(p.rotation, rotation),
            scale: mul_vec3(p.scale, local.scale),
        },
    }
}

/// Resolved transforms for every bone of one entity. Recomputed every tick;
/// direct writes between ticks are transient.
#[derive(Clone, Debug, Default)]
pub struct Pose {
    transforms: Vec<BoneTransform>,
}

impl Pose {
    pub fn new(bone_count: usize) -> Self {
        Self {
            transforms: vec![BoneTransform::IDENTITY; bone_count],
        }
    }

    /// Recompute every bone in one parents-first pass over the rig's cached
    /// order. `correction` supplies the original authored rotation for each
    /// bone (registry entry, else the bone's own authored value).
    pub fn compose(
        &mut self,
        rig: &Rig,
        locals: &[BoneTransform],
        correction: &dyn Fn(&Bone) -> [f32; 4],
    ) {
        debug_assert_eq!(locals.len(), rig.len());
        self.transforms.resize(rig.len(), BoneTransform::IDENTITY);
        for &id in rig.topo_order() {
            let bone = &rig.bones()[id.index()];
            let parent = bone.parent.map(|p| self.transforms[p.index()]);
            self.transforms[id.index()] = compose_bone(
                bone.pivot,
                &locals[id.index()],
                correction(bone),
                parent.as_ref(),
            );
        }
    }

    /// Shift every resolved translation's vertical component. Output-only
    /// post-pass; authored pivot data is untouched.
    pub fn adjust_translations_y(&mut self, offset: f32) {
        for t in &mut self.transforms {
            t.translation[1] += offset;
        }
    }

    /// Reset every resolved transform to the identity.
    pub fn set_identity(&mut self) {
        for t in &mut self.transforms {
            *t = BoneTransform::IDENTITY;
        }
    }

    #[inline]
    pub fn get(&self, id: BoneId) -> Option<&BoneTransform> {
        self.transforms.get(id.index())
    }

    #[inline]
    pub fn transforms(&self) -> &[BoneTransform] {
        &self.transforms
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn set_rotation(&mut self, id: BoneId, rotation: [f32; 4]) -> bool {
        match self.transforms.get_mut(id.index()) {
            Some(t) => {
                t.rotation = rotation;
                true
            }
            None => false,
        }
    }

    pub fn set_translation(&mut self, id: BoneId, translation: [f32; 3]) -> bool {
        match self.transforms.get_mut(id.index()) {
            Some(t) => {
                t.translation = translation;
                true
            }
            None => false,
        }
    }

    pub fn set_scale(&mut self, id: BoneId, scale: [f32; 3]) -> bool {
        match self.transforms.get_mut(id.index()) {
            Some(t) => {
                t.scale = scale;
                true
            }
            None => false,
        }
    }
}
