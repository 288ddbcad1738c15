//! Shared fixtures for the armature crates: canned JSON assets under the
//! repo-level `fixtures/` directory, plus programmatic builders with
//! hand-checkable values for tests that assert exact numbers.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    models: HashMap<String, String>,
    clips: HashMap<String, String>,
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a, T>(map: &'a HashMap<String, T>, kind: &str, name: &str) -> Result<&'a T> {
    map.get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

pub mod models {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.models.keys().cloned().collect()
    }

    pub fn json(name: &str) -> Result<String> {
        let rel = lookup(&MANIFEST.models, "model", name)?;
        read_to_string(rel)
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let rel = lookup(&MANIFEST.models, "model", name)?;
        super::load_json(rel)
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let rel = lookup(&MANIFEST.models, "model", name)?;
        Ok(resolve_path(rel))
    }
}

pub mod clips {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.clips.keys().cloned().collect()
    }

    pub fn json(name: &str) -> Result<String> {
        let rel = lookup(&MANIFEST.clips, "clip", name)?;
        read_to_string(rel)
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let rel = lookup(&MANIFEST.clips, "clip", name)?;
        super::load_json(rel)
    }
}

pub mod build {
    //! Deterministic in-memory assets. Every value here is chosen so test
    //! expectations can be worked out by hand.

    use armature_animation_core::{
        Bone, BoneId, BoneTrack, Clip, EventMarker, LoopMode, Model, Rig, RotationKeyframe,
        VectorKeyframe,
    };

    /// Hips with a torso/head chain and one leg off to the side: enough
    /// branching to exercise parents-first traversal.
    pub fn biped_rig() -> Rig {
        Rig::new(
            "biped",
            vec![
                Bone::new(BoneId(0), "hips")
                    .with_pivot([0.0, 0.75, 0.0])
                    .with_children(vec![BoneId(1), BoneId(2)]),
                Bone::new(BoneId(1), "torso")
                    .with_pivot([0.0, 1.0, 0.0])
                    .with_parent(BoneId(0))
                    .with_children(vec![BoneId(3)]),
                Bone::new(BoneId(2), "left_leg")
                    .with_pivot([0.12, 0.75, 0.0])
                    .with_rotation_deg([0.0, 0.0, 5.0])
                    .with_parent(BoneId(0)),
                Bone::new(BoneId(3), "head")
                    .with_pivot([0.0, 1.5, 0.0])
                    .with_rotation_deg([0.0, 90.0, 0.0])
                    .with_parent(BoneId(1)),
            ],
        )
        .expect("biped rig should validate")
    }

    /// One-second looping bob on bone 0: position (0,0,0) at t=0 and
    /// (0,1,0) at t=0.5, linear, returning to the start through the
    /// wrap-around segment. Carries a "step" marker at t=0.25.
    pub fn walk_clip() -> Clip {
        let mut track = BoneTrack::default();
        track.position.push(VectorKeyframe::new(0.0, [0.0, 0.0, 0.0]));
        track.position.push(VectorKeyframe::new(0.5, [0.0, 1.0, 0.0]));

        let mut clip = Clip::new("Walk", 1.0, LoopMode::Loop);
        clip.tracks.push((BoneId(0), track));
        clip.markers
            .push(EventMarker::new(0.25, "step").with_channel("footsteps"));
        clip
    }

    /// Half-second Once clip yawing the head from 0 to 60 degrees.
    pub fn wave_clip() -> Clip {
        let mut track = BoneTrack::default();
        track.rotation.push(RotationKeyframe::new(0.0, [0.0, 0.0, 0.0]));
        track.rotation.push(RotationKeyframe::new(0.5, [0.0, 60.0, 0.0]));

        let mut clip = Clip::new("Wave", 0.5, LoopMode::Once);
        clip.tracks.push((BoneId(3), track));
        clip
    }

    pub fn soldier_model() -> Model {
        let mut model = Model::new("soldier", biped_rig());
        model.add_clip(walk_clip()).expect("walk clip should validate");
        model.add_clip(wave_clip()).expect("wave clip should validate");
        model
    }

    /// The same model twice: `source` keeps its authored bone rotations,
    /// `stripped` ships with them zeroed the way derived assets do. Feeding
    /// the source rotations into the registry under the stripped key must
    /// reproduce the source model's output exactly.
    pub fn stripped_pair() -> (Model, Model) {
        let source = soldier_model();

        let mut bones: Vec<Bone> = source.rig.bones().to_vec();
        for bone in &mut bones {
            bone.rotation_deg = [0.0; 3];
        }
        let rig = Rig::new("biped", bones).expect("stripped rig should validate");
        let mut stripped = Model::new("soldier-stripped", rig);
        for clip in source.clips() {
            stripped
                .add_clip((**clip).clone())
                .expect("shared clip should validate");
        }
        (source, stripped)
    }
}
