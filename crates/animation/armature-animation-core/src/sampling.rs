//! Timeline evaluation over sparse keyframe tracks.
//!
//! Model:
//! - Keyframe times are seconds from clip start, ordered non-decreasing.
//! - The segment [k_i -> k_(i+1)] is shaped by k_i's interpolation kind.
//! - Looped tracks close the cycle: past the last keyframe the value runs
//!   back toward the first keyframe, treated as sitting at `length`.
//! - Non-loop queries clamp to the first/last keyframe; no extrapolation.
//!
//! API:
//! - normalize_time(t, length, mode)
//! - sample_vector / sample_rotation at an already-normalized time.

use crate::clip::{Interp, LoopMode, RotationKeyframe, VectorKeyframe};
use crate::math::{
    add_vec3, catmull_rom_vec3, cubic_bezier_vec3, lerp_vec3, quat_from_euler_deg, slerp_quat,
    VEC3_ZERO,
};

/// Map a raw query time into the clip's evaluable range per loop policy.
/// Loop wraps into [0, length); Hold and Once clamp into [0, length].
#[inline]
pub fn normalize_time(t: f32, length: f32, mode: LoopMode) -> f32 {
    if !(length > 0.0) {
        return 0.0;
    }
    match mode {
        LoopMode::Loop => t.rem_euclid(length),
        LoopMode::Hold | LoopMode::Once => t.clamp(0.0, length),
    }
}

/// Locate the bracketing pair for time `t`: (left, right, alpha).
///
/// `left == right` means the caller holds that keyframe's value (clamped
/// edges and degenerate intervals). On looped tracks the closing segment
/// wraps, so `right` may come back as index 0 with the first keyframe
/// standing at `length`.
fn find_segment(
    n: usize,
    time_at: &dyn Fn(usize) -> f32,
    t: f32,
    length: f32,
    looped: bool,
) -> (usize, usize, f32) {
    debug_assert!(n >= 2);
    if t <= time_at(0) {
        return (0, 0, 0.0);
    }
    let last = n - 1;
    let last_time = time_at(last);
    if t >= last_time {
        if looped && length > last_time {
            let alpha = ((t - last_time) / (length - last_time)).clamp(0.0, 1.0);
            return (last, 0, alpha);
        }
        return (last, last, 0.0);
    }
    // Invariant: time_at(lo) <= t < time_at(hi).
    let mut lo = 0usize;
    let mut hi = last;
    while hi - lo > 1 {
        let mid = (lo + hi) / 2;
        if time_at(mid) <= t {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    let t0 = time_at(lo);
    let denom = time_at(hi) - t0;
    if denom <= f32::EPSILON {
        // Degenerate interval: hold the left value rather than divide.
        return (lo, lo, 0.0);
    }
    (lo, hi, ((t - t0) / denom).clamp(0.0, 1.0))
}

/// Sample a position or scale track at an already-normalized time.
/// `default` is the track's implicit rest value and doubles as the result
/// for an empty track (the engine passes zero translation or unit scale).
pub fn sample_vector(
    track: &[VectorKeyframe],
    t: f32,
    length: f32,
    looped: bool,
    default: [f32; 3],
) -> [f32; 3] {
    let n = track.len();
    match n {
        0 => default,
        1 => track[0].value,
        _ => {
            let (i0, i1, alpha) = find_segment(n, &|i| track[i].time, t, length, looped);
            if i0 == i1 {
                return track[i0].value;
            }
            let left = &track[i0];
            let right = &track[i1];
            match left.interp {
                Interp::Step => left.value,
                Interp::Linear => lerp_vec3(left.value, right.value, alpha),
                Interp::CatmullRom => {
                    let prev = if i0 > 0 { track[i0 - 1].value } else { left.value };
                    let next = if i1 > i0 && i1 + 1 < n {
                        track[i1 + 1].value
                    } else {
                        right.value
                    };
                    catmull_rom_vec3(prev, left.value, right.value, next, alpha)
                }
                Interp::Bezier => {
                    let out = left.handles.and_then(|h| h.out).unwrap_or(VEC3_ZERO);
                    let inn = right.handles.and_then(|h| h.r#in).unwrap_or(VEC3_ZERO);
                    cubic_bezier_vec3(
                        left.value,
                        add_vec3(left.value, out),
                        add_vec3(right.value, inn),
                        right.value,
                        alpha,
                    )
                }
            }
        }
    }
}

/// Quaternion carried by a rotation keyframe: the precomputed value when
/// stored, otherwise derived from the authored Euler degrees.
#[inline]
pub fn rotation_quat(key: &RotationKeyframe) -> [f32; 4] {
    key.quat.unwrap_or_else(|| quat_from_euler_deg(key.euler_deg))
}

/// Sample a rotation track at an already-normalized time.
///
/// `initial` is the implicit value before the first keyframe, standing in
/// for a missing key at time 0; tracks with at least two keys blend
/// spherically from it. It also doubles as the empty-track result (the
/// engine passes the identity). A single-keyframe track returns its value
/// unconditionally.
pub fn sample_rotation(
    track: &[RotationKeyframe],
    t: f32,
    length: f32,
    looped: bool,
    initial: [f32; 4],
) -> [f32; 4] {
    let n = track.len();
    match n {
        0 => initial,
        1 => rotation_quat(&track[0]),
        _ => {
            let first_time = track[0].time;
            if t < first_time {
                // Virtual keyframe at t=0 holding `initial`.
                let alpha = if first_time > f32::EPSILON {
                    (t / first_time).clamp(0.0, 1.0)
                } else {
                    1.0
                };
                return slerp_quat(initial, rotation_quat(&track[0]), alpha);
            }
            let (i0, i1, alpha) = find_segment(n, &|i| track[i].time, t, length, looped);
            if i0 == i1 {
                return rotation_quat(&track[i0]);
            }
            let left = &track[i0];
            let right = &track[i1];
            match left.interp {
                Interp::Step => rotation_quat(left),
                Interp::Linear => slerp_quat(rotation_quat(left), rotation_quat(right), alpha),
                // Spline kinds run in Euler-degree space, where the authored
                // values and handles live, then convert.
                Interp::CatmullRom => {
                    let prev = if i0 > 0 {
                        track[i0 - 1].euler_deg
                    } else {
                        left.euler_deg
                    };
                    let next = if i1 > i0 && i1 + 1 < n {
                        track[i1 + 1].euler_deg
                    } else {
                        right.euler_deg
                    };
                    quat_from_euler_deg(catmull_rom_vec3(
                        prev,
                        left.euler_deg,
                        right.euler_deg,
                        next,
                        alpha,
                    ))
                }
                Interp::Bezier => {
                    let out = left.handles.and_then(|h| h.out).unwrap_or(VEC3_ZERO);
                    let inn = right.handles.and_then(|h| h.r#in).unwrap_or(VEC3_ZERO);
                    quat_from_euler_deg(cubic_bezier_vec3(
                        left.euler_deg,
                        add_vec3(left.euler_deg, out),
                        add_vec3(right.euler_deg, inn),
                        right.euler_deg,
                        alpha,
                    ))
                }
            }
        }
    }
}
