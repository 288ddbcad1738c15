//! Numeric helpers:
//! - lerp family (fused multiply-add form)
//! - Catmull-Rom via the cubic Hermite basis
//! - cubic Bezier basis
//! - Euler-degree <-> quaternion conversion and SLERP (nalgebra-backed)

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

const DEG_TO_RAD: f32 = core::f32::consts::PI / 180.0;

pub const VEC3_ZERO: [f32; 3] = [0.0, 0.0, 0.0];
pub const VEC3_ONE: [f32; 3] = [1.0, 1.0, 1.0];
/// Identity rotation (x, y, z, w).
pub const QUAT_IDENTITY: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Linear interpolation of scalars, fused form.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    (b - a).mul_add(t, a)
}

#[inline]
pub fn lerp_vec3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        lerp_f32(a[0], b[0], t),
        lerp_f32(a[1], b[1], t),
        lerp_f32(a[2], b[2], t),
    ]
}

#[inline]
pub fn mul_vec3(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] * b[0], a[1] * b[1], a[2] * b[2]]
}

#[inline]
pub fn add_vec3(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
pub fn sub_vec3(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
fn dot4(a: [f32; 4], b: [f32; 4]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3]
}

#[inline]
fn normalize4(mut q: [f32; 4]) -> [f32; 4] {
    let len2 = q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3];
    if len2 > 0.0 {
        let inv_len = len2.sqrt().recip();
        q[0] *= inv_len;
        q[1] *= inv_len;
        q[2] *= inv_len;
        q[3] *= inv_len;
    }
    q
}

#[inline]
fn unit_quat(q: [f32; 4]) -> UnitQuaternion<f32> {
    UnitQuaternion::new_normalize(Quaternion::new(q[3], q[0], q[1], q[2]))
}

#[inline]
fn quat_array(q: UnitQuaternion<f32>) -> [f32; 4] {
    let c = q.into_inner().coords;
    [c.x, c.y, c.z, c.w]
}

/// Quaternion NLERP with shortest-arc correction.
/// If dot < 0, negate the second quaternion to ensure the shortest path.
/// Returns a normalized quaternion (x,y,z,w).
#[inline]
pub fn nlerp_quat(a: [f32; 4], mut b: [f32; 4], t: f32) -> [f32; 4] {
    let d = dot4(a, b);
    if d < 0.0 {
        b[0] = -b[0];
        b[1] = -b[1];
        b[2] = -b[2];
        b[3] = -b[3];
    }
    let q = [
        lerp_f32(a[0], b[0], t),
        lerp_f32(a[1], b[1], t),
        lerp_f32(a[2], b[2], t),
        lerp_f32(a[3], b[3], t),
    ];
    normalize4(q)
}

/// Spherical interpolation between two quaternions (x,y,z,w).
/// Antipodal pairs have no unique great-circle arc; those fall back to the
/// shortest-arc NLERP instead of failing.
#[inline]
pub fn slerp_quat(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    let qa = unit_quat(a);
    let qb = unit_quat(b);
    match qa.try_slerp(&qb, t, 1.0e-6) {
        Some(q) => quat_array(q),
        None => nlerp_quat(a, b, t),
    }
}

/// Compose two rotations: the result applies `b` first, then `a`.
#[inline]
pub fn quat_mul(a: [f32; 4], b: [f32; 4]) -> [f32; 4] {
    quat_array(unit_quat(a) * unit_quat(b))
}

/// Rotate a vector by a quaternion (x,y,z,w).
#[inline]
pub fn rotate_vec3(q: [f32; 4], v: [f32; 3]) -> [f32; 3] {
    let r = unit_quat(q) * Vector3::new(v[0], v[1], v[2]);
    [r.x, r.y, r.z]
}

/// Convert authored Euler degrees to a quaternion (x,y,z,w).
/// Components are roll (x), pitch (y), yaw (z), composed extrinsically as
/// Rz * Ry * Rx.
#[inline]
pub fn quat_from_euler_deg(e: [f32; 3]) -> [f32; 4] {
    quat_array(UnitQuaternion::from_euler_angles(
        e[0] * DEG_TO_RAD,
        e[1] * DEG_TO_RAD,
        e[2] * DEG_TO_RAD,
    ))
}

#[inline]
fn hermite(p0: f32, m0: f32, p1: f32, m1: f32, t: f32) -> f32 {
    let t2 = t * t;
    let t3 = t2 * t;
    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;
    h00 * p0 + h10 * m0 + h01 * p1 + h11 * m1
}

/// Catmull-Rom value between `p1` and `p2`; `p0`/`p3` are the neighbor
/// control points. Tangents are the standard half central differences.
#[inline]
pub fn catmull_rom_f32(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let m1 = 0.5 * (p2 - p0);
    let m2 = 0.5 * (p3 - p1);
    hermite(p1, m1, p2, m2, t)
}

#[inline]
pub fn catmull_rom_vec3(p0: [f32; 3], p1: [f32; 3], p2: [f32; 3], p3: [f32; 3], t: f32) -> [f32; 3] {
    [
        catmull_rom_f32(p0[0], p1[0], p2[0], p3[0], t),
        catmull_rom_f32(p0[1], p1[1], p2[1], p3[1], t),
        catmull_rom_f32(p0[2], p1[2], p2[2], p3[2], t),
    ]
}

/// Cubic Bezier basis function
#[inline]
pub fn cubic_bezier(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

#[inline]
pub fn cubic_bezier_vec3(
    p0: [f32; 3],
    p1: [f32; 3],
    p2: [f32; 3],
    p3: [f32; 3],
    t: f32,
) -> [f32; 3] {
    [
        cubic_bezier(p0[0], p1[0], p2[0], p3[0], t),
        cubic_bezier(p0[1], p1[1], p2[1], p3[1], t),
        cubic_bezier(p0[2], p1[2], p2[2], p3[2], t),
    ]
}
