//! Quaternion helpers:
//! - slerp_shortest (spherical, shortest arc)
//! - hermite_quat (component-wise hermite + renormalize)
//! - quat_tangent / quat_concat (rotation deltas)

use glam::{Quat, Vec4};

use super::HermiteWeights;

/// Above this |dot| the arc is short enough that nlerp is indistinguishable.
const SLERP_DOT_THRESHOLD: f32 = 0.9995;

#[inline]
fn normalize_or_identity(v: Vec4) -> Quat {
    let len2 = v.length_squared();
    if len2 > 0.0 && len2.is_finite() {
        Quat::from_vec4(v * len2.sqrt().recip())
    } else {
        Quat::IDENTITY
    }
}

/// Spherical interpolation along the shortest arc.
/// If dot < 0, `b` is negated so the path never exceeds 180 degrees.
#[inline]
pub fn slerp_shortest(a: Quat, b: Quat, t: f32) -> Quat {
    let va = Vec4::from(a);
    let mut vb = Vec4::from(b);
    let mut dot = va.dot(vb);
    if dot < 0.0 {
        vb = -vb;
        dot = -dot;
    }

    if dot > SLERP_DOT_THRESHOLD {
        return normalize_or_identity(va + (vb - va) * t);
    }

    let theta_0 = dot.clamp(-1.0, 1.0).acos();
    let theta = theta_0 * t;
    let sin_theta_0 = theta_0.sin();
    let s0 = (theta_0 - theta).sin() / sin_theta_0;
    let s1 = theta.sin() / sin_theta_0;
    normalize_or_identity(va * s0 + vb * s1)
}

/// Cubic hermite on the raw `(x, y, z, w)` components, renormalized.
#[inline]
pub fn hermite_quat(v0: Quat, out0: Quat, v1: Quat, in1: Quat, w: HermiteWeights, dt: f32) -> Quat {
    let blended = Vec4::from(v0) * w.h00
        + Vec4::from(v1) * w.h01
        + Vec4::from(out0) * (w.h10 * dt)
        + Vec4::from(in1) * (w.h11 * dt);
    normalize_or_identity(blended)
}

/// Rotation taking `from` to `to`: `to ⊗ conjugate(from)`.
#[inline]
pub fn quat_tangent(from: Quat, to: Quat) -> Quat {
    to * from.conjugate()
}

/// Apply a rotation delta produced by [`quat_tangent`].
#[inline]
pub fn quat_concat(delta: Quat, base: Quat) -> Quat {
    delta * base
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn assert_same_rotation(a: Quat, b: Quat) {
        // q and -q are the same rotation
        let d = Vec4::from(a).dot(Vec4::from(b)).abs();
        assert!((d - 1.0).abs() < 1e-5, "{a:?} vs {b:?}");
    }

    #[test]
    fn slerp_takes_shortest_arc() {
        let a = Quat::from_rotation_z(0.1);
        let b = -Quat::from_rotation_z(0.5);
        let mid = slerp_shortest(a, b, 0.5);
        assert_same_rotation(mid, Quat::from_rotation_z(0.3));
    }

    #[test]
    fn slerp_endpoints_are_exact_rotations() {
        let a = Quat::from_rotation_y(1.0);
        let b = Quat::from_rotation_x(-2.0);
        assert_same_rotation(slerp_shortest(a, b, 0.0), a);
        assert_same_rotation(slerp_shortest(a, b, 1.0), b);
    }

    #[test]
    fn slerp_keeps_constant_angular_speed() {
        let a = Quat::IDENTITY;
        let b = Quat::from_axis_angle(Vec3::Y, 1.5);
        let q = slerp_shortest(a, b, 0.25);
        assert_same_rotation(q, Quat::from_axis_angle(Vec3::Y, 0.375));
    }

    #[test]
    fn tangent_concat_round_trip() {
        let q1 = Quat::from_euler(glam::EulerRot::XYZ, 0.3, -1.2, 2.0);
        let q2 = Quat::from_euler(glam::EulerRot::XYZ, -0.7, 0.4, 0.1);
        let back = quat_concat(quat_tangent(q1, q2), q1);
        assert!(Vec4::from(back).abs_diff_eq(Vec4::from(q2), 1e-5));
    }

    #[test]
    fn degenerate_hermite_falls_back_to_identity() {
        let zero = Quat::from_xyzw(0.0, 0.0, 0.0, 0.0);
        let q = hermite_quat(zero, zero, zero, zero, HermiteWeights::new(0.5), 1.0);
        assert_eq!(q, Quat::IDENTITY);
    }
}
