//! Interpolatable value capability set.
//!
//! One sampler algorithm serves every value kind through [`Interpolate`]:
//! - scalars and vectors blend component-wise
//! - quaternions slerp along the shortest arc and renormalize after hermite
//! - sparse morph weights blend per target slot, never renormalized
//! - booleans hold the left value

pub mod functions;

use glam::{Quat, Vec2, Vec3, Vec4};

use crate::weights::SparseWeights;

/// Hermite basis weights for a normalized segment parameter `u ∈ [0, 1]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HermiteWeights {
    pub h00: f32,
    pub h01: f32,
    pub h10: f32,
    pub h11: f32,
}

impl HermiteWeights {
    #[inline]
    pub fn new(u: f32) -> Self {
        let u2 = u * u;
        let u3 = u2 * u;
        Self {
            h00: 2.0 * u3 - 3.0 * u2 + 1.0,
            h01: -2.0 * u3 + 3.0 * u2,
            h10: u3 - 2.0 * u2 + u,
            h11: u3 - u2,
        }
    }
}

/// Values a keyframe curve can carry.
pub trait Interpolate: Copy {
    /// Blend `a` towards `b` by `t ∈ [0, 1]`.
    fn lerp(a: Self, b: Self, t: f32) -> Self;

    /// `v0*h00 + v1*h01 + out0*h10*dt + in1*h11*dt`.
    fn hermite(v0: Self, out0: Self, v1: Self, in1: Self, w: HermiteWeights, dt: f32) -> Self;

    /// The change that carries `from` to `to`.
    fn tangent(from: Self, to: Self) -> Self;
}

macro_rules! impl_linear_interpolate {
    ($($t:ty),*) => {$(
        impl Interpolate for $t {
            #[inline]
            fn lerp(a: Self, b: Self, t: f32) -> Self {
                a + (b - a) * t
            }

            #[inline]
            fn hermite(v0: Self, out0: Self, v1: Self, in1: Self, w: HermiteWeights, dt: f32) -> Self {
                v0 * w.h00 + v1 * w.h01 + out0 * (w.h10 * dt) + in1 * (w.h11 * dt)
            }

            #[inline]
            fn tangent(from: Self, to: Self) -> Self {
                to - from
            }
        }
    )*};
}

impl_linear_interpolate!(f32, Vec2, Vec3, Vec4);

impl Interpolate for Quat {
    #[inline]
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        functions::slerp_shortest(a, b, t)
    }

    #[inline]
    fn hermite(v0: Self, out0: Self, v1: Self, in1: Self, w: HermiteWeights, dt: f32) -> Self {
        functions::hermite_quat(v0, out0, v1, in1, w, dt)
    }

    #[inline]
    fn tangent(from: Self, to: Self) -> Self {
        functions::quat_tangent(from, to)
    }
}

impl Interpolate for SparseWeights {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        SparseWeights::combine([&a, &b], |[x, y]| x + (y - x) * t)
    }

    fn hermite(v0: Self, out0: Self, v1: Self, in1: Self, w: HermiteWeights, dt: f32) -> Self {
        SparseWeights::combine([&v0, &out0, &v1, &in1], |[p0, m0, p1, m1]| {
            p0 * w.h00 + p1 * w.h01 + m0 * (w.h10 * dt) + m1 * (w.h11 * dt)
        })
    }

    fn tangent(from: Self, to: Self) -> Self {
        SparseWeights::combine([&from, &to], |[x, y]| y - x)
    }
}

/// Step-only: every mode holds the left value. The tangent reports a toggle.
impl Interpolate for bool {
    #[inline]
    fn lerp(a: Self, _b: Self, _t: f32) -> Self {
        a
    }

    #[inline]
    fn hermite(v0: Self, _out0: Self, _v1: Self, _in1: Self, _w: HermiteWeights, _dt: f32) -> Self {
        v0
    }

    #[inline]
    fn tangent(from: Self, to: Self) -> Self {
        from != to
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hermite_weights_partition_endpoints() {
        let w0 = HermiteWeights::new(0.0);
        assert_eq!((w0.h00, w0.h01, w0.h10, w0.h11), (1.0, 0.0, 0.0, 0.0));
        let w1 = HermiteWeights::new(1.0);
        assert_eq!((w1.h00, w1.h01, w1.h10, w1.h11), (0.0, 1.0, 0.0, 0.0));
        let mid = HermiteWeights::new(0.5);
        assert!((mid.h00 + mid.h01 - 1.0).abs() < 1e-6);
        assert!((mid.h10 - 0.125).abs() < 1e-6);
        assert!((mid.h11 + 0.125).abs() < 1e-6);
    }

    #[test]
    fn sparse_weights_blend_per_slot_without_renormalizing() {
        let a = SparseWeights::from_pairs([(0, 1.0)]);
        let b = SparseWeights::from_pairs([(5, 1.0)]);
        let mid = SparseWeights::lerp(a, b, 0.5);
        assert_eq!(mid.get(0), 0.5);
        assert_eq!(mid.get(5), 0.5);
        let delta = SparseWeights::tangent(a, b);
        assert_eq!(delta.get(0), -1.0);
        assert_eq!(delta.get(5), 1.0);
    }

    #[test]
    fn booleans_hold_left() {
        assert!(bool::lerp(true, false, 0.99));
        assert!(!bool::hermite(false, true, true, true, HermiteWeights::new(0.7), 1.0));
        assert!(bool::tangent(true, false));
    }
}
