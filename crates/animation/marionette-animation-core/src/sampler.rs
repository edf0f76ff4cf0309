//! Curve evaluation.
//!
//! Model:
//! - Times at or before the first key return the first value; times at or after
//!   the last key return the last value (no extrapolation).
//! - Otherwise the enclosing segment `[k_i, k_i+1)` is found and evaluated with
//!   the interpolation mode of `k_i`.
//!
//! Two lookup strategies share one segment evaluator, so they agree bit for bit:
//! - stateless binary search (`Curve::sample`)
//! - [`CurveCursor`], which remembers the last segment for frame-by-frame playback

use crate::curve::{Curve, Interpolation, Keyframe};
use crate::interp::{HermiteWeights, Interpolate};

/// Forward steps tried from the cached segment before falling back to a binary search.
const CURSOR_LINEAR_STEPS: usize = 4;

/// Value for times outside the interior of the key range.
#[inline]
fn clamped<T: Interpolate>(keys: &[Keyframe<T>], time: f32) -> Option<T> {
    let first = &keys[0];
    if keys.len() == 1 || time.is_nan() || time <= first.time {
        return Some(first.value);
    }
    let last = &keys[keys.len() - 1];
    if time >= last.time {
        return Some(last.value);
    }
    None
}

/// Index `i` with `keys[i].time <= time < keys[i + 1].time`.
/// Callers guarantee `first.time < time < last.time`.
#[inline]
fn segment_index<T>(keys: &[Keyframe<T>], time: f32) -> usize {
    keys.partition_point(|k| k.time <= time) - 1
}

/// Evaluate segment `i` at `time`.
#[inline]
fn evaluate_segment<T: Interpolate>(keys: &[Keyframe<T>], i: usize, time: f32) -> T {
    let k0 = &keys[i];
    let k1 = &keys[i + 1];
    match k0.interpolation {
        Interpolation::Step => k0.value,
        Interpolation::Linear => {
            let u = (time - k0.time) / (k1.time - k0.time);
            T::lerp(k0.value, k1.value, u)
        }
        Interpolation::CubicSpline => {
            let dt = k1.time - k0.time;
            let u = (time - k0.time) / dt;
            match (k0.outgoing, k1.incoming) {
                (Some(out0), Some(in1)) => {
                    T::hermite(k0.value, out0, k1.value, in1, HermiteWeights::new(u), dt)
                }
                // rejected by Curve::from_keys
                _ => T::lerp(k0.value, k1.value, u),
            }
        }
    }
}

/// Binary-search sampling over a validated, non-empty key list.
#[inline]
pub(crate) fn sample_keys<T: Interpolate>(keys: &[Keyframe<T>], time: f32) -> T {
    if let Some(v) = clamped(keys, time) {
        return v;
    }
    evaluate_segment(keys, segment_index(keys, time), time)
}

/// Motion between two times: `tangent(sample(t0), sample(t1))`.
///
/// Vectors yield the difference, rotations the delta quaternion, weights the
/// per-slot change.
pub fn sample_delta<T: Interpolate>(curve: &Curve<T>, t0: f32, t1: f32) -> T {
    T::tangent(curve.sample(t0), curve.sample(t1))
}

/// Stateful sampler tuned for mostly-forward sequential queries.
///
/// Keeps the last segment index; a query inside it or a few segments ahead is
/// O(1), anything else falls back to a binary search.
#[derive(Clone, Debug)]
pub struct CurveCursor<'c, T> {
    curve: &'c Curve<T>,
    segment: usize,
}

impl<'c, T: Interpolate> CurveCursor<'c, T> {
    pub fn new(curve: &'c Curve<T>) -> Self {
        Self { curve, segment: 0 }
    }

    #[inline]
    pub fn curve(&self) -> &'c Curve<T> {
        self.curve
    }

    /// Forget the cached segment.
    pub fn reset(&mut self) {
        self.segment = 0;
    }

    pub fn sample(&mut self, time: f32) -> T {
        let keys = self.curve.keys();
        if let Some(v) = clamped(keys, time) {
            return v;
        }

        let mut i = self.segment.min(keys.len() - 2);
        if keys[i].time <= time {
            let mut steps = 0;
            while keys[i + 1].time <= time {
                i += 1;
                steps += 1;
                if steps == CURSOR_LINEAR_STEPS {
                    i = segment_index(keys, time);
                    break;
                }
            }
        } else {
            i = segment_index(keys, time);
        }
        self.segment = i;
        evaluate_segment(keys, i, time)
    }
}

impl<T: Interpolate> Curve<T> {
    /// Cursor-based sampler borrowing this curve.
    pub fn cursor(&self) -> CurveCursor<'_, T> {
        CurveCursor::new(self)
    }
}
