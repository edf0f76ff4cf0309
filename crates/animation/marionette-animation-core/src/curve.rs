//! Keyframe curves.
//!
//! A curve is an ordered list of keys with strictly increasing, finite times.
//! Each key carries the interpolation degree used for the segment that starts at
//! it, so step, linear and cubic segments can be mixed in one curve. Cubic
//! segments need the left key's outgoing and the right key's incoming tangent.

use serde::{Deserialize, Serialize};

use crate::error::{AnimationError, Result};
use crate::interp::Interpolate;
use crate::sampler;

/// Segment interpolation mode.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Interpolation {
    Step,
    #[default]
    Linear,
    #[serde(alias = "CUBICSPLINE")]
    CubicSpline,
}

impl Interpolation {
    /// Polynomial degree: 0 step, 1 linear, 3 cubic.
    #[inline]
    pub const fn degree(self) -> u8 {
        match self {
            Interpolation::Step => 0,
            Interpolation::Linear => 1,
            Interpolation::CubicSpline => 3,
        }
    }

    pub const fn from_degree(degree: u8) -> Option<Self> {
        match degree {
            0 => Some(Interpolation::Step),
            1 => Some(Interpolation::Linear),
            3 => Some(Interpolation::CubicSpline),
            _ => None,
        }
    }
}

/// A single key. Tangents are rates of change per second.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe<T> {
    pub time: f32,
    pub value: T,
    #[serde(default)]
    pub interpolation: Interpolation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incoming: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outgoing: Option<T>,
}

impl<T> Keyframe<T> {
    pub fn step(time: f32, value: T) -> Self {
        Self {
            time,
            value,
            interpolation: Interpolation::Step,
            incoming: None,
            outgoing: None,
        }
    }

    pub fn linear(time: f32, value: T) -> Self {
        Self {
            time,
            value,
            interpolation: Interpolation::Linear,
            incoming: None,
            outgoing: None,
        }
    }

    pub fn cubic(time: f32, incoming: T, value: T, outgoing: T) -> Self {
        Self {
            time,
            value,
            interpolation: Interpolation::CubicSpline,
            incoming: Some(incoming),
            outgoing: Some(outgoing),
        }
    }
}

/// Ordered keys of one animated property.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "Vec<Keyframe<T>>",
    into = "Vec<Keyframe<T>>",
    bound(
        serialize = "T: Serialize + Clone",
        deserialize = "T: Deserialize<'de> + Interpolate"
    )
)]
pub struct Curve<T> {
    keys: Vec<Keyframe<T>>,
}

impl<T: Interpolate> TryFrom<Vec<Keyframe<T>>> for Curve<T> {
    type Error = AnimationError;

    fn try_from(keys: Vec<Keyframe<T>>) -> Result<Self> {
        Curve::from_keys(keys)
    }
}

impl<T> From<Curve<T>> for Vec<Keyframe<T>> {
    fn from(curve: Curve<T>) -> Self {
        curve.keys
    }
}

impl<T: Interpolate> Curve<T> {
    /// Validate and wrap a key list.
    pub fn from_keys(keys: Vec<Keyframe<T>>) -> Result<Self> {
        if keys.is_empty() {
            return Err(AnimationError::EmptyCurve);
        }
        for (index, key) in keys.iter().enumerate() {
            if !key.time.is_finite() {
                return Err(AnimationError::NonFiniteTime { index });
            }
            if index > 0 {
                let previous = keys[index - 1].time;
                if key.time <= previous {
                    return Err(AnimationError::NonIncreasingTimes {
                        index,
                        time: key.time,
                        previous,
                    });
                }
            }
        }
        for (index, pair) in keys.windows(2).enumerate() {
            if pair[0].interpolation == Interpolation::CubicSpline {
                if pair[0].outgoing.is_none() {
                    return Err(AnimationError::MissingTangents { index });
                }
                if pair[1].incoming.is_none() {
                    return Err(AnimationError::MissingTangents { index: index + 1 });
                }
            }
        }
        Ok(Self { keys })
    }

    /// A single key: the same value at every time.
    pub fn constant(value: T) -> Self {
        Self {
            keys: vec![Keyframe::linear(0.0, value)],
        }
    }

    pub fn step(times: &[f32], values: &[T]) -> Result<Self> {
        check_len(times.len(), values.len())?;
        Self::from_keys(
            times
                .iter()
                .zip(values)
                .map(|(t, v)| Keyframe::step(*t, *v))
                .collect(),
        )
    }

    pub fn linear(times: &[f32], values: &[T]) -> Result<Self> {
        check_len(times.len(), values.len())?;
        Self::from_keys(
            times
                .iter()
                .zip(values)
                .map(|(t, v)| Keyframe::linear(*t, *v))
                .collect(),
        )
    }

    /// Cubic curve from `[in, value, out]` triplets, one per time.
    pub fn cubic(times: &[f32], triplets: &[T]) -> Result<Self> {
        check_len(times.len() * 3, triplets.len())?;
        Self::from_keys(
            times
                .iter()
                .zip(triplets.chunks_exact(3))
                .map(|(t, c)| Keyframe::cubic(*t, c[0], c[1], c[2]))
                .collect(),
        )
    }

    /// Build from parallel input/output arrays laid out per interpolation mode.
    pub fn from_sampler(times: &[f32], outputs: &[T], interpolation: Interpolation) -> Result<Self> {
        match interpolation {
            Interpolation::Step => Self::step(times, outputs),
            Interpolation::Linear => Self::linear(times, outputs),
            Interpolation::CubicSpline => Self::cubic(times, outputs),
        }
    }

    /// Value at `time`; clamps to the first/last key outside the key range.
    #[inline]
    pub fn sample(&self, time: f32) -> T {
        sampler::sample_keys(&self.keys, time)
    }

    /// Convert every value (and tangent) through `f`, keeping times and modes.
    pub fn map<U: Interpolate>(&self, f: impl Fn(T) -> U) -> Curve<U> {
        Curve {
            keys: self
                .keys
                .iter()
                .map(|k| Keyframe {
                    time: k.time,
                    value: f(k.value),
                    interpolation: k.interpolation,
                    incoming: k.incoming.map(&f),
                    outgoing: k.outgoing.map(&f),
                })
                .collect(),
        }
    }
}

impl<T> Curve<T> {
    #[inline]
    pub fn keys(&self) -> &[Keyframe<T>] {
        &self.keys
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Always false for a constructed curve.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[inline]
    pub fn is_constant(&self) -> bool {
        self.keys.len() == 1
    }

    pub fn times(&self) -> impl Iterator<Item = f32> + '_ {
        self.keys.iter().map(|k| k.time)
    }

    #[inline]
    pub fn start(&self) -> f32 {
        self.keys.first().map(|k| k.time).unwrap_or(0.0)
    }

    #[inline]
    pub fn end(&self) -> f32 {
        self.keys.last().map(|k| k.time).unwrap_or(0.0)
    }

    #[inline]
    pub fn duration(&self) -> f32 {
        self.end() - self.start()
    }
}

fn check_len(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(AnimationError::LengthMismatch { expected, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn rejects_empty_and_unordered_keys() {
        assert_eq!(
            Curve::<f32>::linear(&[], &[]).unwrap_err(),
            AnimationError::EmptyCurve
        );
        assert_eq!(
            Curve::linear(&[0.0, 1.0, 1.0], &[0.0f32, 1.0, 2.0]).unwrap_err(),
            AnimationError::NonIncreasingTimes {
                index: 2,
                time: 1.0,
                previous: 1.0
            }
        );
        assert!(matches!(
            Curve::linear(&[0.0, f32::NAN], &[0.0f32, 1.0]),
            Err(AnimationError::NonFiniteTime { index: 1 })
        ));
    }

    #[test]
    fn cubic_needs_both_tangents_of_a_segment() {
        let keys = vec![
            Keyframe::cubic(0.0, 0.0f32, 0.0, 1.0),
            Keyframe::linear(1.0, 1.0),
        ];
        assert_eq!(
            Curve::from_keys(keys).unwrap_err(),
            AnimationError::MissingTangents { index: 1 }
        );
    }

    #[test]
    fn cubic_layout_is_in_value_out() {
        let curve = Curve::cubic(
            &[0.0, 2.0],
            &[
                Vec3::ZERO,
                Vec3::X,
                Vec3::Y,
                Vec3::Z,
                Vec3::ONE,
                Vec3::NEG_X,
            ],
        )
        .unwrap();
        let k0 = curve.keys()[0];
        assert_eq!(k0.incoming, Some(Vec3::ZERO));
        assert_eq!(k0.value, Vec3::X);
        assert_eq!(k0.outgoing, Some(Vec3::Y));
        assert_eq!(curve.keys()[1].value, Vec3::ONE);
        assert_eq!(curve.duration(), 2.0);
    }

    #[test]
    fn output_count_must_match_layout() {
        assert_eq!(
            Curve::cubic(&[0.0, 1.0], &[1.0f32, 2.0, 3.0]).unwrap_err(),
            AnimationError::LengthMismatch {
                expected: 6,
                actual: 3
            }
        );
    }

    #[test]
    fn degrees_map_both_ways() {
        for mode in [
            Interpolation::Step,
            Interpolation::Linear,
            Interpolation::CubicSpline,
        ] {
            assert_eq!(Interpolation::from_degree(mode.degree()), Some(mode));
        }
        assert_eq!(Interpolation::from_degree(2), None);
    }

    #[test]
    fn deserialization_validates() {
        let ok: Curve<f32> = serde_json::from_str(
            r#"[{"time":0.0,"value":1.0},{"time":1.0,"value":3.0,"interpolation":"STEP"}]"#,
        )
        .unwrap();
        assert_eq!(ok.sample(0.5), 2.0);
        let bad = serde_json::from_str::<Curve<f32>>(r#"[{"time":1.0,"value":1.0},{"time":0.5,"value":3.0}]"#);
        assert!(bad.is_err());
    }

    #[test]
    fn absent_tangents_deserialize_as_none() {
        let key: Keyframe<f32> =
            serde_json::from_str(r#"{"time":0.0,"value":1.0,"outgoing":2.0}"#).unwrap();
        assert_eq!(key.incoming, None);
        assert_eq!(key.outgoing, Some(2.0));
        let json = serde_json::to_string(&Keyframe::linear(0.0, 1.0f32)).unwrap();
        assert!(!json.contains("incoming"));
    }
}
