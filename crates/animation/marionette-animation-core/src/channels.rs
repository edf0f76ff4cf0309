//! Per-node channel dispatch.
//!
//! A node animated by one track owns a [`ChannelSet`]: one optional curve per
//! animatable property. Sampling evaluates every authored channel on its own;
//! properties without a channel keep their rest value.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::curve::Curve;
use crate::transform::LocalTransform;
use crate::weights::SparseWeights;

/// Everything a track can drive on one node.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelSample {
    pub transform: LocalTransform,
    pub weights: SparseWeights,
    pub visible: bool,
}

impl Default for ChannelSample {
    fn default() -> Self {
        Self {
            transform: LocalTransform::IDENTITY,
            weights: SparseWeights::ZERO,
            visible: true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<Curve<Vec3>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Curve<Quat>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Curve<Vec3>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<Curve<SparseWeights>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Curve<bool>>,
}

impl ChannelSet {
    pub fn is_empty(&self) -> bool {
        self.translation.is_none()
            && self.rotation.is_none()
            && self.scale.is_none()
            && self.weights.is_none()
            && self.visibility.is_none()
    }

    /// True when any of translation, rotation or scale is authored.
    pub fn drives_transform(&self) -> bool {
        self.translation.is_some() || self.rotation.is_some() || self.scale.is_some()
    }

    /// Latest key time over all authored channels (0 when empty).
    pub fn duration(&self) -> f32 {
        [
            self.translation.as_ref().map(Curve::end),
            self.rotation.as_ref().map(Curve::end),
            self.scale.as_ref().map(Curve::end),
            self.weights.as_ref().map(Curve::end),
            self.visibility.as_ref().map(Curve::end),
        ]
        .into_iter()
        .flatten()
        .fold(0.0, f32::max)
    }

    pub fn sample(&self, time: f32, rest: &ChannelSample) -> ChannelSample {
        let mut out = *rest;
        if let Some(c) = &self.translation {
            out.transform.translation = c.sample(time);
        }
        if let Some(c) = &self.rotation {
            out.transform.rotation = c.sample(time);
        }
        if let Some(c) = &self.scale {
            out.transform.scale = c.sample(time);
        }
        if let Some(c) = &self.weights {
            out.weights = c.sample(time);
        }
        if let Some(c) = &self.visibility {
            out.visible = c.sample(time);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_returns_rest() {
        let rest = ChannelSample {
            transform: LocalTransform::new(Vec3::ONE, Quat::from_rotation_x(0.2), Vec3::splat(3.0)),
            weights: SparseWeights::from_dense(&[0.0, 0.25]),
            visible: false,
        };
        let set = ChannelSet::default();
        assert!(set.is_empty());
        assert_eq!(set.duration(), 0.0);
        assert_eq!(set.sample(4.0, &rest), rest);
    }

    #[test]
    fn authored_channels_override_only_their_property() {
        let set = ChannelSet {
            translation: Some(Curve::linear(&[0.0, 2.0], &[Vec3::ZERO, Vec3::X * 4.0]).unwrap()),
            visibility: Some(Curve::step(&[0.0, 1.5], &[true, false]).unwrap()),
            ..Default::default()
        };
        let rest = ChannelSample {
            transform: LocalTransform::new(Vec3::Y, Quat::IDENTITY, Vec3::splat(2.0)),
            ..Default::default()
        };
        let s = set.sample(1.0, &rest);
        assert_eq!(s.transform.translation, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(s.transform.scale, Vec3::splat(2.0));
        assert!(s.visible);
        assert!(!set.sample(1.75, &rest).visible);
        assert_eq!(set.duration(), 2.0);
        assert!(set.drives_transform());
    }
}
