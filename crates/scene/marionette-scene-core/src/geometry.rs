//! Captured mesh geometry and CPU morph/skin evaluation.

use std::sync::Arc;

use glam::{Mat4, Vec3, Vec4};
use marionette_animation_core::SparseWeights;
use marionette_codec_core::AccessorView;

use crate::bounds::BoundingSphere;

/// Vec3 stream either decoded up front or read lazily from a shared buffer.
#[derive(Clone, Debug)]
pub enum GeometrySource {
    Owned(Vec<Vec3>),
    Shared(AccessorView<Arc<[u8]>, Vec3>),
}

impl GeometrySource {
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            GeometrySource::Owned(v) => v.len(),
            GeometrySource::Shared(view) => view.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn get(&self, index: usize) -> Vec3 {
        match self {
            GeometrySource::Owned(v) => v[index],
            GeometrySource::Shared(view) => view.get(index),
        }
    }

    pub fn to_vec(&self) -> Vec<Vec3> {
        match self {
            GeometrySource::Owned(v) => v.clone(),
            GeometrySource::Shared(view) => view.to_vec(),
        }
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, GeometrySource::Shared(_))
    }
}

/// Per-vertex skin influences.
#[derive(Clone, Debug, PartialEq)]
pub struct SkinInfluences {
    pub joints: Vec<[u16; 4]>,
    pub weights: Vec<Vec4>,
}

#[derive(Clone, Debug)]
pub struct MeshGeometry {
    positions: GeometrySource,
    morph_targets: Vec<GeometrySource>,
    influences: Option<SkinInfluences>,
}

impl MeshGeometry {
    pub fn new(
        positions: GeometrySource,
        morph_targets: Vec<GeometrySource>,
        influences: Option<SkinInfluences>,
    ) -> Self {
        Self {
            positions,
            morph_targets,
            influences,
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn positions(&self) -> &GeometrySource {
        &self.positions
    }

    pub fn morph_target_count(&self) -> usize {
        self.morph_targets.len()
    }

    pub fn influences(&self) -> Option<&SkinInfluences> {
        self.influences.as_ref()
    }

    pub fn rest_bounds(&self) -> Option<BoundingSphere> {
        BoundingSphere::from_points(self.positions.to_vec())
    }

    /// Rest positions plus weighted morph deltas. Weights past the last target are ignored.
    pub fn morphed_positions(&self, weights: &SparseWeights) -> Vec<Vec3> {
        let mut out = self.positions.to_vec();
        for (target, weight) in weights.iter() {
            let Some(deltas) = self.morph_targets.get(target as usize) else {
                continue;
            };
            for (i, p) in out.iter_mut().enumerate().take(deltas.len()) {
                *p += deltas.get(i) * weight;
            }
        }
        out
    }

    /// Morph, then blend each vertex through the joint palette.
    ///
    /// Without influences every vertex follows `palette[0]`.
    pub fn skinned_positions(&self, weights: &SparseWeights, palette: &[Mat4]) -> Vec<Vec3> {
        let mut out = self.morphed_positions(weights);
        match &self.influences {
            Some(skin) => {
                for (i, p) in out.iter_mut().enumerate() {
                    let (Some(joints), Some(w)) = (skin.joints.get(i), skin.weights.get(i)) else {
                        continue;
                    };
                    let mut blended = Vec3::ZERO;
                    for k in 0..4 {
                        if w[k] == 0.0 {
                            continue;
                        }
                        if let Some(m) = palette.get(joints[k] as usize) {
                            blended += m.transform_point3(*p) * w[k];
                        }
                    }
                    *p = blended;
                }
            }
            None => {
                if let Some(m) = palette.first() {
                    out.iter_mut().for_each(|p| *p = m.transform_point3(*p));
                }
            }
        }
        out
    }
}
