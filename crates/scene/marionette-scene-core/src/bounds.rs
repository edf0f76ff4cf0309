//! Bounding volumes.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Axis-aligned box, as authored on mesh data.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Some(Self { min, max })
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// Center + radius.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Sphere around the box center reaching the farthest point.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vec3>,
        I::IntoIter: Clone,
    {
        let iter = points.into_iter();
        let center = Aabb::from_points(iter.clone())?.center();
        let radius = iter.map(|p| p.distance(center)).fold(0.0, f32::max);
        Some(Self { center, radius })
    }

    pub fn from_aabb(aabb: &Aabb) -> Self {
        Self {
            center: aabb.center(),
            radius: (aabb.max - aabb.min).length() * 0.5,
        }
    }

    /// Smallest sphere enclosing both.
    pub fn merge(&self, other: &BoundingSphere) -> BoundingSphere {
        let d = other.center - self.center;
        let dist = d.length();
        if dist + other.radius <= self.radius {
            return *self;
        }
        if dist + self.radius <= other.radius {
            return *other;
        }
        let radius = (dist + self.radius + other.radius) * 0.5;
        let center = self.center + d * ((radius - self.radius) / dist);
        BoundingSphere { center, radius }
    }

    /// Conservative image under an affine transform (radius scaled by the largest axis scale).
    pub fn transformed(&self, m: &Mat4) -> BoundingSphere {
        let scale = m
            .x_axis
            .truncate()
            .length()
            .max(m.y_axis.truncate().length())
            .max(m.z_axis.truncate().length());
        BoundingSphere {
            center: m.transform_point3(self.center),
            radius: self.radius * scale,
        }
    }

    pub fn scaled(&self, factor: f32) -> BoundingSphere {
        BoundingSphere {
            center: self.center,
            radius: self.radius * factor,
        }
    }

    pub fn contains(&self, point: Vec3, epsilon: f32) -> bool {
        point.distance(self.center) <= self.radius + epsilon
    }
}

/// Merge an iterator of spheres; `None` when empty.
pub fn merge_all(spheres: impl IntoIterator<Item = BoundingSphere>) -> Option<BoundingSphere> {
    spheres.into_iter().reduce(|acc, s| acc.merge(&s))
}
