//! Animated instances of a [`SceneTemplate`].
//!
//! Instances borrow their template and own only per-frame state. Several
//! instances can share one template across threads; each instance is driven
//! through `&mut self` by one owner at a time.

use glam::{Mat4, Vec3};
use marionette_animation_core::{ChannelSample, SparseWeights};

use crate::bounds::{merge_all, BoundingSphere};
use crate::error::{Result, SceneError};
use crate::template::{propagate_world, DrawableTemplate, SceneTemplate};

/// Node hierarchy state: local/world matrices, visibility and morph weights.
#[derive(Clone, Debug)]
pub struct ArmatureInstance<'t> {
    template: &'t SceneTemplate,
    track: Option<usize>,
    time: f32,
    local: Vec<Mat4>,
    world: Vec<Mat4>,
    visible: Vec<bool>,
    weights: Vec<SparseWeights>,
}

impl<'t> ArmatureInstance<'t> {
    /// Starts at the rest pose.
    pub fn new(template: &'t SceneTemplate) -> Self {
        let n = template.node_count();
        let mut instance = Self {
            template,
            track: None,
            time: 0.0,
            local: Vec::with_capacity(n),
            world: Vec::with_capacity(n),
            visible: Vec::with_capacity(n),
            weights: Vec::with_capacity(n),
        };
        instance.set_rest_pose();
        instance
    }

    pub fn template(&self) -> &'t SceneTemplate {
        self.template
    }

    pub fn set_rest_pose(&mut self) {
        let nodes = self.template.nodes();
        self.local.clear();
        self.local.extend(nodes.iter().map(|n| n.local().to_matrix()));
        self.visible.clear();
        self.visible.resize(nodes.len(), true);
        self.weights.clear();
        self.weights.extend(nodes.iter().map(|n| *n.rest_weights()));
        self.track = None;
        self.time = 0.0;
        propagate_world(nodes, &self.local, &mut self.world);
    }

    /// Pose every node at `time` of `track`.
    ///
    /// Unanimated properties keep their rest value. On a bad track index the
    /// current state is left untouched.
    pub fn set_animation_frame(&mut self, track: usize, time: f32) -> Result<()> {
        let count = self.template.track_count();
        if track >= count {
            return Err(SceneError::TrackOutOfRange {
                index: track,
                count,
            });
        }

        for (i, node) in self.template.nodes().iter().enumerate() {
            let rest_local = node.local();
            match node.channels(track).filter(|c| !c.is_empty()) {
                None => {
                    self.local[i] = rest_local.to_matrix();
                    self.visible[i] = true;
                    self.weights[i] = *node.rest_weights();
                }
                Some(channels) => {
                    let rest = ChannelSample {
                        transform: rest_local.to_transform(),
                        weights: *node.rest_weights(),
                        visible: true,
                    };
                    let sample = channels.sample(time, &rest);
                    self.local[i] = if channels.drives_transform() {
                        sample.transform.to_matrix()
                    } else {
                        rest_local.to_matrix()
                    };
                    self.visible[i] = sample.visible;
                    self.weights[i] = sample.weights;
                }
            }
        }
        propagate_world(self.template.nodes(), &self.local, &mut self.world);
        self.track = Some(track);
        self.time = time;
        Ok(())
    }

    /// Resolve a track by name, then pose it.
    pub fn set_animation_frame_by_name(&mut self, track: &str, time: f32) -> Result<()> {
        let index = self
            .template
            .track_index(track)
            .ok_or_else(|| SceneError::TrackNotFound {
                name: track.to_string(),
            })?;
        self.set_animation_frame(index, time)
    }

    pub fn current_track(&self) -> Option<usize> {
        self.track
    }

    pub fn current_time(&self) -> f32 {
        self.time
    }

    #[inline]
    pub fn local_matrix(&self, node: usize) -> Mat4 {
        self.local[node]
    }

    #[inline]
    pub fn world_matrix(&self, node: usize) -> Mat4 {
        self.world[node]
    }

    pub fn world_matrices(&self) -> &[Mat4] {
        &self.world
    }

    /// Own visibility channel only; hidden parents do not hide children.
    #[inline]
    pub fn is_visible(&self, node: usize) -> bool {
        self.visible[node]
    }

    #[inline]
    pub fn morph_weights(&self, node: usize) -> &SparseWeights {
        &self.weights[node]
    }
}

/// How a drawable is placed in the world.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum DrawableTransform<'a> {
    Rigid(Mat4),
    /// One skinning matrix per joint, in the skin's declared joint order.
    Skinned(&'a [Mat4]),
}

/// A drawable as seen by a renderer for the current frame.
#[derive(Copy, Clone, Debug)]
pub struct Drawable<'a> {
    template: &'a DrawableTemplate,
    transform: DrawableTransform<'a>,
    visible: bool,
    morph_weights: &'a SparseWeights,
}

impl<'a> Drawable<'a> {
    /// Logical mesh index.
    pub fn mesh(&self) -> usize {
        self.template.mesh()
    }

    /// Arena index of the owning node.
    pub fn node(&self) -> usize {
        self.template.node()
    }

    pub fn transform(&self) -> DrawableTransform<'a> {
        self.transform
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn morph_weights(&self) -> &'a SparseWeights {
        self.morph_weights
    }

    /// World-space vertex positions (morphed, then skinned or placed rigidly).
    /// `None` when the template did not capture geometry.
    pub fn world_positions(&self) -> Option<Vec<Vec3>> {
        let geometry = self.template.geometry()?;
        Some(match self.transform {
            DrawableTransform::Skinned(palette) => {
                geometry.skinned_positions(self.morph_weights, palette)
            }
            DrawableTransform::Rigid(m) => geometry
                .morphed_positions(self.morph_weights)
                .into_iter()
                .map(|p| m.transform_point3(p))
                .collect(),
        })
    }
}

/// An armature plus one skinning palette per skinned drawable.
#[derive(Clone, Debug)]
pub struct SceneInstance<'t> {
    armature: ArmatureInstance<'t>,
    /// Indexed like `template.drawables()`; empty for rigid drawables.
    palettes: Vec<Vec<Mat4>>,
}

impl<'t> SceneInstance<'t> {
    pub fn new(template: &'t SceneTemplate) -> Self {
        let mut instance = Self {
            armature: ArmatureInstance::new(template),
            palettes: vec![Vec::new(); template.drawables().len()],
        };
        instance.update_palettes();
        instance
    }

    pub fn template(&self) -> &'t SceneTemplate {
        self.armature.template()
    }

    pub fn armature(&self) -> &ArmatureInstance<'t> {
        &self.armature
    }

    pub fn set_rest_pose(&mut self) {
        self.armature.set_rest_pose();
        self.update_palettes();
    }

    pub fn set_animation_frame(&mut self, track: usize, time: f32) -> Result<()> {
        self.armature.set_animation_frame(track, time)?;
        self.update_palettes();
        Ok(())
    }

    pub fn set_animation_frame_by_name(&mut self, track: &str, time: f32) -> Result<()> {
        self.armature.set_animation_frame_by_name(track, time)?;
        self.update_palettes();
        Ok(())
    }

    fn update_palettes(&mut self) {
        let template = self.armature.template();
        for (drawable, palette) in template.drawables().iter().zip(self.palettes.iter_mut()) {
            match template.nodes()[drawable.node()].skin() {
                Some(skin) => template.fill_palette(skin, self.armature.world_matrices(), palette),
                None => palette.clear(),
            }
        }
    }

    /// Skinning palette of drawable `index` (empty for rigid drawables).
    pub fn palette(&self, index: usize) -> &[Mat4] {
        self.palettes.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every drawable, hidden ones included.
    pub fn all_drawables(&self) -> impl Iterator<Item = Drawable<'_>> + '_ {
        let template = self.armature.template();
        template
            .drawables()
            .iter()
            .zip(&self.palettes)
            .map(move |(drawable, palette)| {
                let node = drawable.node();
                let transform = if template.nodes()[node].skin().is_some() {
                    DrawableTransform::Skinned(palette.as_slice())
                } else {
                    DrawableTransform::Rigid(self.armature.world_matrix(node))
                };
                Drawable {
                    template: drawable,
                    transform,
                    visible: self.armature.is_visible(node),
                    morph_weights: self.armature.morph_weights(node),
                }
            })
    }

    /// Drawables visible this frame.
    pub fn drawables(&self) -> impl Iterator<Item = Drawable<'_>> + '_ {
        self.all_drawables().filter(Drawable::is_visible)
    }

    /// World bounds of every drawable in the current pose.
    pub fn world_bounds(&self) -> Option<BoundingSphere> {
        let template = self.armature.template();
        merge_all(
            template
                .drawables()
                .iter()
                .filter_map(|d| template.drawable_bounds(d, self.armature.world_matrices())),
        )
    }
}
