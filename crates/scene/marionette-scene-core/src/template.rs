//! Immutable scene templates.
//!
//! A template is built from one scene of a [`Document`] in a single pass and
//! never reads the document again:
//! - nodes reachable from the scene roots are laid out in one arena, parents
//!   before children, and refer to each other by arena index
//! - every animation becomes a track; its channels are decoded into per-node
//!   [`ChannelSet`]s owned by the template
//! - skins are resolved to arena joint indices plus inverse bind matrices
//! - every mesh-bearing node becomes a drawable with rest bounds and,
//!   optionally, captured geometry
//!
//! Any dangling or unreachable reference fails the whole build.

use std::sync::Arc;

use glam::{Mat4, Quat, Vec3, Vec4};
use hashbrown::HashMap;
use log::{debug, warn};
use marionette_animation_core::{
    ChannelSet, Curve, Interpolate, Interpolation, LocalTransform, SparseWeights,
};
use marionette_codec_core::Element;

use crate::bounds::{merge_all, BoundingSphere};
use crate::config::{BufferMode, TemplateOptions};
use crate::document::{AnimationSampler, Document, Mesh, TargetPath};
use crate::error::{Result, SceneError};
use crate::geometry::{GeometrySource, MeshGeometry, SkinInfluences};

/// Static local transform of a node.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum LocalSource {
    Matrix(Mat4),
    Trs(LocalTransform),
}

impl LocalSource {
    #[inline]
    pub fn to_matrix(&self) -> Mat4 {
        match self {
            LocalSource::Matrix(m) => *m,
            LocalSource::Trs(t) => t.to_matrix(),
        }
    }

    /// Decomposed form, used as the rest value of animated properties.
    pub fn to_transform(&self) -> LocalTransform {
        match self {
            LocalSource::Matrix(m) => LocalTransform::from_matrix(m),
            LocalSource::Trs(t) => *t,
        }
    }
}

/// Joints of a skinned node, resolved to arena indices.
#[derive(Clone, Debug, PartialEq)]
pub struct SkinBinding {
    pub skin: usize,
    pub joints: Vec<usize>,
    pub inverse_bind_matrices: Vec<Mat4>,
}

#[derive(Clone, Debug)]
pub struct NodeTemplate {
    name: Option<String>,
    logical_index: usize,
    parent: Option<usize>,
    children: Vec<usize>,
    local: LocalSource,
    rest_weights: SparseWeights,
    /// One entry per track; empty sets for unanimated tracks.
    channels: Vec<ChannelSet>,
    mesh: Option<usize>,
    skin: Option<SkinBinding>,
}

impl NodeTemplate {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Index of the node in the source document.
    pub fn logical_index(&self) -> usize {
        self.logical_index
    }

    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn children(&self) -> &[usize] {
        &self.children
    }

    pub fn local(&self) -> &LocalSource {
        &self.local
    }

    pub fn rest_weights(&self) -> &SparseWeights {
        &self.rest_weights
    }

    pub fn channels(&self, track: usize) -> Option<&ChannelSet> {
        self.channels.get(track)
    }

    /// Logical mesh index.
    pub fn mesh(&self) -> Option<usize> {
        self.mesh
    }

    pub fn skin(&self) -> Option<&SkinBinding> {
        self.skin.as_ref()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrackInfo {
    pub name: String,
    pub duration: f32,
}

#[derive(Clone, Debug)]
pub struct DrawableTemplate {
    node: usize,
    mesh: usize,
    local_bounds: Option<BoundingSphere>,
    geometry: Option<Arc<MeshGeometry>>,
}

impl DrawableTemplate {
    /// Arena index of the owning node.
    pub fn node(&self) -> usize {
        self.node
    }

    /// Logical mesh index.
    pub fn mesh(&self) -> usize {
        self.mesh
    }

    /// Mesh-space rest bounds.
    pub fn local_bounds(&self) -> Option<BoundingSphere> {
        self.local_bounds
    }

    pub fn geometry(&self) -> Option<&MeshGeometry> {
        self.geometry.as_deref()
    }
}

#[derive(Clone, Debug)]
pub struct SceneTemplate {
    name: Option<String>,
    nodes: Vec<NodeTemplate>,
    roots: Vec<usize>,
    node_lookup: HashMap<usize, usize>,
    tracks: Vec<TrackInfo>,
    track_lookup: HashMap<String, usize>,
    drawables: Vec<DrawableTemplate>,
    skinned_bounds_margin: f32,
    bounds: Option<BoundingSphere>,
}

impl SceneTemplate {
    pub fn build(doc: &Document, scene_index: usize, options: &TemplateOptions) -> Result<Self> {
        let scene = doc
            .scenes
            .get(scene_index)
            .ok_or_else(|| SceneError::structural(format!("scene {scene_index} does not exist")))?;

        let (mut nodes, node_lookup, roots) = build_arena(doc, &scene.nodes)?;
        let arena_of = |logical: usize, what: &str| -> Result<usize> {
            node_lookup.get(&logical).copied().ok_or_else(|| {
                SceneError::structural(format!(
                    "{what} references node {logical}, not reachable from scene {scene_index}"
                ))
            })
        };

        for node in nodes.iter_mut() {
            let source = &doc.nodes[node.logical_index];
            if let Some(mesh) = node.mesh {
                let Some(mesh_def) = doc.meshes.get(mesh) else {
                    return Err(SceneError::structural(format!(
                        "node {} references missing mesh {mesh}",
                        node.logical_index
                    )));
                };
                if source.weights.is_none() && !mesh_def.default_weights.is_empty() {
                    node.rest_weights = SparseWeights::from_dense(&mesh_def.default_weights);
                }
            }
            if let Some(skin_index) = source.skin {
                let skin = doc.skins.get(skin_index).ok_or_else(|| {
                    SceneError::structural(format!(
                        "node {} references missing skin {skin_index}",
                        node.logical_index
                    ))
                })?;
                let joints = skin
                    .joints
                    .iter()
                    .map(|j| arena_of(*j, &format!("skin {skin_index}")))
                    .collect::<Result<Vec<_>>>()?;
                let inverse_bind_matrices = match skin.inverse_bind_matrices {
                    Some(accessor) => {
                        let view = doc.view::<Mat4>(accessor)?;
                        if view.len() < joints.len() {
                            return Err(SceneError::structural(format!(
                                "skin {skin_index} has {} joints but {} inverse bind matrices",
                                joints.len(),
                                view.len()
                            )));
                        }
                        view.iter().take(joints.len()).collect()
                    }
                    None => vec![Mat4::IDENTITY; joints.len()],
                };
                node.skin = Some(SkinBinding {
                    skin: skin_index,
                    joints,
                    inverse_bind_matrices,
                });
            }
        }

        // tracks
        let track_count = doc.animations.len();
        for node in nodes.iter_mut() {
            node.channels = vec![ChannelSet::default(); track_count];
        }
        let mut tracks = Vec::with_capacity(track_count);
        let mut track_lookup = HashMap::new();
        for (track, animation) in doc.animations.iter().enumerate() {
            for (c, channel) in animation.channels.iter().enumerate() {
                let what = format!("animation {track} channel {c}");
                let node = arena_of(channel.target.node, &what)?;
                let sampler = animation.samplers.get(channel.sampler).ok_or_else(|| {
                    SceneError::structural(format!(
                        "{what} references missing sampler {}",
                        channel.sampler
                    ))
                })?;
                let morph_targets = nodes[node]
                    .mesh
                    .and_then(|mesh| doc.meshes.get(mesh))
                    .map(|mesh| mesh.morph_targets.len());
                let set = &mut nodes[node].channels[track];
                let replaced = match channel.target.path {
                    TargetPath::Translation => {
                        set.translation.replace(read_curve::<Vec3>(doc, sampler)?).is_some()
                    }
                    TargetPath::Rotation => set
                        .rotation
                        .replace(read_curve::<Quat>(doc, sampler)?)
                        .is_some(),
                    TargetPath::Scale => set.scale.replace(read_curve::<Vec3>(doc, sampler)?).is_some(),
                    TargetPath::Weights => set
                        .weights
                        .replace(read_weights_curve(doc, sampler, morph_targets, &what)?)
                        .is_some(),
                    TargetPath::Visibility => set
                        .visibility
                        .replace(read_visibility_curve(doc, sampler)?)
                        .is_some(),
                };
                if replaced {
                    warn!(
                        "{what}: node {} already has a {:?} channel; keeping the later one",
                        channel.target.node, channel.target.path
                    );
                }
            }
            let duration = nodes
                .iter()
                .map(|n| n.channels[track].duration())
                .fold(0.0, f32::max);
            let name = animation
                .name
                .clone()
                .unwrap_or_else(|| format!("track{track}"));
            track_lookup.entry(name.clone()).or_insert(track);
            tracks.push(TrackInfo { name, duration });
        }

        // drawables
        let mut geometry_cache: HashMap<usize, (Option<BoundingSphere>, Option<Arc<MeshGeometry>>)> =
            HashMap::new();
        let mut drawables = Vec::new();
        for (arena, node) in nodes.iter().enumerate() {
            let Some(mesh) = node.mesh else { continue };
            if !geometry_cache.contains_key(&mesh) {
                let captured = capture_mesh(doc, mesh, &doc.meshes[mesh], options)?;
                geometry_cache.insert(mesh, captured);
            }
            let (local_bounds, geometry) = geometry_cache
                .get(&mesh)
                .cloned()
                .unwrap_or((None, None));
            drawables.push(DrawableTemplate {
                node: arena,
                mesh,
                local_bounds,
                geometry,
            });
        }

        let mut template = SceneTemplate {
            name: scene.name.clone(),
            nodes,
            roots,
            node_lookup,
            tracks,
            track_lookup,
            drawables,
            skinned_bounds_margin: options.skinned_bounds_margin,
            bounds: None,
        };
        let rest_world = template.rest_world_matrices();
        template.bounds = merge_all(
            template
                .drawables
                .iter()
                .filter_map(|d| template.drawable_bounds(d, &rest_world)),
        );

        debug!(
            "built scene template {:?}: {} nodes, {} tracks, {} drawables",
            template.name,
            template.nodes.len(),
            template.tracks.len(),
            template.drawables.len()
        );
        Ok(template)
    }

    /// Build the document's default scene.
    pub fn build_default(doc: &Document, options: &TemplateOptions) -> Result<Self> {
        Self::build(doc, doc.default_scene(), options)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Nodes in parent-before-child order.
    pub fn nodes(&self) -> &[NodeTemplate] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&NodeTemplate> {
        self.nodes.get(index)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Arena index of a document node.
    pub fn node_index(&self, logical: usize) -> Option<usize> {
        self.node_lookup.get(&logical).copied()
    }

    pub fn find_node(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.name() == Some(name))
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn track_index(&self, name: &str) -> Option<usize> {
        self.track_lookup.get(name).copied()
    }

    pub fn track_name(&self, track: usize) -> Option<&str> {
        self.tracks.get(track).map(|t| t.name.as_str())
    }

    pub fn track_duration(&self, track: usize) -> Option<f32> {
        self.tracks.get(track).map(|t| t.duration)
    }

    pub fn tracks(&self) -> &[TrackInfo] {
        &self.tracks
    }

    pub fn drawables(&self) -> &[DrawableTemplate] {
        &self.drawables
    }

    pub fn skinned_bounds_margin(&self) -> f32 {
        self.skinned_bounds_margin
    }

    /// World-space bounds of all drawables at rest.
    pub fn bounds(&self) -> Option<BoundingSphere> {
        self.bounds
    }

    /// World matrices of the rest pose, indexed by arena node.
    pub fn rest_world_matrices(&self) -> Vec<Mat4> {
        let locals: Vec<Mat4> = self.nodes.iter().map(|n| n.local.to_matrix()).collect();
        let mut world = Vec::with_capacity(locals.len());
        propagate_world(&self.nodes, &locals, &mut world);
        world
    }

    /// `world(joint_j) * inverse_bind_j` for each joint, in declared order.
    pub(crate) fn fill_palette(&self, skin: &SkinBinding, world: &[Mat4], out: &mut Vec<Mat4>) {
        out.clear();
        out.extend(
            skin.joints
                .iter()
                .zip(&skin.inverse_bind_matrices)
                .map(|(joint, ibm)| world[*joint] * *ibm),
        );
    }

    /// World bounds of one drawable for the given world matrices.
    ///
    /// Rigid meshes are exact. Skinned meshes take the rest sphere through the
    /// first joint's skinning matrix, widened by the configured margin.
    pub(crate) fn drawable_bounds(
        &self,
        drawable: &DrawableTemplate,
        world: &[Mat4],
    ) -> Option<BoundingSphere> {
        let local = drawable.local_bounds?;
        match self.nodes[drawable.node].skin() {
            Some(skin) => {
                let joint = *skin.joints.first()?;
                let ibm = skin.inverse_bind_matrices.first()?;
                Some(
                    local
                        .transformed(&(world[joint] * *ibm))
                        .scaled(self.skinned_bounds_margin),
                )
            }
            None => Some(local.transformed(&world[drawable.node])),
        }
    }
}

/// `world[i] = world[parent] * local[i]`, in arena order.
pub(crate) fn propagate_world(nodes: &[NodeTemplate], locals: &[Mat4], world: &mut Vec<Mat4>) {
    world.clear();
    for (node, local) in nodes.iter().zip(locals) {
        let w = match node.parent {
            Some(p) => world[p] * *local,
            None => *local,
        };
        world.push(w);
    }
}

type Arena = (Vec<NodeTemplate>, HashMap<usize, usize>, Vec<usize>);

/// Depth-first, parent-before-child layout of every node reachable from `roots`.
fn build_arena(doc: &Document, roots: &[usize]) -> Result<Arena> {
    let mut nodes: Vec<NodeTemplate> = Vec::new();
    let mut lookup: HashMap<usize, usize> = HashMap::new();
    let mut arena_roots = Vec::with_capacity(roots.len());
    let mut stack: Vec<(usize, Option<usize>)> = roots.iter().rev().map(|r| (*r, None)).collect();

    while let Some((logical, parent)) = stack.pop() {
        let source = doc.nodes.get(logical).ok_or_else(|| {
            SceneError::structural(format!("node {logical} does not exist"))
        })?;
        if lookup.contains_key(&logical) {
            return Err(SceneError::structural(format!(
                "node {logical} is reached twice (cycle or shared child)"
            )));
        }
        let arena = nodes.len();
        lookup.insert(logical, arena);
        match parent {
            Some(p) => nodes[p].children.push(arena),
            None => arena_roots.push(arena),
        }

        let local = match source.matrix {
            Some(m) => LocalSource::Matrix(m),
            None => LocalSource::Trs(LocalTransform::new(
                source.translation.unwrap_or(Vec3::ZERO),
                source.rotation.unwrap_or(Quat::IDENTITY),
                source.scale.unwrap_or(Vec3::ONE),
            )),
        };
        nodes.push(NodeTemplate {
            name: source.name.clone(),
            logical_index: logical,
            parent,
            children: Vec::with_capacity(source.children.len()),
            local,
            rest_weights: source
                .weights
                .as_deref()
                .map(SparseWeights::from_dense)
                .unwrap_or_default(),
            channels: Vec::new(),
            mesh: source.mesh,
            skin: None,
        });
        stack.extend(source.children.iter().rev().map(|c| (*c, Some(arena))));
    }
    Ok((nodes, lookup, arena_roots))
}

fn read_times(doc: &Document, sampler: &AnimationSampler) -> Result<Vec<f32>> {
    Ok(doc.view::<f32>(sampler.input)?.to_vec())
}

fn read_curve<T: Element + Interpolate>(doc: &Document, sampler: &AnimationSampler) -> Result<Curve<T>> {
    let times = read_times(doc, sampler)?;
    let outputs = doc.view::<T>(sampler.output)?.to_vec();
    Ok(Curve::from_sampler(&times, &outputs, sampler.interpolation)?)
}

/// Weight outputs hold `morph target count` scalars per value.
/// One dense weight array per key, sized to the driven mesh's morph targets.
fn read_weights_curve(
    doc: &Document,
    sampler: &AnimationSampler,
    morph_targets: Option<usize>,
    what: &str,
) -> Result<Curve<SparseWeights>> {
    let times = read_times(doc, sampler)?;
    let scalars = doc.view::<f32>(sampler.output)?.to_vec();
    let per_key = match sampler.interpolation {
        Interpolation::CubicSpline => times.len() * 3,
        _ => times.len(),
    };
    if per_key == 0 || scalars.len() % per_key != 0 || scalars.is_empty() {
        return Err(SceneError::structural(format!(
            "weights output accessor {} holds {} values for {} keys",
            sampler.output,
            scalars.len(),
            times.len()
        )));
    }
    let targets = scalars.len() / per_key;
    match morph_targets {
        Some(expected) if expected == targets => {}
        Some(expected) => {
            return Err(SceneError::structural(format!(
                "{what}: weights output drives {targets} morph targets but the mesh has {expected}"
            )));
        }
        None => {
            return Err(SceneError::structural(format!(
                "{what}: weights channel targets a node without a mesh"
            )));
        }
    }
    let outputs: Vec<SparseWeights> = scalars
        .chunks_exact(targets)
        .map(SparseWeights::from_dense)
        .collect();
    Ok(Curve::from_sampler(&times, &outputs, sampler.interpolation)?)
}

/// Non-zero scalars are visible.
fn read_visibility_curve(doc: &Document, sampler: &AnimationSampler) -> Result<Curve<bool>> {
    let times = read_times(doc, sampler)?;
    let outputs: Vec<bool> = doc
        .view::<f32>(sampler.output)?
        .iter()
        .map(|v| v != 0.0)
        .collect();
    Ok(Curve::from_sampler(&times, &outputs, sampler.interpolation)?)
}

fn capture_mesh(
    doc: &Document,
    index: usize,
    mesh: &Mesh,
    options: &TemplateOptions,
) -> Result<(Option<BoundingSphere>, Option<Arc<MeshGeometry>>)> {
    let positions = doc.view::<Vec3>(mesh.positions)?;
    let vertex_count = positions.len();
    let bounds = match &mesh.bounds {
        Some(aabb) => Some(BoundingSphere::from_aabb(aabb)),
        None => BoundingSphere::from_points(positions.iter()),
    };

    let mut morph_accessors = Vec::with_capacity(mesh.morph_targets.len());
    for accessor in &mesh.morph_targets {
        let view = doc.view::<Vec3>(*accessor)?;
        if view.len() != vertex_count {
            return Err(SceneError::structural(format!(
                "mesh {index} morph target accessor {accessor} has {} vertices, expected {vertex_count}",
                view.len()
            )));
        }
        morph_accessors.push(*accessor);
    }

    let influences = match (mesh.joints, mesh.weights) {
        (Some(joints), Some(weights)) => {
            let joints = doc.view::<[f32; 4]>(joints)?;
            let weights = doc.view::<Vec4>(weights)?;
            if joints.len() != vertex_count || weights.len() != vertex_count {
                return Err(SceneError::structural(format!(
                    "mesh {index} skin attributes do not match its {vertex_count} vertices"
                )));
            }
            Some(SkinInfluences {
                joints: joints.iter().map(|j| j.map(|c| c as u16)).collect(),
                weights: weights.to_vec(),
            })
        }
        (None, None) => None,
        _ => {
            return Err(SceneError::structural(format!(
                "mesh {index} needs both joints and weights for skinning"
            )));
        }
    };

    if !options.capture_geometry {
        return Ok((bounds, None));
    }
    let source = |accessor: usize| -> Result<GeometrySource> {
        Ok(match options.buffer_mode {
            BufferMode::Copy => GeometrySource::Owned(doc.view::<Vec3>(accessor)?.to_vec()),
            BufferMode::Shared => GeometrySource::Shared(doc.shared_view::<Vec3>(accessor)?),
        })
    };
    let morph_targets = morph_accessors
        .into_iter()
        .map(&source)
        .collect::<Result<Vec<_>>>()?;
    let geometry = MeshGeometry::new(source(mesh.positions)?, morph_targets, influences);
    Ok((bounds, Some(Arc::new(geometry))))
}
