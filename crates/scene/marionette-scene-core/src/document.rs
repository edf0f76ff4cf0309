//! In-memory document model consumed by template construction.
//!
//! Mirrors the parts of the interchange format the runtime needs: raw byte
//! buffers, accessors over them, the node hierarchy, meshes, skins, animations
//! and scenes. Everything is addressed by logical index. The model is read
//! once per [`SceneTemplate::build`](crate::SceneTemplate::build) and never
//! referenced afterwards.

use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};
use marionette_animation_core::Interpolation;
use marionette_codec_core::{
    AccessorLayout, AccessorView, ComponentEncoding, ComponentKind, Dimensions, Element,
};
use serde::{Deserialize, Serialize};

use crate::bounds::Aabb;
use crate::error::{Result, SceneError};

/// Raw bytes, shareable without copying.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Buffer(pub Arc<[u8]>);

impl Buffer {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self(bytes.into())
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Another handle on the same bytes.
    #[inline]
    pub fn shared(&self) -> Arc<[u8]> {
        Arc::clone(&self.0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes.into())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Accessor {
    pub buffer: usize,
    #[serde(default)]
    pub byte_offset: usize,
    /// `0` means tightly packed.
    #[serde(default)]
    pub byte_stride: usize,
    pub count: usize,
    pub component: ComponentKind,
    #[serde(default)]
    pub normalized: bool,
    pub dimensions: Dimensions,
}

impl Accessor {
    pub fn layout(&self) -> core::result::Result<AccessorLayout, marionette_codec_core::CodecError> {
        Ok(AccessorLayout {
            byte_offset: self.byte_offset,
            byte_stride: self.byte_stride,
            count: self.count,
            encoding: ComponentEncoding::new(self.component, self.normalized)?,
            dimensions: self.dimensions,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Node {
    pub name: Option<String>,
    pub children: Vec<usize>,
    /// Static local matrix; takes precedence over TRS when present.
    pub matrix: Option<Mat4>,
    pub translation: Option<Vec3>,
    pub rotation: Option<Quat>,
    pub scale: Option<Vec3>,
    pub mesh: Option<usize>,
    pub skin: Option<usize>,
    /// Rest morph weights; falls back to the mesh defaults.
    pub weights: Option<Vec<f32>>,
}

/// One drawable primitive. Accessor fields are logical accessor indices.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mesh {
    pub name: Option<String>,
    pub positions: usize,
    /// Joint indices per vertex (4 per vertex, into the skin's joint list).
    pub joints: Option<usize>,
    /// Joint weights per vertex (4 per vertex).
    pub weights: Option<usize>,
    /// Position deltas, one accessor per morph target.
    pub morph_targets: Vec<usize>,
    /// Default morph weights.
    pub default_weights: Vec<f32>,
    /// Authored rest bounds; computed from positions when absent.
    pub bounds: Option<Aabb>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Skin {
    pub name: Option<String>,
    pub joints: Vec<usize>,
    /// Mat4 accessor, one matrix per joint. Identity when absent.
    pub inverse_bind_matrices: Option<usize>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetPath {
    Translation,
    Rotation,
    Scale,
    Weights,
    Visibility,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelTarget {
    pub node: usize,
    pub path: TargetPath,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub sampler: usize,
    pub target: ChannelTarget,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationSampler {
    /// Scalar f32 key times.
    pub input: usize,
    pub output: usize,
    #[serde(default)]
    pub interpolation: Interpolation,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Animation {
    pub name: Option<String>,
    pub channels: Vec<Channel>,
    pub samplers: Vec<AnimationSampler>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub name: Option<String>,
    /// Root nodes.
    pub nodes: Vec<usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    pub buffers: Vec<Buffer>,
    pub accessors: Vec<Accessor>,
    pub nodes: Vec<Node>,
    pub meshes: Vec<Mesh>,
    pub skins: Vec<Skin>,
    pub animations: Vec<Animation>,
    pub scenes: Vec<Scene>,
    /// Default scene.
    pub scene: Option<usize>,
}

impl Document {
    pub fn from_json(json: &str) -> core::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[inline]
    pub fn default_scene(&self) -> usize {
        self.scene.unwrap_or(0)
    }

    fn accessor(&self, index: usize) -> Result<(&Accessor, &Buffer)> {
        let accessor = self
            .accessors
            .get(index)
            .ok_or_else(|| SceneError::structural(format!("accessor {index} does not exist")))?;
        let buffer = self.buffers.get(accessor.buffer).ok_or_else(|| {
            SceneError::structural(format!(
                "accessor {index} references missing buffer {}",
                accessor.buffer
            ))
        })?;
        Ok((accessor, buffer))
    }

    /// Validated view borrowing the document's bytes.
    pub fn view<E: Element>(&self, accessor: usize) -> Result<AccessorView<&[u8], E>> {
        let (acc, buffer) = self.accessor(accessor)?;
        let view = AccessorView::new(buffer.as_bytes(), acc.layout()?)
            .map_err(|err| with_accessor(accessor, err))?;
        Ok(view)
    }

    /// Validated view holding a shared handle on the bytes.
    pub fn shared_view<E: Element>(&self, accessor: usize) -> Result<AccessorView<Arc<[u8]>, E>> {
        let (acc, buffer) = self.accessor(accessor)?;
        let view = AccessorView::new(buffer.shared(), acc.layout()?)
            .map_err(|err| with_accessor(accessor, err))?;
        Ok(view)
    }
}

fn with_accessor(index: usize, err: marionette_codec_core::CodecError) -> SceneError {
    match SceneError::from(err) {
        SceneError::Structural { reason } => {
            SceneError::structural(format!("accessor {index}: {reason}"))
        }
        other => other,
    }
}
