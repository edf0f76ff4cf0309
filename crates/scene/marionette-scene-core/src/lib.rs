//! Marionette Scene Core
//!
//! Immutable [`SceneTemplate`]s built once from an in-memory [`Document`], and
//! lightweight [`ArmatureInstance`]/[`SceneInstance`] values that pose the
//! template at a track time: local and world matrices, visibility, morph
//! weights and per-drawable skinning palettes.
//!
//! Templates hold no reference to the document they were built from and are
//! `Send + Sync`; instances borrow their template.

pub mod bounds;
pub mod config;
pub mod document;
pub mod error;
pub mod geometry;
pub mod instance;
pub mod template;

pub use bounds::{Aabb, BoundingSphere};
pub use config::{BufferMode, TemplateOptions};
pub use document::{
    Accessor, Animation, AnimationSampler, Buffer, Channel, ChannelTarget, Document, Mesh, Node,
    Scene, Skin, TargetPath,
};
pub use error::{Result, SceneError};
pub use geometry::{GeometrySource, MeshGeometry, SkinInfluences};
pub use instance::{ArmatureInstance, Drawable, DrawableTransform, SceneInstance};
pub use template::{DrawableTemplate, LocalSource, NodeTemplate, SceneTemplate, SkinBinding, TrackInfo};
