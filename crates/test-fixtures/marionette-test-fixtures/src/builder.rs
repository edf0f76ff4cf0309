//! Assemble a [`Document`] in memory, encoding accessor data through the codec.

use anyhow::{Context, Result};
use marionette_animation_core::Interpolation;
use marionette_codec_core::{AccessorLayout, AccessorView, ComponentEncoding, Element};
use marionette_scene_core::{
    Accessor, Animation, AnimationSampler, Buffer, Channel, ChannelTarget, Document, Mesh, Node,
    Scene, Skin, TargetPath,
};

/// Appends every accessor to a single buffer.
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    doc: Document,
    bytes: Vec<u8>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode `values` as a tightly packed f32 accessor.
    pub fn accessor<E: Element>(&mut self, values: &[E]) -> Result<usize> {
        self.encoded_accessor(values, ComponentEncoding::F32)
    }

    /// Encode `values` with `encoding`, 4-byte aligned.
    pub fn encoded_accessor<E: Element>(
        &mut self,
        values: &[E],
        encoding: ComponentEncoding,
    ) -> Result<usize> {
        while self.bytes.len() % 4 != 0 {
            self.bytes.push(0);
        }
        let layout = AccessorLayout::packed(values.len(), encoding, E::DIMENSIONS);
        let len = layout.required_len().context("accessor too large to encode")?;
        let mut scratch = vec![0u8; len];
        AccessorView::<_, E>::new(scratch.as_mut_slice(), layout)?.copy_from_slice(values);

        let byte_offset = self.bytes.len();
        self.bytes.extend_from_slice(&scratch);
        self.doc.accessors.push(Accessor {
            buffer: 0,
            byte_offset,
            byte_stride: 0,
            count: values.len(),
            component: encoding.kind(),
            normalized: encoding.normalized(),
            dimensions: E::DIMENSIONS,
        });
        Ok(self.doc.accessors.len() - 1)
    }

    pub fn node(&mut self, node: Node) -> usize {
        self.doc.nodes.push(node);
        self.doc.nodes.len() - 1
    }

    /// Mutable access to an already added node (to wire children later).
    pub fn node_mut(&mut self, index: usize) -> &mut Node {
        &mut self.doc.nodes[index]
    }

    pub fn mesh(&mut self, mesh: Mesh) -> usize {
        self.doc.meshes.push(mesh);
        self.doc.meshes.len() - 1
    }

    pub fn skin(&mut self, skin: Skin) -> usize {
        self.doc.skins.push(skin);
        self.doc.skins.len() - 1
    }

    pub fn scene(&mut self, roots: &[usize]) -> usize {
        self.doc.scenes.push(Scene {
            name: None,
            nodes: roots.to_vec(),
        });
        self.doc.scenes.len() - 1
    }

    /// Start an empty animation; add channels with [`DocumentBuilder::channel`].
    pub fn animation(&mut self, name: &str) -> usize {
        self.doc.animations.push(Animation {
            name: Some(name.to_string()),
            ..Default::default()
        });
        self.doc.animations.len() - 1
    }

    /// Add a channel with its own sampler to `animation`.
    pub fn channel(
        &mut self,
        animation: usize,
        node: usize,
        path: TargetPath,
        input: usize,
        output: usize,
        interpolation: Interpolation,
    ) {
        let anim = &mut self.doc.animations[animation];
        anim.samplers.push(AnimationSampler {
            input,
            output,
            interpolation,
        });
        anim.channels.push(Channel {
            sampler: anim.samplers.len() - 1,
            target: ChannelTarget { node, path },
        });
    }

    /// Keyed channel in one call: times and outputs become f32 accessors.
    pub fn keyed<E: Element>(
        &mut self,
        animation: usize,
        node: usize,
        path: TargetPath,
        times: &[f32],
        outputs: &[E],
        interpolation: Interpolation,
    ) -> Result<()> {
        let input = self.accessor(times)?;
        let output = self.accessor(outputs)?;
        self.channel(animation, node, path, input, output, interpolation);
        Ok(())
    }

    pub fn build(mut self) -> Document {
        self.doc.buffers = vec![Buffer::from(self.bytes)];
        self.doc
    }
}
