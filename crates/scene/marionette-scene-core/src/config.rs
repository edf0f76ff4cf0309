//! Template construction options.

use serde::{Deserialize, Serialize};

/// How geometry buffers are held by a built template.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferMode {
    /// Decode into owned arrays; the template keeps nothing of the source document.
    #[default]
    Copy,
    /// Keep shared handles on the source byte buffers and decode on demand.
    /// The buffers outlive the document; the document itself is still released.
    Shared,
}

/// Options for [`SceneTemplate::build`](crate::SceneTemplate::build).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateOptions {
    pub buffer_mode: BufferMode,
    /// Radius factor applied to the rest bounds of skinned meshes.
    pub skinned_bounds_margin: f32,
    /// Capture vertex data for CPU morphing/skinning. Bounds are computed either way.
    pub capture_geometry: bool,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self {
            buffer_mode: BufferMode::Copy,
            skinned_bounds_margin: 1.5,
            capture_geometry: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let opts: TemplateOptions = serde_json::from_str(r#"{"buffer_mode":"shared"}"#).unwrap();
        assert_eq!(opts.buffer_mode, BufferMode::Shared);
        assert_eq!(opts.skinned_bounds_margin, 1.5);
        assert!(opts.capture_geometry);
    }
}
