//! Error types for scene templates and instances.

use marionette_animation_core::AnimationError;
use marionette_codec_core::CodecError;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SceneError {
    /// The document is malformed: dangling reference, unreachable node, bad
    /// accessor layout, invalid curve. Aborts template construction.
    #[error("Structural error: {reason}")]
    Structural { reason: String },

    /// The document asks for an encoding the codec does not implement.
    #[error("Unsupported: {reason}")]
    Unsupported { reason: String },

    /// An instance was asked for a track the template does not have.
    #[error("Track {index} out of range (track count {count})")]
    TrackOutOfRange { index: usize, count: usize },

    /// No track carries this name.
    #[error("Track not found: {name}")]
    TrackNotFound { name: String },
}

impl SceneError {
    pub fn structural(reason: impl Into<String>) -> Self {
        Self::Structural {
            reason: reason.into(),
        }
    }

    /// Only a bad track request leaves the caller with something usable.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::TrackOutOfRange { .. } | Self::TrackNotFound { .. }
        )
    }

    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Structural { .. } => "structure",
            Self::Unsupported { .. } => "unsupported",
            Self::TrackOutOfRange { .. } | Self::TrackNotFound { .. } => "range",
        }
    }
}

impl From<CodecError> for SceneError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::UnsupportedEncoding { .. } | CodecError::UnsupportedDimensions { .. } => {
                Self::Unsupported {
                    reason: err.to_string(),
                }
            }
            other => Self::structural(other.to_string()),
        }
    }
}

impl From<AnimationError> for SceneError {
    fn from(err: AnimationError) -> Self {
        Self::structural(err.to_string())
    }
}

pub type Result<T> = core::result::Result<T, SceneError>;
