//! Curve construction errors.

use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum AnimationError {
    /// A curve needs at least one key.
    #[error("curve has no keys")]
    EmptyCurve,

    /// Key times must be finite.
    #[error("key {index} has a non-finite time")]
    NonFiniteTime { index: usize },

    /// Key times must strictly increase.
    #[error("key {index} at time {time} does not follow time {previous}")]
    NonIncreasingTimes {
        index: usize,
        time: f32,
        previous: f32,
    },

    /// A cubic segment is missing the outgoing tangent of its left key or the
    /// incoming tangent of its right key.
    #[error("cubic key {index} is missing a tangent")]
    MissingTangents { index: usize },

    /// Parallel input/output arrays disagree in length.
    #[error("expected {expected} values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("baking frame rate must be positive and finite, got {frame_rate}")]
    InvalidFrameRate { frame_rate: f32 },
}

pub type Result<T> = core::result::Result<T, AnimationError>;
