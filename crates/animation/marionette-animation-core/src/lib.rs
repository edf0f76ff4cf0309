//! Marionette Animation Core (engine-agnostic)
//!
//! Keyframe curves over interpolatable values and the samplers that evaluate
//! them: step, linear and cubic Hermite segments, shortest-arc quaternion
//! slerp, sparse morph weights, a cursor for sequential playback, plus
//! per-node channel dispatch, segmentation and baking helpers.

pub mod baking;
pub mod channels;
pub mod curve;
pub mod error;
pub mod interp;
pub mod sampler;
pub mod segment;
pub mod transform;
pub mod weights;

pub use baking::{bake_curve, BakingConfig};
pub use channels::{ChannelSample, ChannelSet};
pub use curve::{Curve, Interpolation, Keyframe};
pub use error::{AnimationError, Result};
pub use interp::functions::{quat_concat, quat_tangent, slerp_shortest};
pub use interp::{HermiteWeights, Interpolate};
pub use sampler::{sample_delta, CurveCursor};
pub use segment::{split_by_time, split_monotonic_runs};
pub use transform::LocalTransform;
pub use weights::{SparseWeights, MAX_SPARSE_WEIGHTS};
