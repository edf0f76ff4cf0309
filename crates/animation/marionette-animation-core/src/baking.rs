//! Resample curves at a fixed frame rate.

use serde::{Deserialize, Serialize};

use crate::curve::{Curve, Keyframe};
use crate::error::{AnimationError, Result};
use crate::interp::Interpolate;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BakingConfig {
    /// Target frame rate (Hz).
    pub frame_rate: f32,
    /// Window start in curve time; `None` uses the first key.
    #[serde(default)]
    pub start_time: Option<f32>,
    /// Window end in curve time; `None` uses the last key.
    #[serde(default)]
    pub end_time: Option<f32>,
}

impl Default for BakingConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60.0,
            start_time: None,
            end_time: None,
        }
    }
}

/// Bake `curve` into a linear curve with one key per frame over the window.
///
/// The last key always sits exactly on the window end.
pub fn bake_curve<T: Interpolate>(curve: &Curve<T>, cfg: &BakingConfig) -> Result<Curve<T>> {
    let frame_rate = cfg.frame_rate;
    if !(frame_rate.is_finite() && frame_rate > 0.0) {
        return Err(AnimationError::InvalidFrameRate { frame_rate });
    }
    let start = cfg.start_time.filter(|t| t.is_finite()).unwrap_or(curve.start());
    let end = cfg
        .end_time
        .filter(|t| t.is_finite())
        .unwrap_or(curve.end())
        .max(start);
    let frames = ((end - start) * frame_rate).ceil() as usize + 1;

    let mut cursor = curve.cursor();
    let mut keys: Vec<Keyframe<T>> = Vec::with_capacity(frames);
    for f in 0..frames {
        let t = if f + 1 == frames {
            end
        } else {
            start + f as f32 / frame_rate
        };
        if keys.last().map_or(false, |k| t <= k.time) {
            continue;
        }
        keys.push(Keyframe::linear(t, cursor.sample(t)));
    }
    Curve::from_keys(keys)
}
