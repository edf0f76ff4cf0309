//! Component codec: numeric storage kinds and their (de)normalization.
//!
//! All storage is little-endian. Normalized integer kinds map their full range to
//! `[0, 1]` (unsigned) or `[-1, 1]` (signed, with the most negative value clamped
//! to `-1`).

use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// Storage type of a single accessor component.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    I8,
    U8,
    I16,
    U16,
    U32,
    F32,
}

impl ComponentKind {
    /// Size in bytes of one component.
    #[inline]
    pub const fn byte_size(self) -> usize {
        match self {
            ComponentKind::I8 | ComponentKind::U8 => 1,
            ComponentKind::I16 | ComponentKind::U16 => 2,
            ComponentKind::U32 | ComponentKind::F32 => 4,
        }
    }

    /// Map the interchange format's numeric component code.
    pub fn from_code(code: u32) -> Result<Self, CodecError> {
        match code {
            5120 => Ok(ComponentKind::I8),
            5121 => Ok(ComponentKind::U8),
            5122 => Ok(ComponentKind::I16),
            5123 => Ok(ComponentKind::U16),
            5125 => Ok(ComponentKind::U32),
            5126 => Ok(ComponentKind::F32),
            _ => Err(CodecError::UnknownComponentCode { code }),
        }
    }

    #[inline]
    pub const fn code(self) -> u32 {
        match self {
            ComponentKind::I8 => 5120,
            ComponentKind::U8 => 5121,
            ComponentKind::I16 => 5122,
            ComponentKind::U16 => 5123,
            ComponentKind::U32 => 5125,
            ComponentKind::F32 => 5126,
        }
    }

    #[inline]
    pub const fn is_signed(self) -> bool {
        matches!(self, ComponentKind::I8 | ComponentKind::I16 | ComponentKind::F32)
    }

    /// Inclusive integer range of the raw storage; `None` for floats.
    #[inline]
    pub fn integer_range(self) -> Option<(f64, f64)> {
        match self {
            ComponentKind::I8 => Some((i8::MIN as f64, i8::MAX as f64)),
            ComponentKind::U8 => Some((0.0, u8::MAX as f64)),
            ComponentKind::I16 => Some((i16::MIN as f64, i16::MAX as f64)),
            ComponentKind::U16 => Some((0.0, u16::MAX as f64)),
            ComponentKind::U32 => Some((0.0, u32::MAX as f64)),
            ComponentKind::F32 => None,
        }
    }
}

/// A component kind plus its normalization flag.
///
/// Only constructible through [`ComponentEncoding::new`], which rejects the
/// combinations the codec does not implement (normalized `u32` and `f32`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawEncoding", into = "RawEncoding")]
pub struct ComponentEncoding {
    kind: ComponentKind,
    normalized: bool,
}

#[derive(Serialize, Deserialize)]
struct RawEncoding {
    kind: ComponentKind,
    #[serde(default)]
    normalized: bool,
}

impl TryFrom<RawEncoding> for ComponentEncoding {
    type Error = CodecError;

    fn try_from(raw: RawEncoding) -> Result<Self, Self::Error> {
        ComponentEncoding::new(raw.kind, raw.normalized)
    }
}

impl From<ComponentEncoding> for RawEncoding {
    fn from(enc: ComponentEncoding) -> Self {
        RawEncoding {
            kind: enc.kind,
            normalized: enc.normalized,
        }
    }
}

impl ComponentEncoding {
    pub const F32: ComponentEncoding = ComponentEncoding {
        kind: ComponentKind::F32,
        normalized: false,
    };

    pub fn new(kind: ComponentKind, normalized: bool) -> Result<Self, CodecError> {
        if normalized && matches!(kind, ComponentKind::U32 | ComponentKind::F32) {
            return Err(CodecError::UnsupportedEncoding { kind, normalized });
        }
        Ok(Self { kind, normalized })
    }

    #[inline]
    pub fn kind(self) -> ComponentKind {
        self.kind
    }

    #[inline]
    pub fn normalized(self) -> bool {
        self.normalized
    }

    #[inline]
    pub fn byte_size(self) -> usize {
        self.kind.byte_size()
    }

    /// Decoded value range: `[0,1]`/`[-1,1]` when normalized, the raw integer range otherwise.
    pub fn value_range(self) -> (f64, f64) {
        if self.normalized {
            if self.kind.is_signed() {
                (-1.0, 1.0)
            } else {
                (0.0, 1.0)
            }
        } else {
            self.kind
                .integer_range()
                .unwrap_or((f32::MIN as f64, f32::MAX as f64))
        }
    }

    /// Decode one component from the first `byte_size()` bytes of `bytes`.
    #[inline]
    pub fn decode(self, bytes: &[u8]) -> f64 {
        let raw = match self.kind {
            ComponentKind::I8 => bytes[0] as i8 as f64,
            ComponentKind::U8 => bytes[0] as f64,
            ComponentKind::I16 => i16::from_le_bytes([bytes[0], bytes[1]]) as f64,
            ComponentKind::U16 => u16::from_le_bytes([bytes[0], bytes[1]]) as f64,
            ComponentKind::U32 => {
                u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64
            }
            ComponentKind::F32 => {
                return f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64
            }
        };
        if !self.normalized {
            return raw;
        }
        match self.kind {
            ComponentKind::I8 => (raw / i8::MAX as f64).max(-1.0),
            ComponentKind::U8 => raw / u8::MAX as f64,
            ComponentKind::I16 => (raw / i16::MAX as f64).max(-1.0),
            ComponentKind::U16 => raw / u16::MAX as f64,
            // rejected by `new`
            ComponentKind::U32 | ComponentKind::F32 => raw,
        }
    }

    /// Encode one component into the first `byte_size()` bytes of `out`.
    ///
    /// The input is clamped to the legal range and rounded to the nearest grid
    /// value. NaN encodes as zero for integer kinds.
    #[inline]
    pub fn encode(self, value: f64, out: &mut [u8]) {
        match self.kind {
            ComponentKind::F32 => out[..4].copy_from_slice(&(value as f32).to_le_bytes()),
            ComponentKind::I8 => {
                let q = self.quantize(value, i8::MAX as f64, i8::MIN as f64);
                out[0] = (q as i8) as u8;
            }
            ComponentKind::U8 => {
                let q = self.quantize(value, u8::MAX as f64, 0.0);
                out[0] = q as u8;
            }
            ComponentKind::I16 => {
                let q = self.quantize(value, i16::MAX as f64, i16::MIN as f64);
                out[..2].copy_from_slice(&(q as i16).to_le_bytes());
            }
            ComponentKind::U16 => {
                let q = self.quantize(value, u16::MAX as f64, 0.0);
                out[..2].copy_from_slice(&(q as u16).to_le_bytes());
            }
            ComponentKind::U32 => {
                let q = self.quantize(value, u32::MAX as f64, 0.0);
                out[..4].copy_from_slice(&(q as u32).to_le_bytes());
            }
        }
    }

    /// Scale (if normalized), clamp and round. `max`/`min` are the raw storage bounds.
    #[inline]
    fn quantize(self, value: f64, max: f64, min: f64) -> f64 {
        if value.is_nan() {
            return 0.0;
        }
        if self.normalized {
            let lo = if min < 0.0 { -1.0 } else { 0.0 };
            (value.clamp(lo, 1.0) * max).round()
        } else {
            value.clamp(min, max).round()
        }
    }
}

impl Default for ComponentEncoding {
    fn default() -> Self {
        Self::F32
    }
}
