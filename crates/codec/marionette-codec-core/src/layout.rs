//! Accessor layout: where elements live inside a byte buffer.

use serde::{Deserialize, Serialize};

use crate::encoding::ComponentEncoding;
use crate::error::CodecError;

/// Number of components per element.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimensions {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

impl Dimensions {
    #[inline]
    pub const fn components(self) -> usize {
        match self {
            Dimensions::Scalar => 1,
            Dimensions::Vec2 => 2,
            Dimensions::Vec3 => 3,
            Dimensions::Vec4 => 4,
            Dimensions::Mat4 => 16,
        }
    }

    pub fn from_components(components: usize) -> Result<Self, CodecError> {
        match components {
            1 => Ok(Dimensions::Scalar),
            2 => Ok(Dimensions::Vec2),
            3 => Ok(Dimensions::Vec3),
            4 => Ok(Dimensions::Vec4),
            16 => Ok(Dimensions::Mat4),
            _ => Err(CodecError::UnsupportedDimensions { components }),
        }
    }
}

/// Describes a strided array of elements inside a buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessorLayout {
    pub byte_offset: usize,
    /// `0` means tightly packed.
    #[serde(default)]
    pub byte_stride: usize,
    pub count: usize,
    pub encoding: ComponentEncoding,
    pub dimensions: Dimensions,
}

impl AccessorLayout {
    /// Tightly packed layout starting at offset zero.
    pub fn packed(count: usize, encoding: ComponentEncoding, dimensions: Dimensions) -> Self {
        Self {
            byte_offset: 0,
            byte_stride: 0,
            count,
            encoding,
            dimensions,
        }
    }

    pub fn with_offset(mut self, byte_offset: usize) -> Self {
        self.byte_offset = byte_offset;
        self
    }

    pub fn with_stride(mut self, byte_stride: usize) -> Self {
        self.byte_stride = byte_stride;
        self
    }

    #[inline]
    pub fn element_size(&self) -> usize {
        self.encoding.byte_size() * self.dimensions.components()
    }

    /// Distance in bytes between consecutive elements.
    #[inline]
    pub fn effective_stride(&self) -> usize {
        if self.byte_stride == 0 {
            self.element_size()
        } else {
            self.byte_stride
        }
    }

    #[inline]
    pub fn is_packed(&self) -> bool {
        self.effective_stride() == self.element_size()
    }

    /// Smallest buffer length that holds every element, or `None` when it
    /// does not fit in `usize`.
    pub fn required_len(&self) -> Option<usize> {
        if self.count == 0 {
            return Some(self.byte_offset);
        }
        (self.count - 1)
            .checked_mul(self.effective_stride())?
            .checked_add(self.element_size())?
            .checked_add(self.byte_offset)
    }

    /// Byte offset of element `index`. Only meaningful for a layout that
    /// passed [`AccessorLayout::validate`] and `index < count`.
    #[inline]
    pub fn element_offset(&self, index: usize) -> usize {
        self.byte_offset + index * self.effective_stride()
    }

    pub fn validate(&self, buffer_len: usize) -> Result<(), CodecError> {
        let element_size = self.element_size();
        if self.byte_stride != 0 && self.byte_stride < element_size {
            return Err(CodecError::InvalidStride {
                stride: self.byte_stride,
                element_size,
            });
        }
        match self.required_len() {
            Some(required) if required <= buffer_len => Ok(()),
            required => Err(CodecError::OutOfBounds {
                required: required.unwrap_or(usize::MAX),
                available: buffer_len,
            }),
        }
    }
}
