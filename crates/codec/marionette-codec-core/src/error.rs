//! Error types for the component codec and accessor views.

use serde::{Deserialize, Serialize};

use crate::encoding::ComponentKind;
use crate::layout::Dimensions;

/// Failures raised while describing or validating an accessor layout.
///
/// Per-element decode/encode never fails: every check happens once, when an
/// encoding or a view is constructed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum CodecError {
    /// The encoding/normalization combination is not implemented.
    #[error("unsupported encoding: {kind:?} (normalized: {normalized})")]
    UnsupportedEncoding {
        kind: ComponentKind,
        normalized: bool,
    },

    /// The requested component count is not one of 1/2/3/4/16.
    #[error("unsupported dimensions: {components} components")]
    UnsupportedDimensions { components: usize },

    /// The element type read through a view disagrees with the layout's dimensions.
    #[error("layout holds {layout:?} elements but {element:?} was requested")]
    ElementMismatch {
        layout: Dimensions,
        element: Dimensions,
    },

    /// Numeric component code that does not map to a known kind.
    #[error("unknown component code: {code}")]
    UnknownComponentCode { code: u32 },

    /// A non-zero byte stride smaller than one element.
    #[error("byte stride {stride} is smaller than the element size {element_size}")]
    InvalidStride { stride: usize, element_size: usize },

    /// The layout addresses bytes past the end of the buffer.
    #[error("accessor needs {required} bytes but the buffer holds {available}")]
    OutOfBounds { required: usize, available: usize },
}

impl CodecError {
    /// Layout problems come from malformed data; encoding problems signal a missing feature.
    #[inline]
    pub fn is_layout_error(&self) -> bool {
        matches!(self, Self::InvalidStride { .. } | Self::OutOfBounds { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_errors_are_classified() {
        let stride = CodecError::InvalidStride {
            stride: 4,
            element_size: 12,
        };
        assert!(stride.is_layout_error());

        let unsupported = CodecError::UnsupportedEncoding {
            kind: ComponentKind::F32,
            normalized: true,
        };
        assert!(!unsupported.is_layout_error());
    }

    #[test]
    fn messages_name_the_offending_values() {
        let err = CodecError::OutOfBounds {
            required: 48,
            available: 40,
        };
        assert_eq!(
            err.to_string(),
            "accessor needs 48 bytes but the buffer holds 40"
        );
    }
}
