//! Marionette codec core: component encodings and typed accessor views.
//!
//! An accessor describes how a byte range is read as an array of numeric
//! elements (scalar, 2/3/4-vectors, 4x4 matrices). Integer encodings may be
//! normalized to `[0, 1]` / `[-1, 1]`.

pub mod element;
pub mod encoding;
pub mod error;
pub mod layout;
pub mod view;

pub use element::Element;
pub use encoding::{ComponentEncoding, ComponentKind};
pub use error::CodecError;
pub use layout::{AccessorLayout, Dimensions};
pub use view::AccessorView;
