//! Element types readable from and writable to an accessor.

use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

use crate::encoding::ComponentEncoding;
use crate::layout::Dimensions;

/// A value made of `DIMENSIONS.components()` encoded components.
pub trait Element: Copy {
    const DIMENSIONS: Dimensions;

    /// Decode from the bytes of one element.
    fn read(encoding: ComponentEncoding, bytes: &[u8]) -> Self;

    /// Encode into the bytes of one element.
    fn write(&self, encoding: ComponentEncoding, out: &mut [u8]);
}

#[inline]
fn read_components<const N: usize>(encoding: ComponentEncoding, bytes: &[u8]) -> [f32; N] {
    let size = encoding.byte_size();
    let mut out = [0.0f32; N];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = encoding.decode(&bytes[i * size..]) as f32;
    }
    out
}

#[inline]
fn write_components(encoding: ComponentEncoding, values: &[f32], out: &mut [u8]) {
    let size = encoding.byte_size();
    for (i, v) in values.iter().enumerate() {
        encoding.encode(*v as f64, &mut out[i * size..]);
    }
}

impl Element for f32 {
    const DIMENSIONS: Dimensions = Dimensions::Scalar;

    #[inline]
    fn read(encoding: ComponentEncoding, bytes: &[u8]) -> Self {
        encoding.decode(bytes) as f32
    }

    #[inline]
    fn write(&self, encoding: ComponentEncoding, out: &mut [u8]) {
        encoding.encode(*self as f64, out);
    }
}

impl Element for Vec2 {
    const DIMENSIONS: Dimensions = Dimensions::Vec2;

    #[inline]
    fn read(encoding: ComponentEncoding, bytes: &[u8]) -> Self {
        Vec2::from_array(read_components(encoding, bytes))
    }

    #[inline]
    fn write(&self, encoding: ComponentEncoding, out: &mut [u8]) {
        write_components(encoding, &self.to_array(), out);
    }
}

impl Element for Vec3 {
    const DIMENSIONS: Dimensions = Dimensions::Vec3;

    #[inline]
    fn read(encoding: ComponentEncoding, bytes: &[u8]) -> Self {
        Vec3::from_array(read_components(encoding, bytes))
    }

    #[inline]
    fn write(&self, encoding: ComponentEncoding, out: &mut [u8]) {
        write_components(encoding, &self.to_array(), out);
    }
}

impl Element for Vec4 {
    const DIMENSIONS: Dimensions = Dimensions::Vec4;

    #[inline]
    fn read(encoding: ComponentEncoding, bytes: &[u8]) -> Self {
        Vec4::from_array(read_components(encoding, bytes))
    }

    #[inline]
    fn write(&self, encoding: ComponentEncoding, out: &mut [u8]) {
        write_components(encoding, &self.to_array(), out);
    }
}

/// Quaternions are stored as `(x, y, z, w)` four-component elements.
impl Element for Quat {
    const DIMENSIONS: Dimensions = Dimensions::Vec4;

    #[inline]
    fn read(encoding: ComponentEncoding, bytes: &[u8]) -> Self {
        Quat::from_array(read_components(encoding, bytes))
    }

    #[inline]
    fn write(&self, encoding: ComponentEncoding, out: &mut [u8]) {
        write_components(encoding, &self.to_array(), out);
    }
}

/// Matrices are stored column-major.
impl Element for Mat4 {
    const DIMENSIONS: Dimensions = Dimensions::Mat4;

    #[inline]
    fn read(encoding: ComponentEncoding, bytes: &[u8]) -> Self {
        Mat4::from_cols_array(&read_components(encoding, bytes))
    }

    #[inline]
    fn write(&self, encoding: ComponentEncoding, out: &mut [u8]) {
        write_components(encoding, &self.to_cols_array(), out);
    }
}

macro_rules! impl_array_element {
    ($n:literal, $dims:expr) => {
        impl Element for [f32; $n] {
            const DIMENSIONS: Dimensions = $dims;

            #[inline]
            fn read(encoding: ComponentEncoding, bytes: &[u8]) -> Self {
                read_components(encoding, bytes)
            }

            #[inline]
            fn write(&self, encoding: ComponentEncoding, out: &mut [u8]) {
                write_components(encoding, self, out);
            }
        }
    };
}

impl_array_element!(2, Dimensions::Vec2);
impl_array_element!(3, Dimensions::Vec3);
impl_array_element!(4, Dimensions::Vec4);
impl_array_element!(16, Dimensions::Mat4);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::ComponentKind;

    #[test]
    fn mat4_reads_column_major() {
        let cols: Vec<u8> = (0..16)
            .flat_map(|i| (i as f32).to_le_bytes())
            .collect();
        let m = Mat4::read(ComponentEncoding::F32, &cols);
        assert_eq!(m.x_axis, Vec4::new(0.0, 1.0, 2.0, 3.0));
        assert_eq!(m.w_axis, Vec4::new(12.0, 13.0, 14.0, 15.0));
    }

    #[test]
    fn normalized_vec4_writes_each_component() {
        let enc = ComponentEncoding::new(ComponentKind::U8, true).unwrap();
        let mut out = [0u8; 4];
        Vec4::new(0.0, 1.0, 0.5, 2.0).write(enc, &mut out);
        assert_eq!(out, [0, 255, 128, 255]);
    }
}
