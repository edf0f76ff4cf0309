//! Typed, strided views over byte buffers.
//!
//! A view never copies its backing store. Bounds are validated once in
//! [`AccessorView::new`]; per-element index checks are debug assertions only.

use std::fmt;
use std::marker::PhantomData;

use crate::element::Element;
use crate::error::CodecError;
use crate::layout::AccessorLayout;

/// A typed window over `B` interpreting its bytes as `layout.count` elements of `E`.
///
/// `B` can be any byte container: `&[u8]`, `&mut [u8]`, `Vec<u8>`, `Arc<[u8]>`.
/// Writing requires `B: AsMut<[u8]>`.
pub struct AccessorView<B, E> {
    buffer: B,
    layout: AccessorLayout,
    _element: PhantomData<fn() -> E>,
}

impl<B: Clone, E> Clone for AccessorView<B, E> {
    fn clone(&self) -> Self {
        Self {
            buffer: self.buffer.clone(),
            layout: self.layout,
            _element: PhantomData,
        }
    }
}

impl<B, E> fmt::Debug for AccessorView<B, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessorView")
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

impl<B: AsRef<[u8]>, E: Element> AccessorView<B, E> {
    pub fn new(buffer: B, layout: AccessorLayout) -> Result<Self, CodecError> {
        if layout.dimensions != E::DIMENSIONS {
            return Err(CodecError::ElementMismatch {
                layout: layout.dimensions,
                element: E::DIMENSIONS,
            });
        }
        layout.validate(buffer.as_ref().len())?;
        Ok(Self {
            buffer,
            layout,
            _element: PhantomData,
        })
    }

    #[inline]
    pub fn layout(&self) -> &AccessorLayout {
        &self.layout
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.layout.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layout.count == 0
    }

    #[inline]
    pub fn buffer(&self) -> &B {
        &self.buffer
    }

    pub fn into_inner(self) -> B {
        self.buffer
    }

    #[inline]
    fn element_range(&self, index: usize) -> std::ops::Range<usize> {
        let start = self.layout.element_offset(index);
        start..start + self.layout.element_size()
    }

    /// Decode element `index`.
    #[inline]
    pub fn get(&self, index: usize) -> E {
        debug_assert!(
            index < self.layout.count,
            "accessor index {index} out of range (count {})",
            self.layout.count
        );
        let range = self.element_range(index);
        E::read(self.layout.encoding, &self.buffer.as_ref()[range])
    }

    pub fn iter(&self) -> Iter<'_, B, E> {
        Iter {
            view: self,
            front: 0,
            back: self.layout.count,
        }
    }

    pub fn to_vec(&self) -> Vec<E> {
        self.iter().collect()
    }

    /// Copy `min(self.len(), dst.len())` elements into `dst`, returning the count.
    ///
    /// Matching encodings copy raw element bytes (a single memcpy when both sides
    /// are tightly packed); otherwise each element is decoded and re-encoded.
    pub fn copy_to<D>(&self, dst: &mut AccessorView<D, E>) -> usize
    where
        D: AsRef<[u8]> + AsMut<[u8]>,
    {
        let n = self.len().min(dst.len());
        if n == 0 {
            return 0;
        }
        let src_layout = self.layout;
        let dst_layout = dst.layout;
        if src_layout.encoding != dst_layout.encoding {
            for i in 0..n {
                dst.set(i, self.get(i));
            }
            return n;
        }

        let size = src_layout.element_size();
        let src = self.buffer.as_ref();
        let out = dst.buffer.as_mut();
        if src_layout.is_packed() && dst_layout.is_packed() {
            let bytes = n * size;
            let s = src_layout.byte_offset;
            let d = dst_layout.byte_offset;
            out[d..d + bytes].copy_from_slice(&src[s..s + bytes]);
        } else {
            for i in 0..n {
                let s = src_layout.element_offset(i);
                let d = dst_layout.element_offset(i);
                out[d..d + size].copy_from_slice(&src[s..s + size]);
            }
        }
        n
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>, E: Element> AccessorView<B, E> {
    /// Encode `value` into element `index`, in place.
    #[inline]
    pub fn set(&mut self, index: usize, value: E) {
        debug_assert!(
            index < self.layout.count,
            "accessor index {index} out of range (count {})",
            self.layout.count
        );
        let range = self.element_range(index);
        let encoding = self.layout.encoding;
        value.write(encoding, &mut self.buffer.as_mut()[range]);
    }

    /// Write `values` starting at element zero.
    pub fn copy_from_slice(&mut self, values: &[E]) {
        debug_assert!(values.len() <= self.layout.count);
        for (i, v) in values.iter().enumerate() {
            self.set(i, *v);
        }
    }
}

/// Iterator over decoded elements.
pub struct Iter<'a, B, E> {
    view: &'a AccessorView<B, E>,
    front: usize,
    back: usize,
}

impl<B, E> Clone for Iter<'_, B, E> {
    fn clone(&self) -> Self {
        Self {
            view: self.view,
            front: self.front,
            back: self.back,
        }
    }
}

impl<B: AsRef<[u8]>, E: Element> Iterator for Iter<'_, B, E> {
    type Item = E;

    #[inline]
    fn next(&mut self) -> Option<E> {
        if self.front >= self.back {
            return None;
        }
        let item = self.view.get(self.front);
        self.front += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl<B: AsRef<[u8]>, E: Element> DoubleEndedIterator for Iter<'_, B, E> {
    fn next_back(&mut self) -> Option<E> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(self.view.get(self.back))
    }
}

impl<B: AsRef<[u8]>, E: Element> ExactSizeIterator for Iter<'_, B, E> {}
