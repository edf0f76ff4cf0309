//! Sparse morph-target weight sets.
//!
//! A `SparseWeights` holds at most [`MAX_SPARSE_WEIGHTS`] non-zero
//! `(target index, weight)` slots. Arithmetic is per target index over the union
//! of both operands' slots; when a result has more non-zero slots than fit, the
//! ones with the largest magnitude are kept.

use serde::{Deserialize, Serialize};

pub const MAX_SPARSE_WEIGHTS: usize = 8;

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<(u16, f32)>", into = "Vec<(u16, f32)>")]
pub struct SparseWeights {
    indices: [u16; MAX_SPARSE_WEIGHTS],
    weights: [f32; MAX_SPARSE_WEIGHTS],
    len: u8,
}

impl SparseWeights {
    pub const ZERO: SparseWeights = SparseWeights {
        indices: [0; MAX_SPARSE_WEIGHTS],
        weights: [0.0; MAX_SPARSE_WEIGHTS],
        len: 0,
    };

    /// Build from a dense weight array (index = morph target). Targets past
    /// `u16::MAX` are not addressable and are ignored.
    pub fn from_dense(dense: &[f32]) -> Self {
        Self::from_pairs(
            dense
                .iter()
                .enumerate()
                .map_while(|(i, w)| u16::try_from(i).ok().map(|i| (i, *w))),
        )
    }

    /// Build from `(index, weight)` pairs. Duplicate indices are summed.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (u16, f32)>,
    {
        let mut merged: Vec<(u16, f32)> = Vec::new();
        for (index, weight) in pairs {
            match merged.iter_mut().find(|(i, _)| *i == index) {
                Some(slot) => slot.1 += weight,
                None => merged.push((index, weight)),
            }
        }
        Self::pack(merged)
    }

    /// Keep the largest-magnitude non-zero slots, ordered by index.
    fn pack(mut pairs: Vec<(u16, f32)>) -> Self {
        pairs.retain(|(_, w)| *w != 0.0);
        if pairs.len() > MAX_SPARSE_WEIGHTS {
            pairs.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()).then(a.0.cmp(&b.0)));
            pairs.truncate(MAX_SPARSE_WEIGHTS);
        }
        pairs.sort_by_key(|(i, _)| *i);

        let mut out = Self::ZERO;
        out.len = pairs.len() as u8;
        for (slot, (index, weight)) in pairs.into_iter().enumerate() {
            out.indices[slot] = index;
            out.weights[slot] = weight;
        }
        out
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.len == 0
    }

    /// Weight of morph target `index` (zero if absent).
    pub fn get(&self, index: u16) -> f32 {
        self.iter()
            .find_map(|(i, w)| if i == index { Some(w) } else { None })
            .unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, f32)> + '_ {
        self.indices[..self.len()]
            .iter()
            .copied()
            .zip(self.weights[..self.len()].iter().copied())
    }

    /// Expand into a dense array of `count` weights; slots past `count` are dropped.
    pub fn to_dense(&self, count: usize) -> Vec<f32> {
        let mut out = vec![0.0; count];
        for (i, w) in self.iter() {
            if let Some(slot) = out.get_mut(i as usize) {
                *slot = w;
            }
        }
        out
    }

    /// Combine `N` weight sets slot by slot over the union of their indices.
    pub fn combine<const N: usize>(inputs: [&SparseWeights; N], f: impl Fn([f32; N]) -> f32) -> Self {
        let mut union: Vec<u16> = Vec::with_capacity(N * MAX_SPARSE_WEIGHTS);
        for set in inputs.iter() {
            for (index, _) in set.iter() {
                if !union.contains(&index) {
                    union.push(index);
                }
            }
        }
        let pairs = union
            .into_iter()
            .map(|index| {
                let mut args = [0.0f32; N];
                for (slot, set) in args.iter_mut().zip(inputs.iter()) {
                    *slot = set.get(index);
                }
                (index, f(args))
            })
            .collect();
        Self::pack(pairs)
    }
}

impl From<Vec<(u16, f32)>> for SparseWeights {
    fn from(pairs: Vec<(u16, f32)>) -> Self {
        Self::from_pairs(pairs)
    }
}

impl From<SparseWeights> for Vec<(u16, f32)> {
    fn from(weights: SparseWeights) -> Self {
        weights.iter().collect()
    }
}
