use parking_lot::{RwLock, RwLockReadGuard};

use crate::error::VecError;
use crate::l2::l2_squared;
use crate::vecstore::{Match, VecIndex};

/// FlatIndex is an exact in-memory VecIndex using brute-force squared L2
/// distance.
///
/// Rows are stored contiguously with a parallel ID column, so IDs are an
/// explicit mapping and need not be contiguous or unique. Search cost is
/// linear in the number of rows.
pub struct FlatIndex {
    inner: RwLock<FlatInner>,
}

pub(crate) struct FlatInner {
    pub(crate) dim: usize,
    pub(crate) ids: Vec<u64>,
    /// Concatenated rows of length `dim`.
    pub(crate) vectors: Vec<f32>,
}

impl FlatInner {
    fn row(&self, i: usize) -> &[f32] {
        let start = i * self.dim;
        &self.vectors[start..start + self.dim]
    }

    pub(crate) fn rows(&self) -> impl Iterator<Item = (u64, &[f32])> {
        self.ids
            .iter()
            .copied()
            .zip(self.vectors.chunks_exact(self.dim))
    }
}

impl FlatIndex {
    /// Create an empty index for vectors of the given dimension.
    /// Panics if `dim` is 0.
    pub fn new(dim: usize) -> Self {
        assert!(dim > 0, "vecstore: FlatIndex dim must be positive");
        Self {
            inner: RwLock::new(FlatInner {
                dim,
                ids: Vec::new(),
                vectors: Vec::new(),
            }),
        }
    }

    /// Build from deserialized rows (used by load).
    pub(crate) fn from_inner(inner: FlatInner) -> Self {
        Self {
            inner: RwLock::new(inner),
        }
    }

    /// Access rows for serialization (used by save).
    pub(crate) fn read_inner(&self) -> RwLockReadGuard<'_, FlatInner> {
        self.inner.read()
    }

    /// Return true if at least one row carries `id`.
    pub fn contains(&self, id: u64) -> bool {
        self.inner.read().ids.contains(&id)
    }

    /// Return the largest stored ID, if any.
    pub fn max_id(&self) -> Option<u64> {
        self.inner.read().ids.iter().copied().max()
    }
}

fn check_dim(got: usize, want: usize) -> Result<(), VecError> {
    if got != want {
        return Err(VecError::DimensionMismatch { got, want });
    }
    Ok(())
}

/// Validate a batch before anything is written.
pub(crate) fn check_batch(dim: usize, ids: &[u64], vectors: &[&[f32]]) -> Result<(), VecError> {
    if ids.len() != vectors.len() {
        return Err(VecError::BatchLengthMismatch {
            ids: ids.len(),
            vectors: vectors.len(),
        });
    }
    for v in vectors {
        check_dim(v.len(), dim)?;
    }
    Ok(())
}

impl VecIndex for FlatIndex {
    fn dim(&self) -> usize {
        self.inner.read().dim
    }

    fn insert(&self, id: u64, vector: &[f32]) -> Result<(), VecError> {
        self.batch_insert(&[id], &[vector])
    }

    fn batch_insert(&self, ids: &[u64], vectors: &[&[f32]]) -> Result<(), VecError> {
        let mut inner = self.inner.write();
        check_batch(inner.dim, ids, vectors)?;
        inner.ids.extend_from_slice(ids);
        for v in vectors {
            inner.vectors.extend_from_slice(v);
        }
        Ok(())
    }

    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<Match>, VecError> {
        let inner = self.inner.read();
        check_dim(query.len(), inner.dim)?;
        if inner.ids.is_empty() || top_k == 0 {
            return Ok(vec![]);
        }

        let mut results: Vec<Match> = (0..inner.ids.len())
            .map(|i| Match {
                id: inner.ids[i],
                distance: l2_squared(query, inner.row(i)),
            })
            .collect();

        // Stable: equal distances keep insertion order.
        results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        results.truncate(top_k);
        Ok(results)
    }

    fn len(&self) -> usize {
        self.inner.read().ids.len()
    }
}
