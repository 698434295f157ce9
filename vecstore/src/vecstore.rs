use crate::error::VecError;

/// Match is a single result from a nearest-neighbor search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    /// Caller-assigned identifier of the matched vector.
    pub id: u64,

    /// Squared Euclidean distance between the query and matched vector.
    /// Lower values indicate higher similarity.
    pub distance: f32,
}

/// VecIndex is the interface for nearest-neighbor search over dense
/// float32 vectors of a fixed dimension.
///
/// All implementations must be safe for concurrent use (Send + Sync).
pub trait VecIndex: Send + Sync {
    /// Dimension every stored and queried vector must have.
    fn dim(&self) -> usize;

    /// Add a vector with the given ID. Duplicate IDs are stored as
    /// separate entries.
    fn insert(&self, id: u64, vector: &[f32]) -> Result<(), VecError>;

    /// Add multiple vectors at once.
    /// `ids` and `vectors` must have the same length. Either all entries
    /// are added or none are.
    fn batch_insert(&self, ids: &[u64], vectors: &[&[f32]]) -> Result<(), VecError>;

    /// Return up to `top_k` nearest vectors to the query, ordered by
    /// ascending distance (closest first).
    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<Match>, VecError>;

    /// Return the number of vectors in the index.
    fn len(&self) -> usize;

    /// Return true if the index contains no vectors.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
