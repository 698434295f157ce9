use std::sync::Arc;

use facekeep_vecstore::VecIndex;
use tracing::debug;

use crate::policy::ConfidencePolicy;
use crate::FaceIdError;

/// Number of neighbors consulted when no count is given.
pub const DEFAULT_TOP_K: usize = 1;

/// A scored neighbor of a query embedding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Identity ID from the index.
    pub id: u64,
    /// Squared L2 distance to the query.
    pub distance: f32,
    /// Score assigned by the policy.
    pub confidence: f32,
}

/// Verdict for a single query embedding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    /// The closest accepted candidate.
    Recognized(Candidate),
    /// No candidate cleared the acceptance bar.
    Unknown,
}

impl Resolution {
    /// Returns the candidate if recognized.
    pub fn candidate(&self) -> Option<&Candidate> {
        match self {
            Self::Recognized(c) => Some(c),
            Self::Unknown => None,
        }
    }
}

/// Turns raw nearest-neighbor distances into identity decisions.
pub struct Resolver<I: VecIndex + ?Sized> {
    index: Arc<I>,
    policy: ConfidencePolicy,
    top_k: usize,
}

impl<I: VecIndex + ?Sized> Clone for Resolver<I> {
    fn clone(&self) -> Self {
        Self {
            index: Arc::clone(&self.index),
            policy: self.policy,
            top_k: self.top_k,
        }
    }
}

impl<I: VecIndex + ?Sized> Resolver<I> {
    /// Creates a resolver with the default neighbor count.
    /// The policy must pass [`ConfidencePolicy::validate`].
    pub fn new(index: Arc<I>, policy: ConfidencePolicy) -> Result<Self, FaceIdError> {
        policy.validate()?;
        Ok(Self {
            index,
            policy,
            top_k: DEFAULT_TOP_K,
        })
    }

    /// Sets the neighbor count used by [`Resolver::identify`]. Zero falls
    /// back to [`DEFAULT_TOP_K`].
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = if top_k > 0 { top_k } else { DEFAULT_TOP_K };
        self
    }

    pub fn policy(&self) -> &ConfidencePolicy {
        &self.policy
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn index(&self) -> &Arc<I> {
        &self.index
    }

    /// Scores the `k` nearest neighbors of `query` without filtering.
    pub fn score(&self, query: &[f32], k: usize) -> Result<Vec<Candidate>, FaceIdError> {
        let matches = self.index.search(query, k)?;
        Ok(matches
            .into_iter()
            .map(|m| Candidate {
                id: m.id,
                distance: m.distance,
                confidence: self.policy.confidence(m.distance),
            })
            .collect())
    }

    /// Returns the neighbors among the `k` nearest whose confidence clears
    /// the acceptance bar, closest first. An empty result means the face
    /// is unknown.
    pub fn resolve(&self, query: &[f32], k: usize) -> Result<Vec<Candidate>, FaceIdError> {
        let scored = self.score(query, k)?;
        let total = scored.len();
        let accepted: Vec<Candidate> = scored
            .into_iter()
            .filter(|c| self.policy.accepts(c.confidence))
            .collect();
        debug!(k, neighbors = total, accepted = accepted.len(), "resolved query");
        Ok(accepted)
    }

    /// Resolves with the configured neighbor count and returns the best
    /// accepted candidate.
    pub fn identify(&self, query: &[f32]) -> Result<Resolution, FaceIdError> {
        let accepted = self.resolve(query, self.top_k)?;
        Ok(match accepted.into_iter().next() {
            Some(c) => Resolution::Recognized(c),
            None => Resolution::Unknown,
        })
    }
}
