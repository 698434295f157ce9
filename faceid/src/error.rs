use std::time::Duration;

use facekeep_vecstore::VecError;
use thiserror::Error;

/// Errors returned by face identification operations.
///
/// An index failure is always an error, never an empty result, so callers
/// can tell "backend unavailable" apart from "no confident match".
#[derive(Debug, Error)]
pub enum FaceIdError {
    #[error("faceid: index: {0}")]
    Index(#[from] VecError),

    #[error("faceid: descriptions: {0}")]
    Descriptions(String),

    #[error("faceid: invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("faceid: no face detected")]
    NoFace,

    #[error("faceid: failed to align the face")]
    AlignmentFailed,

    #[error("faceid: embedding: {0}")]
    Embedding(String),

    #[error("faceid: {op} timed out after {after:?}")]
    Timeout { op: &'static str, after: Duration },

    #[error("faceid: task: {0}")]
    Task(String),
}

impl FaceIdError {
    /// True for rejections caused by the submitted image rather than by
    /// the service.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::NoFace | Self::AlignmentFailed)
    }
}
