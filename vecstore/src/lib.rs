//! Embedding index for face identification.
//!
//! [`FlatIndex`] is an exact, in-memory nearest-neighbor index over
//! fixed-dimension f32 vectors keyed by caller-supplied u64 IDs.
//! [`EmbeddingIndex`] wraps it with write-through file persistence and a
//! single-writer ID counter.
//!
//! Distances are squared Euclidean (L2); lower means more similar.

pub mod error;
pub mod flat;
pub mod flat_io;
pub mod l2;
pub mod persistent;
pub mod vecstore;

pub use error::VecError;
pub use flat::FlatIndex;
pub use flat_io::{load as load_flat, save as save_flat};
pub use l2::l2_squared;
pub use persistent::{EmbeddingIndex, LoadOutcome, DEFAULT_DIM, DEFAULT_INDEX_FILE};
pub use vecstore::{Match, VecIndex};
