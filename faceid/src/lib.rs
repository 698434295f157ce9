//! Face identification on top of an embedding index.
//!
//! # Pipeline
//!
//! 1. [`FaceEmbedder::embed`]: image -> detected, aligned face -> embedding
//! 2. [`Resolver::resolve`]: embedding -> nearest identities with a
//!    [`ConfidencePolicy`] score, filtered by the acceptance bar
//! 3. [`IdentityService`]: recognized -> description lookup; unknown ->
//!    optional registration under a fresh sequential ID
//!
//! # Confidence tiers
//!
//! Squared L2 distances map to a fixed score:
//!
//! ```text
//!        d < 0.6   -> 1.00  strong
//! 0.6 <= d < 1.0   -> 0.95  weak
//! 1.0 <= d         -> 0.50  low (rejected, below 0.8)
//! ```

mod descriptions;
mod error;
mod identity;
mod model;
mod policy;
mod resolver;
mod service;

pub use descriptions::{DescriptionStore, MemoryDescriptions, RedbDescriptions};
pub use error::FaceIdError;
pub use identity::{user_label, Person, PersonStatus, NEW_USER_NAME, NO_DESCRIPTION, UNKNOWN_PROMPT};
pub use model::{Extraction, FaceEmbedder};
pub use policy::{ConfidencePolicy, Tier};
pub use resolver::{Candidate, Resolution, Resolver, DEFAULT_TOP_K};
pub use service::{IdentityService, ServiceConfig};
