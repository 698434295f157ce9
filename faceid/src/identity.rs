use std::fmt;

use serde::{Deserialize, Serialize};

/// Name reported for a face that is not (yet) in the index.
pub const NEW_USER_NAME: &str = "New User";

/// Description reported for a recognized identity without a stored one.
pub const NO_DESCRIPTION: &str = "No description";

/// Description reported for an unknown face.
pub const UNKNOWN_PROMPT: &str = "Please enter a description for the user";

/// Outcome of a recognize or register request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonStatus {
    /// The face matched an existing identity.
    Recognized,
    /// The face was new and has been stored under a fresh ID.
    Registered,
    /// The face was new and nothing was stored.
    Unknown,
}

impl fmt::Display for PersonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recognized => write!(f, "recognized"),
            Self::Registered => write!(f, "registered"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Person as reported to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    /// Display name: `"User {id}"` for known identities, otherwise
    /// [`NEW_USER_NAME`].
    pub name: String,

    /// Stored or submitted description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Value in [0, 1]; the policy's low-tier score for new faces.
    pub confidence: f32,

    /// Identity ID, absent for unknown faces.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    pub status: PersonStatus,
}

/// Returns the display name of an identity. Format: `"User {id}"`.
pub fn user_label(id: u64) -> String {
    format!("User {id}")
}

impl Person {
    pub(crate) fn recognized(id: u64, description: Option<String>, confidence: f32) -> Self {
        Self {
            name: user_label(id),
            description: Some(description.unwrap_or_else(|| NO_DESCRIPTION.to_string())),
            confidence,
            id: Some(id),
            status: PersonStatus::Recognized,
        }
    }

    pub(crate) fn registered(id: u64, description: String, confidence: f32) -> Self {
        Self {
            name: NEW_USER_NAME.to_string(),
            description: Some(description),
            confidence,
            id: Some(id),
            status: PersonStatus::Registered,
        }
    }

    pub(crate) fn unknown(confidence: f32) -> Self {
        Self {
            name: NEW_USER_NAME.to_string(),
            description: Some(UNKNOWN_PROMPT.to_string()),
            confidence,
            id: None,
            status: PersonStatus::Unknown,
        }
    }
}
