use core::fmt::{self, Display};

use rand::{thread_rng, Rng as _};
use serde::{Deserialize, Serialize};

const GENERATED_ID_LENGTH: usize = 12;

/// Opaque participant identifier. Names and access codes are kept elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh random alphanumeric id for callers that have no ids of their own.
    #[must_use]
    pub fn generate() -> Self {
        Self(
            thread_rng()
                .sample_iter(&rand::distributions::Alphanumeric)
                .take(GENERATED_ID_LENGTH)
                .map(char::from)
                .collect(),
        )
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ParticipantId {
    fn from(value: String) -> Self {
        Self(value)
    }
}
