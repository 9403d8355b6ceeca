use std::collections::BTreeSet;
use std::path::Path;

use gift_exchange_optimizer::{EligibilityGraph, Exclusion, ExclusionSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AppError;
use crate::participant::ParticipantId;

/// The participants of one gift exchange and who must not draw whom.
///
/// Every exclusion only ever names participants on the roster. Mutations check
/// everything before changing anything, so a failed call leaves the roster as it was.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    #[serde(default)]
    participants: BTreeSet<ParticipantId>,
    #[serde(default)]
    exclusions: ExclusionSet<ParticipantId>,
}

impl Roster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a roster from a JSON file of the form
    /// `{"participants": ["ana", "ben"], "exclusions": [["ana", "ben"]]}`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        debug!("loading roster from {}", path.display());
        let roster: Self = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        roster.check()?;
        Ok(roster)
    }

    /// Makes sure every exclusion names participants on the roster.
    pub fn check(&self) -> Result<(), AppError> {
        for exclusion in &self.exclusions {
            let (first, second) = exclusion.pair();
            for participant in [first, second] {
                if !self.participants.contains(participant) {
                    return Err(AppError::ExclusionNotOnRoster(participant.clone()));
                }
            }
        }
        Ok(())
    }

    pub fn add_participant(&mut self, participant: ParticipantId) -> Result<(), AppError> {
        if self.participants.contains(&participant) {
            return Err(AppError::DuplicateParticipant(participant));
        }
        self.participants.insert(participant);
        Ok(())
    }

    /// Removes the participant together with all of their exclusions. Returns how many
    /// exclusions went with them.
    pub fn remove_participant(&mut self, participant: &ParticipantId) -> Result<usize, AppError> {
        if !self.participants.remove(participant) {
            return Err(AppError::UnknownParticipant(participant.clone()));
        }
        Ok(self.exclusions.remove_involving(participant))
    }

    pub fn add_exclusion(&mut self, a: ParticipantId, b: ParticipantId) -> Result<(), AppError> {
        for participant in [&a, &b] {
            if !self.participants.contains(participant) {
                return Err(AppError::ExclusionNotOnRoster(participant.clone()));
            }
        }
        if self.exclusions.contains(&a, &b) {
            return Err(AppError::DuplicateExclusion(a, b));
        }
        self.exclusions.insert(Exclusion::new(a, b)?);
        Ok(())
    }

    /// Removes the exclusion between `a` and `b` in either orientation. Returns whether
    /// there was one.
    pub fn remove_exclusion(&mut self, a: &ParticipantId, b: &ParticipantId) -> bool {
        self.exclusions.remove(a, b)
    }

    #[must_use]
    pub const fn participants(&self) -> &BTreeSet<ParticipantId> {
        &self.participants
    }

    #[must_use]
    pub const fn exclusions(&self) -> &ExclusionSet<ParticipantId> {
        &self.exclusions
    }

    #[must_use]
    pub fn contains(&self, participant: &ParticipantId) -> bool {
        self.participants.contains(participant)
    }

    #[must_use]
    pub fn eligibility(&self) -> EligibilityGraph<ParticipantId> {
        EligibilityGraph::build(&self.participants, &self.exclusions)
    }

    pub fn clear(&mut self) {
        self.participants.clear();
        self.exclusions.clear();
    }
}
