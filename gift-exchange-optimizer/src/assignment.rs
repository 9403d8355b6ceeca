use alloc::collections::{BTreeMap, BTreeSet};
use core::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::exclusion::ExclusionSet;

/// One giver and the receiver they drew.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pairing<P> {
    pub giver: P,
    pub receiver: P,
}

/// The result of a draw: who gives to whom.
///
/// Nothing here enforces the draw invariants on its own. Use [`validate`] or
/// [`Assignment::violation`] to check an assignment against a roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "Vec<Pairing<P>>",
    into = "Vec<Pairing<P>>",
    bound(serialize = "P: Serialize + Clone", deserialize = "P: Deserialize<'de> + Ord")
)]
pub struct Assignment<P> {
    receivers: BTreeMap<P, P>,
}

/// The first rule a checked assignment breaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation<P> {
    /// The givers are not exactly the participants.
    Givers,
    /// The receivers are not exactly the participants, each once.
    Receivers,
    SelfAssignment(P),
    Excluded { giver: P, receiver: P },
}

impl<P: Display> Display for Violation<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Givers => f.write_str("the givers do not match the participants"),
            Self::Receivers => f.write_str("every participant must receive exactly once"),
            Self::SelfAssignment(participant) => {
                write!(f, "{participant} is assigned to themselves")
            }
            Self::Excluded { giver, receiver } => {
                write!(f, "{giver} must not give to {receiver}")
            }
        }
    }
}

impl<P: Ord> Assignment<P> {
    /// Builds an assignment from `(giver, receiver)` pairs without checking it.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (P, P)>) -> Self {
        pairs.into_iter().collect()
    }

    #[must_use]
    pub fn receiver_of(&self, giver: &P) -> Option<&P> {
        self.receivers.get(giver)
    }

    #[must_use]
    pub fn giver_of(&self, receiver: &P) -> Option<&P> {
        self.receivers
            .iter()
            .find_map(|(giver, current)| (current == receiver).then_some(giver))
    }
}

impl<P: Ord + Clone> Assignment<P> {
    /// Checks the assignment against a roster and its exclusions.
    ///
    /// Exclusions are checked in both orientations.
    #[must_use]
    pub fn violation(
        &self,
        participants: &BTreeSet<P>,
        exclusions: &ExclusionSet<P>,
    ) -> Option<Violation<P>> {
        if !self.receivers.keys().eq(participants.iter()) {
            return Some(Violation::Givers);
        }
        let receivers: BTreeSet<&P> = self.receivers.values().collect();
        if receivers.len() != self.receivers.len() || !receivers.into_iter().eq(participants) {
            return Some(Violation::Receivers);
        }
        for (giver, receiver) in &self.receivers {
            if giver == receiver {
                return Some(Violation::SelfAssignment(giver.clone()));
            }
            if exclusions.contains(giver, receiver) {
                return Some(Violation::Excluded {
                    giver: giver.clone(),
                    receiver: receiver.clone(),
                });
            }
        }
        None
    }

    #[must_use]
    pub fn is_valid_for(&self, participants: &BTreeSet<P>, exclusions: &ExclusionSet<P>) -> bool {
        self.violation(participants, exclusions).is_none()
    }
}

impl<P> Assignment<P> {
    pub fn iter(&self) -> impl Iterator<Item = (&P, &P)> {
        self.receivers.iter()
    }

    pub fn givers(&self) -> impl Iterator<Item = &P> {
        self.receivers.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.receivers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.receivers.is_empty()
    }
}

/// Later pairs for the same giver replace earlier ones.
impl<P: Ord> FromIterator<(P, P)> for Assignment<P> {
    fn from_iter<T: IntoIterator<Item = (P, P)>>(iter: T) -> Self {
        Self {
            receivers: iter.into_iter().collect(),
        }
    }
}

impl<P: Ord> From<Vec<Pairing<P>>> for Assignment<P> {
    fn from(value: Vec<Pairing<P>>) -> Self {
        value
            .into_iter()
            .map(|pairing| (pairing.giver, pairing.receiver))
            .collect()
    }
}

impl<P> From<Assignment<P>> for Vec<Pairing<P>> {
    fn from(value: Assignment<P>) -> Self {
        value
            .receivers
            .into_iter()
            .map(|(giver, receiver)| Pairing { giver, receiver })
            .collect()
    }
}

/// Whether `assignment` is a complete draw for `participants` that respects `exclusions`.
#[must_use]
pub fn validate<P: Ord + Clone>(
    assignment: &Assignment<P>,
    participants: &BTreeSet<P>,
    exclusions: &ExclusionSet<P>,
) -> bool {
    assignment.is_valid_for(participants, exclusions)
}
