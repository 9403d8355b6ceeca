use alloc::collections::{BTreeMap, BTreeSet};

use crate::exclusion::ExclusionSet;

/// For every giver, the receivers they may draw.
///
/// Derived fresh for each draw and never stored. A giver is never eligible to draw
/// themselves, and `a` may draw `b` exactly when `b` may draw `a`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityGraph<P> {
    receivers: BTreeMap<P, BTreeSet<P>>,
}

impl<P: Ord + Clone> EligibilityGraph<P> {
    /// Builds the graph as the complement of `exclusions` within `participants`.
    ///
    /// Exclusions naming someone outside of `participants` have no effect.
    #[must_use]
    pub fn build(participants: &BTreeSet<P>, exclusions: &ExclusionSet<P>) -> Self {
        let receivers = participants
            .iter()
            .map(|giver| {
                let eligible = participants
                    .iter()
                    .filter(|receiver| *receiver != giver && !exclusions.contains(giver, receiver))
                    .cloned()
                    .collect();
                (giver.clone(), eligible)
            })
            .collect();
        Self { receivers }
    }

    /// Participants that rule out every possible draw on their own: givers without an
    /// eligible receiver among `members`, and members nobody in `members` may draw.
    ///
    /// An empty result does not mean a draw exists.
    #[must_use]
    pub fn dead_ends_within<'a>(&'a self, members: &BTreeSet<&'a P>) -> BTreeSet<&'a P> {
        let mut reachable = BTreeSet::new();
        let mut dead_ends = BTreeSet::new();
        for &giver in members {
            let mut has_receiver = false;
            for receiver in self.eligible(giver).into_iter().flatten() {
                if members.contains(receiver) {
                    has_receiver = true;
                    reachable.insert(receiver);
                }
            }
            if !has_receiver {
                dead_ends.insert(giver);
            }
        }
        dead_ends.extend(members.iter().filter(|member| !reachable.contains(*member)));
        dead_ends
    }

    #[must_use]
    pub fn dead_ends(&self) -> BTreeSet<&P> {
        self.dead_ends_within(&self.receivers.keys().collect())
    }
}

impl<P: Ord> EligibilityGraph<P> {
    #[must_use]
    pub fn eligible(&self, giver: &P) -> Option<&BTreeSet<P>> {
        self.receivers.get(giver)
    }

    #[must_use]
    pub fn can_give(&self, giver: &P, receiver: &P) -> bool {
        self.eligible(giver).is_some_and(|receivers| receivers.contains(receiver))
    }

    pub fn participants(&self) -> impl Iterator<Item = &P> {
        self.receivers.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&P, &BTreeSet<P>)> {
        self.receivers.iter()
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
