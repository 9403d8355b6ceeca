use alloc::collections::BTreeSet;
use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::ExclusionError;

/// Two participants that must not draw each other, in either direction.
///
/// The pair is unordered: `Exclusion::new(a, b)` and `Exclusion::new(b, a)` are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(
    try_from = "(P, P)",
    into = "(P, P)",
    bound(serialize = "P: Serialize + Clone", deserialize = "P: Deserialize<'de> + Ord")
)]
pub struct Exclusion<P> {
    // always `first < second`
    first: P,
    second: P,
}

impl<P: Ord> Exclusion<P> {
    pub fn new(a: P, b: P) -> Result<Self, ExclusionError> {
        match a.cmp(&b) {
            Ordering::Less => Ok(Self {
                first: a,
                second: b,
            }),
            Ordering::Greater => Ok(Self {
                first: b,
                second: a,
            }),
            Ordering::Equal => Err(ExclusionError::SelfExclusion),
        }
    }

    #[must_use]
    pub fn involves(&self, participant: &P) -> bool {
        &self.first == participant || &self.second == participant
    }

    /// The partner of `participant` in this pair, if `participant` is part of it.
    #[must_use]
    pub fn other(&self, participant: &P) -> Option<&P> {
        if &self.first == participant {
            Some(&self.second)
        } else if &self.second == participant {
            Some(&self.first)
        } else {
            None
        }
    }

    #[must_use]
    pub fn matches(&self, a: &P, b: &P) -> bool {
        (&self.first == a && &self.second == b) || (&self.first == b && &self.second == a)
    }
}

impl<P> Exclusion<P> {
    pub const fn pair(&self) -> (&P, &P) {
        (&self.first, &self.second)
    }
}

impl<P: Ord> TryFrom<(P, P)> for Exclusion<P> {
    type Error = ExclusionError;

    fn try_from((a, b): (P, P)) -> Result<Self, Self::Error> {
        Self::new(a, b)
    }
}

impl<P> From<Exclusion<P>> for (P, P) {
    fn from(value: Exclusion<P>) -> Self {
        (value.first, value.second)
    }
}

/// A set of exclusions without duplicate pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    transparent,
    bound(serialize = "P: Serialize + Clone", deserialize = "P: Deserialize<'de> + Ord")
)]
pub struct ExclusionSet<P> {
    pairs: BTreeSet<Exclusion<P>>,
}

impl<P> Default for ExclusionSet<P> {
    fn default() -> Self {
        Self {
            pairs: BTreeSet::new(),
        }
    }
}

impl<P: Ord + Clone> ExclusionSet<P> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from raw pairs, rejecting any pair of a participant with itself.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, ExclusionError>
    where
        I: IntoIterator<Item = (P, P)>,
    {
        pairs
            .into_iter()
            .map(|(a, b)| Exclusion::new(a, b))
            .collect()
    }

    /// Returns `false` if the pair was already present.
    pub fn insert(&mut self, exclusion: Exclusion<P>) -> bool {
        self.pairs.insert(exclusion)
    }

    /// Removes the pair in whichever orientation it was given. Returns whether it existed.
    pub fn remove(&mut self, a: &P, b: &P) -> bool {
        Exclusion::new(a.clone(), b.clone()).is_ok_and(|exclusion| self.pairs.remove(&exclusion))
    }

    /// Removes every pair involving `participant` and returns how many were dropped.
    pub fn remove_involving(&mut self, participant: &P) -> usize {
        let before = self.pairs.len();
        self.pairs.retain(|exclusion| !exclusion.involves(participant));
        before - self.pairs.len()
    }

    #[must_use]
    pub fn contains(&self, a: &P, b: &P) -> bool {
        Exclusion::new(a.clone(), b.clone()).is_ok_and(|exclusion| self.pairs.contains(&exclusion))
    }

    /// Everyone `participant` is excluded from.
    pub fn partners_of<'a>(&'a self, participant: &'a P) -> impl Iterator<Item = &'a P> + 'a {
        self.pairs
            .iter()
            .filter_map(move |exclusion| exclusion.other(participant))
    }
}

impl<P> ExclusionSet<P> {
    pub fn iter(&self) -> impl Iterator<Item = &Exclusion<P>> {
        self.pairs.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn clear(&mut self) {
        self.pairs.clear();
    }
}

impl<P: Ord> FromIterator<Exclusion<P>> for ExclusionSet<P> {
    fn from_iter<T: IntoIterator<Item = Exclusion<P>>>(iter: T) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

impl<'a, P> IntoIterator for &'a ExclusionSet<P> {
    type IntoIter = alloc::collections::btree_set::Iter<'a, Exclusion<P>>;
    type Item = &'a Exclusion<P>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}
