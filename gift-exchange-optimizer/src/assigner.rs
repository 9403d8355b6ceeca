//! Randomized backtracking search for a draw.
//!
//! Each attempt shuffles the order in which givers are placed, then walks that order
//! depth first. At every giver the still untaken eligible receivers are shuffled and tried
//! one after the other. Choosing a receiver pushes a pairing and marks the receiver taken,
//! and a dead end below pops it again before the next receiver is tried. An attempt that
//! runs out of receivers at the first giver has tried everything and proves there is no
//! draw. Only attempts cut short by a step limit are retried with a new order.
//!
//! The randomness only makes outcomes unpredictable. Valid draws are not sampled uniformly.

use alloc::collections::BTreeSet;
use core::fmt::Debug;

use itertools::Itertools as _;
use rand::seq::SliceRandom as _;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::assignment::Assignment;
use crate::eligibility::EligibilityGraph;
use crate::error::DrawError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assigner {
    max_attempts: u32,
    step_limit: Option<u64>,
}

impl Default for Assigner {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS)
    }
}

impl Assigner {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;

    #[must_use]
    pub const fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            step_limit: None,
        }
    }

    /// Gives up on an attempt after `step_limit` tentative pairings and moves on to the next.
    #[must_use]
    pub const fn with_step_limit(self, step_limit: u64) -> Self {
        Self {
            step_limit: Some(step_limit),
            ..self
        }
    }

    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub const fn step_limit(&self) -> Option<u64> {
        self.step_limit
    }

    /// Draws a receiver for every participant.
    ///
    /// Repeated participants are only placed once. Receivers are only ever picked from
    /// `participants`, even if `eligibility` knows about more people. `rng` is the only
    /// source of randomness, so a seeded rng reproduces the same draw.
    ///
    /// Fails with [`DrawError::InsufficientParticipants`] for fewer than two distinct
    /// participants and with [`DrawError::Infeasible`] once every attempt failed. When a
    /// participant can neither give nor receive at all no attempt is made and `attempts`
    /// is zero. Without a step limit one attempt searches exhaustively, so its dead end
    /// ends the draw right away.
    #[tracing::instrument(skip_all, fields(participants = participants.len()))]
    pub fn assign<P, R>(
        &self,
        participants: &[P],
        eligibility: &EligibilityGraph<P>,
        rng: &mut R,
    ) -> Result<Assignment<P>, DrawError>
    where
        P: Ord + Clone + Debug,
        R: Rng + ?Sized,
    {
        let mut seen = BTreeSet::new();
        let mut order: Vec<&P> = participants
            .iter()
            .filter(|participant| seen.insert(*participant))
            .collect();
        if order.len() < 2 {
            return Err(DrawError::InsufficientParticipants { count: order.len() });
        }
        let members = seen;

        let dead_ends = eligibility.dead_ends_within(&members);
        if !dead_ends.is_empty() {
            warn!(
                "no draw possible, these participants can not give or can not receive: {:?}",
                dead_ends.iter().format(", ")
            );
            return Err(DrawError::Infeasible { attempts: 0 });
        }

        for attempt in 1..=self.max_attempts {
            order.shuffle(rng);
            let mut search = Attempt::new(order.clone(), &members, eligibility, self.step_limit);
            match search.place(0, rng) {
                Placement::Complete => {
                    info!(attempt, steps = search.steps, "found a valid draw");
                    return Ok(search.into_assignment());
                }
                Placement::DeadEnd if self.step_limit.is_none() => {
                    // an unbounded attempt has tried every receiver for every giver
                    warn!(attempt, steps = search.steps, "no valid draw exists");
                    return Err(DrawError::Infeasible { attempts: attempt });
                }
                Placement::DeadEnd => {
                    debug!(attempt, steps = search.steps, "attempt ran out of receivers");
                }
                Placement::StepLimit => {
                    debug!(attempt, steps = search.steps, "attempt hit the step limit");
                }
            }
        }

        warn!(attempts = self.max_attempts, "giving up, no valid draw found");
        Err(DrawError::Infeasible {
            attempts: self.max_attempts,
        })
    }
}

enum Placement {
    Complete,
    DeadEnd,
    StepLimit,
}

/// State of one attempt. Nothing in here outlives the attempt.
struct Attempt<'a, P> {
    order: Vec<&'a P>,
    members: &'a BTreeSet<&'a P>,
    eligibility: &'a EligibilityGraph<P>,
    taken: BTreeSet<&'a P>,
    pairings: Vec<(&'a P, &'a P)>,
    steps: u64,
    step_limit: Option<u64>,
}

impl<'a, P: Ord + Clone> Attempt<'a, P> {
    fn new(
        order: Vec<&'a P>,
        members: &'a BTreeSet<&'a P>,
        eligibility: &'a EligibilityGraph<P>,
        step_limit: Option<u64>,
    ) -> Self {
        Self {
            pairings: Vec::with_capacity(order.len()),
            order,
            members,
            eligibility,
            taken: BTreeSet::new(),
            steps: 0,
            step_limit,
        }
    }

    fn place<R: Rng + ?Sized>(&mut self, position: usize, rng: &mut R) -> Placement {
        let Some(&giver) = self.order.get(position) else {
            return Placement::Complete;
        };

        let mut candidates: Vec<&'a P> = self
            .eligibility
            .eligible(giver)
            .into_iter()
            .flatten()
            .filter(|receiver| self.members.contains(receiver) && !self.taken.contains(receiver))
            .collect();
        candidates.shuffle(rng);

        for receiver in candidates {
            if self.step_limit.is_some_and(|limit| self.steps >= limit) {
                return Placement::StepLimit;
            }
            self.steps += 1;

            self.taken.insert(receiver);
            self.pairings.push((giver, receiver));
            match self.place(position + 1, rng) {
                Placement::DeadEnd => {}
                placement => return placement,
            }
            self.pairings.pop();
            self.taken.remove(receiver);
        }

        Placement::DeadEnd
    }

    fn into_assignment(self) -> Assignment<P> {
        self.pairings
            .into_iter()
            .map(|(giver, receiver)| (giver.clone(), receiver.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use alloc::collections::BTreeSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng as _;

    use super::Assigner;
    use crate::assignment::validate;
    use crate::eligibility::EligibilityGraph;
    use crate::error::{DrawError, ExclusionError};
    use crate::exclusion::ExclusionSet;

    fn setup(
        names: &[&'static str],
        pairs: &[(&'static str, &'static str)],
    ) -> Result<(BTreeSet<&'static str>, ExclusionSet<&'static str>), ExclusionError> {
        Ok((
            names.iter().copied().collect(),
            ExclusionSet::from_pairs(pairs.iter().copied())?,
        ))
    }

    #[test]
    fn three_participants_form_a_cycle() -> Result<(), DrawError> {
        let (participants, exclusions) = setup(&["a", "b", "c"], &[]).unwrap();
        let graph = EligibilityGraph::build(&participants, &exclusions);
        let roster: Vec<_> = participants.iter().copied().collect();

        for seed in 0..20 {
            let assignment =
                Assigner::default().assign(&roster, &graph, &mut StdRng::seed_from_u64(seed))?;
            assert!(validate(&assignment, &participants, &exclusions));
            // a derangement of three is a single 3-cycle
            let after_three = assignment
                .receiver_of(&"a")
                .and_then(|next| assignment.receiver_of(next))
                .and_then(|next| assignment.receiver_of(next));
            assert_eq!(after_three, Some(&"a"));
        }
        Ok(())
    }

    #[test]
    fn same_seed_same_draw() -> Result<(), DrawError> {
        let (participants, exclusions) =
            setup(&["a", "b", "c", "d", "e", "f"], &[("a", "b"), ("c", "d")]).unwrap();
        let graph = EligibilityGraph::build(&participants, &exclusions);
        let roster: Vec<_> = participants.iter().copied().collect();

        let first = Assigner::default().assign(&roster, &graph, &mut StdRng::seed_from_u64(42))?;
        let second = Assigner::default().assign(&roster, &graph, &mut StdRng::seed_from_u64(42))?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn too_few_participants() {
        let (participants, exclusions) = setup(&["a"], &[]).unwrap();
        let graph = EligibilityGraph::build(&participants, &exclusions);
        let mut rng = StdRng::seed_from_u64(0);

        assert_eq!(
            Assigner::default().assign(&["a"], &graph, &mut rng),
            Err(DrawError::InsufficientParticipants { count: 1 })
        );
        assert_eq!(
            Assigner::default().assign::<&str, _>(&[], &graph, &mut rng),
            Err(DrawError::InsufficientParticipants { count: 0 })
        );
        // the same person twice is still one participant
        assert_eq!(
            Assigner::default().assign(&["a", "a"], &graph, &mut rng),
            Err(DrawError::InsufficientParticipants { count: 1 })
        );
    }

    #[test]
    fn excluded_couple_cannot_draw() {
        let (participants, exclusions) = setup(&["a", "b"], &[("a", "b")]).unwrap();
        let graph = EligibilityGraph::build(&participants, &exclusions);
        assert_eq!(
            Assigner::default().assign(&["a", "b"], &graph, &mut StdRng::seed_from_u64(1)),
            Err(DrawError::Infeasible { attempts: 0 })
        );
    }

    #[test]
    fn one_exhaustive_attempt_proves_infeasibility() {
        // everyone can give and receive, but a, b and c all compete for d and e
        let (participants, exclusions) =
            setup(&["a", "b", "c", "d", "e"], &[("a", "b"), ("a", "c"), ("b", "c")]).unwrap();
        let graph = EligibilityGraph::build(&participants, &exclusions);
        assert!(graph.dead_ends().is_empty());
        let roster: Vec<_> = participants.iter().copied().collect();

        assert_eq!(
            Assigner::new(7).assign(&roster, &graph, &mut StdRng::seed_from_u64(3)),
            Err(DrawError::Infeasible { attempts: 1 })
        );
        // bounded attempts prove nothing and use up the whole budget
        assert_eq!(
            Assigner::new(7)
                .with_step_limit(10_000)
                .assign(&roster, &graph, &mut StdRng::seed_from_u64(3)),
            Err(DrawError::Infeasible { attempts: 7 })
        );
    }

    #[test]
    fn large_infeasible_roster_fails_after_one_attempt() {
        // seven of thirteen exclude each other, so they need seven outside receivers
        let names = [
            "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m",
        ];
        let group = &names[..7];
        let pairs: Vec<_> = group
            .iter()
            .enumerate()
            .flat_map(|(i, first)| group[i + 1..].iter().map(move |second| (*first, *second)))
            .collect();
        let (participants, exclusions) = setup(&names, &pairs).unwrap();
        let graph = EligibilityGraph::build(&participants, &exclusions);
        assert!(graph.dead_ends().is_empty());
        let roster: Vec<_> = participants.iter().copied().collect();

        assert_eq!(
            Assigner::default().assign(&roster, &graph, &mut StdRng::seed_from_u64(5)),
            Err(DrawError::Infeasible { attempts: 1 })
        );
    }

    #[test]
    fn step_limit_ends_attempts_early() {
        let (participants, exclusions) = setup(&["a", "b", "c", "d"], &[]).unwrap();
        let graph = EligibilityGraph::build(&participants, &exclusions);
        let roster: Vec<_> = participants.iter().copied().collect();

        // a complete draw needs one step per participant
        assert_eq!(
            Assigner::new(5)
                .with_step_limit(2)
                .assign(&roster, &graph, &mut StdRng::seed_from_u64(9)),
            Err(DrawError::Infeasible { attempts: 5 })
        );
        assert!(Assigner::new(5)
            .with_step_limit(64)
            .assign(&roster, &graph, &mut StdRng::seed_from_u64(9))
            .is_ok());
    }

    #[test]
    fn receivers_come_from_the_participants_only() -> Result<(), DrawError> {
        let (everyone, exclusions) = setup(&["a", "b", "c", "d"], &[]).unwrap();
        let graph = EligibilityGraph::build(&everyone, &exclusions);
        let participants: BTreeSet<_> = ["a", "b", "c"].into_iter().collect();
        let roster: Vec<_> = participants.iter().copied().collect();

        for seed in 0..10 {
            let assignment =
                Assigner::default().assign(&roster, &graph, &mut StdRng::seed_from_u64(seed))?;
            assert!(validate(&assignment, &participants, &exclusions));
        }
        Ok(())
    }
}
