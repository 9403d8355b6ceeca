use std::sync::{Mutex, MutexGuard};

use gift_exchange_config::Config;
use gift_exchange_optimizer::{Assigner, Assignment, EligibilityGraph};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng as _};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::{AppError, Conflict};
use crate::participant::ParticipantId;
use crate::roster::Roster;

/// Everything a gift exchange needs to remember between requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawState {
    pub roster: Roster,
    /// `Some` once a draw succeeded, until the next reset.
    pub assignment: Option<Assignment<ParticipantId>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DrawStatus {
    pub participants: usize,
    pub exclusions: usize,
    pub draw_completed: bool,
}

struct Inner<R> {
    state: DrawState,
    rng: R,
}

/// Owns the draw state and serializes every access to it.
///
/// One lock guards roster, exclusions, assignment and the rng, and a draw holds it
/// from start to finish, so a draw always sees one consistent roster and nothing can
/// change it halfway. A draw either stores a complete assignment or changes nothing.
pub struct DrawService<R = StdRng> {
    inner: Mutex<Inner<R>>,
    assigner: Assigner,
}

fn assigner_for(config: &Config) -> Assigner {
    let assigner = Assigner::new(config.max_attempts);
    match config.step_limit {
        Some(step_limit) => assigner.with_step_limit(step_limit),
        None => assigner,
    }
}

impl DrawService<StdRng> {
    /// Seeds the rng from `config.seed` or, without one, from system entropy.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self::with_rng(config, rng)
    }
}

impl Default for DrawService<StdRng> {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl<R: Rng> DrawService<R> {
    pub fn with_rng(config: &Config, rng: R) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: DrawState::default(),
                rng,
            }),
            assigner: assigner_for(config),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner<R>>, AppError> {
        self.inner.lock().map_err(|_| AppError::Poisoned)
    }

    fn mutate_roster<T>(
        &self,
        change: impl FnOnce(&mut Roster) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut inner = self.lock()?;
        if inner.state.assignment.is_some() {
            return Err(Conflict::LockedAfterDraw.into());
        }
        change(&mut inner.state.roster)
    }

    pub fn add_participant(&self, participant: ParticipantId) -> Result<(), AppError> {
        self.mutate_roster(|roster| roster.add_participant(participant))
    }

    /// Also drops every exclusion involving the participant.
    pub fn remove_participant(&self, participant: &ParticipantId) -> Result<(), AppError> {
        let dropped = self.mutate_roster(|roster| roster.remove_participant(participant))?;
        info!(%participant, dropped_exclusions = dropped, "removed participant");
        Ok(())
    }

    pub fn add_exclusion(&self, a: ParticipantId, b: ParticipantId) -> Result<(), AppError> {
        self.mutate_roster(|roster| roster.add_exclusion(a, b))
    }

    pub fn remove_exclusion(&self, a: &ParticipantId, b: &ParticipantId) -> Result<bool, AppError> {
        self.mutate_roster(|roster| Ok(roster.remove_exclusion(a, b)))
    }

    /// Draws a receiver for every participant and keeps the result until [`Self::reset`].
    #[tracing::instrument(skip(self))]
    pub fn draw(&self) -> Result<Assignment<ParticipantId>, AppError> {
        let mut guard = self.lock()?;
        let Inner { state, rng } = &mut *guard;
        if state.assignment.is_some() {
            return Err(Conflict::AlreadyDrawn.into());
        }

        let roster = &state.roster;
        let participants: Vec<ParticipantId> = roster.participants().iter().cloned().collect();
        let assignment = match self.assigner.assign(&participants, &roster.eligibility(), rng) {
            Ok(assignment) => assignment,
            Err(err) => {
                warn!("draw failed: {err}");
                return Err(err.into());
            }
        };
        if let Some(violation) = assignment.violation(roster.participants(), roster.exclusions())
        {
            error!("refusing to store an invalid draw: {violation}");
            return Err(AppError::InvalidAssignment(violation.to_string()));
        }

        info!(participants = participants.len(), "draw completed");
        state.assignment = Some(assignment.clone());
        Ok(assignment)
    }

    /// Throws away the assignment. Participants and exclusions stay.
    pub fn reset(&self) -> Result<(), AppError> {
        let mut inner = self.lock()?;
        if inner.state.assignment.take().is_some() {
            info!("draw reset");
        }
        Ok(())
    }

    /// Throws away the assignment, all participants and all exclusions.
    pub fn full_reset(&self) -> Result<(), AppError> {
        self.lock()?.state = DrawState::default();
        info!("everything reset");
        Ok(())
    }

    pub fn status(&self) -> Result<DrawStatus, AppError> {
        let inner = self.lock()?;
        Ok(DrawStatus {
            participants: inner.state.roster.participants().len(),
            exclusions: inner.state.roster.exclusions().len(),
            draw_completed: inner.state.assignment.is_some(),
        })
    }

    /// Who `giver` gives to. `None` until a draw has been done.
    pub fn receiver_of(&self, giver: &ParticipantId) -> Result<Option<ParticipantId>, AppError> {
        let inner = self.lock()?;
        if !inner.state.roster.contains(giver) {
            return Err(AppError::UnknownParticipant(giver.clone()));
        }
        Ok(inner
            .state
            .assignment
            .as_ref()
            .and_then(|assignment| assignment.receiver_of(giver))
            .cloned())
    }

    pub fn eligibility(&self) -> Result<EligibilityGraph<ParticipantId>, AppError> {
        Ok(self.lock()?.state.roster.eligibility())
    }

    pub fn snapshot(&self) -> Result<DrawState, AppError> {
        Ok(self.lock()?.state.clone())
    }

    /// Replaces the whole state, e.g. with one loaded from storage. Nothing changes if
    /// `state` is inconsistent.
    pub fn restore(&self, state: DrawState) -> Result<(), AppError> {
        state.roster.check()?;
        if let Some(assignment) = &state.assignment {
            if let Some(violation) =
                assignment.violation(state.roster.participants(), state.roster.exclusions())
            {
                return Err(AppError::InvalidAssignment(violation.to_string()));
            }
        }
        self.lock()?.state = state;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use gift_exchange_config::Config;
    use gift_exchange_optimizer::{validate, Assignment, DrawError};

    use super::{assigner_for, DrawService, DrawState};
    use crate::error::{AppError, Conflict};
    use crate::participant::ParticipantId;

    fn id(name: &str) -> ParticipantId {
        ParticipantId::new(name)
    }

    fn seeded(seed: u64) -> DrawService {
        DrawService::new(&Config {
            seed: Some(seed),
            ..Config::default()
        })
    }

    fn with_participants(names: &[&str]) -> Result<DrawService, AppError> {
        let service = seeded(5);
        for name in names {
            service.add_participant(id(name))?;
        }
        Ok(service)
    }

    #[test]
    fn draw_with_too_few_participants() -> Result<(), AppError> {
        let service = with_participants(&["ana"])?;
        assert!(matches!(
            service.draw(),
            Err(AppError::Draw(DrawError::InsufficientParticipants { count: 1 }))
        ));
        assert!(!service.status()?.draw_completed);
        Ok(())
    }

    #[test]
    fn failed_draw_changes_nothing() -> Result<(), AppError> {
        let service = with_participants(&["ana", "ben"])?;
        service.add_exclusion(id("ana"), id("ben"))?;
        let before = service.snapshot()?;

        assert!(matches!(
            service.draw(),
            Err(AppError::Draw(DrawError::Infeasible { .. }))
        ));
        assert_eq!(service.snapshot()?, before);
        assert_eq!(service.receiver_of(&id("ana"))?, None);

        // still editable after a failed draw
        assert!(service.remove_exclusion(&id("ana"), &id("ben"))?);
        let assignment = service.draw()?;
        assert_eq!(assignment.receiver_of(&id("ana")), Some(&id("ben")));
        Ok(())
    }

    #[test]
    fn roster_is_locked_after_the_draw() -> Result<(), AppError> {
        let service = with_participants(&["ana", "ben", "cleo"])?;
        service.draw()?;

        let conflict = |result: Result<(), AppError>| {
            matches!(
                result,
                Err(AppError::StateConflict(Conflict::LockedAfterDraw))
            )
        };
        assert!(conflict(service.add_participant(id("dan"))));
        assert!(conflict(service.remove_participant(&id("ana"))));
        assert!(conflict(service.add_exclusion(id("ana"), id("ben"))));
        assert!(matches!(
            service.remove_exclusion(&id("ana"), &id("ben")),
            Err(AppError::StateConflict(Conflict::LockedAfterDraw))
        ));
        assert!(matches!(
            service.draw(),
            Err(AppError::StateConflict(Conflict::AlreadyDrawn))
        ));
        Ok(())
    }

    #[test]
    fn reset_behaves_like_a_fresh_draw() -> Result<(), AppError> {
        let service = with_participants(&["ana", "ben", "cleo", "dan"])?;
        service.add_exclusion(id("ana"), id("ben"))?;
        let before = service.snapshot()?;

        service.draw()?;
        service.reset()?;
        service.reset()?;
        assert_eq!(service.snapshot()?, before);
        assert!(!service.status()?.draw_completed);
        assert_eq!(service.receiver_of(&id("cleo"))?, None);

        service.add_participant(id("eve"))?;
        let assignment = service.draw()?;
        let state = service.snapshot()?;
        assert!(validate(
            &assignment,
            state.roster.participants(),
            state.roster.exclusions()
        ));
        Ok(())
    }

    #[test]
    fn full_reset_forgets_everyone() -> Result<(), AppError> {
        let service = with_participants(&["ana", "ben"])?;
        service.draw()?;
        service.full_reset()?;
        assert_eq!(service.snapshot()?, DrawState::default());
        assert!(matches!(
            service.receiver_of(&id("ana")),
            Err(AppError::UnknownParticipant(_))
        ));
        Ok(())
    }

    #[test]
    fn assigner_follows_the_config() {
        let config = Config {
            max_attempts: 3,
            step_limit: Some(50),
            ..Config::default()
        };
        let assigner = assigner_for(&config);
        assert_eq!(assigner.max_attempts(), 3);
        assert_eq!(assigner.step_limit(), Some(50));
        assert_eq!(assigner_for(&Config::default()).step_limit(), None);
    }

    #[test]
    fn invalid_restore_names_participants_plainly() -> Result<(), AppError> {
        let service = with_participants(&["ana", "ben", "cleo"])?;
        let mut state = service.snapshot()?;
        let swap_and_self = [
            (id("ana"), id("ben")),
            (id("ben"), id("ana")),
            (id("cleo"), id("cleo")),
        ];
        state.assignment = Some(Assignment::from_pairs(swap_and_self));
        match service.restore(state) {
            Err(AppError::InvalidAssignment(message)) => {
                assert_eq!(message, "cleo is assigned to themselves");
            }
            other => panic!("unexpected {other:?}"),
        }

        let mut state = service.snapshot()?;
        state.roster.add_exclusion(id("ana"), id("ben"))?;
        let cycle = [
            (id("ana"), id("ben")),
            (id("ben"), id("cleo")),
            (id("cleo"), id("ana")),
        ];
        state.assignment = Some(Assignment::from_pairs(cycle));
        match service.restore(state) {
            Err(AppError::InvalidAssignment(message)) => {
                assert_eq!(message, "ana must not give to ben");
            }
            other => panic!("unexpected {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn restore_rejects_invalid_assignments() -> Result<(), AppError> {
        let service = with_participants(&["ana", "ben"])?;
        let mut state = service.snapshot()?;
        let self_gifts = [(id("ana"), id("ana")), (id("ben"), id("ben"))];
        state.assignment = Some(Assignment::from_pairs(self_gifts));
        assert!(matches!(
            service.restore(state),
            Err(AppError::InvalidAssignment(_))
        ));
        assert!(!service.status()?.draw_completed);

        let mut state = service.snapshot()?;
        let swap = [(id("ana"), id("ben")), (id("ben"), id("ana"))];
        state.assignment = Some(Assignment::from_pairs(swap));
        service.restore(state)?;
        assert_eq!(service.receiver_of(&id("ben"))?, Some(id("ana")));
        Ok(())
    }
}
