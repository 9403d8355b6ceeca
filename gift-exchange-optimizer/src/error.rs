#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawError {
    #[error("at least 2 participants are needed for a draw, got {count}")]
    InsufficientParticipants { count: usize },
    #[error(
        "no valid draw found after {attempts} attempts, the exclusions are too restrictive. \
         Try removing some of them."
    )]
    Infeasible { attempts: u32 },
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionError {
    #[error("an exclusion needs two different participants")]
    SelfExclusion,
}
