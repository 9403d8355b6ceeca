use gift_exchange_config::ConfigError;
use gift_exchange_optimizer::{DrawError, ExclusionError};

use crate::participant::ParticipantId;

/// Why a request was refused because of the current draw state.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    #[error("the draw has already been done, reset it first")]
    AlreadyDrawn,
    #[error("participants and exclusions can not be changed after the draw, reset it first")]
    LockedAfterDraw,
}

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Draw(#[from] DrawError),
    #[error("invalid exclusion: {0}")]
    InvalidExclusion(#[from] ExclusionError),
    #[error("invalid exclusion: {0} is not a participant")]
    ExclusionNotOnRoster(ParticipantId),
    #[error("this exclusion already exists: {0} and {1}")]
    DuplicateExclusion(ParticipantId, ParticipantId),
    #[error("this participant already exists: {0}")]
    DuplicateParticipant(ParticipantId),
    #[error("unknown participant: {0}")]
    UnknownParticipant(ParticipantId),
    #[error("state conflict: {0}")]
    StateConflict(#[from] Conflict),
    #[error("invalid assignment: {0}")]
    InvalidAssignment(String),
    #[error("the draw state lock is poisoned")]
    Poisoned,
    #[error(
        "no roster file configured. Set roster_file in gift-exchange.toml or \
         GIFT_EXCHANGE_ROSTER_FILE."
    )]
    MissingRosterFile,
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    File(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("log filter error: {0}")]
    LogFilter(#[from] tracing_subscriber::filter::ParseError),
    #[error("logging setup error: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),
}

impl AppError {
    /// Whether the caller can fix the request and try again, as opposed to an
    /// environment or internal failure.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::Poisoned
                | Self::Config(_)
                | Self::File(_)
                | Self::Json(_)
                | Self::LogFilter(_)
                | Self::Logging(_)
        )
    }
}
