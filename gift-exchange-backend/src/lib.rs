//! Keeps the state of one gift exchange and runs its draw.
//!
//! [`DrawService`] is the only way to touch that state. It holds the [`Roster`] and,
//! after a successful draw, the assignment, and refuses roster changes until the draw
//! is reset.

pub mod error;
pub mod participant;
pub mod roster;
pub mod service;
pub mod telemetry;

pub use error::{AppError, Conflict};
pub use participant::ParticipantId;
pub use roster::Roster;
pub use service::{DrawService, DrawState, DrawStatus};
