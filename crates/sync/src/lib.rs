//! Tracks a knowledge map that is generated remotely.
//!
//! Two channels report on the same artifact and may arrive in any order:
//! a push channel with free text progress and a completion signal, and a
//! poll of the backend which is the only source of truth for the map
//! itself. [`merge`] folds both into one [`SyncState`] and
//! [`SyncCoordinator`] drives the polling and owns the channels.

mod coordinator;
mod poll;
mod state;

pub use coordinator::{SyncConfig, SyncCoordinator};
pub use poll::{HttpPollSource, PollError, PollSource};
pub use state::{merge, SyncMessage, SyncPhase, SyncState, Transition};
