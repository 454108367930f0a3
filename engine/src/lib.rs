//! DachsTaler game resolution and economy engine.
//!
//! Pure decision core for the slot and duel game: the caller (the chat
//! command layer) hands in a typed [`Action`](dachstaler_types::Action), the
//! current unix time and an RNG, and gets back a structured
//! [`Outcome`](dachstaler_types::Outcome) plus a [`WriteIntent`] carrying
//! every storage effect of the action. Committing the intent is a separate
//! step so the read-to-write window on the non-transactional store stays as
//! small as possible.
//!
//! The engine never reads the wall clock and never seeds its own randomness;
//! both are inputs, which keeps every resolution replayable in tests.

pub mod achievements;
pub mod clock;
pub mod config;
pub mod duel;
pub mod error;
pub mod layer;
pub mod leaderboard;
pub mod ledger;
pub mod slots;
pub mod state;

pub use config::EngineConfig;
pub use error::EngineError;
pub use layer::Engine;
pub use ledger::{commit, CommitReceipt, WriteIntent};
pub use state::{Mirror, MirrorRow, NullMirror, ReadFallback, State, Status};

#[cfg(test)]
mod tests;
