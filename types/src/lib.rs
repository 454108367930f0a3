//! Common types for the DachsTaler game engine.
//!
//! Everything that crosses the storage boundary lives here: the player/buff/
//! duel/achievement data model, the [`Key`]/[`Value`] storage enums and the
//! action/outcome API consumed by the chat and presentation collaborators.
//!
//! Stored values are encoded with `commonware-codec`. Readers tolerate
//! missing trailing fields so records written by older versions stay
//! decodable.

pub mod api;
pub mod game;
pub mod store;

pub use api::{Action, DuelOutcome, MessageKey, Outcome, PurchaseOutcome, SpinOutcome};
pub use game::*;
pub use store::{Key, KeyGroup, Value};
