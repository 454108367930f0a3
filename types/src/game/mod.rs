//! DachsTaler domain types.
//!
//! Defines the player account, buff, duel, achievement, economy and
//! leaderboard state shared by the engine and its callers.

mod achievements;
mod buffs;
mod codec;
mod constants;
mod duel;
mod economy;
mod leaderboard;
mod player;
mod symbols;

/// True once `deadline` has passed. Exactly at the deadline still counts as
/// live. Buff expiry and the duel response window both go through this, so
/// the boundary convention cannot drift between them.
pub fn deadline_passed(now: u64, deadline: u64) -> bool {
    now > deadline
}

pub use achievements::*;
pub use buffs::*;
pub use codec::{read_string, string_encode_size, write_string};
pub use constants::*;
pub use duel::*;
pub use economy::*;
pub use leaderboard::*;
pub use player::*;
pub use symbols::*;
