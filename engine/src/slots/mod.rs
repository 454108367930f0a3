//! The spin pipeline: weighted symbol draws, grid evaluation, streak
//! tracking and buff resolution.

pub mod buffs;
pub mod payout;
pub mod streak;
pub mod symbols;
