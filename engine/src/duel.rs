//! Duel winner determination.
//!
//! Pure over both grids and the tiebreak table, so a resolution replayed
//! from a receipt is always identical. Buffs never reach this code; the duel
//! handler draws both grids with boosts disabled.

use dachstaler_types::Grid;

use crate::config::EngineConfig;
use crate::slots::payout::{classify, GridClass};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Challenger,
    Target,
}

/// Tier ordering: triple beats pair beats lone jackpot beats miss.
fn tier_rank(class: GridClass) -> u8 {
    match class {
        GridClass::Triple(_) => 3,
        GridClass::Pair(_) => 2,
        GridClass::JackpotSingle => 1,
        GridClass::Miss => 0,
    }
}

/// Sum of the fixed per-symbol tiebreak values over the whole grid.
pub fn tiebreak_sum(grid: &Grid, config: &EngineConfig) -> u64 {
    grid.iter().map(|&s| config.tiebreak_value(s)).sum()
}

/// Decides a duel: tier first, tiebreak sum second, exact tie means no
/// winner and both stakes go back.
pub fn winner(challenger: &Grid, target: &Grid, config: &EngineConfig) -> Option<Side> {
    let challenger_tier = tier_rank(classify(challenger));
    let target_tier = tier_rank(classify(target));
    if challenger_tier != target_tier {
        return if challenger_tier > target_tier {
            Some(Side::Challenger)
        } else {
            Some(Side::Target)
        };
    }

    let challenger_sum = tiebreak_sum(challenger, config);
    let target_sum = tiebreak_sum(target, config);
    match challenger_sum.cmp(&target_sum) {
        std::cmp::Ordering::Greater => Some(Side::Challenger),
        std::cmp::Ordering::Less => Some(Side::Target),
        std::cmp::Ordering::Equal => None,
    }
}
