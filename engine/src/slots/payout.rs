//! Grid classification and base payouts.

use dachstaler_types::{Grid, MessageKey, Symbol, BPS_ONE, FREE_SPINS_PAIR, FREE_SPINS_TRIPLE};

use crate::config::EngineConfig;

/// Fixed-point multiply: `amount * bps / 10_000`, widened to avoid overflow.
pub fn mul_bps(amount: u64, bps: u64) -> u64 {
    let wide = (amount as u128 * bps as u128) / BPS_ONE as u128;
    wide.min(u64::MAX as u128) as u64
}

/// The single class a grid falls into. A lone jackpot symbol is a win of its
/// own; any other single symbol is a miss.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridClass {
    Triple(Symbol),
    Pair(Symbol),
    JackpotSingle,
    Miss,
}

pub fn classify(grid: &Grid) -> GridClass {
    let [a, b, c] = *grid;
    if a == b && b == c {
        GridClass::Triple(a)
    } else if a == b || a == c {
        GridClass::Pair(a)
    } else if b == c {
        GridClass::Pair(b)
    } else if grid.iter().any(|s| s.is_jackpot()) {
        GridClass::JackpotSingle
    } else {
        GridClass::Miss
    }
}

/// Base evaluation of one grid, before streak, bonus and buff adjustments.
/// `payout` already carries the bet multiplier; free spins carry it through
/// [`dachstaler_types::FreeSpinCredit`] instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Evaluation {
    pub class: GridClass,
    pub payout: u64,
    pub free_spins: u32,
    pub message: MessageKey,
    pub jackpot_hit: bool,
}

impl Evaluation {
    pub fn is_win(&self) -> bool {
        self.payout > 0 || self.free_spins > 0
    }
}

pub fn evaluate(grid: &Grid, bet_multiplier_bps: u64, config: &EngineConfig) -> Evaluation {
    let class = classify(grid);
    let mut payout = 0;
    let mut free_spins = 0;
    let mut jackpot_hit = false;
    let message = match class {
        GridClass::Triple(symbol) if symbol.is_jackpot() => {
            payout = mul_bps(config.jackpot.triple, bet_multiplier_bps);
            jackpot_hit = true;
            MessageKey::JackpotTriple
        }
        GridClass::Triple(symbol) if symbol.awards_free_spins() => {
            free_spins = FREE_SPINS_TRIPLE;
            MessageKey::FreeSpins
        }
        GridClass::Triple(symbol) => {
            let base = config.payout_for(symbol).map(|row| row.triple).unwrap_or(0);
            payout = mul_bps(base, bet_multiplier_bps);
            MessageKey::Triple
        }
        GridClass::Pair(symbol) if symbol.is_jackpot() => {
            payout = mul_bps(config.jackpot.pair, bet_multiplier_bps);
            jackpot_hit = true;
            MessageKey::JackpotPair
        }
        GridClass::Pair(symbol) if symbol.awards_free_spins() => {
            free_spins = FREE_SPINS_PAIR;
            MessageKey::FreeSpins
        }
        GridClass::Pair(symbol) => {
            let base = config.payout_for(symbol).map(|row| row.pair).unwrap_or(0);
            payout = mul_bps(base, bet_multiplier_bps);
            MessageKey::Pair
        }
        GridClass::JackpotSingle => {
            payout = mul_bps(config.jackpot.single, bet_multiplier_bps);
            jackpot_hit = true;
            MessageKey::JackpotSingle
        }
        GridClass::Miss => MessageKey::NoWin,
    };

    Evaluation {
        class,
        payout,
        free_spins,
        message,
        jackpot_hit,
    }
}
