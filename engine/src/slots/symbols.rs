//! Weighted symbol draws.

use dachstaler_types::{Grid, Symbol};
use rand::Rng;

use crate::config::SymbolWeight;

const PPM_SCALE: u32 = 1_000_000;

/// Precomputed cumulative-weight table over the reel symbols. The jackpot
/// symbol is never part of the table; it enters a grid only through its own
/// per-cell gate.
pub struct ReelTable {
    symbols: Vec<Symbol>,
    cumulative: Vec<u64>,
    total: u64,
}

impl ReelTable {
    pub fn new(weights: &[SymbolWeight]) -> Self {
        Self::boosted(weights, None)
    }

    /// Table with one symbol's weight raised, for probability-shifting buffs.
    pub fn boosted(weights: &[SymbolWeight], boost: Option<(Symbol, u32)>) -> Self {
        let mut symbols = Vec::with_capacity(weights.len());
        let mut cumulative = Vec::with_capacity(weights.len());
        let mut total = 0u64;
        for entry in weights {
            let mut weight = entry.weight as u64;
            if let Some((symbol, bonus)) = boost {
                if symbol == entry.symbol {
                    weight += bonus as u64;
                }
            }
            if weight == 0 {
                continue;
            }
            total += weight;
            symbols.push(entry.symbol);
            cumulative.push(total);
        }
        Self {
            symbols,
            cumulative,
            total,
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// One weighted draw: uniform roll in `[0, total)`, resolved to the first
    /// cumulative entry above it.
    pub fn draw(&self, rng: &mut impl Rng) -> Symbol {
        let roll = rng.gen_range(0..self.total);
        let index = self.cumulative.partition_point(|&c| c <= roll);
        self.symbols[index]
    }

    /// Draws a full grid. Each cell first passes the independent jackpot
    /// gate (`jackpot_ppm` in parts per million); only cells that miss it go
    /// through the weighted table.
    pub fn draw_grid(&self, rng: &mut impl Rng, jackpot_ppm: u32) -> Grid {
        let jackpot_ppm = jackpot_ppm.min(PPM_SCALE);
        let mut grid = [Symbol::Cherry; 3];
        for cell in &mut grid {
            *cell = if jackpot_ppm > 0 && rng.gen_range(0..PPM_SCALE) < jackpot_ppm {
                Symbol::Dachs
            } else {
                self.draw(rng)
            };
        }
        grid
    }
}
