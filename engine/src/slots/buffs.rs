//! Buff resolution for one pending spin.
//!
//! Precedence is fixed: probability-shifting buffs act before the draw,
//! one-shot substitutions rewrite the drawn grid before evaluation, payout
//! multipliers apply after evaluation. Validity is checked against `now` at
//! read time; a stale persisted record is simply dead.

use dachstaler_types::{
    BuffId, BuffInstance, BuffKind, BuffSet, Grid, Symbol, BPS_ONE,
};

use crate::config::EngineConfig;
use crate::slots::payout::{classify, mul_bps, GridClass};

/// Pre-draw adjustments collected from probability-shifting buffs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PreSpin {
    pub weight_boost: Option<(Symbol, u32)>,
    pub jackpot_ppm_bonus: u32,
}

/// Per-spin buff resolver. Owns the player's buff set for the duration of
/// the action and hands back the settled set for persistence.
pub struct Resolver<'a> {
    set: BuffSet,
    config: &'a EngineConfig,
    now: u64,
    radar_used: bool,
    doubler_used: bool,
    substituted: Option<BuffId>,
}

impl<'a> Resolver<'a> {
    pub fn new(set: BuffSet, config: &'a EngineConfig, now: u64) -> Self {
        Self {
            set,
            config,
            now,
            radar_used: false,
            doubler_used: false,
            substituted: None,
        }
    }

    fn active(&self, id: BuffId) -> Option<&BuffInstance> {
        self.set.get(id).filter(|buff| buff.is_active(self.now))
    }

    pub fn pre_spin(&mut self) -> PreSpin {
        let catalog = &self.config.buffs;
        let weight_boost = self
            .active(BuffId::LuckyCharm)
            .map(|_| (catalog.lucky_charm.symbol, catalog.lucky_charm.weight_bonus));
        let jackpot_ppm_bonus = if self.active(BuffId::DachsRadar).is_some() {
            self.radar_used = true;
            catalog.dachs_radar.ppm_bonus
        } else {
            0
        };
        PreSpin {
            weight_boost,
            jackpot_ppm_bonus,
        }
    }

    /// The most valuable substitution target present in the grid, ranked by
    /// triple payout. The jackpot symbol is never a candidate.
    fn best_symbol(&self, grid: &Grid) -> Option<Symbol> {
        grid.iter()
            .filter(|s| !s.is_jackpot())
            .max_by_key(|&&s| {
                self.config
                    .payout_for(s)
                    .map(|row| row.triple)
                    .unwrap_or(0)
            })
            .copied()
    }

    /// Applies at most one one-shot grid substitution. A grid containing the
    /// jackpot symbol is left untouched so substitution can neither fabricate
    /// nor disturb a jackpot occurrence.
    pub fn substitute(&mut self, grid: Grid) -> Grid {
        if grid.iter().any(|s| s.is_jackpot()) {
            return grid;
        }

        if self.active(BuffId::WildCard).is_some() {
            if let Some(best) = self.best_symbol(&grid) {
                self.substituted = Some(BuffId::WildCard);
                return [best; 3];
            }
        }

        if self.active(BuffId::GuaranteedPair).is_some() && classify(&grid) == GridClass::Miss {
            if let Some(best) = self.best_symbol(&grid) {
                // A missed grid has three distinct symbols, so a filler
                // different from `best` always exists.
                let filler = grid
                    .iter()
                    .copied()
                    .find(|&s| s != best)
                    .unwrap_or(Symbol::Cherry);
                self.substituted = Some(BuffId::GuaranteedPair);
                return [best, best, filler];
            }
        }

        grid
    }

    /// Combined payout multiplier of all active post-evaluation buffs.
    /// Call only for winning spins; it marks use-limited multipliers as
    /// consumed.
    pub fn payout_multiplier_bps(&mut self) -> u64 {
        let catalog = &self.config.buffs;
        let mut bps = BPS_ONE;
        if self.active(BuffId::ProfitDoubler).is_some() {
            self.doubler_used = true;
            bps = mul_bps(bps, catalog.profit_doubler.multiplier_bps);
        }
        if self.active(BuffId::HappyHour).is_some() {
            bps = mul_bps(bps, catalog.happy_hour.multiplier_bps);
        }
        if let Some(buff) = self.active(BuffId::RageMode) {
            if let BuffKind::StackLimited { stacks, .. } = buff.kind {
                let rage = BPS_ONE + stacks as u64 * catalog.rage_mode.per_stack_bps;
                bps = mul_bps(bps, rage);
            }
        }
        bps
    }

    /// Settles consumption: removes fired one-shots, decrements used
    /// counters, grows rage stacks on a loss, and prunes everything dead.
    pub fn settle(mut self, won: bool) -> BuffSet {
        if let Some(id) = self.substituted {
            self.set.remove(id);
        }
        if self.radar_used {
            decrement_use(&mut self.set, BuffId::DachsRadar);
        }
        if self.doubler_used {
            decrement_use(&mut self.set, BuffId::ProfitDoubler);
        }
        if !won {
            let max_stacks = self.config.buffs.rage_mode.max_stacks;
            let now = self.now;
            if let Some(buff) = self.set.get_mut(BuffId::RageMode) {
                if buff.is_active(now) {
                    if let BuffKind::StackLimited { stacks, .. } = &mut buff.kind {
                        *stacks = stacks.saturating_add(1).min(max_stacks);
                    }
                }
            }
        }
        self.set.prune(self.now);
        self.set
    }
}

fn decrement_use(set: &mut BuffSet, id: BuffId) {
    if let Some(buff) = set.get_mut(id) {
        if let BuffKind::UsesLimited { remaining, .. } = &mut buff.kind {
            *remaining = remaining.saturating_sub(1);
        }
    }
}

/// Activates a purchased buff into the player's set. Uses-limited grants
/// stack onto a live instance; every other kind replaces it.
pub fn grant(set: &mut BuffSet, id: BuffId, config: &EngineConfig, now: u64) {
    let catalog = &config.buffs;
    let kind = match id {
        BuffId::LuckyCharm => BuffKind::Timed {
            activated_ts: now,
            duration_secs: catalog.lucky_charm.duration_secs,
        },
        BuffId::DachsRadar => BuffKind::UsesLimited {
            remaining: catalog.dachs_radar.uses,
            expires_ts: now.saturating_add(catalog.dachs_radar.ttl_secs),
        },
        BuffId::ProfitDoubler => BuffKind::UsesLimited {
            remaining: catalog.profit_doubler.uses,
            expires_ts: now.saturating_add(catalog.profit_doubler.ttl_secs),
        },
        BuffId::HappyHour => BuffKind::Timed {
            activated_ts: now,
            duration_secs: catalog.happy_hour.duration_secs,
        },
        BuffId::RageMode => BuffKind::StackLimited {
            stacks: 0,
            expires_ts: now.saturating_add(catalog.rage_mode.ttl_secs),
        },
        BuffId::WildCard | BuffId::GuaranteedPair => BuffKind::OneShot,
    };

    if let BuffKind::UsesLimited {
        remaining: granted,
        expires_ts: new_expiry,
    } = kind
    {
        if let Some(existing) = set.get_mut(id) {
            if existing.is_active(now) {
                if let BuffKind::UsesLimited {
                    remaining,
                    expires_ts,
                } = &mut existing.kind
                {
                    *remaining = remaining.saturating_add(granted);
                    *expires_ts = (*expires_ts).max(new_expiry);
                    return;
                }
            }
        }
    }

    set.remove(id);
    set.buffs.push(BuffInstance { id, kind });
}
