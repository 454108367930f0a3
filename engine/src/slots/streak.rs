//! Win/loss streak state machine and its derived bonuses.

use dachstaler_types::{StreakState, BPS_ONE};

use crate::config::StreakConfig;

/// Streak multiplier for a given consecutive-win count, in basis points.
pub fn multiplier_bps(wins: u32, config: &StreakConfig) -> u64 {
    if wins == 0 {
        return BPS_ONE;
    }
    let steps = wins.saturating_sub(1).min(config.cap_steps) as u64;
    (BPS_ONE + steps * config.step_bps).min(config.ceiling_bps)
}

/// Result of advancing the streak by one spin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreakOutcome {
    pub streak: StreakState,
    /// Multiplier derived from the updated win count.
    pub multiplier_bps: u64,
    /// Combo + hot-streak + comeback bonus, flat and additive.
    pub bonus: u64,
    pub hot_streak: bool,
    pub comeback: bool,
}

/// Advances the streak. Bonuses fire on reaching a threshold exactly, never
/// again while the streak continues past it.
pub fn advance(prior: &StreakState, won: bool, config: &StreakConfig) -> StreakOutcome {
    if !won {
        let streak = StreakState {
            wins: 0,
            losses: prior.losses.saturating_add(1),
        };
        return StreakOutcome {
            streak,
            multiplier_bps: BPS_ONE,
            bonus: 0,
            hot_streak: false,
            comeback: false,
        };
    }

    let wins = prior.wins.saturating_add(1);
    let comeback = prior.losses >= config.comeback_threshold;
    let hot_streak = wins == config.hot_streak_threshold;

    let mut bonus = 0;
    for combo in &config.combo_bonuses {
        if combo.wins == wins {
            bonus += combo.bonus;
        }
    }
    if hot_streak {
        bonus += config.hot_streak_bonus;
    }
    if comeback {
        bonus += config.comeback_bonus;
    }

    let streak = StreakState { wins, losses: 0 };
    StreakOutcome {
        multiplier_bps: multiplier_bps(wins, config),
        streak,
        bonus,
        hot_streak,
        comeback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> StreakConfig {
        StreakConfig::default()
    }

    #[test]
    fn multiplier_is_monotone_and_capped() {
        let cfg = config();
        let mut last = 0;
        for wins in 0..50 {
            let bps = multiplier_bps(wins, &cfg);
            assert!(bps >= last);
            assert!(bps <= cfg.ceiling_bps);
            last = bps;
        }
        // Ceiling (3.0x) is reached at the configured streak length.
        assert_eq!(multiplier_bps(21, &cfg), cfg.ceiling_bps);
        assert_eq!(multiplier_bps(u32::MAX, &cfg), cfg.ceiling_bps);
    }

    #[test]
    fn any_loss_resets_the_multiplier() {
        let cfg = config();
        let long = StreakState { wins: 19, losses: 0 };
        let out = advance(&long, false, &cfg);
        assert_eq!(out.streak, StreakState { wins: 0, losses: 1 });
        assert_eq!(out.multiplier_bps, BPS_ONE);
        assert_eq!(out.bonus, 0);
    }

    #[test]
    fn combo_bonuses_fire_at_their_thresholds_only() {
        let cfg = config();
        let bonus_at = |prior_wins| {
            advance(
                &StreakState {
                    wins: prior_wins,
                    losses: 0,
                },
                true,
                &cfg,
            )
            .bonus
        };
        assert_eq!(bonus_at(0), 0); // first win
        assert_eq!(bonus_at(1), 50); // reaching 2
        assert_eq!(bonus_at(2), 100); // reaching 3
        assert_eq!(bonus_at(3), 200); // reaching 4
        assert_eq!(bonus_at(5), 0); // past every threshold
    }

    #[test]
    fn hot_streak_fires_at_the_threshold() {
        let cfg = config();
        let out = advance(&StreakState { wins: 4, losses: 0 }, true, &cfg);
        assert!(out.hot_streak);
        assert_eq!(out.bonus, cfg.hot_streak_bonus);

        // Winning again past the threshold pays no second hot-streak bonus
        // but keeps climbing the multiplier.
        let next = advance(&out.streak, true, &cfg);
        assert!(!next.hot_streak);
        assert_eq!(next.bonus, 0);
        assert_eq!(next.multiplier_bps, multiplier_bps(6, &cfg));
    }

    #[test]
    fn comeback_fires_on_a_win_ending_a_long_loss_streak() {
        let cfg = config();
        let out = advance(&StreakState { wins: 0, losses: 5 }, true, &cfg);
        assert!(out.comeback);
        assert_eq!(out.bonus, cfg.comeback_bonus);
        assert_eq!(out.streak, StreakState { wins: 1, losses: 0 });

        let short = advance(&StreakState { wins: 0, losses: 4 }, true, &cfg);
        assert!(!short.comeback);
    }
}
