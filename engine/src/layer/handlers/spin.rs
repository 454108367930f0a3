use super::super::*;
use super::*;
use dachstaler_types::{MessageKey, SpinOutcome, BPS_ONE, MAX_NAME_LENGTH};

use crate::slots::buffs::Resolver;
use crate::slots::payout::{self, mul_bps};
use crate::slots::streak;
use crate::slots::symbols::ReelTable;

impl<'a, S: State> Engine<'a, S> {
    pub(in crate::layer) async fn handle_accept_disclaimer(
        &mut self,
        player: Username,
        display_name: String,
        now: u64,
    ) -> Result<Outcome, EngineError> {
        // The stored record caps the display name at decode time, so an
        // oversized or empty one must be rejected before anything is written.
        let display_name = display_name.trim().to_string();
        if display_name.is_empty() || display_name.len() > MAX_NAME_LENGTH {
            return Err(EngineError::InvalidDisplayName {
                len: display_name.len(),
                max: MAX_NAME_LENGTH,
            });
        }

        // Accepting twice is a no-op, not an error.
        if let Some(Value::Player(account)) = self.get(&Key::Player(player.clone())).await? {
            return Ok(Outcome::DisclaimerAccepted {
                new_balance: account.balance,
            });
        }

        let account = PlayerAccount::new(player, display_name, now, self.config.starting_balance);
        let mut bank = self.get_or_init_bank().await?;
        bank.debit(self.config.starting_balance);

        let new_balance = account.balance;
        self.stage_player(account);
        self.stage_bank(bank);
        Ok(Outcome::DisclaimerAccepted { new_balance })
    }

    pub(in crate::layer) async fn handle_spin<R: rand::Rng>(
        &mut self,
        player: Username,
        stake: u64,
        now: u64,
        rng: &mut R,
    ) -> Result<Outcome, EngineError> {
        let mut account = self.acting_account(&player).await?;
        let mut bank = self.get_or_init_bank().await?;

        // A pending free spin replaces the stake entirely and replays the
        // bet multiplier of the spin that earned it.
        let (bet_bps, used_free_spin) = if account.free_spins.remaining > 0 {
            account.free_spins.remaining -= 1;
            (account.free_spins.multiplier_bps.max(BPS_ONE), true)
        } else {
            if stake < self.config.base_stake || stake > self.config.max_stake {
                return Err(EngineError::InvalidStake { stake });
            }
            ledger::debit(&mut account, stake)?;
            bank.credit(stake);
            account.stats.total_wagered = account.stats.total_wagered.saturating_add(stake);
            (stake * BPS_ONE / self.config.base_stake, false)
        };

        let buffs = self.buffs_or_default(&player).await;
        let buffs_defaulted = buffs.is_defaulted();
        let mut resolver = Resolver::new(buffs.into_inner(), self.config, now);

        // Probability shifts first, then the draw, then one-shot grid
        // substitution, then evaluation.
        let pre = resolver.pre_spin();
        let table = ReelTable::boosted(&self.config.symbol_weights, pre.weight_boost);
        let jackpot_ppm = self
            .config
            .jackpot
            .cell_chance_ppm
            .saturating_add(pre.jackpot_ppm_bonus);
        let grid = table.draw_grid(rng, jackpot_ppm);
        let grid = resolver.substitute(grid);
        let eval = payout::evaluate(&grid, bet_bps, self.config);
        let won = eval.is_win();

        let streak = streak::advance(&account.streak, won, &self.config.streak);

        // base -> streak multiplier -> flat bonuses -> buff multipliers.
        let mut total = mul_bps(eval.payout, streak.multiplier_bps).saturating_add(streak.bonus);
        if total > 0 {
            total = mul_bps(total, resolver.payout_multiplier_bps());
        }

        account.streak = streak.streak.clone();
        account.stats.total_spins = account.stats.total_spins.saturating_add(1);
        if won {
            account.stats.total_wins = account.stats.total_wins.saturating_add(1);
            account.stats.longest_win_streak =
                account.stats.longest_win_streak.max(streak.streak.wins);
        } else {
            account.stats.total_losses = account.stats.total_losses.saturating_add(1);
            account.stats.longest_loss_streak =
                account.stats.longest_loss_streak.max(streak.streak.losses);
        }
        if eval.jackpot_hit {
            account.stats.jackpots = account.stats.jackpots.saturating_add(1);
            bank.jackpot_hits = bank.jackpot_hits.saturating_add(1);
        }
        if eval.free_spins > 0 {
            account.free_spins.remaining =
                account.free_spins.remaining.saturating_add(eval.free_spins);
            account.free_spins.multiplier_bps = bet_bps;
        }
        if total > 0 {
            ledger::credit(&mut account, total);
            bank.debit(total);
            account.stats.total_won = account.stats.total_won.saturating_add(total);
        }
        account.last_active_ts = now;

        let mut events = Vec::new();
        if account.stats.total_spins == 1 {
            events.push(AchievementEvent::FirstSpin);
        }
        if eval.jackpot_hit {
            events.push(AchievementEvent::JackpotHit);
        }
        if streak.hot_streak {
            events.push(AchievementEvent::HotStreak);
        }
        if streak.comeback {
            events.push(AchievementEvent::Comeback);
        }
        let unlocked = self
            .settle_achievements(&mut account, &mut bank, &events, now)
            .await?;

        let message = if streak.hot_streak {
            MessageKey::HotStreak
        } else if streak.comeback {
            MessageKey::Comeback
        } else {
            eval.message
        };

        if !buffs_defaulted {
            self.insert(Key::Buffs(player.clone()), Value::Buffs(resolver.settle(won)));
        }
        self.mirror.push(crate::state::MirrorRow::StreakSnapshot {
            player: player.clone(),
            wins: account.streak.wins,
            losses: account.streak.losses,
        });

        let outcome = SpinOutcome {
            grid,
            base_payout: eval.payout,
            total_payout: total,
            bonus: streak.bonus,
            streak_multiplier_bps: streak.multiplier_bps,
            win_streak: account.streak.wins,
            free_spins_awarded: eval.free_spins,
            used_free_spin,
            message,
            new_balance: account.balance,
            unlocked_achievements: unlocked,
        };
        self.stage_player(account);
        self.stage_bank(bank);
        Ok(Outcome::Spin(outcome))
    }
}
