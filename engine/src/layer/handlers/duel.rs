use super::super::*;
use super::*;
use dachstaler_types::{DuelChallenge, DuelOutcome, DuelPhase, DuelReceipt};

use crate::duel::{self, Side};
use crate::slots::symbols::ReelTable;

impl<'a, S: State> Engine<'a, S> {
    pub(in crate::layer) async fn handle_duel_create(
        &mut self,
        challenger: Username,
        target: Username,
        stake: u64,
        challenge_id: u64,
        now: u64,
    ) -> Result<Outcome, EngineError> {
        if challenger == target {
            return Err(EngineError::InvalidTarget);
        }
        if stake < self.config.duel.min_stake {
            return Err(EngineError::InvalidStake { stake });
        }

        let challenger_account = self.acting_account(&challenger).await?;
        let target_account = match self.get(&Key::Player(target.clone())).await? {
            Some(Value::Player(account)) if !account.flags.self_banned => account,
            _ => return Err(EngineError::InvalidTarget),
        };
        if challenger_account.flags.duels_opted_out || target_account.flags.duels_opted_out {
            return Err(EngineError::DuelOptedOut);
        }
        if challenger_account.balance < stake {
            return Err(EngineError::InsufficientFunds {
                balance: challenger_account.balance,
                needed: stake,
            });
        }
        if target_account.balance < stake {
            return Err(EngineError::InsufficientFunds {
                balance: target_account.balance,
                needed: stake,
            });
        }
        let ready_ts = challenger_account
            .last_duel_ts
            .saturating_add(self.config.duel.cooldown_secs);
        if challenger_account.last_duel_ts > 0 && now < ready_ts {
            return Err(EngineError::Cooldown {
                remaining_secs: ready_ts - now,
            });
        }

        // Retrying the exact same open challenge is idempotent; any other
        // reuse of the id is rejected.
        if self.get(&Key::DuelReceipt(challenge_id)).await?.is_some() {
            return Err(EngineError::ChallengeExpired { challenge_id });
        }
        if let Some(Value::Duel(existing)) = self.get(&Key::Duel(challenge_id)).await? {
            if existing.phase == DuelPhase::Created
                && !existing.is_stale(now)
                && existing.challenger == challenger
                && existing.target == target
                && existing.stake == stake
            {
                return Ok(Outcome::DuelCreated {
                    challenge_id,
                    expires_ts: existing
                        .created_ts
                        .saturating_add(self.config.duel.response_window_secs),
                });
            }
            return Err(EngineError::ChallengeExpired { challenge_id });
        }

        self.ensure_unengaged(&challenger, now).await?;
        self.ensure_unengaged(&target, now).await?;

        let challenge = DuelChallenge {
            id: challenge_id,
            challenger: challenger.clone(),
            target: target.clone(),
            stake,
            created_ts: now,
            phase: DuelPhase::Created,
        };
        self.insert(Key::Duel(challenge_id), Value::Duel(challenge));
        self.insert(Key::ActiveDuel(challenger), Value::DuelRef(challenge_id));
        self.insert(Key::ActiveDuel(target), Value::DuelRef(challenge_id));
        self.tag = challenge_id;

        Ok(Outcome::DuelCreated {
            challenge_id,
            expires_ts: now.saturating_add(self.config.duel.response_window_secs),
        })
    }

    pub(in crate::layer) async fn handle_duel_accept<R: rand::Rng>(
        &mut self,
        player: Username,
        now: u64,
        rng: &mut R,
    ) -> Result<Outcome, EngineError> {
        let challenge_id = match self.get(&Key::ActiveDuel(player.clone())).await? {
            Some(Value::DuelRef(id)) => id,
            _ => return Err(EngineError::NoActiveChallenge),
        };
        let duel = match self.get(&Key::Duel(challenge_id)).await? {
            Some(Value::Duel(duel)) => duel,
            _ => return Err(EngineError::NoActiveChallenge),
        };

        // A receipt means the pot was already settled; replay the recorded
        // result instead of rolling again.
        if let Some(Value::DuelReceipt(receipt)) =
            self.get(&Key::DuelReceipt(challenge_id)).await?
        {
            let account = self.load_account(&player).await?;
            self.stage_delete(Key::ActiveDuel(duel.challenger.clone()));
            self.stage_delete(Key::ActiveDuel(duel.target.clone()));
            self.tag = challenge_id;
            return Ok(Outcome::DuelResolved(DuelOutcome {
                challenge_id,
                challenger: duel.challenger.to_string(),
                target: duel.target.to_string(),
                challenger_grid: receipt.challenger_grid,
                target_grid: receipt.target_grid,
                winner: receipt.winner.map(|name| name.to_string()),
                pot: receipt.pot,
                new_balance: account.balance,
                unlocked_achievements: Vec::new(),
            }));
        }

        if duel.phase != DuelPhase::Created {
            return Err(EngineError::ChallengeExpired { challenge_id });
        }
        if duel.is_stale(now) {
            return self.expire_challenge(duel);
        }
        if player != duel.target {
            return Err(EngineError::Unauthorized);
        }

        let mut challenger = self.acting_account(&duel.challenger).await?;
        let mut target = self.acting_account(&player).await?;

        // Solvency can have changed since creation. The accepter is told to
        // top up; a broke challenger voids the challenge instead.
        if target.balance < duel.stake {
            return Err(EngineError::InsufficientFunds {
                balance: target.balance,
                needed: duel.stake,
            });
        }
        if challenger.balance < duel.stake {
            return self.expire_challenge(duel);
        }

        // Duels are rolled without buffs or boosts: base weights, base
        // jackpot odds, challenger first.
        let table = ReelTable::new(&self.config.symbol_weights);
        let ppm = self.config.jackpot.cell_chance_ppm;
        let challenger_grid = table.draw_grid(rng, ppm);
        let target_grid = table.draw_grid(rng, ppm);
        let decision = duel::winner(&challenger_grid, &target_grid, self.config);

        let pot = duel.stake.saturating_mul(2);
        let winner_name = match decision {
            Some(Side::Challenger) => {
                ledger::debit(&mut target, duel.stake)?;
                ledger::credit(&mut challenger, duel.stake);
                challenger.stats.duels_won = challenger.stats.duels_won.saturating_add(1);
                challenger.stats.duel_winnings =
                    challenger.stats.duel_winnings.saturating_add(duel.stake);
                Some(challenger.name.clone())
            }
            Some(Side::Target) => {
                ledger::debit(&mut challenger, duel.stake)?;
                ledger::credit(&mut target, duel.stake);
                target.stats.duels_won = target.stats.duels_won.saturating_add(1);
                target.stats.duel_winnings =
                    target.stats.duel_winnings.saturating_add(duel.stake);
                Some(target.name.clone())
            }
            // Exact tie: both stakes stay where they are.
            None => None,
        };

        let mut bank = self.get_or_init_bank().await?;
        let mut unlocked = Vec::new();
        for account in [&mut challenger, &mut target] {
            account.stats.duels_played = account.stats.duels_played.saturating_add(1);
            account.last_duel_ts = now;
            account.last_active_ts = now;
            let events = if account.stats.duels_played == 1 {
                vec![AchievementEvent::FirstDuel]
            } else {
                Vec::new()
            };
            let fresh = self
                .settle_achievements(account, &mut bank, &events, now)
                .await?;
            unlocked.extend(fresh);
        }

        let resolved = DuelChallenge {
            phase: DuelPhase::Resolved,
            ..duel.clone()
        };
        let receipt = DuelReceipt {
            challenge_id,
            winner: winner_name.clone(),
            pot,
            challenger_grid,
            target_grid,
            resolved_ts: now,
        };
        let new_balance = target.balance;

        self.insert(Key::Duel(challenge_id), Value::Duel(resolved));
        self.insert(Key::DuelReceipt(challenge_id), Value::DuelReceipt(receipt));
        self.stage_delete(Key::ActiveDuel(duel.challenger.clone()));
        self.stage_delete(Key::ActiveDuel(duel.target.clone()));
        self.stage_player(challenger);
        self.stage_player(target);
        self.stage_bank(bank);
        self.tag = challenge_id;

        Ok(Outcome::DuelResolved(DuelOutcome {
            challenge_id,
            challenger: duel.challenger.to_string(),
            target: duel.target.to_string(),
            challenger_grid,
            target_grid,
            winner: winner_name.map(|name| name.to_string()),
            pot,
            new_balance,
            unlocked_achievements: unlocked,
        }))
    }

    pub(in crate::layer) async fn handle_duel_decline(
        &mut self,
        player: Username,
        now: u64,
    ) -> Result<Outcome, EngineError> {
        let challenge_id = match self.get(&Key::ActiveDuel(player.clone())).await? {
            Some(Value::DuelRef(id)) => id,
            _ => return Err(EngineError::NoActiveChallenge),
        };
        let duel = match self.get(&Key::Duel(challenge_id)).await? {
            Some(Value::Duel(duel)) => duel,
            _ => return Err(EngineError::NoActiveChallenge),
        };
        if duel.phase != DuelPhase::Created {
            return Err(EngineError::ChallengeExpired { challenge_id });
        }
        if duel.is_stale(now) {
            return self.expire_challenge(duel);
        }

        // Either side may cancel an open challenge. No stakes were held, so
        // nothing moves.
        let declined = DuelChallenge {
            phase: DuelPhase::Declined,
            ..duel.clone()
        };
        self.insert(Key::Duel(challenge_id), Value::Duel(declined));
        self.stage_delete(Key::ActiveDuel(duel.challenger));
        self.stage_delete(Key::ActiveDuel(duel.target));
        self.tag = challenge_id;
        Ok(Outcome::DuelDeclined { challenge_id })
    }

    /// Marks a stale challenge expired and clears both pointers. Returned as
    /// a successful outcome so the staged cleanup actually commits.
    fn expire_challenge(&mut self, duel: DuelChallenge) -> Result<Outcome, EngineError> {
        let challenge_id = duel.id;
        let expired = DuelChallenge {
            phase: DuelPhase::Expired,
            ..duel.clone()
        };
        self.insert(Key::Duel(challenge_id), Value::Duel(expired));
        self.stage_delete(Key::ActiveDuel(duel.challenger));
        self.stage_delete(Key::ActiveDuel(duel.target));
        self.tag = challenge_id;
        Ok(Outcome::DuelExpired { challenge_id })
    }

    /// Fails with [`EngineError::ChallengePending`] while `name` is in a live
    /// challenge. Stale or dangling pointers are cleaned up in passing.
    async fn ensure_unengaged(&mut self, name: &Username, now: u64) -> Result<(), EngineError> {
        let id = match self.get(&Key::ActiveDuel(name.clone())).await? {
            Some(Value::DuelRef(id)) => id,
            _ => return Ok(()),
        };
        match self.get(&Key::Duel(id)).await? {
            Some(Value::Duel(duel)) if duel.phase == DuelPhase::Created => {
                if duel.is_stale(now) {
                    let expired = DuelChallenge {
                        phase: DuelPhase::Expired,
                        ..duel.clone()
                    };
                    self.insert(Key::Duel(id), Value::Duel(expired));
                    self.stage_delete(Key::ActiveDuel(duel.challenger));
                    self.stage_delete(Key::ActiveDuel(duel.target));
                    Ok(())
                } else {
                    Err(EngineError::ChallengePending)
                }
            }
            // Terminal challenge or missing record: the pointer is stale.
            _ => {
                self.stage_delete(Key::ActiveDuel(name.clone()));
                Ok(())
            }
        }
    }
}
