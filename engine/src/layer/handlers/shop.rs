use super::super::*;
use super::*;
use dachstaler_types::{PurchaseLimit, PurchaseOutcome};

use crate::clock;
use crate::config::ItemEffect;
use crate::slots::buffs;

impl<'a, S: State> Engine<'a, S> {
    pub(in crate::layer) async fn handle_purchase(
        &mut self,
        player: Username,
        item: String,
        now: u64,
    ) -> Result<Outcome, EngineError> {
        let spec = self
            .config
            .shop_item(&item)
            .ok_or_else(|| EngineError::UnknownItem(item.clone()))?
            .clone();

        let mut account = self.acting_account(&player).await?;
        let mut bank = self.get_or_init_bank().await?;

        // Purchases are double-spend-sensitive, so unlike buff reads on a
        // spin, a failed counter read aborts the action.
        let limit_key = Key::PurchaseLimit(player.clone(), spec.id.clone());
        let mut limit = match self.get(&limit_key).await? {
            Some(Value::PurchaseLimit(limit)) => limit,
            _ => PurchaseLimit::default(),
        };
        let weekly_remaining = ledger::take_weekly_slot(
            &mut limit,
            clock::week_of(now),
            spec.weekly_limit,
            &spec.id,
        )?;

        ledger::debit(&mut account, spec.price)?;
        bank.credit(spec.price);
        account.stats.purchases = account.stats.purchases.saturating_add(1);
        account.last_active_ts = now;

        match spec.effect {
            ItemEffect::Buff(id) => {
                // Paid activation: a failed buff read must abort rather than
                // silently replace the set.
                let mut set = match self.get(&Key::Buffs(player.clone())).await? {
                    Some(Value::Buffs(set)) => set,
                    _ => Default::default(),
                };
                buffs::grant(&mut set, id, self.config, now);
                self.insert(Key::Buffs(player.clone()), Value::Buffs(set));
            }
            ItemEffect::Prestige => {
                account.prestige = account.prestige.saturating_add(1);
            }
        }

        self.settle_achievements(&mut account, &mut bank, &[], now)
            .await?;

        if spec.weekly_limit.is_some() {
            self.insert(limit_key, Value::PurchaseLimit(limit.clone()));
            self.mirror.push(MirrorRow::PurchaseCount {
                player: player.clone(),
                item: spec.id.clone(),
                week: limit.week,
                count: limit.count,
            });
        }
        self.mirror.push(MirrorRow::PaidItem {
            player: player.clone(),
            item: spec.id.clone(),
        });

        let new_balance = account.balance;
        self.stage_player(account);
        self.stage_bank(bank);

        Ok(Outcome::Purchased(PurchaseOutcome {
            item: spec.id,
            price: spec.price,
            new_balance,
            weekly_remaining,
        }))
    }

    pub(in crate::layer) async fn handle_clear_achievement(
        &mut self,
        admin: Username,
        player: Username,
        achievement: String,
    ) -> Result<Outcome, EngineError> {
        if !self.config.is_admin(&admin) {
            return Err(EngineError::Unauthorized);
        }
        if self.get(&Key::Player(player.clone())).await?.is_none() {
            return Err(EngineError::InvalidTarget);
        }

        // Clearing an unlock that was never held is a no-op, not an error.
        let mut state = match self.get(&Key::Achievements(player.clone())).await? {
            Some(Value::Achievements(state)) => state,
            _ => Default::default(),
        };
        state.unlocked.remove(&achievement);
        self.insert(Key::Achievements(player.clone()), Value::Achievements(state));

        Ok(Outcome::AchievementCleared {
            player: player.to_string(),
            achievement,
        })
    }
}
