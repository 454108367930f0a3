use super::*;
use dachstaler_types::{
    AchievementEvent, AchievementState, Bank, BuffSet, PlayerAccount, Username,
};
use tracing::warn;

use crate::achievements;
use crate::ledger;
use crate::state::ReadFallback;

mod duel;
mod shop;
mod spin;

impl<'a, S: State> Engine<'a, S> {
    /// Loads an existing account. Read paths never materialize one; a
    /// missing record means the disclaimer was never accepted.
    pub(super) async fn load_account(
        &self,
        name: &Username,
    ) -> Result<PlayerAccount, EngineError> {
        match self.get(&Key::Player(name.clone())).await? {
            Some(Value::Player(account)) => Ok(account),
            _ => Err(EngineError::DisclaimerRequired),
        }
    }

    /// Account that is allowed to act: existing and not self-banned.
    pub(super) async fn acting_account(
        &self,
        name: &Username,
    ) -> Result<PlayerAccount, EngineError> {
        let account = self.load_account(name).await?;
        if account.flags.self_banned {
            return Err(EngineError::SelfBanned);
        }
        Ok(account)
    }

    pub(super) async fn get_or_init_bank(&self) -> Result<Bank, EngineError> {
        Ok(match self.get(&Key::Bank).await? {
            Some(Value::Bank(bank)) => bank,
            _ => Bank::default(),
        })
    }

    /// Buff reads are non-critical: a storage failure falls back to an empty
    /// set and the spin proceeds without modifiers. The defaulted marker
    /// tells the caller not to write the set back, so a transient read
    /// failure cannot wipe real buffs.
    pub(super) async fn buffs_or_default(&self, name: &Username) -> ReadFallback<BuffSet> {
        match self.get(&Key::Buffs(name.clone())).await {
            Ok(Some(Value::Buffs(set))) => ReadFallback::Loaded(set),
            Ok(_) => ReadFallback::Loaded(BuffSet::default()),
            Err(err) => {
                warn!(player = %name, %err, "buff read failed, spinning without buffs");
                ReadFallback::Defaulted(BuffSet::default())
            }
        }
    }

    pub(super) async fn achievements_or_default(
        &self,
        name: &Username,
    ) -> ReadFallback<AchievementState> {
        match self.get(&Key::Achievements(name.clone())).await {
            Ok(Some(Value::Achievements(state))) => ReadFallback::Loaded(state),
            Ok(_) => ReadFallback::Loaded(AchievementState::default()),
            Err(err) => {
                warn!(player = %name, %err, "achievement read failed, skipping detection");
                ReadFallback::Defaulted(AchievementState::default())
            }
        }
    }

    /// Runs detection over the updated counters, records fresh unlocks and
    /// credits the batch reward. On a failed read the whole step is skipped
    /// rather than risking duplicate rewards against an empty unlock set.
    pub(super) async fn settle_achievements(
        &mut self,
        account: &mut PlayerAccount,
        bank: &mut Bank,
        events: &[AchievementEvent],
        now: u64,
    ) -> Result<Vec<String>, EngineError> {
        let fallback = self.achievements_or_default(&account.name).await;
        if fallback.is_defaulted() {
            return Ok(Vec::new());
        }
        let mut state = fallback.into_inner();

        let fresh = achievements::detect(self.config, &account.stats, &state, events);
        if fresh.is_empty() {
            return Ok(Vec::new());
        }
        for id in &fresh {
            state.unlock(id, now);
        }

        let reward = achievements::batch_reward(self.config, &fresh);
        if reward > 0 {
            ledger::credit(account, reward);
            bank.debit(reward);
        }

        self.insert(
            Key::Achievements(account.name.clone()),
            Value::Achievements(state),
        );
        Ok(fresh)
    }

    pub(super) fn stage_player(&mut self, account: PlayerAccount) {
        self.insert(Key::Player(account.name.clone()), Value::Player(account));
    }

    pub(super) fn stage_bank(&mut self, bank: Bank) {
        self.insert(Key::Bank, Value::Bank(bank));
    }
}
