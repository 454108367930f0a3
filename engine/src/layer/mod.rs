//! Per-action engine.
//!
//! One [`Engine`] handles exactly one inbound action: it overlays a pending
//! write set on the backing store, runs the handler, and either hands back a
//! [`WriteIntent`] carrying every staged effect or, on a domain error,
//! nothing at all. Cross-action state lives only in storage; the chat layer
//! is expected to serialize a player's actions but the engine never relies
//! on it.

use anyhow::Result;
use dachstaler_types::{Action, Key, Outcome, Value};
use rand::Rng;
use std::collections::BTreeMap;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::ledger::WriteIntent;
use crate::state::{MirrorRow, State, Status};

mod handlers;

pub struct Engine<'a, S: State> {
    state: &'a S,
    config: &'a EngineConfig,
    pending: BTreeMap<Key, Status>,
    mirror: Vec<MirrorRow>,
    tag: u64,
}

impl<'a, S: State> Engine<'a, S> {
    /// `config` must have passed [`EngineConfig::validate`].
    pub fn new(state: &'a S, config: &'a EngineConfig) -> Self {
        Self {
            state,
            config,
            pending: BTreeMap::new(),
            mirror: Vec::new(),
            tag: 0,
        }
    }

    async fn get(&self, key: &Key) -> Result<Option<Value>> {
        Ok(match self.pending.get(key) {
            Some(Status::Update(value)) => Some(value.clone()),
            Some(Status::Delete) => None,
            None => self.state.get(key).await?,
        })
    }

    fn insert(&mut self, key: Key, value: Value) {
        self.pending.insert(key, Status::Update(value));
    }

    fn stage_delete(&mut self, key: Key) {
        self.pending.insert(key, Status::Delete);
    }

    /// Runs one action. On any error the pending set is rolled back, so an
    /// error never leaves a partial effect behind.
    pub async fn apply<R: Rng>(
        &mut self,
        action: Action,
        now: u64,
        rng: &mut R,
    ) -> Result<Outcome, EngineError> {
        let pending = self.pending.clone();
        let mirror_len = self.mirror.len();
        let tag = self.tag;

        let result = self.dispatch(action, now, rng).await;
        if result.is_err() {
            self.pending = pending;
            self.mirror.truncate(mirror_len);
            self.tag = tag;
        }
        result
    }

    async fn dispatch<R: Rng>(
        &mut self,
        action: Action,
        now: u64,
        rng: &mut R,
    ) -> Result<Outcome, EngineError> {
        match action {
            Action::AcceptDisclaimer {
                player,
                display_name,
            } => self.handle_accept_disclaimer(player, display_name, now).await,
            Action::Spin { player, stake } => self.handle_spin(player, stake, now, rng).await,
            Action::DuelCreate {
                challenger,
                target,
                stake,
                challenge_id,
            } => {
                self.handle_duel_create(challenger, target, stake, challenge_id, now)
                    .await
            }
            Action::DuelAccept { player } => self.handle_duel_accept(player, now, rng).await,
            Action::DuelDecline { player } => self.handle_duel_decline(player, now).await,
            Action::Purchase { player, item } => self.handle_purchase(player, item, now).await,
            Action::AdminClearAchievement {
                admin,
                player,
                achievement,
            } => self.handle_clear_achievement(admin, player, achievement).await,
        }
    }

    /// Everything staged by the action, as one committed unit for
    /// [`crate::ledger::commit`].
    pub fn into_intent(self) -> WriteIntent {
        WriteIntent {
            tag: self.tag,
            changes: self.pending.into_iter().collect(),
            mirror: self.mirror,
        }
    }
}
