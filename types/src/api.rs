//! Action inputs and structured outcomes.
//!
//! Actions arrive from the chat-command/web collaborator already parsed into
//! typed form; constructing a [`crate::Username`] is where shape validation
//! happens, so malformed input never reaches storage. Outcomes go back to the
//! presentation collaborator, which owns all rendering.

use serde::Serialize;

use crate::game::{Grid, Symbol, Username};

/// A player action entering the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Accept the gambling disclaimer; creates the account lazily.
    AcceptDisclaimer {
        player: Username,
        display_name: String,
    },
    /// One spin. Uses a pending free spin when available, otherwise debits
    /// the stake.
    Spin { player: Username, stake: u64 },
    /// Challenge another player. The challenge id is supplied by the caller
    /// so retries are idempotent.
    DuelCreate {
        challenger: Username,
        target: Username,
        stake: u64,
        challenge_id: u64,
    },
    DuelAccept { player: Username },
    DuelDecline { player: Username },
    /// Buy a shop item; buff items activate immediately.
    Purchase { player: Username, item: String },
    /// Admin-only: clear one unlock (the only path that ever removes one).
    AdminClearAchievement {
        admin: Username,
        player: Username,
        achievement: String,
    },
}

impl Action {
    /// The acting player (for logging and cooldown attribution).
    pub fn actor(&self) -> &Username {
        match self {
            Action::AcceptDisclaimer { player, .. }
            | Action::Spin { player, .. }
            | Action::DuelAccept { player }
            | Action::DuelDecline { player }
            | Action::Purchase { player, .. } => player,
            Action::DuelCreate { challenger, .. } => challenger,
            Action::AdminClearAchievement { admin, .. } => admin,
        }
    }
}

/// Message selector for the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKey {
    NoWin,
    Pair,
    Triple,
    FreeSpins,
    JackpotSingle,
    JackpotPair,
    JackpotTriple,
    HotStreak,
    Comeback,
}

/// Result of one spin, free or staked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SpinOutcome {
    pub grid: Grid,
    /// Payout before streak/bonus/buff adjustments, bet multiplier applied.
    pub base_payout: u64,
    /// Everything credited for this spin.
    pub total_payout: u64,
    /// Combo + hot-streak + comeback portion of the payout.
    pub bonus: u64,
    pub streak_multiplier_bps: u64,
    pub win_streak: u32,
    pub free_spins_awarded: u32,
    pub used_free_spin: bool,
    pub message: MessageKey,
    pub new_balance: u64,
    pub unlocked_achievements: Vec<String>,
}

/// Result of a resolved (or declined/expired) duel step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DuelOutcome {
    pub challenge_id: u64,
    pub challenger: String,
    pub target: String,
    pub challenger_grid: Grid,
    pub target_grid: Grid,
    /// `None` on an exact tie; both stakes returned.
    pub winner: Option<String>,
    pub pot: u64,
    pub new_balance: u64,
    pub unlocked_achievements: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PurchaseOutcome {
    pub item: String,
    pub price: u64,
    pub new_balance: u64,
    /// Remaining purchases of this item in the current ISO week, if limited.
    pub weekly_remaining: Option<u32>,
}

/// Engine response handed to the presentation/chat collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    DisclaimerAccepted { new_balance: u64 },
    Spin(SpinOutcome),
    DuelCreated { challenge_id: u64, expires_ts: u64 },
    DuelResolved(DuelOutcome),
    DuelDeclined { challenge_id: u64 },
    DuelExpired { challenge_id: u64 },
    Purchased(PurchaseOutcome),
    AchievementCleared { player: String, achievement: String },
}

impl Serialize for Username {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for Username {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Username::new(&raw).map_err(serde::de::Error::custom)
    }
}

impl Serialize for Symbol {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let name = match self {
            Symbol::Cherry => "cherry",
            Symbol::Lemon => "lemon",
            Symbol::Orange => "orange",
            Symbol::Grape => "grape",
            Symbol::Bell => "bell",
            Symbol::Star => "star",
            Symbol::Seven => "seven",
            Symbol::Clover => "clover",
            Symbol::Coin => "coin",
            Symbol::Dachs => "dachs",
        };
        serializer.serialize_str(name)
    }
}

impl<'de> serde::Deserialize<'de> for Symbol {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.as_str() {
            "cherry" => Ok(Symbol::Cherry),
            "lemon" => Ok(Symbol::Lemon),
            "orange" => Ok(Symbol::Orange),
            "grape" => Ok(Symbol::Grape),
            "bell" => Ok(Symbol::Bell),
            "star" => Ok(Symbol::Star),
            "seven" => Ok(Symbol::Seven),
            "clover" => Ok(Symbol::Clover),
            "coin" => Ok(Symbol::Coin),
            "dachs" => Ok(Symbol::Dachs),
            other => Err(serde::de::Error::custom(format!("unknown symbol: {other}"))),
        }
    }
}
