use thiserror::Error;

/// Domain errors reported to the caller. Except for [`EngineError::Storage`]
/// on a balance-affecting write, an error means no state change was staged.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("insufficient funds: balance {balance}, needed {needed}")]
    InsufficientFunds { balance: u64, needed: u64 },
    #[error("invalid target")]
    InvalidTarget,
    #[error("invalid stake: {stake}")]
    InvalidStake { stake: u64 },
    #[error("invalid display name length {len} (max {max})")]
    InvalidDisplayName { len: usize, max: usize },
    #[error("weekly limit reached for {item} ({limit}/week)")]
    LimitExceeded { item: String, limit: u32 },
    #[error("no active challenge")]
    NoActiveChallenge,
    #[error("challenge {challenge_id} already settled or expired")]
    ChallengeExpired { challenge_id: u64 },
    #[error("another challenge is still pending")]
    ChallengePending,
    #[error("duel cooldown active ({remaining_secs}s remaining)")]
    Cooldown { remaining_secs: u64 },
    #[error("disclaimer not accepted")]
    DisclaimerRequired,
    #[error("player is self-banned")]
    SelfBanned,
    #[error("player has opted out of duels")]
    DuelOptedOut,
    #[error("unknown shop item: {0}")]
    UnknownItem(String),
    #[error("not authorized")]
    Unauthorized,
    #[error("storage unavailable")]
    Storage(#[from] anyhow::Error),
}
