//! Leaderboard cache: read-only, stale-while-revalidate.
//!
//! The snapshot is advisory, never authoritative. Concurrent recomputations
//! are tolerated; the last writer wins.

use anyhow::Result;
use dachstaler_types::{
    Key, KeyGroup, LeaderboardEntry, LeaderboardSnapshot, Value,
};
use tracing::debug;

use crate::state::State;

/// A served snapshot plus whether the caller should schedule a background
/// refresh. Serving never blocks on recomputation; the refresh is
/// fire-and-forget relative to the read that noticed the staleness.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Served {
    pub snapshot: LeaderboardSnapshot,
    pub refresh_due: bool,
}

/// Serves the cached snapshot. A stale cache is still returned with
/// `refresh_due` set; only a missing cache forces a synchronous
/// recomputation.
pub async fn serve<S: State>(state: &mut S, now: u64, max_age_secs: u64) -> Result<Served> {
    match state.get(&Key::Leaderboard).await? {
        Some(Value::Leaderboard(snapshot)) => {
            let refresh_due = snapshot.age(now) > max_age_secs;
            Ok(Served {
                snapshot,
                refresh_due,
            })
        }
        _ => {
            let snapshot = recompute(state, now).await?;
            Ok(Served {
                snapshot,
                refresh_due: false,
            })
        }
    }
}

/// Rebuilds and stores the full ranking. Qualifying players only: disclaimer
/// accepted, not self-banned, not hidden, positive balance.
pub async fn recompute<S: State>(state: &mut S, now: u64) -> Result<LeaderboardSnapshot> {
    let mut entries: Vec<LeaderboardEntry> = state
        .scan(KeyGroup::Player)
        .await?
        .into_iter()
        .filter_map(|(_, value)| match value {
            Value::Player(account) => Some(account),
            _ => None,
        })
        .filter(|account| {
            account.flags.disclaimer_accepted
                && !account.flags.self_banned
                && !account.flags.hide_on_leaderboard
                && account.balance > 0
        })
        .map(|account| LeaderboardEntry {
            name: account.name,
            display_name: account.display_name,
            balance: account.balance,
            prestige: account.prestige,
        })
        .collect();

    entries.sort_by(|a, b| {
        b.balance
            .cmp(&a.balance)
            .then(b.prestige.cmp(&a.prestige))
            .then(a.name.cmp(&b.name))
    });
    debug!(players = entries.len(), "leaderboard recomputed");

    let snapshot = LeaderboardSnapshot {
        entries,
        computed_ts: now,
    };
    state
        .insert(Key::Leaderboard, Value::Leaderboard(snapshot.clone()))
        .await?;
    Ok(snapshot)
}
