//! The economy ledger: the only code allowed to move a balance.
//!
//! Handlers compute every derived effect of one action (balance delta, buff
//! consumption, streak update, purchase-limit bump) and stage them as a
//! single [`WriteIntent`], minimizing the read-to-write window on a store
//! without multi-key transactions. Durability-critical rows are additionally
//! mirrored to the secondary store, best effort.

use dachstaler_types::{Key, PlayerAccount, PurchaseLimit, WeekId};
use tracing::warn;

use crate::error::EngineError;
use crate::state::{Mirror, MirrorRow, State, Status};

/// Debits a player balance. Fails without touching anything if the balance
/// would go negative.
pub fn debit(account: &mut PlayerAccount, amount: u64) -> Result<u64, EngineError> {
    if account.balance < amount {
        return Err(EngineError::InsufficientFunds {
            balance: account.balance,
            needed: amount,
        });
    }
    account.balance -= amount;
    Ok(account.balance)
}

pub fn credit(account: &mut PlayerAccount, amount: u64) -> u64 {
    account.balance = account.balance.saturating_add(amount);
    account.balance
}

/// Checks and consumes one weekly purchase slot. A stored counter from an
/// older ISO week counts as zero. Returns the slots left after this purchase,
/// `None` for unlimited items.
pub fn take_weekly_slot(
    limit: &mut PurchaseLimit,
    week: WeekId,
    cap: Option<u32>,
    item: &str,
) -> Result<Option<u32>, EngineError> {
    let Some(cap) = cap else {
        return Ok(None);
    };
    let used = limit.count_for(week);
    if used >= cap {
        return Err(EngineError::LimitExceeded {
            item: item.to_string(),
            limit: cap,
        });
    }
    limit.week = week;
    limit.count = used + 1;
    Ok(Some(cap - limit.count))
}

/// Every effect of one action, committed as a unit. `tag` is the idempotency
/// key of the action (the duel challenge id, 0 otherwise); the durable
/// records it stages (duel receipts in particular) make a replayed commit
/// harmless.
#[derive(Debug, Default)]
pub struct WriteIntent {
    pub tag: u64,
    pub changes: Vec<(Key, Status)>,
    pub mirror: Vec<MirrorRow>,
}

/// What actually happened during a commit. Mirror failures are surfaced here
/// for reconciliation; they never fail the primary write.
#[derive(Debug, Default)]
pub struct CommitReceipt {
    pub written: usize,
    pub mirror_failures: Vec<String>,
}

/// Applies an intent: the primary batch first (failure aborts the action),
/// then the mirror rows best effort.
pub async fn commit<S: State, M: Mirror>(
    state: &mut S,
    mirror: &mut M,
    intent: WriteIntent,
) -> Result<CommitReceipt, EngineError> {
    let written = intent.changes.len();
    state.apply(intent.changes).await?;

    let mut mirror_failures = Vec::new();
    for row in &intent.mirror {
        if let Err(err) = mirror.upsert(row).await {
            warn!(?row, %err, "mirror upsert failed, queuing for reconciliation");
            mirror_failures.push(format!("{row:?}: {err}"));
        }
    }

    Ok(CommitReceipt {
        written,
        mirror_failures,
    })
}
