//! End-to-end action tests: apply, commit, inspect the store.

use commonware_codec::{Encode, ReadExt};
use dachstaler_types::{
    Action, DuelPhase, Key, KeyGroup, Outcome, PlayerAccount, Username, Value, BPS_ONE,
    MAX_NAME_LENGTH,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::layer::Engine;
use crate::ledger::commit;
use crate::state::{Flaky, Memory, MemoryMirror, MirrorRow, State};

fn name(raw: &str) -> Username {
    Username::new(raw).unwrap()
}

/// One full action: fresh engine, apply, commit on success.
async fn run<S: State>(
    state: &mut S,
    mirror: &mut MemoryMirror,
    config: &EngineConfig,
    action: Action,
    now: u64,
    seed: u64,
) -> Result<Outcome, EngineError> {
    let mut engine = Engine::new(&*state, config);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let outcome = engine.apply(action, now, &mut rng).await?;
    let intent = engine.into_intent();
    commit(state, mirror, intent).await?;
    Ok(outcome)
}

async fn onboard<S: State>(
    state: &mut S,
    mirror: &mut MemoryMirror,
    config: &EngineConfig,
    who: &str,
    now: u64,
) {
    let outcome = run(
        state,
        mirror,
        config,
        Action::AcceptDisclaimer {
            player: name(who),
            display_name: who.to_string(),
        },
        now,
        0,
    )
    .await
    .unwrap();
    assert!(matches!(outcome, Outcome::DisclaimerAccepted { .. }));
}

async fn account<S: State>(state: &S, who: &str) -> PlayerAccount {
    match state.get(&Key::Player(name(who))).await.unwrap() {
        Some(Value::Player(account)) => account,
        other => panic!("missing account for {who}: {other:?}"),
    }
}

async fn balance<S: State>(state: &S, who: &str) -> u64 {
    account(state, who).await.balance
}

async fn bank_net<S: State>(state: &S) -> i128 {
    match state.get(&Key::Bank).await.unwrap() {
        Some(Value::Bank(bank)) => bank.net,
        _ => 0,
    }
}

/// Every DachsTaler in circulation was minted by the bank, so player
/// balances and the bank net always cancel out exactly.
async fn assert_conserved(state: &Memory) {
    let players: i128 = state
        .scan(KeyGroup::Player)
        .await
        .unwrap()
        .into_iter()
        .map(|(_, value)| match value {
            Value::Player(account) => account.balance as i128,
            _ => 0,
        })
        .sum();
    assert_eq!(players + bank_net(state).await, 0);
}

#[tokio::test]
async fn disclaimer_grant_is_idempotent() {
    let config = EngineConfig::default();
    let mut state = Memory::default();
    let mut mirror = MemoryMirror::default();

    onboard(&mut state, &mut mirror, &config, "alice", 100).await;
    assert_eq!(balance(&state, "alice").await, 1_000);
    assert_eq!(bank_net(&state).await, -1_000);

    // A second accept changes nothing.
    onboard(&mut state, &mut mirror, &config, "Alice", 200).await;
    assert_eq!(balance(&state, "alice").await, 1_000);
    assert_eq!(bank_net(&state).await, -1_000);
    assert_conserved(&state).await;
}

#[tokio::test]
async fn display_names_are_validated_before_any_write() {
    let config = EngineConfig::default();
    let mut state = Memory::default();
    let mut mirror = MemoryMirror::default();

    // Whitespace-only and oversized names are rejected up front; nothing is
    // staged, so an undecodable account record can never reach the store.
    for bad in ["   ".to_string(), "A".repeat(MAX_NAME_LENGTH + 1)] {
        let err = run(
            &mut state,
            &mut mirror,
            &config,
            Action::AcceptDisclaimer {
                player: name("alice"),
                display_name: bad,
            },
            100,
            0,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidDisplayName { .. }));
        assert!(state
            .get(&Key::Player(name("alice")))
            .await
            .unwrap()
            .is_none());
    }

    // A maximum-length name is accepted and the stored record still decodes.
    let longest = "A".repeat(MAX_NAME_LENGTH);
    run(
        &mut state,
        &mut mirror,
        &config,
        Action::AcceptDisclaimer {
            player: name("alice"),
            display_name: longest.clone(),
        },
        100,
        0,
    )
    .await
    .unwrap();
    let stored = Value::Player(account(&state, "alice").await);
    let encoded = stored.encode();
    let mut reader = encoded.as_ref();
    let decoded = Value::read(&mut reader).unwrap();
    assert_eq!(decoded, stored);
    match decoded {
        Value::Player(account) => assert_eq!(account.display_name, longest),
        other => panic!("unexpected value: {other:?}"),
    }
}

#[tokio::test]
async fn spin_requires_the_disclaimer() {
    let config = EngineConfig::default();
    let mut state = Memory::default();
    let mut mirror = MemoryMirror::default();

    let err = run(
        &mut state,
        &mut mirror,
        &config,
        Action::Spin {
            player: name("alice"),
            stake: 10,
        },
        100,
        1,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, EngineError::DisclaimerRequired));
}

#[tokio::test]
async fn spin_validates_the_stake() {
    let config = EngineConfig::default();
    let mut state = Memory::default();
    let mut mirror = MemoryMirror::default();
    onboard(&mut state, &mut mirror, &config, "alice", 100).await;

    for stake in [0, 5, 2_000] {
        let err = run(
            &mut state,
            &mut mirror,
            &config,
            Action::Spin {
                player: name("alice"),
                stake,
            },
            200,
            1,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidStake { .. }));
    }
    assert_eq!(balance(&state, "alice").await, 1_000);
}

#[tokio::test]
async fn first_spin_settles_against_the_bank() {
    let config = EngineConfig::default();
    let mut state = Memory::default();
    let mut mirror = MemoryMirror::default();
    onboard(&mut state, &mut mirror, &config, "alice", 100).await;

    let outcome = run(
        &mut state,
        &mut mirror,
        &config,
        Action::Spin {
            player: name("alice"),
            stake: 10,
        },
        200,
        1,
    )
    .await
    .unwrap();
    let Outcome::Spin(spin) = outcome else {
        panic!("expected a spin outcome");
    };

    // Stake out, payout in, plus the first_spin unlock reward of 50.
    assert!(spin.unlocked_achievements.contains(&"first_spin".to_string()));
    assert_eq!(spin.new_balance, 1_000 - 10 + spin.total_payout + 50);
    assert_eq!(balance(&state, "alice").await, spin.new_balance);
    assert_eq!(account(&state, "alice").await.stats.total_spins, 1);
    assert_conserved(&state).await;

    assert!(mirror.rows.iter().any(|row| matches!(
        row,
        MirrorRow::StreakSnapshot { player, .. } if player == &name("alice")
    )));
}

#[tokio::test]
async fn spin_with_an_empty_pocket() {
    let config = EngineConfig {
        starting_balance: 5,
        ..EngineConfig::default()
    };
    let mut state = Memory::default();
    let mut mirror = MemoryMirror::default();
    onboard(&mut state, &mut mirror, &config, "alice", 100).await;

    let err = run(
        &mut state,
        &mut mirror,
        &config,
        Action::Spin {
            player: name("alice"),
            stake: 10,
        },
        200,
        1,
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        EngineError::InsufficientFunds {
            balance: 5,
            needed: 10
        }
    ));
    assert_eq!(balance(&state, "alice").await, 5);
}

#[tokio::test]
async fn free_spins_replace_the_stake() {
    let config = EngineConfig::default();
    let mut state = Memory::default();
    let mut mirror = MemoryMirror::default();
    onboard(&mut state, &mut mirror, &config, "alice", 100).await;

    let mut seeded = account(&state, "alice").await;
    seeded.free_spins.remaining = 2;
    seeded.free_spins.multiplier_bps = 2 * BPS_ONE;
    state
        .insert(Key::Player(seeded.name.clone()), Value::Player(seeded))
        .await
        .unwrap();

    let outcome = run(
        &mut state,
        &mut mirror,
        &config,
        Action::Spin {
            player: name("alice"),
            stake: 0,
        },
        200,
        3,
    )
    .await
    .unwrap();
    let Outcome::Spin(spin) = outcome else {
        panic!("expected a spin outcome");
    };

    assert!(spin.used_free_spin);
    // No debit: the balance only ever moves up on a free spin.
    assert_eq!(spin.new_balance, 1_000 + spin.total_payout + 50);
    let after = account(&state, "alice").await;
    assert_eq!(after.free_spins.remaining, 1 + spin.free_spins_awarded);
    assert_conserved(&state).await;
}

#[tokio::test]
async fn weekly_purchase_limit_resets_on_a_new_iso_week() {
    let config = EngineConfig {
        starting_balance: 10_000,
        ..EngineConfig::default()
    };
    let mut state = Memory::default();
    let mut mirror = MemoryMirror::default();
    onboard(&mut state, &mut mirror, &config, "alice", 1_000).await;

    // lucky_charm is capped at 3 per ISO week.
    for remaining in [2, 1, 0] {
        let outcome = run(
            &mut state,
            &mut mirror,
            &config,
            Action::Purchase {
                player: name("alice"),
                item: "lucky_charm".to_string(),
            },
            1_000,
            0,
        )
        .await
        .unwrap();
        let Outcome::Purchased(purchase) = outcome else {
            panic!("expected a purchase outcome");
        };
        assert_eq!(purchase.weekly_remaining, Some(remaining));
    }

    let before = balance(&state, "alice").await;
    let err = run(
        &mut state,
        &mut mirror,
        &config,
        Action::Purchase {
            player: name("alice"),
            item: "lucky_charm".to_string(),
        },
        2_000,
        0,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, EngineError::LimitExceeded { limit: 3, .. }));
    assert_eq!(balance(&state, "alice").await, before);

    // Seven days later the ISO week has rolled over; no reset job needed.
    let next_week = 1_000 + 7 * 86_400;
    let outcome = run(
        &mut state,
        &mut mirror,
        &config,
        Action::Purchase {
            player: name("alice"),
            item: "lucky_charm".to_string(),
        },
        next_week,
        0,
    )
    .await
    .unwrap();
    let Outcome::Purchased(purchase) = outcome else {
        panic!("expected a purchase outcome");
    };
    assert_eq!(purchase.weekly_remaining, Some(2));

    assert_eq!(account(&state, "alice").await.stats.purchases, 4);
    assert_conserved(&state).await;
    assert!(mirror
        .rows
        .iter()
        .any(|row| matches!(row, MirrorRow::PurchaseCount { count: 1, .. })));
    assert!(mirror
        .rows
        .iter()
        .any(|row| matches!(row, MirrorRow::PaidItem { item, .. } if item == "lucky_charm")));
}

#[tokio::test]
async fn prestige_tokens_are_unlimited() {
    let config = EngineConfig {
        starting_balance: 25_000,
        ..EngineConfig::default()
    };
    let mut state = Memory::default();
    let mut mirror = MemoryMirror::default();
    onboard(&mut state, &mut mirror, &config, "alice", 100).await;

    for _ in 0..2 {
        let outcome = run(
            &mut state,
            &mut mirror,
            &config,
            Action::Purchase {
                player: name("alice"),
                item: "prestige_token".to_string(),
            },
            200,
            0,
        )
        .await
        .unwrap();
        let Outcome::Purchased(purchase) = outcome else {
            panic!("expected a purchase outcome");
        };
        assert_eq!(purchase.weekly_remaining, None);
    }

    let after = account(&state, "alice").await;
    assert_eq!(after.prestige, 2);
    assert_eq!(after.balance, 5_000);
    assert_conserved(&state).await;
}

#[tokio::test]
async fn unknown_items_are_rejected() {
    let config = EngineConfig::default();
    let mut state = Memory::default();
    let mut mirror = MemoryMirror::default();
    onboard(&mut state, &mut mirror, &config, "alice", 100).await;

    let err = run(
        &mut state,
        &mut mirror,
        &config,
        Action::Purchase {
            player: name("alice"),
            item: "moon_ticket".to_string(),
        },
        200,
        0,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, EngineError::UnknownItem(item) if item == "moon_ticket"));
}

#[tokio::test]
async fn duel_resolves_zero_sum() {
    let config = EngineConfig::default();
    let mut state = Memory::default();
    let mut mirror = MemoryMirror::default();
    onboard(&mut state, &mut mirror, &config, "alice", 0).await;
    onboard(&mut state, &mut mirror, &config, "bob", 0).await;

    let outcome = run(
        &mut state,
        &mut mirror,
        &config,
        Action::DuelCreate {
            challenger: name("alice"),
            target: name("bob"),
            stake: 50,
            challenge_id: 7,
        },
        100,
        0,
    )
    .await
    .unwrap();
    assert!(matches!(
        outcome,
        Outcome::DuelCreated {
            challenge_id: 7,
            expires_ts: 160
        }
    ));

    let outcome = run(
        &mut state,
        &mut mirror,
        &config,
        Action::DuelAccept {
            player: name("bob"),
        },
        110,
        42,
    )
    .await
    .unwrap();
    let Outcome::DuelResolved(result) = outcome else {
        panic!("expected a resolution");
    };
    assert_eq!(result.pot, 100);
    assert!(result
        .unlocked_achievements
        .contains(&"first_duel".to_string()));

    // Stakes only move between the two players; the bank saw nothing but
    // the two first_duel rewards.
    let alice = balance(&state, "alice").await;
    let bob = balance(&state, "bob").await;
    assert_eq!(alice + bob, 2_200);
    match result.winner.as_deref() {
        Some("alice") => assert_eq!(alice, 1_150),
        Some("bob") => assert_eq!(bob, 1_150),
        Some(other) => panic!("unexpected winner {other}"),
        None => assert_eq!(alice, 1_100),
    }
    assert_eq!(result.new_balance, bob);
    assert_conserved(&state).await;

    match state.get(&Key::Duel(7)).await.unwrap() {
        Some(Value::Duel(duel)) => assert_eq!(duel.phase, DuelPhase::Resolved),
        other => panic!("missing duel record: {other:?}"),
    }
    assert!(state.get(&Key::DuelReceipt(7)).await.unwrap().is_some());
    assert!(state
        .get(&Key::ActiveDuel(name("alice")))
        .await
        .unwrap()
        .is_none());
    assert!(state
        .get(&Key::ActiveDuel(name("bob")))
        .await
        .unwrap()
        .is_none());

    // A lingering pointer replays the receipt instead of rolling again.
    state
        .insert(Key::ActiveDuel(name("bob")), Value::DuelRef(7))
        .await
        .unwrap();
    let replay = run(
        &mut state,
        &mut mirror,
        &config,
        Action::DuelAccept {
            player: name("bob"),
        },
        300,
        99,
    )
    .await
    .unwrap();
    let Outcome::DuelResolved(replayed) = replay else {
        panic!("expected a replayed resolution");
    };
    assert_eq!(replayed.winner, result.winner);
    assert_eq!(replayed.pot, 100);
    assert_eq!(replayed.challenger_grid, result.challenger_grid);
    assert_eq!(balance(&state, "alice").await, alice);
    assert_eq!(balance(&state, "bob").await, bob);
}

#[tokio::test]
async fn stale_challenges_expire_lazily() {
    let config = EngineConfig::default();
    let mut state = Memory::default();
    let mut mirror = MemoryMirror::default();
    onboard(&mut state, &mut mirror, &config, "carol", 0).await;
    onboard(&mut state, &mut mirror, &config, "dave", 0).await;

    run(
        &mut state,
        &mut mirror,
        &config,
        Action::DuelCreate {
            challenger: name("carol"),
            target: name("dave"),
            stake: 20,
            challenge_id: 8,
        },
        100,
        0,
    )
    .await
    .unwrap();

    // One second past the window the accept observes the expiry.
    let outcome = run(
        &mut state,
        &mut mirror,
        &config,
        Action::DuelAccept {
            player: name("dave"),
        },
        161,
        0,
    )
    .await
    .unwrap();
    assert!(matches!(outcome, Outcome::DuelExpired { challenge_id: 8 }));
    assert_eq!(balance(&state, "carol").await, 1_000);
    assert_eq!(balance(&state, "dave").await, 1_000);

    match state.get(&Key::Duel(8)).await.unwrap() {
        Some(Value::Duel(duel)) => assert_eq!(duel.phase, DuelPhase::Expired),
        other => panic!("missing duel record: {other:?}"),
    }
    let err = run(
        &mut state,
        &mut mirror,
        &config,
        Action::DuelAccept {
            player: name("dave"),
        },
        162,
        0,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, EngineError::NoActiveChallenge));
}

#[tokio::test]
async fn duel_cooldown_applies_to_the_challenger() {
    let config = EngineConfig::default();
    let mut state = Memory::default();
    let mut mirror = MemoryMirror::default();
    onboard(&mut state, &mut mirror, &config, "alice", 0).await;
    onboard(&mut state, &mut mirror, &config, "bob", 0).await;

    run(
        &mut state,
        &mut mirror,
        &config,
        Action::DuelCreate {
            challenger: name("alice"),
            target: name("bob"),
            stake: 10,
            challenge_id: 1,
        },
        100,
        0,
    )
    .await
    .unwrap();
    run(
        &mut state,
        &mut mirror,
        &config,
        Action::DuelAccept {
            player: name("bob"),
        },
        110,
        5,
    )
    .await
    .unwrap();

    let err = run(
        &mut state,
        &mut mirror,
        &config,
        Action::DuelCreate {
            challenger: name("alice"),
            target: name("bob"),
            stake: 10,
            challenge_id: 2,
        },
        150,
        0,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, EngineError::Cooldown { remaining_secs: 80 }));
}

#[tokio::test]
async fn duel_requires_a_willing_opponent() {
    let config = EngineConfig::default();
    let mut state = Memory::default();
    let mut mirror = MemoryMirror::default();
    onboard(&mut state, &mut mirror, &config, "alice", 0).await;
    onboard(&mut state, &mut mirror, &config, "bob", 0).await;

    let create = |target: &str, stake, id| Action::DuelCreate {
        challenger: name("alice"),
        target: name(target),
        stake,
        challenge_id: id,
    };

    let err = run(&mut state, &mut mirror, &config, create("alice", 10, 1), 100, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTarget));

    let err = run(&mut state, &mut mirror, &config, create("nobody", 10, 1), 100, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTarget));

    let err = run(&mut state, &mut mirror, &config, create("bob", 5, 1), 100, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidStake { stake: 5 }));

    let mut bob = account(&state, "bob").await;
    bob.flags.duels_opted_out = true;
    state
        .insert(Key::Player(bob.name.clone()), Value::Player(bob))
        .await
        .unwrap();
    let err = run(&mut state, &mut mirror, &config, create("bob", 10, 1), 100, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::DuelOptedOut));
}

#[tokio::test]
async fn an_open_challenge_blocks_both_parties() {
    let config = EngineConfig::default();
    let mut state = Memory::default();
    let mut mirror = MemoryMirror::default();
    onboard(&mut state, &mut mirror, &config, "alice", 0).await;
    onboard(&mut state, &mut mirror, &config, "bob", 0).await;
    onboard(&mut state, &mut mirror, &config, "carol", 0).await;

    run(
        &mut state,
        &mut mirror,
        &config,
        Action::DuelCreate {
            challenger: name("alice"),
            target: name("bob"),
            stake: 10,
            challenge_id: 1,
        },
        100,
        0,
    )
    .await
    .unwrap();

    let err = run(
        &mut state,
        &mut mirror,
        &config,
        Action::DuelCreate {
            challenger: name("alice"),
            target: name("carol"),
            stake: 10,
            challenge_id: 2,
        },
        110,
        0,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, EngineError::ChallengePending));

    let err = run(
        &mut state,
        &mut mirror,
        &config,
        Action::DuelCreate {
            challenger: name("carol"),
            target: name("bob"),
            stake: 10,
            challenge_id: 3,
        },
        110,
        0,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, EngineError::ChallengePending));

    // Declining frees both parties; no cooldown is charged.
    let outcome = run(
        &mut state,
        &mut mirror,
        &config,
        Action::DuelDecline {
            player: name("bob"),
        },
        120,
        0,
    )
    .await
    .unwrap();
    assert!(matches!(outcome, Outcome::DuelDeclined { challenge_id: 1 }));

    run(
        &mut state,
        &mut mirror,
        &config,
        Action::DuelCreate {
            challenger: name("carol"),
            target: name("bob"),
            stake: 10,
            challenge_id: 3,
        },
        130,
        0,
    )
    .await
    .unwrap();
    assert_eq!(balance(&state, "alice").await, 1_000);
}

#[tokio::test]
async fn buff_read_failure_never_wipes_the_set() {
    let config = EngineConfig::default();
    let mut inner = Memory::default();
    let mut mirror = MemoryMirror::default();
    onboard(&mut inner, &mut mirror, &config, "alice", 100).await;

    let mut flaky = Flaky::new(inner, vec![KeyGroup::Buffs]);
    let outcome = run(
        &mut flaky,
        &mut mirror,
        &config,
        Action::Spin {
            player: name("alice"),
            stake: 10,
        },
        200,
        1,
    )
    .await
    .unwrap();
    assert!(matches!(outcome, Outcome::Spin(_)));

    // The spin went through without buffs and without writing a buff set
    // that could clobber the real one once storage recovers.
    assert!(flaky
        .inner
        .get(&Key::Buffs(name("alice")))
        .await
        .unwrap()
        .is_none());
    assert!(flaky.failures.load(std::sync::atomic::Ordering::Relaxed) > 0);
}

#[tokio::test]
async fn purchase_aborts_when_the_counter_is_unreachable() {
    let config = EngineConfig::default();
    let mut inner = Memory::default();
    let mut mirror = MemoryMirror::default();
    onboard(&mut inner, &mut mirror, &config, "alice", 100).await;

    let mut flaky = Flaky::new(inner, vec![KeyGroup::PurchaseLimit]);
    let err = run(
        &mut flaky,
        &mut mirror,
        &config,
        Action::Purchase {
            player: name("alice"),
            item: "lucky_charm".to_string(),
        },
        200,
        0,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, EngineError::Storage(_)));
    assert_eq!(balance(&flaky.inner, "alice").await, 1_000);
}

#[tokio::test]
async fn only_admins_clear_unlocks() {
    let config = EngineConfig {
        admins: vec![name("root")],
        ..EngineConfig::default()
    };
    let mut state = Memory::default();
    let mut mirror = MemoryMirror::default();
    onboard(&mut state, &mut mirror, &config, "alice", 100).await;
    run(
        &mut state,
        &mut mirror,
        &config,
        Action::Spin {
            player: name("alice"),
            stake: 10,
        },
        200,
        1,
    )
    .await
    .unwrap();

    let err = run(
        &mut state,
        &mut mirror,
        &config,
        Action::AdminClearAchievement {
            admin: name("alice"),
            player: name("alice"),
            achievement: "first_spin".to_string(),
        },
        300,
        0,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, EngineError::Unauthorized));

    for _ in 0..2 {
        // Clearing is idempotent.
        let outcome = run(
            &mut state,
            &mut mirror,
            &config,
            Action::AdminClearAchievement {
                admin: name("root"),
                player: name("alice"),
                achievement: "first_spin".to_string(),
            },
            300,
            0,
        )
        .await
        .unwrap();
        assert!(matches!(outcome, Outcome::AchievementCleared { .. }));
    }
    match state.get(&Key::Achievements(name("alice"))).await.unwrap() {
        Some(Value::Achievements(unlocks)) => assert!(!unlocks.is_unlocked("first_spin")),
        other => panic!("missing achievement record: {other:?}"),
    }
}
