//! Achievement detection.
//!
//! A pure function of the updated stat counters, the prior unlock set and
//! the discrete events the action reported. Unlocking itself (and the
//! reward credit, if globally enabled) happens in the handlers so it lands
//! in the same write intent as everything else.

use dachstaler_types::{AchievementEvent, AchievementState, PlayerStats};

use crate::config::EngineConfig;

/// Newly qualifying achievement ids, in catalog order. Already-unlocked ids
/// never reappear, so running detection twice on unchanged counters yields
/// nothing the second time.
pub fn detect(
    config: &EngineConfig,
    stats: &PlayerStats,
    unlocked: &AchievementState,
    events: &[AchievementEvent],
) -> Vec<String> {
    let mut fresh = Vec::new();
    for spec in &config.achievements {
        if unlocked.is_unlocked(&spec.id) {
            continue;
        }
        let qualifies = match (&spec.stat, &spec.event) {
            (Some(threshold), _) => stats.get(threshold.key) >= threshold.at,
            (None, Some(event)) => events.contains(event),
            (None, None) => false,
        };
        if qualifies {
            fresh.push(spec.id.clone());
        }
    }
    fresh
}

/// Total reward for one unlock batch. The global flag is applied here, once
/// per batch, so a catalog update mid-batch cannot split reward semantics.
pub fn batch_reward(config: &EngineConfig, ids: &[String]) -> u64 {
    if !config.rewards_enabled {
        return 0;
    }
    ids.iter()
        .filter_map(|id| config.achievements.iter().find(|spec| &spec.id == id))
        .map(|spec| spec.reward)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    #[test]
    fn thresholds_unlock_at_their_stat_values() {
        let cfg = config();
        let mut stats = PlayerStats::default();
        let unlocked = AchievementState::default();

        stats.total_spins = 99;
        assert!(!detect(&cfg, &stats, &unlocked, &[]).contains(&"spinner_100".to_string()));

        stats.total_spins = 100;
        let fresh = detect(&cfg, &stats, &unlocked, &[]);
        assert!(fresh.contains(&"spinner_100".to_string()));
        assert!(!fresh.contains(&"spinner_1000".to_string()));
    }

    #[test]
    fn events_unlock_without_thresholds() {
        let cfg = config();
        let stats = PlayerStats::default();
        let unlocked = AchievementState::default();

        let fresh = detect(&cfg, &stats, &unlocked, &[AchievementEvent::FirstSpin]);
        assert_eq!(fresh, vec!["first_spin".to_string()]);

        assert!(detect(&cfg, &stats, &unlocked, &[]).is_empty());
    }

    #[test]
    fn detection_is_idempotent() {
        let cfg = config();
        let mut stats = PlayerStats::default();
        stats.total_spins = 100;
        let mut unlocked = AchievementState::default();

        let first = detect(&cfg, &stats, &unlocked, &[]);
        assert!(!first.is_empty());
        for id in &first {
            assert!(unlocked.unlock(id, 1_000));
        }

        assert!(detect(&cfg, &stats, &unlocked, &[]).is_empty());
    }

    #[test]
    fn batch_reward_respects_the_global_flag() {
        let mut cfg = config();
        let ids = vec!["first_spin".to_string(), "spinner_100".to_string()];
        assert_eq!(batch_reward(&cfg, &ids), 50 + 200);

        cfg.rewards_enabled = false;
        assert_eq!(batch_reward(&cfg, &ids), 0);
    }

    #[test]
    fn multiple_thresholds_can_unlock_in_one_batch() {
        let cfg = config();
        let mut stats = PlayerStats::default();
        stats.total_spins = 1_000;
        let fresh = detect(&cfg, &stats, &AchievementState::default(), &[]);
        assert!(fresh.contains(&"spinner_100".to_string()));
        assert!(fresh.contains(&"spinner_1000".to_string()));
    }
}
