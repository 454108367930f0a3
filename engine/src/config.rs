//! The configuration surface, consumed read-only at process start.
//!
//! Catalogs (payouts, buffs, shop, achievements) and tuning constants are
//! plain data with production defaults; deployments override them from static
//! JSON. [`EngineConfig::validate`] runs once at load, after which the engine
//! treats every lookup as infallible.

use dachstaler_types::{
    AchievementEvent, BuffId, StatKey, Symbol, Username, BASE_STAKE, BPS_ONE, COMBO_BONUSES,
    COMEBACK_BONUS, COMEBACK_THRESHOLD, DUEL_COOLDOWN_SECS, DUEL_MIN_STAKE,
    DUEL_RESPONSE_WINDOW_SECS, HOT_STREAK_BONUS, HOT_STREAK_THRESHOLD, JACKPOT_CELL_CHANCE_PPM,
    JACKPOT_PAIR_PAYOUT, JACKPOT_SINGLE_PAYOUT, JACKPOT_TRIPLE_PAYOUT, MAX_ID_LENGTH, MAX_STAKE,
    RAGE_MODE_MAX_STACKS, RAGE_MODE_STACK_BPS, STARTING_BALANCE, STREAK_CAP_STEPS,
    STREAK_CEILING_BPS, STREAK_STEP_BPS,
};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid stakes: base {base}, max {max}")]
    Stakes { base: u64, max: u64 },
    #[error("symbol weights invalid: {0}")]
    Weights(&'static str),
    #[error("payout table invalid for {0:?}")]
    Payouts(Symbol),
    #[error("jackpot config invalid")]
    Jackpot,
    #[error("streak constants invalid")]
    Streak,
    #[error("shop catalog invalid: {0}")]
    Shop(String),
    #[error("achievement catalog invalid: {0}")]
    Achievements(String),
    #[error("duel config invalid: {0}")]
    Duel(&'static str),
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub struct SymbolWeight {
    pub symbol: Symbol,
    pub weight: u32,
}

/// Currency payouts per tier at bet multiplier 1.0x.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub struct PayoutRow {
    pub symbol: Symbol,
    pub triple: u64,
    pub pair: u64,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct JackpotConfig {
    /// Chance of the jackpot symbol per grid cell, in parts per million.
    pub cell_chance_ppm: u32,
    pub single: u64,
    pub pair: u64,
    pub triple: u64,
}

impl Default for JackpotConfig {
    fn default() -> Self {
        Self {
            cell_chance_ppm: JACKPOT_CELL_CHANCE_PPM,
            single: JACKPOT_SINGLE_PAYOUT,
            pair: JACKPOT_PAIR_PAYOUT,
            triple: JACKPOT_TRIPLE_PAYOUT,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub struct ComboBonus {
    pub wins: u32,
    pub bonus: u64,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StreakConfig {
    pub step_bps: u64,
    pub cap_steps: u32,
    pub ceiling_bps: u64,
    pub combo_bonuses: Vec<ComboBonus>,
    pub hot_streak_threshold: u32,
    pub hot_streak_bonus: u64,
    pub comeback_threshold: u32,
    pub comeback_bonus: u64,
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            step_bps: STREAK_STEP_BPS,
            cap_steps: STREAK_CAP_STEPS,
            ceiling_bps: STREAK_CEILING_BPS,
            combo_bonuses: COMBO_BONUSES
                .iter()
                .map(|&(wins, bonus)| ComboBonus { wins, bonus })
                .collect(),
            hot_streak_threshold: HOT_STREAK_THRESHOLD,
            hot_streak_bonus: HOT_STREAK_BONUS,
            comeback_threshold: COMEBACK_THRESHOLD,
            comeback_bonus: COMEBACK_BONUS,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LuckyCharmSpec {
    pub duration_secs: u64,
    pub symbol: Symbol,
    pub weight_bonus: u32,
}

impl Default for LuckyCharmSpec {
    fn default() -> Self {
        Self {
            duration_secs: 600,
            symbol: Symbol::Seven,
            weight_bonus: 600,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DachsRadarSpec {
    pub uses: u32,
    pub ttl_secs: u64,
    pub ppm_bonus: u32,
}

impl Default for DachsRadarSpec {
    fn default() -> Self {
        Self {
            uses: 10,
            ttl_secs: 3_600,
            ppm_bonus: 2_000,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProfitDoublerSpec {
    pub uses: u32,
    pub ttl_secs: u64,
    pub multiplier_bps: u64,
}

impl Default for ProfitDoublerSpec {
    fn default() -> Self {
        Self {
            uses: 3,
            ttl_secs: 3_600,
            multiplier_bps: 20_000,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HappyHourSpec {
    pub duration_secs: u64,
    pub multiplier_bps: u64,
}

impl Default for HappyHourSpec {
    fn default() -> Self {
        Self {
            duration_secs: 3_600,
            multiplier_bps: 15_000,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RageModeSpec {
    pub ttl_secs: u64,
    pub max_stacks: u8,
    pub per_stack_bps: u64,
}

impl Default for RageModeSpec {
    fn default() -> Self {
        Self {
            ttl_secs: 1_800,
            max_stacks: RAGE_MODE_MAX_STACKS,
            per_stack_bps: RAGE_MODE_STACK_BPS,
        }
    }
}

/// Shapes and effect parameters of every buff. One field per buff id keeps
/// the catalog exhaustive at compile time.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BuffCatalog {
    pub lucky_charm: LuckyCharmSpec,
    pub dachs_radar: DachsRadarSpec,
    pub profit_doubler: ProfitDoublerSpec,
    pub happy_hour: HappyHourSpec,
    pub rage_mode: RageModeSpec,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemEffect {
    Buff(BuffId),
    Prestige,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ShopItem {
    pub id: String,
    pub price: u64,
    pub effect: ItemEffect,
    /// Purchases allowed per ISO week; `None` means unlimited.
    pub weekly_limit: Option<u32>,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub struct StatThreshold {
    pub key: StatKey,
    pub at: u64,
}

/// One catalog entry: either a stat threshold or a discrete trigger event.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct AchievementSpec {
    pub id: String,
    #[serde(default)]
    pub stat: Option<StatThreshold>,
    #[serde(default)]
    pub event: Option<AchievementEvent>,
    #[serde(default)]
    pub reward: u64,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub struct TiebreakValue {
    pub symbol: Symbol,
    pub value: u64,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DuelConfig {
    pub response_window_secs: u64,
    pub cooldown_secs: u64,
    pub min_stake: u64,
    pub tiebreak: Vec<TiebreakValue>,
}

impl Default for DuelConfig {
    fn default() -> Self {
        Self {
            response_window_secs: DUEL_RESPONSE_WINDOW_SECS,
            cooldown_secs: DUEL_COOLDOWN_SECS,
            min_stake: DUEL_MIN_STAKE,
            tiebreak: vec![
                TiebreakValue { symbol: Symbol::Cherry, value: 1 },
                TiebreakValue { symbol: Symbol::Lemon, value: 2 },
                TiebreakValue { symbol: Symbol::Orange, value: 3 },
                TiebreakValue { symbol: Symbol::Grape, value: 4 },
                TiebreakValue { symbol: Symbol::Bell, value: 5 },
                TiebreakValue { symbol: Symbol::Star, value: 6 },
                TiebreakValue { symbol: Symbol::Seven, value: 7 },
                TiebreakValue { symbol: Symbol::Clover, value: 2 },
                TiebreakValue { symbol: Symbol::Coin, value: 3 },
                TiebreakValue { symbol: Symbol::Dachs, value: 10 },
            ],
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub starting_balance: u64,
    pub base_stake: u64,
    pub max_stake: u64,
    pub symbol_weights: Vec<SymbolWeight>,
    pub payouts: Vec<PayoutRow>,
    pub jackpot: JackpotConfig,
    pub streak: StreakConfig,
    pub buffs: BuffCatalog,
    pub shop: Vec<ShopItem>,
    pub achievements: Vec<AchievementSpec>,
    pub duel: DuelConfig,
    pub admins: Vec<Username>,
    /// When false, unlocks are recorded but pay nothing. Checked once per
    /// unlock batch.
    pub rewards_enabled: bool,
    pub leaderboard_max_age_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let buff_item = |id: &str, price, buff, limit| ShopItem {
            id: id.to_string(),
            price,
            effect: ItemEffect::Buff(buff),
            weekly_limit: Some(limit),
        };
        let threshold = |id: &str, key, at, reward| AchievementSpec {
            id: id.to_string(),
            stat: Some(StatThreshold { key, at }),
            event: None,
            reward,
        };
        let event = |id: &str, ev, reward| AchievementSpec {
            id: id.to_string(),
            stat: None,
            event: Some(ev),
            reward,
        };

        Self {
            starting_balance: STARTING_BALANCE,
            base_stake: BASE_STAKE,
            max_stake: MAX_STAKE,
            symbol_weights: vec![
                SymbolWeight { symbol: Symbol::Cherry, weight: 2_000 },
                SymbolWeight { symbol: Symbol::Lemon, weight: 1_800 },
                SymbolWeight { symbol: Symbol::Orange, weight: 1_500 },
                SymbolWeight { symbol: Symbol::Grape, weight: 1_200 },
                SymbolWeight { symbol: Symbol::Bell, weight: 900 },
                SymbolWeight { symbol: Symbol::Star, weight: 600 },
                SymbolWeight { symbol: Symbol::Seven, weight: 300 },
                SymbolWeight { symbol: Symbol::Clover, weight: 900 },
                SymbolWeight { symbol: Symbol::Coin, weight: 800 },
            ],
            payouts: vec![
                PayoutRow { symbol: Symbol::Cherry, triple: 50, pair: 10 },
                PayoutRow { symbol: Symbol::Lemon, triple: 60, pair: 12 },
                PayoutRow { symbol: Symbol::Orange, triple: 80, pair: 16 },
                PayoutRow { symbol: Symbol::Grape, triple: 100, pair: 20 },
                PayoutRow { symbol: Symbol::Bell, triple: 150, pair: 30 },
                PayoutRow { symbol: Symbol::Star, triple: 250, pair: 50 },
                PayoutRow { symbol: Symbol::Seven, triple: 400, pair: 80 },
            ],
            jackpot: JackpotConfig::default(),
            streak: StreakConfig::default(),
            buffs: BuffCatalog::default(),
            shop: vec![
                buff_item("lucky_charm", 300, BuffId::LuckyCharm, 3),
                buff_item("dachs_radar", 500, BuffId::DachsRadar, 3),
                buff_item("profit_doubler", 400, BuffId::ProfitDoubler, 3),
                buff_item("happy_hour", 250, BuffId::HappyHour, 5),
                buff_item("rage_mode", 350, BuffId::RageMode, 3),
                buff_item("wild_card", 600, BuffId::WildCard, 3),
                buff_item("guaranteed_pair", 200, BuffId::GuaranteedPair, 5),
                ShopItem {
                    id: "prestige_token".to_string(),
                    price: 10_000,
                    effect: ItemEffect::Prestige,
                    weekly_limit: None,
                },
            ],
            achievements: vec![
                event("first_spin", AchievementEvent::FirstSpin, 50),
                event("first_duel", AchievementEvent::FirstDuel, 100),
                event("dachs_hunter", AchievementEvent::JackpotHit, 500),
                event("hot_streak", AchievementEvent::HotStreak, 100),
                event("comeback_kid", AchievementEvent::Comeback, 100),
                threshold("spinner_100", StatKey::TotalSpins, 100, 200),
                threshold("spinner_1000", StatKey::TotalSpins, 1_000, 1_000),
                threshold("high_roller", StatKey::TotalWagered, 100_000, 2_000),
                threshold("pechvogel", StatKey::LongestLossStreak, 10, 300),
                threshold("duelist", StatKey::DuelsWon, 10, 500),
                threshold("tycoon", StatKey::DuelWinnings, 10_000, 1_000),
            ],
            duel: DuelConfig::default(),
            admins: Vec::new(),
            rewards_enabled: true,
            leaderboard_max_age_secs: 300,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_stake == 0 || self.max_stake < self.base_stake {
            return Err(ConfigError::Stakes {
                base: self.base_stake,
                max: self.max_stake,
            });
        }

        if self.symbol_weights.is_empty() {
            return Err(ConfigError::Weights("empty"));
        }
        let mut seen = Vec::new();
        for entry in &self.symbol_weights {
            if entry.symbol.is_jackpot() {
                return Err(ConfigError::Weights("jackpot symbol on the reel"));
            }
            if entry.weight == 0 {
                return Err(ConfigError::Weights("zero weight"));
            }
            if seen.contains(&entry.symbol) {
                return Err(ConfigError::Weights("duplicate symbol"));
            }
            seen.push(entry.symbol);
        }

        for row in &self.payouts {
            if row.symbol.is_jackpot() || row.symbol.awards_free_spins() {
                return Err(ConfigError::Payouts(row.symbol));
            }
            if row.pair == 0 || row.triple <= row.pair {
                return Err(ConfigError::Payouts(row.symbol));
            }
        }

        let jackpot = &self.jackpot;
        if jackpot.cell_chance_ppm > 1_000_000
            || jackpot.single == 0
            || jackpot.pair <= jackpot.single
            || jackpot.triple <= jackpot.pair
        {
            return Err(ConfigError::Jackpot);
        }

        let streak = &self.streak;
        if streak.step_bps == 0 || streak.ceiling_bps < BPS_ONE {
            return Err(ConfigError::Streak);
        }

        let mut item_ids = Vec::new();
        for item in &self.shop {
            if item.id.is_empty() || item.id.len() > MAX_ID_LENGTH || item.price == 0 {
                return Err(ConfigError::Shop(item.id.clone()));
            }
            if item_ids.contains(&&item.id) {
                return Err(ConfigError::Shop(item.id.clone()));
            }
            item_ids.push(&item.id);
        }

        let mut achievement_ids = Vec::new();
        for spec in &self.achievements {
            if spec.id.is_empty() || spec.id.len() > MAX_ID_LENGTH {
                return Err(ConfigError::Achievements(spec.id.clone()));
            }
            if spec.stat.is_none() && spec.event.is_none() {
                return Err(ConfigError::Achievements(spec.id.clone()));
            }
            if achievement_ids.contains(&&spec.id) {
                return Err(ConfigError::Achievements(spec.id.clone()));
            }
            achievement_ids.push(&spec.id);
        }

        if self.duel.min_stake == 0 {
            return Err(ConfigError::Duel("zero min stake"));
        }
        if self.duel.response_window_secs == 0 {
            return Err(ConfigError::Duel("zero response window"));
        }
        for symbol in Symbol::ALL {
            if !self.duel.tiebreak.iter().any(|t| t.symbol == symbol) {
                return Err(ConfigError::Duel("tiebreak table incomplete"));
            }
        }

        Ok(())
    }

    pub fn payout_for(&self, symbol: Symbol) -> Option<&PayoutRow> {
        self.payouts.iter().find(|row| row.symbol == symbol)
    }

    pub fn shop_item(&self, id: &str) -> Option<&ShopItem> {
        self.shop.iter().find(|item| item.id == id)
    }

    pub fn tiebreak_value(&self, symbol: Symbol) -> u64 {
        self.duel
            .tiebreak
            .iter()
            .find(|t| t.symbol == symbol)
            .map(|t| t.value)
            .unwrap_or(0)
    }

    pub fn is_admin(&self, name: &Username) -> bool {
        self.admins.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_overrides_defaults() {
        let config: EngineConfig = serde_json::from_str(
            r#"{
                "rewards_enabled": false,
                "admins": ["Dachswart"],
                "jackpot": { "cell_chance_ppm": 500 }
            }"#,
        )
        .unwrap();
        config.validate().unwrap();
        assert!(!config.rewards_enabled);
        assert!(config.is_admin(&Username::new("dachswart").unwrap()));
        assert_eq!(config.jackpot.cell_chance_ppm, 500);
        // Untouched sections keep production defaults.
        assert_eq!(config.base_stake, BASE_STAKE);
        assert_eq!(config.shop.len(), 8);
    }

    #[test]
    fn catalog_entries_parse_from_json() {
        let spec: AchievementSpec = serde_json::from_str(
            r#"{ "id": "marathon", "stat": { "key": "total_spins", "at": 5000 }, "reward": 750 }"#,
        )
        .unwrap();
        assert_eq!(spec.stat.unwrap().key, StatKey::TotalSpins);

        let item: ShopItem = serde_json::from_str(
            r#"{ "id": "wild_card", "price": 600, "effect": { "buff": "wild_card" }, "weekly_limit": 3 }"#,
        )
        .unwrap();
        assert_eq!(item.effect, ItemEffect::Buff(BuffId::WildCard));
    }

    #[test]
    fn validate_rejects_jackpot_on_reel() {
        let mut config = EngineConfig::default();
        config.symbol_weights.push(SymbolWeight {
            symbol: Symbol::Dachs,
            weight: 1,
        });
        assert!(matches!(config.validate(), Err(ConfigError::Weights(_))));
    }

    #[test]
    fn validate_rejects_non_monotonic_payouts() {
        let mut config = EngineConfig::default();
        config.payouts[0].pair = config.payouts[0].triple;
        assert!(matches!(config.validate(), Err(ConfigError::Payouts(_))));
    }

    #[test]
    fn validate_requires_complete_tiebreak_table() {
        let mut config = EngineConfig::default();
        config.duel.tiebreak.retain(|t| t.symbol != Symbol::Dachs);
        assert!(matches!(config.validate(), Err(ConfigError::Duel(_))));
    }
}
