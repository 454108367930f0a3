/// Maximum username length (chat usernames are short).
pub const MAX_NAME_LENGTH: usize = 25;

/// Maximum length of achievement and shop item identifiers.
pub const MAX_ID_LENGTH: usize = 48;

/// DachsTaler granted when a player accepts the disclaimer.
pub const STARTING_BALANCE: u64 = 1_000;

/// Base stake of one spin. The bet multiplier is `stake / BASE_STAKE`.
pub const BASE_STAKE: u64 = 10;

/// Largest stake a single spin may carry.
pub const MAX_STAKE: u64 = 1_000;

/// Fixed-point scale used for all multipliers (1.0x = 10_000).
pub const BPS_ONE: u64 = 10_000;

/// Streak multiplier growth per consecutive win beyond the first, in bps.
pub const STREAK_STEP_BPS: u64 = 1_000;

/// Number of growth steps before the streak multiplier stops climbing.
pub const STREAK_CAP_STEPS: u32 = 20;

/// Hard ceiling of the streak multiplier (3.0x).
pub const STREAK_CEILING_BPS: u64 = 30_000;

/// Flat combo bonuses awarded on reaching 2/3/4 consecutive wins.
pub const COMBO_BONUSES: [(u32, u64); 3] = [(2, 50), (3, 100), (4, 200)];

/// Consecutive wins at which the hot-streak bonus fires.
pub const HOT_STREAK_THRESHOLD: u32 = 5;

/// One-time bonus awarded on reaching [`HOT_STREAK_THRESHOLD`].
pub const HOT_STREAK_BONUS: u64 = 500;

/// Loss streak that arms the comeback bonus for the next win.
pub const COMEBACK_THRESHOLD: u32 = 5;

/// One-time bonus for a win that ends an armed loss streak.
pub const COMEBACK_BONUS: u64 = 250;

/// Free spins awarded for a pair / triple of a free-spin symbol.
pub const FREE_SPINS_PAIR: u32 = 1;
pub const FREE_SPINS_TRIPLE: u32 = 5;

/// Seconds a duel challenge stays acceptable before it lazily expires.
pub const DUEL_RESPONSE_WINDOW_SECS: u64 = 60;

/// Cooldown between duels for the challenger.
pub const DUEL_COOLDOWN_SECS: u64 = 120;

/// Minimum duel stake.
pub const DUEL_MIN_STAKE: u64 = 10;

/// Maximum rage-mode stack depth.
pub const RAGE_MODE_MAX_STACKS: u8 = 5;

/// Additional payout bps per rage-mode stack (stack 1 = +20%).
pub const RAGE_MODE_STACK_BPS: u64 = 2_000;

/// Base chance of the jackpot symbol appearing in one grid cell, in bps
/// of 1_000_000 (200 = 0.02% per cell).
pub const JACKPOT_CELL_CHANCE_PPM: u32 = 200;

/// Jackpot payouts per tier at bet multiplier 1.0x.
pub const JACKPOT_SINGLE_PAYOUT: u64 = 500;
pub const JACKPOT_PAIR_PAYOUT: u64 = 5_000;
pub const JACKPOT_TRIPLE_PAYOUT: u64 = 50_000;
