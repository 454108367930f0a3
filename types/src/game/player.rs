use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};
use thiserror::Error as ThisError;

use super::{read_string, string_encode_size, write_string, MAX_NAME_LENGTH};

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum UsernameError {
    #[error("username empty")]
    Empty,
    #[error("username too long (len={len}, max={max})")]
    TooLong { len: usize, max: usize },
}

/// Case-insensitive player identity. Construction lowercases, so two spellings
/// of the same name always map to the same storage key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Username(String);

impl Username {
    pub fn new(raw: &str) -> Result<Self, UsernameError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(UsernameError::Empty);
        }
        if trimmed.len() > MAX_NAME_LENGTH {
            return Err(UsernameError::TooLong {
                len: trimmed.len(),
                max: MAX_NAME_LENGTH,
            });
        }
        Ok(Self(trimmed.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Write for Username {
    fn write(&self, writer: &mut impl BufMut) {
        write_string(&self.0, writer);
    }
}

impl Read for Username {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let raw = read_string(reader, MAX_NAME_LENGTH)?;
        Username::new(&raw).map_err(|_| Error::Invalid("Username", "malformed"))
    }
}

impl EncodeSize for Username {
    fn encode_size(&self) -> usize {
        string_encode_size(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct PlayerFlags {
    pub disclaimer_accepted: bool,
    pub self_banned: bool,
    pub hide_on_leaderboard: bool,
    pub duels_opted_out: bool,
}

/// Consecutive win/loss counters. The multiplier is derived from the streak
/// configuration at spin time, never stored.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct StreakState {
    pub wins: u32,
    pub losses: u32,
}

/// Free spins carried between actions. Free spins inherit the bet multiplier
/// of the spin that earned them.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct FreeSpinCredit {
    pub remaining: u32,
    pub multiplier_bps: u64,
}

/// Cumulative statistic counters used for achievement progress.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct PlayerStats {
    pub total_spins: u64,
    pub total_wins: u64,
    pub total_losses: u64,
    pub total_wagered: u64,
    pub total_won: u64,
    pub jackpots: u64,
    pub longest_win_streak: u32,
    pub longest_loss_streak: u32,
    pub duels_played: u64,
    pub duels_won: u64,
    pub duel_winnings: u64,
    pub purchases: u64,
}

/// Keys into [`PlayerStats`], referenced by the achievement catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKey {
    TotalSpins,
    TotalWins,
    TotalLosses,
    TotalWagered,
    TotalWon,
    Jackpots,
    LongestWinStreak,
    LongestLossStreak,
    DuelsPlayed,
    DuelsWon,
    DuelWinnings,
    Purchases,
}

impl PlayerStats {
    pub fn get(&self, key: StatKey) -> u64 {
        match key {
            StatKey::TotalSpins => self.total_spins,
            StatKey::TotalWins => self.total_wins,
            StatKey::TotalLosses => self.total_losses,
            StatKey::TotalWagered => self.total_wagered,
            StatKey::TotalWon => self.total_won,
            StatKey::Jackpots => self.jackpots,
            StatKey::LongestWinStreak => self.longest_win_streak as u64,
            StatKey::LongestLossStreak => self.longest_loss_streak as u64,
            StatKey::DuelsPlayed => self.duels_played,
            StatKey::DuelsWon => self.duels_won,
            StatKey::DuelWinnings => self.duel_winnings,
            StatKey::Purchases => self.purchases,
        }
    }
}

/// A player account. Only ever created by disclaimer acceptance; read paths
/// must not materialize one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerAccount {
    pub name: Username,
    /// Display form as first seen, original casing preserved.
    pub display_name: String,
    pub balance: u64,
    pub prestige: u32,
    pub flags: PlayerFlags,
    pub streak: StreakState,
    pub free_spins: FreeSpinCredit,
    pub stats: PlayerStats,
    pub created_ts: u64,
    pub last_active_ts: u64,
    pub last_duel_ts: u64,
}

impl PlayerAccount {
    pub fn new(name: Username, display_name: String, now: u64, starting_balance: u64) -> Self {
        Self {
            name,
            display_name,
            balance: starting_balance,
            prestige: 0,
            flags: PlayerFlags {
                disclaimer_accepted: true,
                ..PlayerFlags::default()
            },
            streak: StreakState::default(),
            free_spins: FreeSpinCredit::default(),
            stats: PlayerStats::default(),
            created_ts: now,
            last_active_ts: now,
            last_duel_ts: 0,
        }
    }
}

impl Write for PlayerFlags {
    fn write(&self, writer: &mut impl BufMut) {
        let bits: u8 = (self.disclaimer_accepted as u8)
            | ((self.self_banned as u8) << 1)
            | ((self.hide_on_leaderboard as u8) << 2)
            | ((self.duels_opted_out as u8) << 3);
        bits.write(writer);
    }
}

impl Read for PlayerFlags {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let bits = u8::read(reader)?;
        Ok(Self {
            disclaimer_accepted: bits & 0x01 != 0,
            self_banned: bits & 0x02 != 0,
            hide_on_leaderboard: bits & 0x04 != 0,
            duels_opted_out: bits & 0x08 != 0,
        })
    }
}

impl EncodeSize for PlayerFlags {
    fn encode_size(&self) -> usize {
        1
    }
}

impl Write for PlayerStats {
    fn write(&self, writer: &mut impl BufMut) {
        self.total_spins.write(writer);
        self.total_wins.write(writer);
        self.total_losses.write(writer);
        self.total_wagered.write(writer);
        self.total_won.write(writer);
        self.jackpots.write(writer);
        self.longest_win_streak.write(writer);
        self.longest_loss_streak.write(writer);
        self.duels_played.write(writer);
        self.duels_won.write(writer);
        self.duel_winnings.write(writer);
        self.purchases.write(writer);
    }
}

impl Read for PlayerStats {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            total_spins: u64::read(reader)?,
            total_wins: u64::read(reader)?,
            total_losses: u64::read(reader)?,
            total_wagered: u64::read(reader)?,
            total_won: u64::read(reader)?,
            jackpots: u64::read(reader)?,
            longest_win_streak: u32::read(reader)?,
            longest_loss_streak: u32::read(reader)?,
            duels_played: u64::read(reader)?,
            duels_won: u64::read(reader)?,
            duel_winnings: u64::read(reader)?,
            purchases: u64::read(reader)?,
        })
    }
}

impl EncodeSize for PlayerStats {
    fn encode_size(&self) -> usize {
        self.total_spins.encode_size()
            + self.total_wins.encode_size()
            + self.total_losses.encode_size()
            + self.total_wagered.encode_size()
            + self.total_won.encode_size()
            + self.jackpots.encode_size()
            + self.longest_win_streak.encode_size()
            + self.longest_loss_streak.encode_size()
            + self.duels_played.encode_size()
            + self.duels_won.encode_size()
            + self.duel_winnings.encode_size()
            + self.purchases.encode_size()
    }
}

impl Write for PlayerAccount {
    fn write(&self, writer: &mut impl BufMut) {
        self.name.write(writer);
        write_string(&self.display_name, writer);
        self.balance.write(writer);
        self.prestige.write(writer);
        self.flags.write(writer);
        self.streak.wins.write(writer);
        self.streak.losses.write(writer);
        self.free_spins.remaining.write(writer);
        self.free_spins.multiplier_bps.write(writer);
        self.stats.write(writer);
        self.created_ts.write(writer);
        self.last_active_ts.write(writer);
        self.last_duel_ts.write(writer);
    }
}

impl Read for PlayerAccount {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let name = Username::read(reader)?;
        let display_name = read_string(reader, MAX_NAME_LENGTH)?;
        let balance = u64::read(reader)?;
        let prestige = u32::read(reader)?;
        let flags = PlayerFlags::read(reader)?;
        let wins = u32::read(reader)?;
        let losses = u32::read(reader)?;
        let free_remaining = u32::read(reader)?;
        let free_multiplier_bps = u64::read(reader)?;
        let stats = PlayerStats::read(reader)?;
        let created_ts = u64::read(reader)?;
        let last_active_ts = u64::read(reader)?;
        // Optional extension (records written before duels shipped).
        let last_duel_ts = if reader.remaining() >= 8 {
            u64::read(reader)?
        } else {
            0
        };

        Ok(Self {
            name,
            display_name,
            balance,
            prestige,
            flags,
            streak: StreakState { wins, losses },
            free_spins: FreeSpinCredit {
                remaining: free_remaining,
                multiplier_bps: free_multiplier_bps,
            },
            stats,
            created_ts,
            last_active_ts,
            last_duel_ts,
        })
    }
}

impl EncodeSize for PlayerAccount {
    fn encode_size(&self) -> usize {
        self.name.encode_size()
            + string_encode_size(&self.display_name)
            + self.balance.encode_size()
            + self.prestige.encode_size()
            + self.flags.encode_size()
            + self.streak.wins.encode_size()
            + self.streak.losses.encode_size()
            + self.free_spins.remaining.encode_size()
            + self.free_spins.multiplier_bps.encode_size()
            + self.stats.encode_size()
            + self.created_ts.encode_size()
            + self.last_active_ts.encode_size()
            + self.last_duel_ts.encode_size()
    }
}
