//! Storage keys and values.
//!
//! The backing store is an eventually-consistent key/value store offering
//! point get/put and list-by-prefix, with no multi-key transactions. Keys
//! carry a one-byte group tag so a prefix scan over a [`KeyGroup`] is cheap.

use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};

use crate::game::{
    read_string, string_encode_size, write_string, AchievementState, Bank, BuffSet, DuelChallenge,
    DuelReceipt, LeaderboardSnapshot, PlayerAccount, PurchaseLimit, Username, MAX_ID_LENGTH,
};

/// Key namespaces, used as scan prefixes.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyGroup {
    Player = 0,
    Buffs = 1,
    Achievements = 2,
    PurchaseLimit = 3,
    ActiveDuel = 4,
    Duel = 5,
    DuelReceipt = 6,
    Bank = 7,
    Leaderboard = 8,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    /// Authoritative player account.
    Player(Username),
    /// All buffs held by a player.
    Buffs(Username),
    /// Achievement unlocks of a player.
    Achievements(Username),
    /// Weekly purchase counter for (player, shop item).
    PurchaseLimit(Username, String),
    /// Pointer from a participant to the duel they are currently in.
    ActiveDuel(Username),
    /// Duel challenge by id.
    Duel(u64),
    /// Resolution receipt by challenge id.
    DuelReceipt(u64),
    /// The single aggregate bank counter.
    Bank,
    /// The materialized leaderboard snapshot.
    Leaderboard,
}

impl Key {
    pub fn group(&self) -> KeyGroup {
        match self {
            Key::Player(_) => KeyGroup::Player,
            Key::Buffs(_) => KeyGroup::Buffs,
            Key::Achievements(_) => KeyGroup::Achievements,
            Key::PurchaseLimit(_, _) => KeyGroup::PurchaseLimit,
            Key::ActiveDuel(_) => KeyGroup::ActiveDuel,
            Key::Duel(_) => KeyGroup::Duel,
            Key::DuelReceipt(_) => KeyGroup::DuelReceipt,
            Key::Bank => KeyGroup::Bank,
            Key::Leaderboard => KeyGroup::Leaderboard,
        }
    }
}

impl Write for Key {
    fn write(&self, writer: &mut impl BufMut) {
        (self.group() as u8).write(writer);
        match self {
            Key::Player(name)
            | Key::Buffs(name)
            | Key::Achievements(name)
            | Key::ActiveDuel(name) => name.write(writer),
            Key::PurchaseLimit(name, item) => {
                name.write(writer);
                write_string(item, writer);
            }
            Key::Duel(id) | Key::DuelReceipt(id) => id.write(writer),
            Key::Bank | Key::Leaderboard => {}
        }
    }
}

impl Read for Key {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let tag = u8::read(reader)?;
        Ok(match tag {
            0 => Key::Player(Username::read(reader)?),
            1 => Key::Buffs(Username::read(reader)?),
            2 => Key::Achievements(Username::read(reader)?),
            3 => Key::PurchaseLimit(Username::read(reader)?, read_string(reader, MAX_ID_LENGTH)?),
            4 => Key::ActiveDuel(Username::read(reader)?),
            5 => Key::Duel(u64::read(reader)?),
            6 => Key::DuelReceipt(u64::read(reader)?),
            7 => Key::Bank,
            8 => Key::Leaderboard,
            _ => return Err(Error::InvalidEnum(tag)),
        })
    }
}

impl EncodeSize for Key {
    fn encode_size(&self) -> usize {
        1 + match self {
            Key::Player(name)
            | Key::Buffs(name)
            | Key::Achievements(name)
            | Key::ActiveDuel(name) => name.encode_size(),
            Key::PurchaseLimit(name, item) => name.encode_size() + string_encode_size(item),
            Key::Duel(id) | Key::DuelReceipt(id) => id.encode_size(),
            Key::Bank | Key::Leaderboard => 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(clippy::large_enum_variant)]
pub enum Value {
    Player(PlayerAccount),
    Buffs(BuffSet),
    Achievements(AchievementState),
    PurchaseLimit(PurchaseLimit),
    /// Pointer stored under [`Key::ActiveDuel`].
    DuelRef(u64),
    Duel(DuelChallenge),
    DuelReceipt(DuelReceipt),
    Bank(Bank),
    Leaderboard(LeaderboardSnapshot),
}

impl Write for Value {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Value::Player(v) => {
                0u8.write(writer);
                v.write(writer);
            }
            Value::Buffs(v) => {
                1u8.write(writer);
                v.write(writer);
            }
            Value::Achievements(v) => {
                2u8.write(writer);
                v.write(writer);
            }
            Value::PurchaseLimit(v) => {
                3u8.write(writer);
                v.write(writer);
            }
            Value::DuelRef(v) => {
                4u8.write(writer);
                v.write(writer);
            }
            Value::Duel(v) => {
                5u8.write(writer);
                v.write(writer);
            }
            Value::DuelReceipt(v) => {
                6u8.write(writer);
                v.write(writer);
            }
            Value::Bank(v) => {
                7u8.write(writer);
                v.write(writer);
            }
            Value::Leaderboard(v) => {
                8u8.write(writer);
                v.write(writer);
            }
        }
    }
}

impl Read for Value {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let tag = u8::read(reader)?;
        Ok(match tag {
            0 => Value::Player(PlayerAccount::read(reader)?),
            1 => Value::Buffs(BuffSet::read(reader)?),
            2 => Value::Achievements(AchievementState::read(reader)?),
            3 => Value::PurchaseLimit(PurchaseLimit::read(reader)?),
            4 => Value::DuelRef(u64::read(reader)?),
            5 => Value::Duel(DuelChallenge::read(reader)?),
            6 => Value::DuelReceipt(DuelReceipt::read(reader)?),
            7 => Value::Bank(Bank::read(reader)?),
            8 => Value::Leaderboard(LeaderboardSnapshot::read(reader)?),
            _ => return Err(Error::InvalidEnum(tag)),
        })
    }
}

impl EncodeSize for Value {
    fn encode_size(&self) -> usize {
        1 + match self {
            Value::Player(v) => v.encode_size(),
            Value::Buffs(v) => v.encode_size(),
            Value::Achievements(v) => v.encode_size(),
            Value::PurchaseLimit(v) => v.encode_size(),
            Value::DuelRef(v) => v.encode_size(),
            Value::Duel(v) => v.encode_size(),
            Value::DuelReceipt(v) => v.encode_size(),
            Value::Bank(v) => v.encode_size(),
            Value::Leaderboard(v) => v.encode_size(),
        }
    }
}
