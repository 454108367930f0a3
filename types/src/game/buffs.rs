use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};

use super::deadline_passed;

/// Identifiers of every buff the shop can grant.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuffId {
    /// Timed: boosts the reel weight of a target symbol.
    LuckyCharm = 0,
    /// Uses-limited: raises the jackpot cell chance.
    DachsRadar = 1,
    /// Uses-limited: doubles spin payouts.
    ProfitDoubler = 2,
    /// Timed: 1.5x spin payouts.
    HappyHour = 3,
    /// Stack-limited: payout multiplier grows with each loss while active.
    RageMode = 4,
    /// One-shot: replaces the next qualifying grid with a triple of its best
    /// symbol.
    WildCard = 5,
    /// One-shot: forces a pair of the best drawn symbol.
    GuaranteedPair = 6,
}

impl BuffId {
    pub const ALL: [BuffId; 7] = [
        BuffId::LuckyCharm,
        BuffId::DachsRadar,
        BuffId::ProfitDoubler,
        BuffId::HappyHour,
        BuffId::RageMode,
        BuffId::WildCard,
        BuffId::GuaranteedPair,
    ];
}

impl TryFrom<u8> for BuffId {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(BuffId::LuckyCharm),
            1 => Ok(BuffId::DachsRadar),
            2 => Ok(BuffId::ProfitDoubler),
            3 => Ok(BuffId::HappyHour),
            4 => Ok(BuffId::RageMode),
            5 => Ok(BuffId::WildCard),
            6 => Ok(BuffId::GuaranteedPair),
            _ => Err(Error::InvalidEnum(value)),
        }
    }
}

impl Write for BuffId {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for BuffId {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        BuffId::try_from(u8::read(reader)?)
    }
}

impl EncodeSize for BuffId {
    fn encode_size(&self) -> usize {
        1
    }
}

/// Lifecycle shape of a buff. The resolver matches exhaustively, so adding a
/// kind is a compile-time-checked change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuffKind {
    Timed { activated_ts: u64, duration_secs: u64 },
    UsesLimited { remaining: u32, expires_ts: u64 },
    StackLimited { stacks: u8, expires_ts: u64 },
    OneShot,
}

impl Write for BuffKind {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            BuffKind::Timed {
                activated_ts,
                duration_secs,
            } => {
                0u8.write(writer);
                activated_ts.write(writer);
                duration_secs.write(writer);
            }
            BuffKind::UsesLimited {
                remaining,
                expires_ts,
            } => {
                1u8.write(writer);
                remaining.write(writer);
                expires_ts.write(writer);
            }
            BuffKind::StackLimited { stacks, expires_ts } => {
                2u8.write(writer);
                stacks.write(writer);
                expires_ts.write(writer);
            }
            BuffKind::OneShot => 3u8.write(writer),
        }
    }
}

impl Read for BuffKind {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let tag = u8::read(reader)?;
        match tag {
            0 => Ok(BuffKind::Timed {
                activated_ts: u64::read(reader)?,
                duration_secs: u64::read(reader)?,
            }),
            1 => Ok(BuffKind::UsesLimited {
                remaining: u32::read(reader)?,
                expires_ts: u64::read(reader)?,
            }),
            2 => Ok(BuffKind::StackLimited {
                stacks: u8::read(reader)?,
                expires_ts: u64::read(reader)?,
            }),
            3 => Ok(BuffKind::OneShot),
            _ => Err(Error::InvalidEnum(tag)),
        }
    }
}

impl EncodeSize for BuffKind {
    fn encode_size(&self) -> usize {
        1 + match self {
            BuffKind::Timed {
                activated_ts,
                duration_secs,
            } => activated_ts.encode_size() + duration_secs.encode_size(),
            BuffKind::UsesLimited {
                remaining,
                expires_ts,
            } => remaining.encode_size() + expires_ts.encode_size(),
            BuffKind::StackLimited { stacks, expires_ts } => {
                stacks.encode_size() + expires_ts.encode_size()
            }
            BuffKind::OneShot => 0,
        }
    }
}

/// One granted buff. Buffs of the same id for the same player occupy a single
/// slot; grants stack or replace depending on kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuffInstance {
    pub id: BuffId,
    pub kind: BuffKind,
}

impl BuffInstance {
    /// Expiry is checked at read time, never by a background sweep. A buff
    /// whose persisted record has not been pruned is still dead once its
    /// deadline passes; the deadline itself counts as live, same as the duel
    /// response window.
    pub fn is_active(&self, now: u64) -> bool {
        match self.kind {
            BuffKind::Timed {
                activated_ts,
                duration_secs,
            } => !deadline_passed(now, activated_ts.saturating_add(duration_secs)),
            BuffKind::UsesLimited {
                remaining,
                expires_ts,
            } => remaining > 0 && !deadline_passed(now, expires_ts),
            BuffKind::StackLimited { expires_ts, .. } => !deadline_passed(now, expires_ts),
            BuffKind::OneShot => true,
        }
    }
}

impl Write for BuffInstance {
    fn write(&self, writer: &mut impl BufMut) {
        self.id.write(writer);
        self.kind.write(writer);
    }
}

impl Read for BuffInstance {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            id: BuffId::read(reader)?,
            kind: BuffKind::read(reader)?,
        })
    }
}

impl EncodeSize for BuffInstance {
    fn encode_size(&self) -> usize {
        self.id.encode_size() + self.kind.encode_size()
    }
}

/// All buffs held by one player, stored under a single key so the spin
/// pipeline reads and writes them in one round trip.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct BuffSet {
    pub buffs: Vec<BuffInstance>,
}

impl BuffSet {
    pub fn get(&self, id: BuffId) -> Option<&BuffInstance> {
        self.buffs.iter().find(|b| b.id == id)
    }

    pub fn get_mut(&mut self, id: BuffId) -> Option<&mut BuffInstance> {
        self.buffs.iter_mut().find(|b| b.id == id)
    }

    pub fn remove(&mut self, id: BuffId) {
        self.buffs.retain(|b| b.id != id);
    }

    /// Drop everything that is no longer active. Called opportunistically
    /// when the set is written back anyway.
    pub fn prune(&mut self, now: u64) {
        self.buffs.retain(|b| b.is_active(now));
    }
}

const MAX_BUFFS: usize = 64;

impl Write for BuffSet {
    fn write(&self, writer: &mut impl BufMut) {
        (self.buffs.len() as u32).write(writer);
        for buff in &self.buffs {
            buff.write(writer);
        }
    }
}

impl Read for BuffSet {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let len = u32::read(reader)? as usize;
        if len > MAX_BUFFS {
            return Err(Error::Invalid("BuffSet", "too many buffs"));
        }
        let mut buffs = Vec::with_capacity(len);
        for _ in 0..len {
            buffs.push(BuffInstance::read(reader)?);
        }
        Ok(Self { buffs })
    }
}

impl EncodeSize for BuffSet {
    fn encode_size(&self) -> usize {
        4 + self.buffs.iter().map(|b| b.encode_size()).sum::<usize>()
    }
}
