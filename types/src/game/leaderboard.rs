use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};

use super::{read_string, string_encode_size, write_string, Username, MAX_NAME_LENGTH};

const MAX_ENTRIES: usize = 100_000;

/// One ranked row of the leaderboard snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub name: Username,
    pub display_name: String,
    pub balance: u64,
    pub prestige: u32,
}

impl Write for LeaderboardEntry {
    fn write(&self, writer: &mut impl BufMut) {
        self.name.write(writer);
        write_string(&self.display_name, writer);
        self.balance.write(writer);
        self.prestige.write(writer);
    }
}

impl Read for LeaderboardEntry {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            name: Username::read(reader)?,
            display_name: read_string(reader, MAX_NAME_LENGTH)?,
            balance: u64::read(reader)?,
            prestige: u32::read(reader)?,
        })
    }
}

impl EncodeSize for LeaderboardEntry {
    fn encode_size(&self) -> usize {
        self.name.encode_size()
            + string_encode_size(&self.display_name)
            + self.balance.encode_size()
            + self.prestige.encode_size()
    }
}

/// Materialized ranking of all qualifying players. A cache artifact, not
/// authoritative state: concurrent recomputations are tolerated and the last
/// writer wins.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct LeaderboardSnapshot {
    /// Full ranking, best balance first. Rank of a player is index + 1.
    pub entries: Vec<LeaderboardEntry>,
    pub computed_ts: u64,
}

impl LeaderboardSnapshot {
    /// Off-page rank lookup (1-based).
    pub fn rank_of(&self, name: &Username) -> Option<usize> {
        self.entries.iter().position(|e| &e.name == name).map(|i| i + 1)
    }

    pub fn age(&self, now: u64) -> u64 {
        now.saturating_sub(self.computed_ts)
    }
}

impl Write for LeaderboardSnapshot {
    fn write(&self, writer: &mut impl BufMut) {
        (self.entries.len() as u32).write(writer);
        for entry in &self.entries {
            entry.write(writer);
        }
        self.computed_ts.write(writer);
    }
}

impl Read for LeaderboardSnapshot {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let len = u32::read(reader)? as usize;
        if len > MAX_ENTRIES {
            return Err(Error::Invalid("LeaderboardSnapshot", "too many entries"));
        }
        let mut entries = Vec::with_capacity(len);
        for _ in 0..len {
            entries.push(LeaderboardEntry::read(reader)?);
        }
        Ok(Self {
            entries,
            computed_ts: u64::read(reader)?,
        })
    }
}

impl EncodeSize for LeaderboardSnapshot {
    fn encode_size(&self) -> usize {
        4 + self.entries.iter().map(|e| e.encode_size()).sum::<usize>()
            + self.computed_ts.encode_size()
    }
}
