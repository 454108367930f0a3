use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};
use std::collections::BTreeMap;

use super::{read_string, string_encode_size, write_string, MAX_ID_LENGTH};

const MAX_UNLOCKS: usize = 1_024;

/// Per-player achievement record: achievement id → unlock timestamp.
/// Absence means locked. Unlocks are monotonic and idempotent; a timestamp is
/// never cleared except by explicit admin action.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AchievementState {
    pub unlocked: BTreeMap<String, u64>,
}

impl AchievementState {
    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked.contains_key(id)
    }

    /// Records an unlock; returns false if it was already present.
    pub fn unlock(&mut self, id: &str, now: u64) -> bool {
        if self.unlocked.contains_key(id) {
            return false;
        }
        self.unlocked.insert(id.to_string(), now);
        true
    }
}

impl Write for AchievementState {
    fn write(&self, writer: &mut impl BufMut) {
        (self.unlocked.len() as u32).write(writer);
        // BTreeMap iteration is sorted, so the encoding is canonical.
        for (id, ts) in &self.unlocked {
            write_string(id, writer);
            ts.write(writer);
        }
    }
}

impl Read for AchievementState {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let len = u32::read(reader)? as usize;
        if len > MAX_UNLOCKS {
            return Err(Error::Invalid("AchievementState", "too many unlocks"));
        }
        let mut unlocked = BTreeMap::new();
        for _ in 0..len {
            let id = read_string(reader, MAX_ID_LENGTH)?;
            let ts = u64::read(reader)?;
            unlocked.insert(id, ts);
        }
        Ok(Self { unlocked })
    }
}

impl EncodeSize for AchievementState {
    fn encode_size(&self) -> usize {
        4 + self
            .unlocked
            .iter()
            .map(|(id, ts)| string_encode_size(id) + ts.encode_size())
            .sum::<usize>()
    }
}

/// Discrete events that unlock achievements without a stat threshold,
/// reported directly by the triggering component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementEvent {
    FirstSpin,
    FirstDuel,
    JackpotHit,
    HotStreak,
    Comeback,
}
