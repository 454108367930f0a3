use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};

use super::{deadline_passed, read_grid, write_grid, Grid, Username, DUEL_RESPONSE_WINDOW_SECS};

/// Lifecycle of a duel challenge.
///
/// `Created → Accepted → Resolved`; `Declined` and `Expired` are terminal.
/// Expiry is detected lazily when a later duel command observes a stale
/// `Created` timestamp; no timer runs in the background.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DuelPhase {
    Created = 0,
    Accepted = 1,
    Declined = 2,
    Expired = 3,
    Resolved = 4,
}

impl TryFrom<u8> for DuelPhase {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DuelPhase::Created),
            1 => Ok(DuelPhase::Accepted),
            2 => Ok(DuelPhase::Declined),
            3 => Ok(DuelPhase::Expired),
            4 => Ok(DuelPhase::Resolved),
            _ => Err(Error::InvalidEnum(value)),
        }
    }
}

impl Write for DuelPhase {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for DuelPhase {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        DuelPhase::try_from(u8::read(reader)?)
    }
}

impl EncodeSize for DuelPhase {
    fn encode_size(&self) -> usize {
        1
    }
}

/// A head-to-head challenge. The id is supplied by the caller, which makes
/// resolution receipts naturally idempotent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DuelChallenge {
    pub id: u64,
    pub challenger: Username,
    pub target: Username,
    pub stake: u64,
    pub created_ts: u64,
    pub phase: DuelPhase,
}

impl DuelChallenge {
    /// True once the response window has passed without an accept/decline.
    pub fn is_stale(&self, now: u64) -> bool {
        self.phase == DuelPhase::Created
            && deadline_passed(
                now,
                self.created_ts.saturating_add(DUEL_RESPONSE_WINDOW_SECS),
            )
    }
}

impl Write for DuelChallenge {
    fn write(&self, writer: &mut impl BufMut) {
        self.id.write(writer);
        self.challenger.write(writer);
        self.target.write(writer);
        self.stake.write(writer);
        self.created_ts.write(writer);
        self.phase.write(writer);
    }
}

impl Read for DuelChallenge {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            id: u64::read(reader)?,
            challenger: Username::read(reader)?,
            target: Username::read(reader)?,
            stake: u64::read(reader)?,
            created_ts: u64::read(reader)?,
            phase: DuelPhase::read(reader)?,
        })
    }
}

impl EncodeSize for DuelChallenge {
    fn encode_size(&self) -> usize {
        self.id.encode_size()
            + self.challenger.encode_size()
            + self.target.encode_size()
            + self.stake.encode_size()
            + self.created_ts.encode_size()
            + self.phase.encode_size()
    }
}

/// Durable record of a completed resolution. Written in the same intent as
/// the stake movements; its presence means the pot has already been settled,
/// so a retried accept never double-debits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DuelReceipt {
    pub challenge_id: u64,
    /// `None` on an exact tie (both stakes returned).
    pub winner: Option<Username>,
    pub pot: u64,
    pub challenger_grid: Grid,
    pub target_grid: Grid,
    pub resolved_ts: u64,
}

impl Write for DuelReceipt {
    fn write(&self, writer: &mut impl BufMut) {
        self.challenge_id.write(writer);
        self.winner.write(writer);
        self.pot.write(writer);
        write_grid(&self.challenger_grid, writer);
        write_grid(&self.target_grid, writer);
        self.resolved_ts.write(writer);
    }
}

impl Read for DuelReceipt {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            challenge_id: u64::read(reader)?,
            winner: Option::<Username>::read(reader)?,
            pot: u64::read(reader)?,
            challenger_grid: read_grid(reader)?,
            target_grid: read_grid(reader)?,
            resolved_ts: u64::read(reader)?,
        })
    }
}

impl EncodeSize for DuelReceipt {
    fn encode_size(&self) -> usize {
        self.challenge_id.encode_size()
            + self.winner.encode_size()
            + self.pot.encode_size()
            + 6
            + self.resolved_ts.encode_size()
    }
}
