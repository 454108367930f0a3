use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};

/// Aggregate counter of all currency flow into and out of the player economy.
/// Stakes, purchases and donations flow in; payouts and bonuses flow out.
/// Unlike player balances the net may go negative.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Bank {
    pub net: i128,
    pub total_stakes_in: u64,
    pub total_payouts_out: u64,
    pub jackpot_hits: u64,
}

impl Bank {
    pub fn credit(&mut self, amount: u64) {
        self.net = self.net.saturating_add(amount as i128);
        self.total_stakes_in = self.total_stakes_in.saturating_add(amount);
    }

    pub fn debit(&mut self, amount: u64) {
        self.net = self.net.saturating_sub(amount as i128);
        self.total_payouts_out = self.total_payouts_out.saturating_add(amount);
    }
}

impl Write for Bank {
    fn write(&self, writer: &mut impl BufMut) {
        self.net.write(writer);
        self.total_stakes_in.write(writer);
        self.total_payouts_out.write(writer);
        self.jackpot_hits.write(writer);
    }
}

impl Read for Bank {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            net: i128::read(reader)?,
            total_stakes_in: u64::read(reader)?,
            total_payouts_out: u64::read(reader)?,
            jackpot_hits: u64::read(reader)?,
        })
    }
}

impl EncodeSize for Bank {
    fn encode_size(&self) -> usize {
        self.net.encode_size()
            + self.total_stakes_in.encode_size()
            + self.total_payouts_out.encode_size()
            + self.jackpot_hits.encode_size()
    }
}

/// ISO week identifier packed as `year * 100 + week` (e.g. 202634).
/// Stored with purchase counters; a mismatch with the current week means the
/// counter is implicitly zero, so no reset job is needed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct WeekId(pub u32);

impl Write for WeekId {
    fn write(&self, writer: &mut impl BufMut) {
        self.0.write(writer);
    }
}

impl Read for WeekId {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self(u32::read(reader)?))
    }
}

impl EncodeSize for WeekId {
    fn encode_size(&self) -> usize {
        4
    }
}

/// Per player and item: purchases made in the stored ISO week.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct PurchaseLimit {
    pub week: WeekId,
    pub count: u32,
}

impl PurchaseLimit {
    /// Count effective for `week`, treating a stale record as zero.
    pub fn count_for(&self, week: WeekId) -> u32 {
        if self.week == week {
            self.count
        } else {
            0
        }
    }
}

impl Write for PurchaseLimit {
    fn write(&self, writer: &mut impl BufMut) {
        self.week.write(writer);
        self.count.write(writer);
    }
}

impl Read for PurchaseLimit {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            week: WeekId::read(reader)?,
            count: u32::read(reader)?,
        })
    }
}

impl EncodeSize for PurchaseLimit {
    fn encode_size(&self) -> usize {
        self.week.encode_size() + self.count.encode_size()
    }
}
