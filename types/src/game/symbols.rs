use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};

/// Slot symbols.
///
/// [`Symbol::Clover`] and [`Symbol::Coin`] award free spins instead of
/// currency. [`Symbol::Dachs`] is the jackpot symbol: it is never part of the
/// weighted reel table and only enters a grid through its own gated chance.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    Cherry = 0,
    Lemon = 1,
    Orange = 2,
    Grape = 3,
    Bell = 4,
    Star = 5,
    Seven = 6,
    Clover = 7,
    Coin = 8,
    Dachs = 9,
}

impl Symbol {
    /// Every symbol, in tag order.
    pub const ALL: [Symbol; 10] = [
        Symbol::Cherry,
        Symbol::Lemon,
        Symbol::Orange,
        Symbol::Grape,
        Symbol::Bell,
        Symbol::Star,
        Symbol::Seven,
        Symbol::Clover,
        Symbol::Coin,
        Symbol::Dachs,
    ];

    /// Symbols that can appear on the weighted reels (everything but Dachs).
    pub const REEL: [Symbol; 9] = [
        Symbol::Cherry,
        Symbol::Lemon,
        Symbol::Orange,
        Symbol::Grape,
        Symbol::Bell,
        Symbol::Star,
        Symbol::Seven,
        Symbol::Clover,
        Symbol::Coin,
    ];

    /// True for the two symbols that pay out in free spins.
    pub fn awards_free_spins(self) -> bool {
        matches!(self, Symbol::Clover | Symbol::Coin)
    }

    /// True for the gated jackpot symbol.
    pub fn is_jackpot(self) -> bool {
        matches!(self, Symbol::Dachs)
    }
}

impl TryFrom<u8> for Symbol {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Symbol::Cherry),
            1 => Ok(Symbol::Lemon),
            2 => Ok(Symbol::Orange),
            3 => Ok(Symbol::Grape),
            4 => Ok(Symbol::Bell),
            5 => Ok(Symbol::Star),
            6 => Ok(Symbol::Seven),
            7 => Ok(Symbol::Clover),
            8 => Ok(Symbol::Coin),
            9 => Ok(Symbol::Dachs),
            _ => Err(Error::InvalidEnum(value)),
        }
    }
}

impl Write for Symbol {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for Symbol {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Symbol::try_from(u8::read(reader)?)
    }
}

impl EncodeSize for Symbol {
    fn encode_size(&self) -> usize {
        1
    }
}

/// One spin result: three symbols, left to right.
pub type Grid = [Symbol; 3];

pub fn write_grid(grid: &Grid, writer: &mut impl BufMut) {
    for symbol in grid {
        symbol.write(writer);
    }
}

pub fn read_grid(reader: &mut impl Buf) -> Result<Grid, Error> {
    Ok([
        Symbol::read(reader)?,
        Symbol::read(reader)?,
        Symbol::read(reader)?,
    ])
}
