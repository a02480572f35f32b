/// Encoding of a register's contents on the wire.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
    strum::VariantArray,
)]
pub enum WireType {
    #[strum(serialize = "word")]
    Word,
    #[strum(serialize = "bool")]
    Bool,
    /// Signed temperature in tenths of a degree Celsius.
    #[strum(to_string = "te10", serialize = "temp")]
    ScaledTemp,
    #[strum(serialize = "fl10")]
    ScaledFloat10,
    #[strum(serialize = "f100")]
    ScaledFloat100,
    #[strum(serialize = "date")]
    Date,
    #[strum(serialize = "time")]
    Time,
    /// Independent named flags, one per bit.
    #[strum(serialize = "mask")]
    Mask,
    /// 24 hourly on/off flags for one group of week days.
    #[strum(serialize = "tprg")]
    WeeklySchedule,
    #[strum(serialize = "dwrd")]
    DoubleWord,
}

impl WireType {
    // Convenience aliases for nicely tabulated `registers!` tables in `devices`.
    pub const WORD: Self = Self::Word;
    pub const BOOL: Self = Self::Bool;
    pub const TE10: Self = Self::ScaledTemp;
    pub const TEMP: Self = Self::ScaledTemp;
    pub const FL10: Self = Self::ScaledFloat10;
    pub const F100: Self = Self::ScaledFloat100;
    pub const DATE: Self = Self::Date;
    pub const TIME: Self = Self::Time;
    pub const MASK: Self = Self::Mask;
    pub const TPRG: Self = Self::WeeklySchedule;
    pub const DWRD: Self = Self::DoubleWord;

    /// Number of 16-bit words a register of this type occupies.
    pub const fn words(self) -> u16 {
        match self {
            Self::Word
            | Self::Bool
            | Self::ScaledTemp
            | Self::ScaledFloat10
            | Self::ScaledFloat100
            | Self::Mask => 1,
            Self::Date | Self::Time | Self::DoubleWord => 2,
            Self::WeeklySchedule => 4,
        }
    }

    /// Whether writing a value of this type must start from the register's current contents.
    ///
    /// Masks and schedules share their words with bits this catalog does not describe, so a write
    /// only ever touches the bits the new value talks about.
    pub const fn is_partial(self) -> bool {
        matches!(self, Self::Mask | Self::WeeklySchedule)
    }

    /// Implied number of decimal digits for the scaled types.
    pub const fn decimal_digits(self) -> Option<u8> {
        match self {
            Self::ScaledTemp | Self::ScaledFloat10 => Some(1),
            Self::ScaledFloat100 => Some(2),
            _ => None,
        }
    }
}

impl serde::Serialize for WireType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.into())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct Mode(u8);

impl serde::Serialize for Mode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(if self.0 & Self::R.0 == 0 { "-" } else { "R" })?;
        f.write_str(if self.0 & Self::W.0 == 0 { "-" } else { "W" })?;
        Ok(())
    }
}

impl Mode {
    pub const R: Self = Self(1 << 0);
    pub const W: Self = Self(1 << 1);
    pub const RW: Self = Self(Self::R.0 | Self::W.0);
    pub(crate) const R_: Self = Self::R;

    pub const fn is_writable(self) -> bool {
        self.0 & Self::W.0 != 0
    }
}

/// What the bits of a register are called.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegisterName {
    Scalar(&'static str),
    /// Flag names indexed by bit position; `None` marks a reserved or not understood bit.
    Bitfield(&'static [Option<&'static str>]),
}

impl RegisterName {
    /// All the names this register can be looked up by.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        let (scalar, flags) = match *self {
            Self::Scalar(name) => (Some(name), &[][..]),
            Self::Bitfield(flags) => (None, flags),
        };
        scalar.into_iter().chain(flags.iter().filter_map(|f| *f))
    }

    pub fn flags(&self) -> impl Iterator<Item = (u8, &'static str)> + '_ {
        let flags = match *self {
            Self::Scalar(_) => &[][..],
            Self::Bitfield(flags) => flags,
        };
        flags.iter().enumerate().filter_map(|(bit, f)| Some((bit as u8, (*f)?)))
    }

    pub fn flag_bit(&self, flag: &str) -> Option<u8> {
        self.flags().find(|(_, name)| *name == flag).map(|(bit, _)| bit)
    }
}

impl std::fmt::Display for RegisterName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scalar(name) => f.write_str(name),
            Self::Bitfield(_) => {
                f.write_str("[")?;
                for (i, (_, flag)) in self.flags().enumerate() {
                    if i != 0 {
                        f.write_str(",")?;
                    }
                    f.write_str(flag)?;
                }
                f.write_str("]")
            }
        }
    }
}

/// A single entry of a register catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Register {
    pub address: u16,
    pub wire_type: WireType,
    pub mode: Mode,
    pub name: RegisterName,
}

impl Register {
    pub const fn words(&self) -> u16 {
        self.wire_type.words()
    }

    /// Address range occupied by this register.
    pub fn span(&self) -> std::ops::Range<u16> {
        self.address..self.address.saturating_add(self.words())
    }
}

impl std::fmt::Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.name, self.address)
    }
}

/// Violations of the catalog invariants, detected when a device profile is built.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum CatalogError {
    #[error("register address {0} is odd")]
    OddAddress(u16),
    #[error("register address {0} is declared more than once")]
    DuplicateAddress(u16),
    #[error("register address {address} is above the maximum address {max_address}")]
    AboveMaxAddress { address: u16, max_address: u16 },
    #[error("register at {first} overlaps with the register at {second}")]
    Overlap { first: u16, second: u16 },
    #[error("register at {address} is {words} words wide, more than one request of {max_count}")]
    TooWide { address: u16, words: u16, max_count: u16 },
    #[error("mask register at {0} declares more than 16 flags")]
    TooManyFlags(u16),
    #[error("register name `{0}` is declared more than once")]
    DuplicateName(&'static str),
    #[error("switch `{0}` refers to register `{1}` which is not a scalar register")]
    BadSwitch(&'static str, &'static str),
}

/// Build a `&'static [Register]` table.
///
/// Each row is `address: TYPE, MODE, "Name";` or, for masks, `address: MASK, MODE, ["Flag", _,
/// ...];` with `_` standing in for bits that are reserved or not understood.
macro_rules! registers {
    (@flag _) => { None };
    (@flag $flag:literal) => { Some($flag) };
    (@name [$($flag:tt),* $(,)?]) => {
        $crate::registers::RegisterName::Bitfield(&[$($crate::registers::registers!(@flag $flag)),*])
    };
    (@name $name:literal) => {
        $crate::registers::RegisterName::Scalar($name)
    };
    ($($address:literal: $ty:ident, $mode:ident, $name:tt;)*) => {
        &[$(
            $crate::registers::Register {
                address: $address,
                wire_type: $crate::registers::WireType::$ty,
                mode: $crate::registers::Mode::$mode,
                name: $crate::registers::registers!(@name $name),
            },
        )*]
    };
}
pub(crate) use registers;

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &[Register] = registers! {
        120: DATE, R_, "date";
        196: MASK, R_, ["FanON", _, "CirculationPumpON"];
        304: BOOL, RW, "HeatPumpEnabled";
    };

    #[test]
    fn table_macro_builds_descriptors() {
        assert_eq!(SAMPLE.len(), 3);
        assert_eq!(SAMPLE[0].wire_type, WireType::Date);
        assert_eq!(SAMPLE[0].span(), 120..122);
        assert!(!SAMPLE[1].mode.is_writable());
        assert!(SAMPLE[2].mode.is_writable());
        assert_eq!(
            SAMPLE[1].name,
            RegisterName::Bitfield(&[Some("FanON"), None, Some("CirculationPumpON")])
        );
    }

    #[test]
    fn bitfield_names_skip_reserved_bits() {
        let name = SAMPLE[1].name;
        assert_eq!(name.flags().collect::<Vec<_>>(), [(0, "FanON"), (2, "CirculationPumpON")]);
        assert_eq!(name.flag_bit("CirculationPumpON"), Some(2));
        assert_eq!(name.flag_bit("HeatPumpON"), None);
        assert_eq!(name.to_string(), "[FanON,CirculationPumpON]");
    }

    #[test]
    fn wire_type_aliases_parse() {
        assert_eq!("temp".parse::<WireType>(), Ok(WireType::ScaledTemp));
        assert_eq!("te10".parse::<WireType>(), Ok(WireType::ScaledTemp));
        assert_eq!("tprg".parse::<WireType>(), Ok(WireType::WeeklySchedule));
        assert_eq!(WireType::DoubleWord.to_string(), "dwrd");
        assert_eq!(WireType::WeeklySchedule.words(), 4);
        assert!(WireType::Mask.is_partial());
        assert!(!WireType::Bool.is_partial());
    }

    #[test]
    fn mode_display() {
        assert_eq!(Mode::R.to_string(), "R-");
        assert_eq!(Mode::RW.to_string(), "RW");
    }
}
