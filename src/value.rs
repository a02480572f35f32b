use std::borrow::Cow;

use crate::registers::WireType;

/// A fixed-point decimal number: `units` with `digits` implied decimal digits.
///
/// Scaled registers decode into this instead of a binary float, so that `21.5` read from a
/// register encodes back into exactly the same raw word.
#[derive(Clone, Copy, Debug)]
pub struct Decimal {
    units: i64,
    digits: u8,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("`{0}` is not a decimal number")]
pub struct ParseDecimalError(String);

impl Decimal {
    const MAX_DIGITS: u8 = 18;

    pub const fn new(units: i64, digits: u8) -> Self {
        Self { units, digits }
    }

    pub const fn units(&self) -> i64 {
        self.units
    }

    pub const fn digits(&self) -> u8 {
        self.digits
    }

    /// Express this number in units of `10^-digits`, rounding half away from zero.
    pub fn rescale(&self, digits: u8) -> Option<i64> {
        if digits >= self.digits {
            let factor = 10i64.checked_pow(u32::from(digits - self.digits))?;
            self.units.checked_mul(factor)
        } else {
            let factor = 10i64.checked_pow(u32::from(self.digits - digits))?;
            let quotient = self.units / factor;
            let remainder = (self.units % factor).unsigned_abs();
            if remainder * 2 >= factor.unsigned_abs() {
                Some(quotient + self.units.signum())
            } else {
                Some(quotient)
            }
        }
    }

    pub fn to_f64(&self) -> f64 {
        self.units as f64 / 10f64.powi(i32::from(self.digits))
    }

    /// The same number with trailing fractional zeros dropped.
    fn normalized(&self) -> (i64, u8) {
        let (mut units, mut digits) = (self.units, self.digits);
        while digits > 0 && units % 10 == 0 {
            units /= 10;
            digits -= 1;
        }
        (units, digits)
    }
}

impl From<i32> for Decimal {
    fn from(value: i32) -> Self {
        Self::new(i64::from(value), 0)
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for Decimal {}

impl std::fmt::Display for Decimal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.units < 0 {
            f.write_str("-")?;
        }
        let magnitude = self.units.unsigned_abs();
        if self.digits == 0 {
            return write!(f, "{magnitude}");
        }
        let (integer, fraction) = match 10u64.checked_pow(u32::from(self.digits)) {
            Some(factor) => (magnitude / factor, magnitude % factor),
            None => (0, magnitude),
        };
        let width = usize::from(self.digits);
        write!(f, "{integer}.{fraction:0width$}")
    }
}

impl std::str::FromStr for Decimal {
    type Err = ParseDecimalError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = || ParseDecimalError(s.to_string());
        let trimmed = s.trim();
        let (negative, unsigned) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };
        let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
        if integer.is_empty() && fraction.is_empty()
            || !all_digits(integer)
            || !all_digits(fraction)
            || fraction.len() > usize::from(Self::MAX_DIGITS)
        {
            return Err(error());
        }
        let mut units: i64 = 0;
        for b in integer.bytes().chain(fraction.bytes()) {
            units = units
                .checked_mul(10)
                .and_then(|u| u.checked_add(i64::from(b - b'0')))
                .ok_or_else(error)?;
        }
        Ok(Self::new(if negative { -units } else { units }, fraction.len() as u8))
    }
}

/// Named boolean flags of a mask register, in bit order.
///
/// When written, only the flags present here are changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Flags(Vec<(Cow<'static, str>, bool)>);

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("`{0}` is not a `Flag=value` list")]
pub struct ParseFlagsError(String);

impl Flags {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn with(mut self, name: impl Into<Cow<'static, str>>, value: bool) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<Cow<'static, str>>, value: bool) {
        let name = name.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<bool> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> + '_ {
        self.0.iter().map(|(n, v)| (&**n, *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Flags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (name, value)) in self.iter().enumerate() {
            if i != 0 {
                f.write_str(",")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Flags {
    type Err = ParseFlagsError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut flags = Flags::new();
        for item in s.split(',').map(str::trim).filter(|i| !i.is_empty()) {
            let (name, value) = item.split_once('=').ok_or_else(|| ParseFlagsError(s.into()))?;
            let value = parse_bool(value.trim()).ok_or_else(|| ParseFlagsError(s.into()))?;
            flags.set(name.trim().to_string(), value);
        }
        if flags.is_empty() {
            return Err(ParseFlagsError(s.into()));
        }
        Ok(flags)
    }
}

impl serde::Serialize for Flags {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// Hourly on/off program for one group of week days; index 0 is the hour starting at midnight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct Schedule([bool; 24]);

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("`{0}` is not a string of 24 `0` or `1` characters")]
pub struct ParseScheduleError(String);

impl Schedule {
    pub const HOURS: usize = 24;

    pub const fn from_hours(hours: [bool; 24]) -> Self {
        Self(hours)
    }

    /// Lowest 24 bits, bit N being hour N. Higher bits are ignored.
    pub fn from_bits(bits: u32) -> Self {
        Self(std::array::from_fn(|hour| bits & (1 << hour) != 0))
    }

    pub fn bits(&self) -> u32 {
        self.0.iter().enumerate().fold(0, |acc, (hour, on)| acc | (u32::from(*on) << hour))
    }

    pub const fn hours(&self) -> [bool; 24] {
        self.0
    }

    pub fn is_on(&self, hour: usize) -> bool {
        self.0.get(hour).copied().unwrap_or(false)
    }

    pub fn set(&mut self, hour: usize, on: bool) {
        if let Some(h) = self.0.get_mut(hour) {
            *h = on;
        }
    }
}

impl std::fmt::Display for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for on in self.0 {
            f.write_str(if on { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Schedule {
    type Err = ParseScheduleError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != Self::HOURS {
            return Err(ParseScheduleError(s.into()));
        }
        let mut schedule = Self::default();
        for (hour, c) in s.bytes().enumerate() {
            match c {
                b'0' => {}
                b'1' => schedule.set(hour, true),
                _ => return Err(ParseScheduleError(s.into())),
            }
        }
        Ok(schedule)
    }
}

/// A register's contents converted into its meaning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Word(u16),
    Bool(bool),
    Decimal(Decimal),
    Date(jiff::civil::Date),
    Time(jiff::civil::Time),
    Flags(Flags),
    Schedule(Schedule),
    DoubleWord(u32),
}

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("`{1}` is not a valid {0} value")]
    Invalid(WireType, String),
    #[error(transparent)]
    Decimal(#[from] ParseDecimalError),
    #[error(transparent)]
    Flags(#[from] ParseFlagsError),
    #[error(transparent)]
    Schedule(#[from] ParseScheduleError),
    #[error("`{1}` is not a valid {0}")]
    Civil(WireType, String, #[source] jiff::Error),
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

impl Value {
    /// Parse the textual form of a value for a register of the given type.
    pub fn parse(wire_type: WireType, s: &str) -> Result<Self, ParseError> {
        let invalid = || ParseError::Invalid(wire_type, s.to_string());
        let s = s.trim();
        Ok(match wire_type {
            WireType::Word => Self::Word(s.parse().map_err(|_| invalid())?),
            WireType::Bool => Self::Bool(parse_bool(s).ok_or_else(invalid)?),
            WireType::ScaledTemp | WireType::ScaledFloat10 | WireType::ScaledFloat100 => {
                Self::Decimal(s.parse()?)
            }
            WireType::Date => Self::Date(
                s.parse().map_err(|e| ParseError::Civil(wire_type, s.to_string(), e))?,
            ),
            WireType::Time => Self::Time(
                s.parse().map_err(|e| ParseError::Civil(wire_type, s.to_string(), e))?,
            ),
            WireType::Mask => Self::Flags(s.parse()?),
            WireType::WeeklySchedule => Self::Schedule(s.parse()?),
            WireType::DoubleWord => Self::DoubleWord(s.parse().map_err(|_| invalid())?),
        })
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Value::Word(_) => "word",
            Value::Bool(_) => "boolean",
            Value::Decimal(_) => "decimal",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Flags(_) => "flags",
            Value::Schedule(_) => "schedule",
            Value::DoubleWord(_) => "double word",
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Word(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Date(d) => write!(f, "{d}"),
            Value::Time(t) => write!(f, "{t}"),
            Value::Flags(flags) => write!(f, "{flags}"),
            Value::Schedule(s) => write!(f, "{s}"),
            Value::DoubleWord(n) => write!(f, "{n}"),
        }
    }
}

impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Word(n) => serializer.serialize_u16(*n),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Decimal(d) => serializer.serialize_f64(d.to_f64()),
            Value::Date(d) => serializer.collect_str(d),
            Value::Time(t) => serializer.collect_str(t),
            Value::Flags(flags) => flags.serialize(serializer),
            Value::Schedule(s) => s.serialize(serializer),
            Value::DoubleWord(n) => serializer.serialize_u32(*n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_parses_and_displays() {
        let d: Decimal = "21.5".parse().unwrap();
        assert_eq!((d.units(), d.digits()), (215, 1));
        assert_eq!(d.to_string(), "21.5");
        assert_eq!("-0.3".parse::<Decimal>().unwrap().to_string(), "-0.3");
        assert_eq!("7".parse::<Decimal>().unwrap().to_string(), "7");
        assert_eq!(Decimal::new(105, 2).to_string(), "1.05");
        assert!("1.2.3".parse::<Decimal>().is_err());
        assert!("abc".parse::<Decimal>().is_err());
        assert!("-".parse::<Decimal>().is_err());
    }

    #[test]
    fn decimal_equality_is_numeric() {
        assert_eq!(Decimal::new(215, 1), Decimal::new(2150, 2));
        assert_eq!(Decimal::new(3, 0), Decimal::from(3));
        assert_ne!(Decimal::new(215, 1), Decimal::new(216, 1));
        assert_eq!(Decimal::new(-2150, 2), Decimal::new(-215, 1));
    }

    #[test]
    fn decimal_with_many_digits() {
        assert_eq!(Decimal::new(1, 20).to_string(), "0.00000000000000000001");
        assert_eq!(Decimal::new(-12, 25).to_string(), format!("-0.{}12", "0".repeat(23)));
        assert_eq!(Decimal::new(100, 255), Decimal::new(1, 253));
        assert_ne!(Decimal::new(1, 255), Decimal::new(1, 0));
        assert_eq!(Decimal::new(1, 20).rescale(1), None);
    }

    #[test]
    fn decimal_rescale_rounds_half_away_from_zero() {
        assert_eq!(Decimal::new(2155, 2).rescale(1), Some(216));
        assert_eq!(Decimal::new(-2155, 2).rescale(1), Some(-216));
        assert_eq!(Decimal::new(2154, 2).rescale(1), Some(215));
        assert_eq!(Decimal::new(-2154, 2).rescale(1), Some(-215));
        assert_eq!(Decimal::new(215, 1).rescale(2), Some(2150));
        assert_eq!(Decimal::new(i64::MAX, 0).rescale(1), None);
    }

    #[test]
    fn flags_parse_and_update() {
        let flags: Flags = "FanON=true, HeatPumpON=off".parse().unwrap();
        assert_eq!(flags.get("FanON"), Some(true));
        assert_eq!(flags.get("HeatPumpON"), Some(false));
        assert_eq!(flags.get("CompressorON"), None);
        let flags = flags.with("FanON", false);
        assert_eq!(flags.len(), 2);
        assert_eq!(flags.to_string(), "FanON=false,HeatPumpON=false");
        assert!("FanON".parse::<Flags>().is_err());
        assert!("".parse::<Flags>().is_err());
    }

    #[test]
    fn schedule_bits_follow_hours() {
        let schedule: Schedule = "000000111111111111110000".parse().unwrap();
        assert!(!schedule.is_on(5));
        assert!(schedule.is_on(6));
        assert!(schedule.is_on(19));
        assert!(!schedule.is_on(20));
        assert_eq!(schedule.bits(), 0x000F_FFC0);
        assert_eq!(Schedule::from_bits(0xFF0F_FFC0), schedule);
        assert_eq!(schedule.to_string(), "000000111111111111110000");
        assert!("0101".parse::<Schedule>().is_err());
    }

    #[test]
    fn values_parse_per_wire_type() {
        assert_eq!(Value::parse(WireType::Word, "49663").unwrap(), Value::Word(49663));
        assert_eq!(Value::parse(WireType::Bool, "on").unwrap(), Value::Bool(true));
        assert_eq!(
            Value::parse(WireType::ScaledTemp, "-2.5").unwrap(),
            Value::Decimal(Decimal::new(-25, 1))
        );
        assert_eq!(
            Value::parse(WireType::Date, "2024-05-01").unwrap(),
            Value::Date(jiff::civil::date(2024, 5, 1))
        );
        assert_eq!(
            Value::parse(WireType::Time, "12:30:15").unwrap(),
            Value::Time(jiff::civil::time(12, 30, 15, 0))
        );
        assert_eq!(
            Value::parse(WireType::DoubleWord, "70000").unwrap(),
            Value::DoubleWord(70000)
        );
        assert!(matches!(
            Value::parse(WireType::Word, "70000"),
            Err(ParseError::Invalid(WireType::Word, _))
        ));
        assert!(matches!(Value::parse(WireType::Bool, "maybe"), Err(ParseError::Invalid(..))));
    }

    #[test]
    fn values_display() {
        assert_eq!(Value::Decimal(Decimal::new(215, 1)).to_string(), "21.5");
        assert_eq!(Value::Date(jiff::civil::date(2024, 5, 1)).to_string(), "2024-05-01");
        assert_eq!(Value::Time(jiff::civil::time(7, 5, 0, 0)).to_string(), "07:05:00");
        assert_eq!(
            serde_json::to_string(&Value::Flags(Flags::new().with("FanON", true))).unwrap(),
            r#"{"FanON":true}"#
        );
    }
}
