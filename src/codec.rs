//! Conversion between raw register words and [`Value`]s.
//!
//! Registers whose type [is partial](WireType::is_partial) cannot be encoded from a value alone:
//! use [`merge`] with the words currently held by the device instead of [`encode`].

use crate::registers::{Register, WireType};
use crate::value::{Decimal, Flags, Schedule, Value};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("expected {expected} register words, got {got}")]
    WordCount { expected: u16, got: usize },
    #[error("{value} does not fit into a {wire_type} register")]
    OutOfRange { wire_type: WireType, value: String },
    #[error("a {kind} value cannot be stored in a {wire_type} register")]
    WrongKind { wire_type: WireType, kind: &'static str },
    #[error("flag `{0}` is not defined for this register")]
    UnknownFlag(String),
    #[error("register words do not hold a valid {0}")]
    InvalidCivil(WireType, #[source] jiff::Error),
    #[error("{0} registers must be merged into their current contents")]
    RequiresCurrentValue(WireType),
    #[error("{0} registers are written as a whole")]
    NotPartial(WireType),
}

fn take<const N: usize>(words: &[u16]) -> Result<[u16; N], Error> {
    <[u16; N]>::try_from(words)
        .map_err(|_| Error::WordCount { expected: N as u16, got: words.len() })
}

fn bit_mask(bit: u8) -> u16 {
    1u16.checked_shl(u32::from(bit)).unwrap_or(0)
}

fn out_of_range(wire_type: WireType, value: impl ToString) -> Error {
    Error::OutOfRange { wire_type, value: value.to_string() }
}

/// Interpret the raw `words` of `register`.
pub fn decode(register: &Register, words: &[u16]) -> Result<Value, Error> {
    let wire_type = register.wire_type;
    Ok(match wire_type {
        WireType::Word => Value::Word(take::<1>(words)?[0]),
        WireType::Bool => Value::Bool(take::<1>(words)?[0] != 0),
        WireType::ScaledTemp => {
            let [raw] = take::<1>(words)?;
            Value::Decimal(Decimal::new(i64::from(raw as i16), 1))
        }
        WireType::ScaledFloat10 | WireType::ScaledFloat100 => {
            let [raw] = take::<1>(words)?;
            let digits = wire_type.decimal_digits().unwrap_or(0);
            Value::Decimal(Decimal::new(i64::from(raw), digits))
        }
        WireType::Date => {
            let [year_month, day] = take::<2>(words)?;
            let [year, month] = year_month.to_le_bytes();
            let [day, _] = day.to_le_bytes();
            let date = jiff::civil::Date::new(2000 + i16::from(year), month as i8, day as i8)
                .map_err(|e| Error::InvalidCivil(wire_type, e))?;
            Value::Date(date)
        }
        WireType::Time => {
            let [hour_minute, second] = take::<2>(words)?;
            let [hour, minute] = hour_minute.to_le_bytes();
            let [second, _] = second.to_le_bytes();
            let time = jiff::civil::Time::new(hour as i8, minute as i8, second as i8, 0)
                .map_err(|e| Error::InvalidCivil(wire_type, e))?;
            Value::Time(time)
        }
        WireType::Mask => {
            let [raw] = take::<1>(words)?;
            let mut flags = Flags::new();
            for (bit, name) in register.name.flags() {
                flags.set(name, raw & bit_mask(bit) != 0);
            }
            Value::Flags(flags)
        }
        WireType::WeeklySchedule => {
            let [low, high, _, _] = take::<4>(words)?;
            Value::Schedule(Schedule::from_bits(u32::from(low) | u32::from(high) << 16))
        }
        WireType::DoubleWord => {
            let [low, high] = take::<2>(words)?;
            Value::DoubleWord(u32::from(low) | u32::from(high) << 16)
        }
    })
}

/// Produce the words to write into a register that is always written as a whole.
///
/// `true_word` is what the device expects for a boolean `true`.
pub fn encode(register: &Register, value: &Value, true_word: u16) -> Result<Vec<u16>, Error> {
    let wire_type = register.wire_type;
    Ok(match (wire_type, value) {
        (WireType::Word, Value::Word(n)) => vec![*n],
        (WireType::Bool, Value::Bool(b)) => vec![if *b { true_word } else { 0 }],
        (WireType::ScaledTemp, Value::Decimal(d)) => {
            let units = d.rescale(1).ok_or_else(|| out_of_range(wire_type, d))?;
            let raw = i16::try_from(units).map_err(|_| out_of_range(wire_type, d))?;
            vec![raw as u16]
        }
        (WireType::ScaledFloat10 | WireType::ScaledFloat100, Value::Decimal(d)) => {
            let digits = wire_type.decimal_digits().unwrap_or(0);
            let units = d.rescale(digits).ok_or_else(|| out_of_range(wire_type, d))?;
            vec![u16::try_from(units).map_err(|_| out_of_range(wire_type, d))?]
        }
        (WireType::Date, Value::Date(date)) => {
            let year = u8::try_from(date.year() - 2000).map_err(|_| out_of_range(wire_type, date))?;
            vec![
                u16::from_le_bytes([year, date.month() as u8]),
                u16::from(date.day() as u8),
            ]
        }
        (WireType::Time, Value::Time(time)) => vec![
            u16::from_le_bytes([time.hour() as u8, time.minute() as u8]),
            u16::from(time.second() as u8),
        ],
        (WireType::DoubleWord, Value::DoubleWord(n)) => vec![*n as u16, (*n >> 16) as u16],
        (WireType::Mask | WireType::WeeklySchedule, _) => {
            return Err(Error::RequiresCurrentValue(wire_type));
        }
        (_, value) => return Err(Error::WrongKind { wire_type, kind: value.kind() }),
    })
}

/// Check that `value` is of the kind `register` holds, without looking at any words.
pub fn check_kind(register: &Register, value: &Value) -> Result<(), Error> {
    let wire_type = register.wire_type;
    match (wire_type, value) {
        (WireType::Word, Value::Word(_))
        | (WireType::Bool, Value::Bool(_))
        | (
            WireType::ScaledTemp | WireType::ScaledFloat10 | WireType::ScaledFloat100,
            Value::Decimal(_),
        )
        | (WireType::Date, Value::Date(_))
        | (WireType::Time, Value::Time(_))
        | (WireType::Mask, Value::Flags(_))
        | (WireType::WeeklySchedule, Value::Schedule(_))
        | (WireType::DoubleWord, Value::DoubleWord(_)) => Ok(()),
        (_, value) => Err(Error::WrongKind { wire_type, kind: value.kind() }),
    }
}

/// Produce the words to write into a partially updated register.
///
/// `current` is what the register holds right now. Every bit `value` does not talk about is
/// carried over from it unchanged: flags not mentioned in a [`Flags`] value, unnamed mask bits,
/// and the bits of a schedule register above the 24 hours.
pub fn merge(register: &Register, value: &Value, current: &[u16]) -> Result<Vec<u16>, Error> {
    let wire_type = register.wire_type;
    match (wire_type, value) {
        (WireType::Mask, Value::Flags(flags)) => {
            let [mut raw] = take::<1>(current)?;
            for (name, on) in flags.iter() {
                let bit = register
                    .name
                    .flag_bit(name)
                    .ok_or_else(|| Error::UnknownFlag(name.to_string()))?;
                if on {
                    raw |= bit_mask(bit);
                } else {
                    raw &= !bit_mask(bit);
                }
            }
            Ok(vec![raw])
        }
        (WireType::WeeklySchedule, Value::Schedule(schedule)) => {
            let [_, high, reserved_low, reserved_high] = take::<4>(current)?;
            let bits = schedule.bits();
            Ok(vec![
                bits as u16,
                (high & 0xFF00) | ((bits >> 16) as u16 & 0x00FF),
                reserved_low,
                reserved_high,
            ])
        }
        (WireType::Mask | WireType::WeeklySchedule, value) => {
            Err(Error::WrongKind { wire_type, kind: value.kind() })
        }
        (wire_type, _) => Err(Error::NotPartial(wire_type)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::{Mode, RegisterName};

    fn register(wire_type: WireType) -> Register {
        Register { address: 300, wire_type, mode: Mode::RW, name: RegisterName::Scalar("R") }
    }

    const STATUS_MASK: Register = Register {
        address: 196,
        wire_type: WireType::Mask,
        mode: Mode::R,
        name: RegisterName::Bitfield(&[
            Some("FanON"),
            None,
            Some("CirculationPumpON"),
            None,
            None,
            Some("HeatPumpON"),
        ]),
    };

    fn roundtrip(wire_type: WireType, value: Value) {
        let register = register(wire_type);
        let words = encode(&register, &value, 1).unwrap();
        assert_eq!(words.len(), usize::from(wire_type.words()));
        assert_eq!(decode(&register, &words).unwrap(), value, "{wire_type} {value}");
    }

    #[test]
    fn whole_register_types_roundtrip() {
        roundtrip(WireType::Word, Value::Word(0));
        roundtrip(WireType::Word, Value::Word(u16::MAX));
        roundtrip(WireType::Bool, Value::Bool(true));
        roundtrip(WireType::Bool, Value::Bool(false));
        roundtrip(WireType::ScaledTemp, Value::Decimal(Decimal::new(215, 1)));
        roundtrip(WireType::ScaledTemp, Value::Decimal(Decimal::new(-123, 1)));
        roundtrip(WireType::ScaledFloat10, Value::Decimal(Decimal::new(65535, 1)));
        roundtrip(WireType::ScaledFloat100, Value::Decimal(Decimal::new(105, 2)));
        roundtrip(WireType::Date, Value::Date(jiff::civil::date(2024, 2, 29)));
        roundtrip(WireType::Time, Value::Time(jiff::civil::time(23, 59, 7, 0)));
        roundtrip(WireType::DoubleWord, Value::DoubleWord(0x0001_2345));
    }

    #[test]
    fn scaled_temperature_decodes_signed_tenths() {
        let register = register(WireType::ScaledTemp);
        assert_eq!(decode(&register, &[215]).unwrap(), Value::Decimal(Decimal::new(215, 1)));
        assert_eq!(
            decode(&register, &[(-25i16) as u16]).unwrap(),
            Value::Decimal(Decimal::new(-25, 1))
        );
    }

    #[test]
    fn scaled_encode_rounds_half_away_from_zero() {
        let register = register(WireType::ScaledTemp);
        let encode = |units, digits| encode(&register, &Value::Decimal(Decimal::new(units, digits)), 1);
        assert_eq!(encode(2155, 2).unwrap(), [216]);
        assert_eq!(encode(-2155, 2).unwrap(), [(-216i16) as u16]);
        assert_eq!(encode(21, 0).unwrap(), [210]);
        assert!(matches!(encode(4000, 0), Err(Error::OutOfRange { .. })));
        let unsigned = self::register(WireType::ScaledFloat100);
        assert!(matches!(
            super::encode(&unsigned, &Value::Decimal(Decimal::new(-1, 2)), 1),
            Err(Error::OutOfRange { .. })
        ));
    }

    #[test]
    fn packed_layouts() {
        let date = register(WireType::Date);
        assert_eq!(
            encode(&date, &Value::Date(jiff::civil::date(2024, 5, 17)), 1).unwrap(),
            [0x0518, 17]
        );
        let time = register(WireType::Time);
        assert_eq!(
            encode(&time, &Value::Time(jiff::civil::time(13, 45, 30, 0)), 1).unwrap(),
            [0x2D0D, 30]
        );
        let dword = register(WireType::DoubleWord);
        assert_eq!(decode(&dword, &[0x5678, 0x1234]).unwrap(), Value::DoubleWord(0x1234_5678));
        assert!(matches!(
            encode(&date, &Value::Date(jiff::civil::date(1999, 1, 1)), 1),
            Err(Error::OutOfRange { .. })
        ));
        assert!(matches!(decode(&date, &[0x0D18, 1]), Err(Error::InvalidCivil(..))));
    }

    #[test]
    fn boolean_true_word_is_configurable() {
        let register = register(WireType::Bool);
        assert_eq!(encode(&register, &Value::Bool(true), 1).unwrap(), [1]);
        assert_eq!(encode(&register, &Value::Bool(true), 7).unwrap(), [7]);
        assert_eq!(decode(&register, &[255]).unwrap(), Value::Bool(true));
    }

    #[test]
    fn word_count_is_checked() {
        let err = decode(&register(WireType::Date), &[1]).unwrap_err();
        assert!(matches!(err, Error::WordCount { expected: 2, got: 1 }));
        let err = decode(&STATUS_MASK, &[]).unwrap_err();
        assert!(matches!(err, Error::WordCount { expected: 1, got: 0 }));
    }

    #[test]
    fn kind_check_matches_wire_type() {
        let schedule = Value::Schedule(Schedule::from_bits(0));
        assert!(check_kind(&register(WireType::WeeklySchedule), &schedule).is_ok());
        assert!(check_kind(&register(WireType::Mask), &Value::Flags(Flags::new())).is_ok());
        assert!(check_kind(&register(WireType::ScaledFloat100), &Value::Decimal(3.into())).is_ok());
        assert!(matches!(
            check_kind(&register(WireType::Mask), &schedule),
            Err(Error::WrongKind { wire_type: WireType::Mask, kind: "schedule" })
        ));
    }

    #[test]
    fn wrong_kind_is_rejected() {
        let err = encode(&register(WireType::ScaledTemp), &Value::Word(215), 1).unwrap_err();
        assert!(matches!(err, Error::WrongKind { wire_type: WireType::ScaledTemp, kind: "word" }));
    }

    #[test]
    fn mask_exposes_named_bits_only() {
        let Value::Flags(flags) = decode(&STATUS_MASK, &[0b1111_1111_1110_0101]).unwrap() else {
            panic!("mask should decode into flags");
        };
        assert_eq!(
            flags.iter().collect::<Vec<_>>(),
            [("FanON", true), ("CirculationPumpON", true), ("HeatPumpON", true)]
        );
    }

    #[test]
    fn mask_merge_preserves_other_bits() {
        let current = 0b1111_0000_1010_0010;
        let change = Value::Flags(Flags::new().with("FanON", true).with("HeatPumpON", false));
        assert_eq!(merge(&STATUS_MASK, &change, &[current]).unwrap(), [0b1111_0000_1000_0011]);

        let change = Value::Flags(Flags::new().with("CirculationPumpON", true));
        assert_eq!(merge(&STATUS_MASK, &change, &[current]).unwrap(), [current | 0b100]);
    }

    #[test]
    fn mask_merge_rejects_unknown_flags() {
        let change = Value::Flags(Flags::new().with("CompressorON", true));
        assert!(matches!(
            merge(&STATUS_MASK, &change, &[0]),
            Err(Error::UnknownFlag(name)) if name == "CompressorON"
        ));
    }

    #[test]
    fn schedule_merge_preserves_reserved_bits() {
        let register = register(WireType::WeeklySchedule);
        let current = [0x0000, 0xAB00, 0xDEAD, 0xBEEF];
        let schedule: Schedule = "111100000000000011111111".parse().unwrap();
        let words = merge(&register, &Value::Schedule(schedule), &current).unwrap();
        assert_eq!(words, [0x000F, 0xABFF, 0xDEAD, 0xBEEF]);
        assert_eq!(decode(&register, &words).unwrap(), Value::Schedule(schedule));

        let cleared = merge(&register, &Value::Schedule(Schedule::default()), &words).unwrap();
        assert_eq!(cleared, [0x0000, 0xAB00, 0xDEAD, 0xBEEF]);
    }

    #[test]
    fn partial_types_need_current_words() {
        let register = register(WireType::WeeklySchedule);
        let value = Value::Schedule(Schedule::default());
        assert!(matches!(
            encode(&register, &value, 1),
            Err(Error::RequiresCurrentValue(WireType::WeeklySchedule))
        ));
        assert!(matches!(
            merge(&register, &value, &[0, 0]),
            Err(Error::WordCount { expected: 4, got: 2 })
        ));
        assert!(matches!(
            merge(&self::register(WireType::Word), &Value::Word(1), &[0]),
            Err(Error::NotPartial(WireType::Word))
        ));
    }
}
