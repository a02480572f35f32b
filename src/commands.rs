pub mod registers {
    use crate::devices::Variant;
    use crate::output::{self, Record};
    use crate::registers::{Mode, Register, WireType};

    /// Search and output the register catalog of a device.
    #[derive(clap::Parser)]
    pub struct Args {
        #[arg(long, short = 'd', value_enum)]
        device: Variant,
        /// Only show registers whose address, name or flag names contain this text.
        filter: Option<String>,
        #[clap(flatten)]
        output: output::Args,
    }

    #[derive(thiserror::Error, Debug)]
    pub enum Error {
        #[error("could not set up the output")]
        Output(#[from] output::Error),
    }

    #[derive(serde::Serialize)]
    pub struct RegisterSchema {
        pub address: u16,
        pub name: Option<&'static str>,
        pub flags: Vec<Option<&'static str>>,
        pub mode: Mode,
        pub r#type: WireType,
        pub words: u16,
        pub config: bool,
    }

    impl RegisterSchema {
        pub fn new(register: &Register, config: bool) -> Self {
            use crate::registers::RegisterName;
            let (name, flags) = match register.name {
                RegisterName::Scalar(name) => (Some(name), Vec::new()),
                RegisterName::Bitfield(flags) => (None, flags.to_vec()),
            };
            Self {
                address: register.address,
                name,
                flags,
                mode: register.mode,
                r#type: register.wire_type,
                words: register.words(),
                config,
            }
        }

        pub fn is_match(&self, pattern: &str) -> bool {
            let pattern = pattern.to_lowercase();
            self.address.to_string().contains(&pattern)
                || self
                    .name
                    .into_iter()
                    .chain(self.flags.iter().filter_map(|f| *f))
                    .any(|n| n.to_lowercase().contains(&pattern))
        }
    }

    impl Record for RegisterSchema {
        const HEADERS: &'static [&'static str] =
            &["Address", "Name", "Mode", "Type", "Words", "Space"];

        fn cells(&self) -> Vec<String> {
            let name = match self.name {
                Some(name) => name.to_string(),
                None => self
                    .flags
                    .iter()
                    .enumerate()
                    .filter_map(|(bit, f)| Some(format!("{bit}:{}", (*f)?)))
                    .collect::<Vec<_>>()
                    .join(" "),
            };
            vec![
                self.address.to_string(),
                name,
                self.mode.to_string(),
                self.r#type.to_string(),
                self.words.to_string(),
                if self.config { "config" } else { "status" }.to_string(),
            ]
        }
    }

    pub fn run(args: Args) -> Result<(), Error> {
        let profile = args.device.profile();
        let mut output = args.output.to_output()?;
        for register in profile.registers() {
            let schema = RegisterSchema::new(register, profile.is_config(register.address));
            if let Some(pattern) = &args.filter {
                if !schema.is_match(pattern) {
                    continue;
                }
            }
            output.record(&schema)?;
        }
        output.commit()?;
        Ok(())
    }
}

pub mod decode {
    use crate::codec;
    use crate::devices::Variant;
    use crate::output::{self, Record};
    use crate::profile::{self, RegisterKey};
    use crate::registers::Register;
    use crate::value::Value;

    /// Decode raw register words, e.g. from a bus capture.
    #[derive(clap::Parser)]
    pub struct Args {
        #[arg(long, short = 'd', value_enum)]
        device: Variant,
        /// Register name, flag name or address.
        register: String,
        /// Register words, in order of increasing address.
        #[arg(required = true, value_parser = super::parse_word)]
        words: Vec<u16>,
        #[clap(flatten)]
        output: output::Args,
    }

    #[derive(thiserror::Error, Debug)]
    pub enum Error {
        #[error("could not find the register")]
        Lookup(#[from] profile::Error),
        #[error("could not decode register {1}")]
        Decode(#[source] codec::Error, &'static Register),
        #[error("could not output the value")]
        Output(#[from] output::Error),
    }

    #[derive(serde::Serialize)]
    pub struct Decoded {
        pub address: u16,
        pub register: String,
        pub value: Value,
    }

    impl Record for Decoded {
        const HEADERS: &'static [&'static str] = &["Address", "Register", "Value"];
        fn cells(&self) -> Vec<String> {
            vec![self.address.to_string(), self.register.clone(), self.value.to_string()]
        }
    }

    pub fn run(args: Args) -> Result<(), Error> {
        let profile = args.device.profile();
        let register = profile.resolve(RegisterKey::parse(&args.register))?;
        let value = codec::decode(register, &args.words).map_err(|e| Error::Decode(e, register))?;
        let mut output = args.output.to_output()?;
        output.record(&Decoded {
            address: register.address,
            register: register.name.to_string(),
            value,
        })?;
        output.commit()?;
        Ok(())
    }
}

pub mod encode {
    use crate::codec;
    use crate::devices::Variant;
    use crate::output::{self, Record};
    use crate::profile::{self, RegisterKey};
    use crate::registers::Register;
    use crate::value::{self, Value};

    /// Compute the words a write of a value would send to the device.
    #[derive(clap::Parser)]
    pub struct Args {
        #[arg(long, short = 'd', value_enum)]
        device: Variant,
        /// Register name, flag name or address.
        register: String,
        /// The value, e.g. `21.5`, `on`, `2024-05-01`, `12:30`, `FanON=on,HeatPumpON=off` or
        /// `000000111111111111110000` for an hourly program.
        value: String,
        /// Current register words, required for masks and hourly programs.
        #[arg(long, num_args = 1.., value_parser = super::parse_word)]
        current: Vec<u16>,
        #[clap(flatten)]
        output: output::Args,
    }

    #[derive(thiserror::Error, Debug)]
    pub enum Error {
        #[error("could not find the register")]
        Lookup(#[from] profile::Error),
        #[error("register {0} is read-only")]
        NotWritable(&'static Register),
        #[error("could not parse the value")]
        Parse(#[from] value::ParseError),
        #[error("register {1} needs its current words, pass them with `--current`")]
        MissingCurrent(#[source] codec::Error, &'static Register),
        #[error("could not encode the value for register {1}")]
        Encode(#[source] codec::Error, &'static Register),
        #[error("could not output the words")]
        Output(#[from] output::Error),
    }

    #[derive(serde::Serialize)]
    pub struct Encoded {
        pub address: u16,
        pub register: String,
        pub words: Vec<u16>,
    }

    impl Record for Encoded {
        const HEADERS: &'static [&'static str] = &["Address", "Register", "Words"];
        fn cells(&self) -> Vec<String> {
            let words = self.words.iter().map(|w| format!("{w:#06x}")).collect::<Vec<_>>();
            vec![self.address.to_string(), self.register.clone(), words.join(" ")]
        }
    }

    pub fn run(args: Args) -> Result<(), Error> {
        let profile = args.device.profile();
        let register = profile.resolve(RegisterKey::parse(&args.register))?;
        if !register.mode.is_writable() {
            return Err(Error::NotWritable(register));
        }
        let value = Value::parse(register.wire_type, &args.value)?;
        let words = if register.wire_type.is_partial() {
            if args.current.is_empty() {
                let e = codec::Error::RequiresCurrentValue(register.wire_type);
                return Err(Error::MissingCurrent(e, register));
            }
            codec::merge(register, &value, &args.current)
        } else {
            codec::encode(register, &value, profile.true_word())
        }
        .map_err(|e| Error::Encode(e, register))?;
        let mut output = args.output.to_output()?;
        output.record(&Encoded {
            address: register.address,
            register: register.name.to_string(),
            words,
        })?;
        output.commit()?;
        Ok(())
    }
}

/// Accept register words in decimal or `0x`-prefixed hexadecimal.
fn parse_word(s: &str) -> Result<u16, std::num::ParseIntError> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    }
}

#[cfg(test)]
mod tests {
    use super::registers::RegisterSchema;
    use crate::devices::pcwu;
    use crate::output::Record as _;

    #[test]
    fn words_parse_in_both_radixes() {
        assert_eq!(super::parse_word("215"), Ok(215));
        assert_eq!(super::parse_word("0xFF"), Ok(255));
        assert!(super::parse_word("0xFFFFF").is_err());
    }

    #[test]
    fn schema_matches_names_flags_and_addresses() {
        let profile = pcwu();
        let mask = RegisterSchema::new(profile.resolve(196u16).unwrap(), false);
        assert!(mask.is_match("compressor"));
        assert!(mask.is_match("196"));
        assert!(!mask.is_match("T1"));
        let t1 = RegisterSchema::new(profile.resolve("T1").unwrap(), false);
        assert!(t1.is_match("t1"));
        assert_eq!(t1.cells(), ["128", "T1", "R-", "te10", "1", "status"]);
        assert_eq!(mask.cells()[1], "0:FanON 2:CirculationPumpON 5:HeatPumpON 11:CompressorON 12:HeaterEON");
    }
}
