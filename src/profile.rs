use std::collections::{BTreeMap, HashMap};
use std::ops::RangeBounds;

use crate::registers::{CatalogError, Register, RegisterName};

/// How a register is referred to by callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegisterKey<'a> {
    Name(&'a str),
    Address(u16),
}

impl<'a> RegisterKey<'a> {
    /// Interpret user input: plain numbers are addresses, anything else is a name.
    pub fn parse(s: &'a str) -> Self {
        match s.parse() {
            Ok(address) => Self::Address(address),
            Err(_) => Self::Name(s),
        }
    }
}

impl<'a> From<&'a str> for RegisterKey<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl From<u16> for RegisterKey<'_> {
    fn from(address: u16) -> Self {
        Self::Address(address)
    }
}

impl std::fmt::Display for RegisterKey<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Address(address) => write!(f, "{address}"),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("register `{0}` is not known for this device")]
    UnknownRegister(String),
    #[error("there is no register at address {0}")]
    RegisterOutOfRange(u16),
    #[error("`{0}` is not a switch of this device")]
    UnknownSwitch(String),
}

/// A register with hardware-confirmed raw values for turning a function on and off.
///
/// These values are written as-is and bypass the boolean encoding of the register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Switch {
    pub name: &'static str,
    pub register: &'static str,
    pub on: u16,
    pub off: u16,
}

/// Static description of a device variant, see [`crate::devices`].
#[derive(Debug)]
pub struct Definition {
    pub name: &'static str,
    pub max_address: u16,
    /// Largest number of words the device returns in one read request.
    pub max_register_count: u16,
    /// Registers at this address and above configure the device.
    pub config_start: u16,
    /// Word written for a boolean `true`.
    pub true_word: u16,
    pub registers: &'static [Register],
    pub switches: &'static [Switch],
}

/// One read request of a bulk read and the registers it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRequest {
    pub address: u16,
    pub count: u16,
    pub registers: Vec<&'static Register>,
}

impl ReadRequest {
    /// Words of `register` within the response to this request.
    pub fn slice<'w>(&self, register: &Register, response: &'w [u16]) -> Option<&'w [u16]> {
        let offset = usize::from(register.address.checked_sub(self.address)?);
        response.get(offset..offset + usize::from(register.words()))
    }
}

/// A validated register catalog of one device variant.
#[derive(Debug)]
pub struct DeviceProfile {
    definition: &'static Definition,
    by_address: BTreeMap<u16, &'static Register>,
    by_name: HashMap<&'static str, u16>,
}

impl DeviceProfile {
    pub fn new(definition: &'static Definition) -> Result<Self, CatalogError> {
        let mut by_address = BTreeMap::new();
        let mut by_name = HashMap::new();
        for register in definition.registers {
            let address = register.address;
            if address % 2 != 0 {
                return Err(CatalogError::OddAddress(address));
            }
            if address > definition.max_address {
                return Err(CatalogError::AboveMaxAddress {
                    address,
                    max_address: definition.max_address,
                });
            }
            if register.words() > definition.max_register_count {
                return Err(CatalogError::TooWide {
                    address,
                    words: register.words(),
                    max_count: definition.max_register_count,
                });
            }
            if let RegisterName::Bitfield(flags) = register.name {
                if flags.len() > 16 {
                    return Err(CatalogError::TooManyFlags(address));
                }
            }
            if by_address.insert(address, register).is_some() {
                return Err(CatalogError::DuplicateAddress(address));
            }
            for name in register.name.names() {
                if by_name.insert(name, address).is_some() {
                    return Err(CatalogError::DuplicateName(name));
                }
            }
        }
        let mut registers = by_address.values();
        if let Some(mut previous) = registers.next() {
            for register in registers {
                if previous.span().end > register.address {
                    return Err(CatalogError::Overlap {
                        first: previous.address,
                        second: register.address,
                    });
                }
                previous = register;
            }
        }
        for switch in definition.switches {
            let target = by_name.get(switch.register).and_then(|a| by_address.get(a));
            if !matches!(target, Some(r) if matches!(r.name, RegisterName::Scalar(_))) {
                return Err(CatalogError::BadSwitch(switch.name, switch.register));
            }
        }
        Ok(Self { definition, by_address, by_name })
    }

    pub fn name(&self) -> &'static str {
        self.definition.name
    }

    pub fn max_address(&self) -> u16 {
        self.definition.max_address
    }

    pub fn max_register_count(&self) -> u16 {
        self.definition.max_register_count
    }

    pub fn config_start(&self) -> u16 {
        self.definition.config_start
    }

    pub fn true_word(&self) -> u16 {
        self.definition.true_word
    }

    pub fn is_config(&self, address: u16) -> bool {
        address >= self.definition.config_start
    }

    /// All registers, in address order.
    pub fn registers(&self) -> impl Iterator<Item = &'static Register> + '_ {
        self.by_address.values().copied()
    }

    pub fn switches(&self) -> &'static [Switch] {
        self.definition.switches
    }

    pub fn resolve<'a>(&self, key: impl Into<RegisterKey<'a>>) -> Result<&'static Register, Error> {
        match key.into() {
            RegisterKey::Name(name) => self
                .by_name
                .get(name)
                .and_then(|address| self.by_address.get(address))
                .copied()
                .ok_or_else(|| Error::UnknownRegister(name.to_string())),
            RegisterKey::Address(address) => {
                if address > self.definition.max_address {
                    return Err(Error::RegisterOutOfRange(address));
                }
                self.by_address.get(&address).copied().ok_or(Error::RegisterOutOfRange(address))
            }
        }
    }

    pub fn switch(&self, name: &str) -> Result<&'static Switch, Error> {
        self.definition
            .switches
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| Error::UnknownSwitch(name.to_string()))
    }

    /// Split a bulk read of all the registers starting within `range` into requests of at most
    /// [`max_register_count`](Self::max_register_count) words each.
    ///
    /// Every register is read by exactly one request. Gaps between registers are read along with
    /// them.
    pub fn read_plan(&self, range: impl RangeBounds<u16>) -> Vec<ReadRequest> {
        let max_count = self.definition.max_register_count;
        let mut plan: Vec<ReadRequest> = Vec::new();
        for register in self.by_address.range(range).map(|(_, r)| *r) {
            let end = register.span().end;
            match plan.last_mut() {
                Some(request) if end - request.address <= max_count => {
                    request.count = end - request.address;
                    request.registers.push(register);
                }
                _ => plan.push(ReadRequest {
                    address: register.address,
                    count: register.words(),
                    registers: vec![register],
                }),
            }
        }
        plan
    }
}
