use std::ops::RangeBounds;

use tracing::{debug, trace};

use crate::codec;
use crate::devices::{HEAT_PUMP, NIGHT_COOLING};
use crate::profile::{self, DeviceProfile, RegisterKey};
use crate::registers::Register;
use crate::transport::Transport;
use crate::value::Value;

#[derive(thiserror::Error, Debug)]
pub enum Error<E: std::error::Error + 'static> {
    #[error(transparent)]
    Lookup(#[from] profile::Error),
    #[error("register {0} cannot be written")]
    NotWritable(&'static Register),
    #[error("could not convert the contents of register {1}")]
    Codec(#[source] codec::Error, &'static Register),
    #[error("register transaction failed")]
    Transport(#[source] E),
}

/// Reads and writes the registers of one device over a [`Transport`].
///
/// Every operation is a blocking round trip through the transport. Nothing is cached or retried.
pub struct Device<T> {
    profile: &'static DeviceProfile,
    transport: T,
}

impl<T: Transport> Device<T> {
    pub fn new(profile: &'static DeviceProfile, transport: T) -> Self {
        Self { profile, transport }
    }

    pub fn profile(&self) -> &'static DeviceProfile {
        self.profile
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    pub fn read_raw<'a>(
        &mut self,
        key: impl Into<RegisterKey<'a>>,
    ) -> Result<Vec<u16>, Error<T::Error>> {
        let register = self.profile.resolve(key)?;
        self.fetch(register)
    }

    pub fn read<'a>(&mut self, key: impl Into<RegisterKey<'a>>) -> Result<Value, Error<T::Error>> {
        let register = self.profile.resolve(key)?;
        let words = self.fetch(register)?;
        let value = codec::decode(register, &words).map_err(|e| Error::Codec(e, register))?;
        debug!(message = "read register", %register, %value);
        Ok(value)
    }

    /// Write `value` into a configuration register.
    ///
    /// Masks and weekly programs are first read back from the device and only the bits described
    /// by `value` are changed.
    pub fn write<'a>(
        &mut self,
        key: impl Into<RegisterKey<'a>>,
        value: &Value,
    ) -> Result<(), Error<T::Error>> {
        let register = self.writable(key)?;
        codec::check_kind(register, value).map_err(|e| Error::Codec(e, register))?;
        let words = if register.wire_type.is_partial() {
            let current = self.fetch(register)?;
            trace!(message = "merging into current contents", %register, ?current);
            codec::merge(register, value, &current)
        } else {
            codec::encode(register, value, self.profile.true_word())
        }
        .map_err(|e| Error::Codec(e, register))?;
        debug!(message = "writing register", %register, %value);
        self.send(register, &words)
    }

    /// Turn one of the profile's [switches](profile::Switch) on or off.
    pub fn set_switch(&mut self, name: &str, on: bool) -> Result<(), Error<T::Error>> {
        let switch = self.profile.switch(name)?;
        let register = self.writable(switch.register)?;
        let word = if on { switch.on } else { switch.off };
        debug!(message = "setting switch", switch = switch.name, on, word);
        self.send(register, &[word])
    }

    /// Enable the PCWU heat pump.
    pub fn enable(&mut self) -> Result<(), Error<T::Error>> {
        self.set_switch(HEAT_PUMP, true)
    }

    /// Disable the PCWU heat pump.
    pub fn disable(&mut self) -> Result<(), Error<T::Error>> {
        self.set_switch(HEAT_PUMP, false)
    }

    pub fn enable_night_cooling(&mut self) -> Result<(), Error<T::Error>> {
        self.set_switch(NIGHT_COOLING, true)
    }

    pub fn disable_night_cooling(&mut self) -> Result<(), Error<T::Error>> {
        self.set_switch(NIGHT_COOLING, false)
    }

    /// Read and decode every register starting within `range`, using as few requests as the
    /// device allows.
    pub fn read_all(
        &mut self,
        range: impl RangeBounds<u16>,
    ) -> Result<Vec<(&'static Register, Value)>, Error<T::Error>> {
        let mut values = Vec::new();
        for request in self.profile.read_plan(range) {
            trace!(message = "bulk read", address = request.address, count = request.count);
            let response = self
                .transport
                .read_registers(request.address, request.count)
                .map_err(Error::Transport)?;
            for register in request.registers.iter().copied() {
                let words = request.slice(register, &response).ok_or_else(|| {
                    let got = response
                        .len()
                        .saturating_sub(usize::from(register.address - request.address));
                    Error::Codec(codec::Error::WordCount { expected: register.words(), got }, register)
                })?;
                let value = codec::decode(register, words).map_err(|e| Error::Codec(e, register))?;
                values.push((register, value));
            }
        }
        Ok(values)
    }

    pub fn read_status(&mut self) -> Result<Vec<(&'static Register, Value)>, Error<T::Error>> {
        self.read_all(..self.profile.config_start())
    }

    pub fn read_config(&mut self) -> Result<Vec<(&'static Register, Value)>, Error<T::Error>> {
        self.read_all(self.profile.config_start()..)
    }

    fn writable<'a>(
        &self,
        key: impl Into<RegisterKey<'a>>,
    ) -> Result<&'static Register, Error<T::Error>> {
        let register = self.profile.resolve(key)?;
        if !register.mode.is_writable() {
            return Err(Error::NotWritable(register));
        }
        Ok(register)
    }

    fn fetch(&mut self, register: &'static Register) -> Result<Vec<u16>, Error<T::Error>> {
        trace!(message = "reading register", %register, count = register.words());
        let words = self
            .transport
            .read_registers(register.address, register.words())
            .map_err(Error::Transport)?;
        if words.len() != usize::from(register.words()) {
            let error = codec::Error::WordCount { expected: register.words(), got: words.len() };
            return Err(Error::Codec(error, register));
        }
        Ok(words)
    }

    fn send(&mut self, register: &'static Register, words: &[u16]) -> Result<(), Error<T::Error>> {
        trace!(message = "sending", %register, ?words);
        self.transport.write_registers(register.address, words).map_err(Error::Transport)
    }
}
