use std::collections::BTreeMap;

/// Moves raw register words to and from a device.
///
/// Framing, checksums and pacing of the serial link are entirely up to the implementation. A
/// transport is used by one [`Device`](crate::device::Device) at a time, so only one transaction
/// is ever in flight on it.
pub trait Transport {
    type Error: std::error::Error + 'static;

    /// Read `count` consecutive words starting at `address`.
    fn read_registers(&mut self, address: u16, count: u16) -> Result<Vec<u16>, Self::Error>;

    /// Write `words` into consecutive registers starting at `address`.
    fn write_registers(&mut self, address: u16, words: &[u16]) -> Result<(), Self::Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Error = T::Error;

    fn read_registers(&mut self, address: u16, count: u16) -> Result<Vec<u16>, Self::Error> {
        (**self).read_registers(address, count)
    }

    fn write_registers(&mut self, address: u16, words: &[u16]) -> Result<(), Self::Error> {
        (**self).write_registers(address, words)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transaction {
    Read { address: u16, count: u16 },
    Write { address: u16, words: Vec<u16> },
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("{count} words at address {address} do not fit into the {size} word register file")]
    OutOfBounds { address: u16, count: usize, size: u16 },
}

/// An in-memory image of a device's registers.
///
/// Words never set read as zero. Every transaction is recorded, which makes this useful to see
/// what exactly an operation would send to a device.
#[derive(Clone, Debug)]
pub struct RegisterFile {
    size: u16,
    words: BTreeMap<u16, u16>,
    transactions: Vec<Transaction>,
}

impl RegisterFile {
    /// A register file holding addresses `0..size`.
    pub fn new(size: u16) -> Self {
        Self { size, words: BTreeMap::new(), transactions: Vec::new() }
    }

    pub fn with_words(mut self, address: u16, words: &[u16]) -> Self {
        self.set(address, words);
        self
    }

    /// Store `words` from `address` on. Words past the end of the address space are dropped.
    pub fn set(&mut self, address: u16, words: &[u16]) {
        for (address, word) in (address..=u16::MAX).zip(words) {
            self.words.insert(address, *word);
        }
    }

    pub fn get(&self, address: u16) -> u16 {
        self.words.get(&address).copied().unwrap_or(0)
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Recorded writes, oldest first.
    pub fn writes(&self) -> impl Iterator<Item = (u16, &[u16])> + '_ {
        self.transactions.iter().filter_map(|t| match t {
            Transaction::Write { address, words } => Some((*address, &words[..])),
            Transaction::Read { .. } => None,
        })
    }

    pub fn clear_transactions(&mut self) {
        self.transactions.clear();
    }

    fn check(&self, address: u16, count: usize) -> Result<(), Error> {
        if usize::from(address) + count > usize::from(self.size) {
            return Err(Error::OutOfBounds { address, count, size: self.size });
        }
        Ok(())
    }
}

impl Transport for RegisterFile {
    type Error = Error;

    fn read_registers(&mut self, address: u16, count: u16) -> Result<Vec<u16>, Self::Error> {
        self.transactions.push(Transaction::Read { address, count });
        self.check(address, usize::from(count))?;
        Ok((address..address + count).map(|a| self.get(a)).collect())
    }

    fn write_registers(&mut self, address: u16, words: &[u16]) -> Result<(), Self::Error> {
        self.transactions.push(Transaction::Write { address, words: words.to_vec() });
        self.check(address, words.len())?;
        self.set(address, words);
        Ok(())
    }
}
