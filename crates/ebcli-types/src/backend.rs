//! Transport traits.
//!
//! The command engine only talks to the device through these traits. The
//! Etherbone/UDP implementation and the in-memory test double live in
//! `ebcli-net`.

use crate::error::Result;
use crate::target::Target;

/// Word-level register access on a 32-bit bus.
pub trait RegisterBus {
    /// Read the 32-bit word at byte address `addr`.
    fn read(&mut self, addr: u32) -> Result<u32>;

    /// Write a 32-bit word at byte address `addr`.
    fn write(&mut self, addr: u32, value: u32) -> Result<()>;

    /// Read `count` consecutive words starting at `addr`.
    fn read_burst(&mut self, addr: u32, count: usize) -> Result<Vec<u32>> {
        (0..count)
            .map(|i| self.read(word_address(addr, i)))
            .collect()
    }
}

/// A connection to a device that must be opened before use.
pub trait RegisterTransport: RegisterBus {
    fn open(&mut self) -> Result<()>;

    /// Release the connection. Closing twice is not an error.
    fn close(&mut self) -> Result<()>;

    fn is_open(&self) -> bool;
}

/// Builds (unopened) transports bound to a target.
pub trait TransportConnector {
    fn connect(&self, target: &Target) -> Result<Box<dyn RegisterTransport>>;
}

/// Byte address of word `index` in a run of bus words starting at `base`.
pub fn word_address(base: u32, index: usize) -> u32 {
    base.wrapping_add((index as u32).wrapping_mul(4))
}
