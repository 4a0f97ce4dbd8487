//! Named register maps.
//!
//! A [`RegisterMap`] keeps descriptors in insertion order with a name index.
//! Display code iterates [`RegisterMap::sorted_by_address`] instead.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::backend::{RegisterBus, word_address};
use crate::error::{EbError, Result};

/// Access mode declared for a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadWrite,
    ReadOnly,
    WriteOnly,
}

impl FromStr for Access {
    type Err = EbError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rw" => Ok(Access::ReadWrite),
            "ro" => Ok(Access::ReadOnly),
            "wo" => Ok(Access::WriteOnly),
            other => Err(EbError::CsrFormat(format!("unknown access mode '{other}'"))),
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Access::ReadWrite => "rw",
            Access::ReadOnly => "ro",
            Access::WriteOnly => "wo",
        })
    }
}

/// A register bound within a loaded map.
///
/// Wide registers span `size` bus words of `data_width` bits each, stored
/// most significant word first at consecutive word addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterDescriptor {
    pub name: String,
    pub address: u32,
    pub size: u32,
    pub data_width: u32,
    pub access: Access,
}

impl RegisterDescriptor {
    /// Single-word 32-bit read/write register.
    pub fn new(name: impl Into<String>, address: u32) -> Self {
        Self {
            name: name.into(),
            address,
            size: 1,
            data_width: 32,
            access: Access::ReadWrite,
        }
    }

    /// Total register width in bits.
    pub fn width_bits(&self) -> u32 {
        self.size * self.data_width
    }

    fn word_mask(&self) -> u64 {
        if self.data_width >= 32 {
            0xffff_ffff
        } else {
            (1u64 << self.data_width) - 1
        }
    }

    /// Read the full register value through `bus`.
    pub fn read<B: RegisterBus + ?Sized>(&self, bus: &mut B) -> Result<u64> {
        let mask = self.word_mask();
        let words = bus.read_burst(self.address, self.size as usize)?;
        Ok(words
            .iter()
            .fold(0u64, |acc, &w| (acc << self.data_width) | (u64::from(w) & mask)))
    }

    /// Write the full register value through `bus`.
    pub fn write<B: RegisterBus + ?Sized>(&self, bus: &mut B, value: u64) -> Result<()> {
        if self.access == Access::ReadOnly {
            return Err(EbError::ReadOnly(self.name.clone()));
        }
        let width = self.width_bits();
        if width < 64 && value >> width != 0 {
            return Err(EbError::Value(format!(
                "0x{value:x} does not fit in {width}-bit register '{}'",
                self.name
            )));
        }
        let mask = self.word_mask();
        for i in 0..self.size {
            let shift = self.data_width * (self.size - 1 - i);
            let word = ((value >> shift) & mask) as u32;
            bus.write(word_address(self.address, i as usize), word)?;
        }
        Ok(())
    }
}

/// Name-indexed, insertion-ordered collection of register descriptors.
#[derive(Debug, Clone, Default)]
pub struct RegisterMap {
    registers: Vec<RegisterDescriptor>,
    index: HashMap<String, usize>,
}

impl RegisterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a register. Names must be unique within a map.
    pub fn insert(&mut self, descriptor: RegisterDescriptor) -> Result<()> {
        if self.index.contains_key(&descriptor.name) {
            return Err(EbError::CsrFormat(format!(
                "duplicate register name '{}'",
                descriptor.name
            )));
        }
        self.index
            .insert(descriptor.name.clone(), self.registers.len());
        self.registers.push(descriptor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&RegisterDescriptor> {
        self.index.get(name).map(|&i| &self.registers[i])
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    /// Descriptors in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisterDescriptor> {
        self.registers.iter()
    }

    /// Descriptors ordered by address. Ties keep insertion order.
    pub fn sorted_by_address(&self) -> Vec<&RegisterDescriptor> {
        let mut regs: Vec<&RegisterDescriptor> = self.registers.iter().collect();
        regs.sort_by_key(|r| r.address);
        regs
    }

    /// All register names, alphabetically.
    pub fn names_sorted(&self) -> Vec<String> {
        let mut names: Vec<String> = self.index.keys().cloned().collect();
        names.sort();
        names
    }
}
