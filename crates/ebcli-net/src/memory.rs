//! In-memory register transport.
//!
//! Useful for unit tests and dry runs. All transports built by one
//! [`MemoryConnector`] share a single register file, so values survive a
//! reconnect the way they would on real hardware.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use ebcli_types::backend::{RegisterBus, RegisterTransport, TransportConnector};
use ebcli_types::error::{EbError, Result};
use ebcli_types::target::Target;

/// Register file and bookkeeping shared by every transport of a connector.
#[derive(Debug, Default)]
pub struct MemoryDevice {
    /// Word values by byte address. Unwritten words read as zero.
    pub words: BTreeMap<u32, u32>,
    /// Every write in order, as `(addr, value)`.
    pub writes: Vec<(u32, u32)>,
    pub opens: usize,
    pub closes: usize,
    /// Targets passed to the connector, in order.
    pub connects: Vec<Target>,
    /// Make the next `open()` fail.
    pub fail_open: bool,
    /// Make every read fail.
    pub fail_reads: bool,
}

/// A transport backed by a [`MemoryDevice`].
#[derive(Debug)]
pub struct MemoryTransport {
    device: Rc<RefCell<MemoryDevice>>,
    open: bool,
}

impl MemoryTransport {
    pub fn new(device: Rc<RefCell<MemoryDevice>>) -> Self {
        Self {
            device,
            open: false,
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(EbError::Transport("memory transport is closed".into()))
        }
    }
}

impl RegisterBus for MemoryTransport {
    fn read(&mut self, addr: u32) -> Result<u32> {
        self.ensure_open()?;
        let dev = self.device.borrow();
        if dev.fail_reads {
            return Err(EbError::Transport(format!("read 0x{addr:08x} failed")));
        }
        Ok(dev.words.get(&addr).copied().unwrap_or(0))
    }

    fn write(&mut self, addr: u32, value: u32) -> Result<()> {
        self.ensure_open()?;
        let mut dev = self.device.borrow_mut();
        dev.words.insert(addr, value);
        dev.writes.push((addr, value));
        Ok(())
    }
}

impl RegisterTransport for MemoryTransport {
    fn open(&mut self) -> Result<()> {
        let mut dev = self.device.borrow_mut();
        if dev.fail_open {
            dev.fail_open = false;
            return Err(EbError::Transport("memory transport refused to open".into()));
        }
        dev.opens += 1;
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.open {
            self.open = false;
            self.device.borrow_mut().closes += 1;
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

/// Connector handing out [`MemoryTransport`]s over one shared device.
#[derive(Debug, Default, Clone)]
pub struct MemoryConnector {
    device: Rc<RefCell<MemoryDevice>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the shared device, for seeding values and inspecting writes.
    pub fn device(&self) -> Rc<RefCell<MemoryDevice>> {
        Rc::clone(&self.device)
    }
}

impl TransportConnector for MemoryConnector {
    fn connect(&self, target: &Target) -> Result<Box<dyn RegisterTransport>> {
        self.device.borrow_mut().connects.push(target.clone());
        Ok(Box::new(MemoryTransport::new(Rc::clone(&self.device))))
    }
}
