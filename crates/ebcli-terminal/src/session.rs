//! The device session: one transport plus an optional register map.
//!
//! Loading a new map rebuilds the transport from scratch. The transport and
//! map are only ever replaced together, after the new transport is open.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use ebcli_net::load_csr;
use ebcli_types::backend::{RegisterTransport, TransportConnector};
use ebcli_types::error::{EbError, Result};
use ebcli_types::regmap::{RegisterDescriptor, RegisterMap};
use ebcli_types::target::Target;

use crate::resolve::{ResolvedAddress, resolve};

/// Session handle shared by the router and the completion provider.
pub type SharedSession = Rc<RefCell<Session>>;

pub struct Session {
    transport: Box<dyn RegisterTransport>,
    map: Option<RegisterMap>,
    csr_path: Option<PathBuf>,
    target: Target,
    connector: Box<dyn TransportConnector>,
    verbose: bool,
}

impl Session {
    /// Load the optional map, then connect and open a transport.
    pub fn open(
        connector: Box<dyn TransportConnector>,
        target: Target,
        csr: Option<&Path>,
        verbose: bool,
    ) -> Result<Self> {
        let map = csr.map(load_csr).transpose()?;
        let mut transport = connector.connect(&target)?;
        transport.open()?;
        Ok(Self {
            transport,
            map,
            csr_path: csr.map(Path::to_path_buf),
            target,
            connector,
            verbose,
        })
    }

    /// Wrap in the shared handle used by the router and completion.
    pub fn into_shared(self) -> SharedSession {
        Rc::new(RefCell::new(self))
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn map(&self) -> Option<&RegisterMap> {
        self.map.as_ref()
    }

    /// Source file of the loaded map.
    pub fn csr_path(&self) -> Option<&Path> {
        self.csr_path.as_deref()
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_open()
    }

    /// Resolve an address token against the current map.
    pub fn resolve(&self, token: &str) -> Result<ResolvedAddress> {
        resolve(token, self.map.as_ref())
    }

    /// Read through the descriptor when bound, else a raw bus read.
    pub fn read(&mut self, resolved: &ResolvedAddress) -> Result<u64> {
        match &resolved.descriptor {
            Some(reg) => reg.read(self.transport.as_mut()),
            None => self.transport.read(resolved.address).map(u64::from),
        }
    }

    /// Write through the descriptor when bound, else a raw 32-bit write.
    pub fn write(&mut self, resolved: &ResolvedAddress, value: u64) -> Result<()> {
        match &resolved.descriptor {
            Some(reg) => reg.write(self.transport.as_mut(), value),
            None => {
                let word = u32::try_from(value).map_err(|_| {
                    EbError::Value(format!("0x{value:x} does not fit in a 32-bit word"))
                })?;
                self.transport.write(resolved.address, word)
            },
        }
    }

    pub fn read_register(&mut self, reg: &RegisterDescriptor) -> Result<u64> {
        reg.read(self.transport.as_mut())
    }

    /// Registers accepted by `filter`, ordered by address.
    pub fn registers_matching(&self, filter: impl Fn(&str) -> bool) -> Vec<RegisterDescriptor> {
        self.map
            .as_ref()
            .map(|map| {
                map.sorted_by_address()
                    .into_iter()
                    .filter(|r| filter(&r.name))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Replace the map and rebuild the transport against the same target.
    ///
    /// Map errors leave the session untouched. Once the old transport is
    /// closed, failing to open the new one is fatal: the session keeps the
    /// old map and reports `is_open() == false`, and the router that saw
    /// the error stops accepting lines.
    pub fn reload_map(&mut self, path: &Path) -> Result<usize> {
        if !path.is_file() {
            return Err(EbError::FileNotFound(path.to_path_buf()));
        }
        let map = load_csr(path)?;
        let mut transport = self.connector.connect(&self.target)?;

        self.transport.close()?;
        transport.open().map_err(|e| match e {
            EbError::Transport(msg) => EbError::Transport(format!(
                "reopening {} after csr load failed: {msg}",
                self.target
            )),
            other => other,
        })?;

        let count = map.len();
        self.transport = transport;
        self.map = Some(map);
        self.csr_path = Some(path.to_path_buf());
        log::info!("session now uses {} ({count} registers)", path.display());
        Ok(count)
    }

    pub fn close(&mut self) -> Result<()> {
        self.transport.close()
    }
}
