//! Networking and register-map loading for ebcli.
//!
//! Provides the Etherbone/UDP transport, the LiteX `csr.csv` loader and an
//! in-memory transport for tests.

pub mod csr;
pub mod etherbone;
mod memory;
mod udp;

pub use csr::{load_csr, parse_csr};
pub use memory::{MemoryConnector, MemoryDevice, MemoryTransport};
pub use udp::{UdpConnector, UdpTransport};
