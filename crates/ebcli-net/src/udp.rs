//! Etherbone over UDP.
//!
//! Every read is a blocking request/reply exchange; writes are fire and
//! forget, as on the device side they are never acknowledged.

use std::io;
use std::net::UdpSocket;
use std::time::Duration;

use ebcli_types::backend::{RegisterBus, RegisterTransport, TransportConnector, word_address};
use ebcli_types::error::{EbError, Result};
use ebcli_types::target::Target;

use crate::etherbone;

/// Largest datagram we expect back (one Ethernet frame).
const MAX_REPLY: usize = 1500;

/// Etherbone/UDP register transport.
pub struct UdpTransport {
    target: Target,
    timeout: Duration,
    socket: Option<UdpSocket>,
}

impl UdpTransport {
    pub fn new(target: Target, timeout: Duration) -> Self {
        Self {
            target,
            timeout,
            socket: None,
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    fn socket(&self) -> Result<&UdpSocket> {
        self.socket
            .as_ref()
            .ok_or_else(|| EbError::Transport(format!("not connected to {}", self.target)))
    }

    fn io_err(&self, what: &str, e: io::Error) -> EbError {
        match e.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => EbError::Transport(format!(
                "{what} {}: no reply within {} ms",
                self.target,
                self.timeout.as_millis()
            )),
            _ => EbError::Transport(format!("{what} {}: {e}", self.target)),
        }
    }

    fn exchange_reads(&self, addrs: &[u32]) -> Result<Vec<u32>> {
        let socket = self.socket()?;
        let request = etherbone::encode_reads(addrs)?;
        log::debug!("etherbone read {} word(s) from 0x{:08x}", addrs.len(), addrs[0]);
        socket
            .send(&request)
            .map_err(|e| self.io_err("send to", e))?;

        let mut buf = [0u8; MAX_REPLY];
        let n = socket
            .recv(&mut buf)
            .map_err(|e| self.io_err("read from", e))?;
        let datas = etherbone::decode_read_reply(&buf[..n])?;
        if datas.len() != addrs.len() {
            return Err(EbError::Transport(format!(
                "expected {} word(s) from {}, got {}",
                addrs.len(),
                self.target,
                datas.len()
            )));
        }
        Ok(datas)
    }
}

impl RegisterBus for UdpTransport {
    fn read(&mut self, addr: u32) -> Result<u32> {
        Ok(self.exchange_reads(&[addr])?[0])
    }

    fn write(&mut self, addr: u32, value: u32) -> Result<()> {
        let socket = self.socket()?;
        let request = etherbone::encode_writes(addr, &[value])?;
        log::debug!("etherbone write 0x{value:08x} to 0x{addr:08x}");
        socket
            .send(&request)
            .map_err(|e| self.io_err("send to", e))?;
        Ok(())
    }

    fn read_burst(&mut self, addr: u32, count: usize) -> Result<Vec<u32>> {
        let addrs: Vec<u32> = (0..count).map(|i| word_address(addr, i)).collect();
        let mut words = Vec::with_capacity(count);
        for chunk in addrs.chunks(etherbone::MAX_RECORD_WORDS) {
            words.extend(self.exchange_reads(chunk)?);
        }
        Ok(words)
    }
}

impl RegisterTransport for UdpTransport {
    fn open(&mut self) -> Result<()> {
        if self.socket.is_some() {
            return Ok(());
        }
        let socket =
            UdpSocket::bind(("0.0.0.0", 0)).map_err(|e| self.io_err("bind socket for", e))?;
        socket
            .connect((self.target.host.as_str(), self.target.port))
            .map_err(|e| self.io_err("connect to", e))?;
        socket
            .set_read_timeout(Some(self.timeout))
            .map_err(|e| self.io_err("configure socket for", e))?;
        log::info!("connected to {}", self.target);
        self.socket = Some(socket);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.socket.take().is_some() {
            log::info!("disconnected from {}", self.target);
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.socket.is_some()
    }
}

/// Builds [`UdpTransport`]s sharing one reply timeout.
#[derive(Debug, Clone)]
pub struct UdpConnector {
    pub timeout: Duration,
}

impl UdpConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl TransportConnector for UdpConnector {
    fn connect(&self, target: &Target) -> Result<Box<dyn RegisterTransport>> {
        Ok(Box::new(UdpTransport::new(target.clone(), self.timeout)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::thread;

    /// Minimal Etherbone device: answers reads from `regs`, stores writes.
    /// Serves `packets` datagrams, then returns the register file.
    fn spawn_device(
        mut regs: HashMap<u32, u32>,
        packets: usize,
    ) -> (u16, thread::JoinHandle<HashMap<u32, u32>>) {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = socket.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let mut buf = [0u8; MAX_REPLY];
            for _ in 0..packets {
                let (n, peer) = socket.recv_from(&mut buf).unwrap();
                let pkt = &buf[..n];
                let (wcount, rcount) = (pkt[10] as usize, pkt[11] as usize);
                let word = |i: usize| be(pkt, 12 + 4 * i);
                if wcount > 0 {
                    let base = word(0);
                    for i in 0..wcount {
                        regs.insert(word_address(base, i), word(1 + i));
                    }
                }
                if rcount > 0 {
                    let datas: Vec<u32> = (0..rcount)
                        .map(|i| regs.get(&word(1 + i)).copied().unwrap_or(0))
                        .collect();
                    let reply = etherbone::encode_writes(0, &datas).unwrap();
                    socket.send_to(&reply, peer).unwrap();
                }
            }
            regs
        });
        (port, handle)
    }

    fn be(b: &[u8], at: usize) -> u32 {
        u32::from_be_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
    }

    fn transport(port: u16) -> UdpTransport {
        UdpTransport::new(Target::new("127.0.0.1", port), Duration::from_secs(2))
    }

    #[test]
    fn read_write_round_trip() {
        let (port, device) = spawn_device(HashMap::from([(0x800, 0x1234)]), 3);
        let mut t = transport(port);
        t.open().unwrap();
        assert_eq!(t.read(0x800).unwrap(), 0x1234);
        t.write(0x1000, 0xc0a8_0132).unwrap();
        assert_eq!(t.read(0x1000).unwrap(), 0xc0a8_0132);
        t.close().unwrap();
        let regs = device.join().unwrap();
        assert_eq!(regs[&0x1000], 0xc0a8_0132);
    }

    #[test]
    fn burst_read_uses_one_packet() {
        let regs = HashMap::from([(0x20, 1), (0x24, 2)]);
        let (port, device) = spawn_device(regs, 1);
        let mut t = transport(port);
        t.open().unwrap();
        assert_eq!(t.read_burst(0x20, 2).unwrap(), vec![1, 2]);
        device.join().unwrap();
    }

    #[test]
    fn silent_device_times_out() {
        let silent = UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = silent.local_addr().unwrap().port();
        let mut t = UdpTransport::new(Target::new("127.0.0.1", port), Duration::from_millis(50));
        t.open().unwrap();
        let err = t.read(0).unwrap_err();
        assert!(err.is_fatal());
        assert!(format!("{err}").contains("no reply"));
    }

    #[test]
    fn closed_transport_errors() {
        let mut t = transport(1);
        assert!(!t.is_open());
        assert!(matches!(t.read(0), Err(EbError::Transport(_))));
        assert!(matches!(t.write(0, 0), Err(EbError::Transport(_))));
        // Closing an unopened transport is fine.
        t.close().unwrap();
    }

    #[test]
    fn connector_builds_unopened_transport() {
        let connector = UdpConnector::new(Duration::from_millis(10));
        let t = connector.connect(&Target::new("127.0.0.1", 1234)).unwrap();
        assert!(!t.is_open());
    }
}
