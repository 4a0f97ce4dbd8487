//! Remote device address (`host[:port]`).

use std::fmt;
use std::str::FromStr;

use crate::error::{EbError, Result};

/// Etherbone UDP port used when the target omits one.
pub const DEFAULT_PORT: u16 = 1234;

/// Host and UDP port of the device serving register access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
}

impl Target {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl FromStr for Target {
    type Err = EbError;

    /// Parse `host[:port]`. Only the last `:` separates the port.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (host, port) = match s.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| EbError::Config(format!("invalid port in target '{s}'")))?;
                (host, port)
            },
            None => (s, DEFAULT_PORT),
        };
        if host.is_empty() {
            return Err(EbError::Config(format!("missing host in target '{s}'")));
        }
        Ok(Self::new(host, port))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_and_port() {
        let t: Target = "192.168.1.50:1234".parse().unwrap();
        assert_eq!(t, Target::new("192.168.1.50", 1234));
    }

    #[test]
    fn host_only_uses_default_port() {
        let t: Target = "fpga.local".parse().unwrap();
        assert_eq!(t.host, "fpga.local");
        assert_eq!(t.port, DEFAULT_PORT);
    }

    #[test]
    fn custom_port() {
        let t: Target = "10.0.0.2:5000".parse().unwrap();
        assert_eq!(t.port, 5000);
    }

    #[test]
    fn bad_port_is_config_error() {
        let err = "10.0.0.2:http".parse::<Target>().unwrap_err();
        assert!(matches!(err, EbError::Config(_)));
    }

    #[test]
    fn empty_host_rejected() {
        assert!(":1234".parse::<Target>().is_err());
        assert!("".parse::<Target>().is_err());
    }

    #[test]
    fn display_round_trips() {
        let t = Target::new("board", 99);
        assert_eq!(t.to_string(), "board:99");
    }
}
