//! Error types for ebcli.

use std::io;
use std::path::PathBuf;

/// Errors produced by the ebcli crates.
///
/// Everything except [`EbError::Transport`] and [`EbError::Io`] is recoverable:
/// the command that raised it is skipped and the session is left unchanged.
#[derive(Debug, thiserror::Error)]
pub enum EbError {
    #[error("{0}")]
    Usage(String),

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("{0} requires csr")]
    MissingMap(String),

    #[error("register '{name}' not found in csr map")]
    UnknownRegister {
        name: String,
        /// Every register name in the loaded map, sorted.
        available: Vec<String>,
    },

    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("{0}")]
    Syntax(String),

    #[error("invalid value: {0}")]
    Value(String),

    #[error("register '{0}' is read only")]
    ReadOnly(String),

    #[error("csr format error: {0}")]
    CsrFormat(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl EbError {
    /// Whether this error must end the current run instead of being reported.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EbError::Transport(_) | EbError::Io(_))
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, EbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_error_display_is_bare() {
        let e = EbError::Usage("Usage: read <addr>".into());
        assert_eq!(format!("{e}"), "Usage: read <addr>");
    }

    #[test]
    fn unknown_command_display() {
        let e = EbError::UnknownCommand("peek".into());
        assert_eq!(format!("{e}"), "unknown command: peek");
    }

    #[test]
    fn missing_map_display() {
        let e = EbError::MissingMap("register name 'ctrl_reset'".into());
        assert_eq!(format!("{e}"), "register name 'ctrl_reset' requires csr");
    }

    #[test]
    fn unknown_register_keeps_available_names() {
        let e = EbError::UnknownRegister {
            name: "bogus".into(),
            available: vec!["a".into(), "b".into()],
        };
        assert_eq!(format!("{e}"), "register 'bogus' not found in csr map");
        match e {
            EbError::UnknownRegister { available, .. } => assert_eq!(available, ["a", "b"]),
            _ => panic!("expected UnknownRegister"),
        }
    }

    #[test]
    fn file_not_found_display() {
        let e = EbError::FileNotFound(PathBuf::from("/tmp/nope.csv"));
        assert_eq!(format!("{e}"), "file not found: /tmp/nope.csv");
    }

    #[test]
    fn transport_error_display() {
        let e = EbError::Transport("timed out".into());
        assert_eq!(format!("{e}"), "transport error: timed out");
    }

    #[test]
    fn io_error_from_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let e: EbError = io_err.into();
        let msg = format!("{e}");
        assert!(msg.contains("I/O error"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn toml_error_from_conversion() {
        let toml_err = toml::from_str::<toml::Value>("this is [[[not valid toml").unwrap_err();
        let e: EbError = toml_err.into();
        assert!(format!("{e}").contains("TOML parse error"));
    }

    #[test]
    fn only_transport_and_io_are_fatal() {
        assert!(EbError::Transport("x".into()).is_fatal());
        assert!(EbError::Io(io::Error::other("x")).is_fatal());
        assert!(!EbError::Usage("x".into()).is_fatal());
        assert!(!EbError::Syntax("x".into()).is_fatal());
        assert!(!EbError::FileNotFound(PathBuf::new()).is_fatal());
        assert!(!EbError::ReadOnly("x".into()).is_fatal());
    }

    #[test]
    fn result_alias_err() {
        let r: Result<i32> = Err(EbError::Value("oops".into()));
        assert!(r.is_err());
    }
}
