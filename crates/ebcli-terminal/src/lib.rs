//! Command engine for the ebcli register console.
//!
//! The router is a registry-based dispatch system. Commands implement the
//! `Command` trait and are registered by name. The router tokenizes input
//! lines, resolves the command name, and dispatches `execute()` against the
//! shared device session.

pub mod codec;
mod commands;
pub mod completion;
pub mod format;
mod interpreter;
pub mod resolve;
pub mod script;
pub mod session;
pub mod style;

/// Register read/write/regs/csr into a router.
pub use commands::register_builtins;
/// Tab completion over verbs, register names and paths.
pub use completion::CompletionProvider;
/// Register display lines in terse and verbose tiers.
pub use format::RegisterFormatter;
/// A single executable command trait.
pub use interpreter::Command;
/// Output produced by a command (text or signals).
pub use interpreter::CommandOutput;
/// Router of available commands with dispatch.
pub use interpreter::CommandRouter;
/// Mutable environment passed to every command.
pub use interpreter::Environment;
/// Continue/quit signal returned per line.
pub use interpreter::Flow;
/// Router lifecycle state.
pub use interpreter::RouterState;
pub use interpreter::tokenize;
pub use session::{Session, SharedSession};
pub use style::{Style, StyleMode};
