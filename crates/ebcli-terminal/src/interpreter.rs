//! Command trait, router and dispatch logic.
//!
//! Lines are tokenized with shell-style quoting, the first token picks the
//! command (case-insensitive) and the rest are passed as arguments.
//! Recoverable errors are rendered to the output and the router keeps
//! running; transport and I/O errors are returned to the caller.

use std::io::Write;

use ebcli_types::error::{EbError, Result};

use crate::format::RegisterFormatter;
use crate::session::{Session, SharedSession};
use crate::style::Style;

/// Output produced by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// Text lines to print.
    Text(String),
    /// Command produced no visible output.
    None,
    /// Signal to stop processing input.
    Quit,
}

/// Whether the caller should keep feeding lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Router lifecycle. `Terminated` is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterState {
    Running,
    Terminated,
}

/// Everything a command may touch while it runs.
pub struct Environment<'a> {
    pub session: &'a mut Session,
    pub formatter: &'a RegisterFormatter,
    pub style: &'a Style,
}

/// A single executable command.
pub trait Command {
    /// The command name (what the user types).
    fn name(&self) -> &str;

    /// One-line description for `help`.
    fn description(&self) -> &str;

    /// Usage string (e.g. "read <addr>").
    fn usage(&self) -> &str;

    /// Execute the command with the given arguments and environment.
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput>;
}

/// Verbs handled by the router itself.
const BUILTIN_VERBS: [&str; 3] = ["help", "quit", "exit"];

/// Dispatches command lines against the shared session.
pub struct CommandRouter {
    commands: Vec<Box<dyn Command>>,
    session: SharedSession,
    formatter: RegisterFormatter,
    style: Style,
    state: RouterState,
}

impl CommandRouter {
    /// Create a router with no commands registered.
    pub fn new(session: SharedSession, style: Style) -> Self {
        let verbose = session.borrow().verbose();
        Self {
            commands: Vec::new(),
            session,
            formatter: RegisterFormatter::new(style, verbose),
            style,
            state: RouterState::Running,
        }
    }

    /// Create a router with the register commands registered.
    pub fn with_builtins(session: SharedSession, style: Style) -> Self {
        let mut router = Self::new(session, style);
        crate::commands::register_builtins(&mut router);
        router
    }

    /// Register a command. Replaces any existing command with the same name.
    pub fn register(&mut self, cmd: Box<dyn Command>) {
        match self.commands.iter().position(|c| c.name() == cmd.name()) {
            Some(i) => self.commands[i] = cmd,
            None => self.commands.push(cmd),
        }
    }

    /// Every verb the router accepts, registered commands first.
    pub fn verbs(&self) -> Vec<String> {
        self.commands
            .iter()
            .map(|c| c.name().to_string())
            .chain(BUILTIN_VERBS.iter().map(|v| v.to_string()))
            .collect()
    }

    pub fn session(&self) -> SharedSession {
        SharedSession::clone(&self.session)
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn state(&self) -> RouterState {
        self.state
    }

    pub fn is_terminated(&self) -> bool {
        self.state == RouterState::Terminated
    }

    /// Parse and execute a command line.
    pub fn execute(&mut self, line: &str) -> Result<CommandOutput> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(CommandOutput::None);
        }

        let tokens = tokenize(trimmed)?;
        let Some((verb, rest)) = tokens.split_first() else {
            return Ok(CommandOutput::None);
        };
        let verb = verb.to_ascii_lowercase();
        let args: Vec<&str> = rest.iter().map(String::as_str).collect();
        log::debug!("dispatch {verb} {args:?}");

        match verb.as_str() {
            "quit" | "exit" => return Ok(CommandOutput::Quit),
            "help" => return Ok(CommandOutput::Text(self.help_text())),
            _ => {},
        }

        let cmd = self
            .commands
            .iter()
            .find(|c| c.name() == verb)
            .ok_or_else(|| EbError::UnknownCommand(verb.clone()))?;
        let mut session = self.session.borrow_mut();
        let mut env = Environment {
            session: &mut session,
            formatter: &self.formatter,
            style: &self.style,
        };
        cmd.execute(&args, &mut env)
    }

    /// Execute a line and print its output or recoverable error to `out`.
    ///
    /// A fatal error is returned and terminates the router.
    pub fn execute_line(&mut self, line: &str, out: &mut dyn Write) -> Result<Flow> {
        if self.is_terminated() {
            return Ok(Flow::Quit);
        }
        match self.execute(line) {
            Ok(CommandOutput::Quit) => {
                self.state = RouterState::Terminated;
                Ok(Flow::Quit)
            },
            Ok(CommandOutput::Text(text)) => {
                writeln!(out, "{text}")?;
                Ok(Flow::Continue)
            },
            Ok(CommandOutput::None) => Ok(Flow::Continue),
            Err(e) if e.is_fatal() => {
                self.state = RouterState::Terminated;
                Err(e)
            },
            Err(e) => {
                log::debug!("command failed: {e}");
                writeln!(out, "{}", self.render_error(&e))?;
                Ok(Flow::Continue)
            },
        }
    }

    /// User-facing rendering of a recoverable error.
    pub fn render_error(&self, e: &EbError) -> String {
        let s = &self.style;
        match e {
            EbError::Usage(msg) => msg.clone(),
            EbError::Syntax(msg) => format!("{} {msg}", s.red("Syntax error:")),
            EbError::UnknownCommand(verb) => format!("{} {verb}", s.red("Unknown command:")),
            EbError::FileNotFound(path) => format!(
                "{} File not found: {}",
                s.red("Error:"),
                s.bold(&path.display().to_string())
            ),
            EbError::UnknownRegister { name, available } => format!(
                "{} Register '{}' not found in csr map\nAvailable: {}",
                s.red("Error:"),
                s.bold(name),
                s.dim(&available.join(", "))
            ),
            other => format!("{} {other}", s.red("Error:")),
        }
    }

    /// Static command summary.
    pub fn help_text(&self) -> String {
        let s = &self.style;
        let mut rows: Vec<(String, String, String)> = self
            .commands
            .iter()
            .map(|c| {
                let args = c.usage().strip_prefix(c.name()).unwrap_or("").trim();
                (c.name().to_string(), args.to_string(), c.description().to_string())
            })
            .collect();
        rows.push(("help".into(), String::new(), "Show this help".into()));
        rows.push(("quit".into(), String::new(), "Exit interactive mode".into()));

        let mut lines = vec![s.bold("Commands:")];
        for (name, args, description) in rows {
            // Pad before styling so escape codes don't skew the columns.
            lines.push(format!(
                "  {} {}  {description}",
                s.bold(&format!("{name:<5}")),
                s.dim(&format!("{args:<14}"))
            ));
        }
        lines.join("\n")
    }

    /// Close the session's transport.
    pub fn close(&mut self) -> Result<()> {
        self.session.borrow_mut().close()
    }
}

// ---------------------------------------------------------------------------
// Tokenizer: handles single quotes, double quotes, and backslash escapes.
// ---------------------------------------------------------------------------

/// Tokenize a command line respecting quotes and backslash escapes.
///
/// - Single-quoted strings preserve all characters literally.
/// - Inside double quotes, backslash only escapes `"` and `\`.
/// - Backslash escapes the next character outside of quotes.
pub fn tokenize(input: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    // Distinguishes `''` (an empty token) from no token at all.
    let mut in_token = false;
    let mut chars = input.chars().peekable();
    let mut in_single = false;
    let mut in_double = false;

    while let Some(ch) = chars.next() {
        if in_single {
            if ch == '\'' {
                in_single = false;
            } else {
                current.push(ch);
            }
        } else if in_double {
            if ch == '"' {
                in_double = false;
            } else if ch == '\\' {
                match chars.peek() {
                    Some(&next @ ('"' | '\\')) => {
                        current.push(next);
                        chars.next();
                    },
                    _ => current.push('\\'),
                }
            } else {
                current.push(ch);
            }
        } else {
            match ch {
                '\'' => {
                    in_single = true;
                    in_token = true;
                },
                '"' => {
                    in_double = true;
                    in_token = true;
                },
                '\\' => match chars.next() {
                    Some(next) => {
                        current.push(next);
                        in_token = true;
                    },
                    None => return Err(EbError::Syntax("no escaped character".to_string())),
                },
                c if c.is_whitespace() => {
                    if in_token {
                        tokens.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                },
                _ => {
                    current.push(ch);
                    in_token = true;
                },
            }
        }
    }

    if in_single || in_double {
        return Err(EbError::Syntax("no closing quotation".to_string()));
    }

    if in_token {
        tokens.push(current);
    }

    Ok(tokens)
}
