//! Register commands: read, write, regs, csr.

use ebcli_types::config::expand_tilde;
use ebcli_types::error::{EbError, Result};

use crate::codec::parse_value;
use crate::interpreter::{Command, CommandOutput, CommandRouter, Environment};
use crate::style::Style;

/// Register the register commands into a router, in help order.
pub fn register_builtins(router: &mut CommandRouter) {
    router.register(Box::new(ReadCmd));
    router.register(Box::new(WriteCmd));
    router.register(Box::new(RegsCmd));
    router.register(Box::new(CsrCmd));
}

fn usage_error(style: &Style, verb: &str, args: &str) -> EbError {
    EbError::Usage(format!("Usage: {} {}", style.bold(verb), style.dim(args)))
}

// ---------------------------------------------------------------------------
// read
// ---------------------------------------------------------------------------

struct ReadCmd;
impl Command for ReadCmd {
    fn name(&self) -> &str {
        "read"
    }
    fn description(&self) -> &str {
        "Read a register (name or hex address)"
    }
    fn usage(&self) -> &str {
        "read <addr>"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let [addr] = args else {
            return Err(usage_error(env.style, "read", "<addr>"));
        };
        let resolved = env.session.resolve(addr)?;
        let value = env.session.read(&resolved)?;
        Ok(CommandOutput::Text(env.formatter.read_line(
            resolved.address,
            value,
            resolved.name.as_deref(),
        )))
    }
}

// ---------------------------------------------------------------------------
// write
// ---------------------------------------------------------------------------

struct WriteCmd;
impl Command for WriteCmd {
    fn name(&self) -> &str {
        "write"
    }
    fn description(&self) -> &str {
        "Write a register and read back"
    }
    fn usage(&self) -> &str {
        "write <addr> <value>"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let [addr, value] = args else {
            return Err(usage_error(env.style, "write", "<addr> <value>"));
        };
        let resolved = env.session.resolve(addr)?;
        let value = parse_value(value)?;
        env.session.write(&resolved, value)?;
        // The read-back is what gets reported, whatever the device kept.
        let readback = env.session.read(&resolved)?;
        Ok(CommandOutput::Text(env.formatter.write_lines(
            resolved.address,
            value,
            readback,
            resolved.name.as_deref(),
        )))
    }
}

// ---------------------------------------------------------------------------
// regs
// ---------------------------------------------------------------------------

struct RegsCmd;
impl Command for RegsCmd {
    fn name(&self) -> &str {
        "regs"
    }
    fn description(&self) -> &str {
        "Dump registers, optionally filtered by glob pattern"
    }
    fn usage(&self) -> &str {
        "regs [pattern]"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        if env.session.map().is_none() {
            return Err(EbError::MissingMap("regs".to_string()));
        }
        let pattern = match args {
            [] => None,
            [p] => Some(register_pattern(p)?),
            _ => return Err(usage_error(env.style, "regs", "[pattern]")),
        };

        let regs = env
            .session
            .registers_matching(|name| pattern.as_ref().is_none_or(|p| p.matches(name)));
        let mut lines = Vec::with_capacity(regs.len());
        for reg in &regs {
            let value = env.session.read_register(reg)?;
            lines.push(env.formatter.dump_line(reg.address, value, &reg.name));
        }
        if lines.is_empty() {
            return Ok(CommandOutput::None);
        }
        Ok(CommandOutput::Text(lines.join("\n")))
    }
}

/// Compile a `regs` filter with shell-glob semantics.
///
/// Runs of `*` match like a single `*`, and a pattern that still does not
/// compile (such as an unclosed `[`) matches literally.
fn register_pattern(p: &str) -> Result<glob::Pattern> {
    let mut collapsed = String::with_capacity(p.len());
    for c in p.chars() {
        if c == '*' && collapsed.ends_with('*') {
            continue;
        }
        collapsed.push(c);
    }
    glob::Pattern::new(&collapsed)
        .or_else(|_| glob::Pattern::new(&glob::Pattern::escape(p)))
        .map_err(|e| EbError::Usage(format!("invalid pattern '{p}': {}", e.msg)))
}

// ---------------------------------------------------------------------------
// csr
// ---------------------------------------------------------------------------

struct CsrCmd;
impl Command for CsrCmd {
    fn name(&self) -> &str {
        "csr"
    }
    fn description(&self) -> &str {
        "Load/show CSR CSV file"
    }
    fn usage(&self) -> &str {
        "csr [file]"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let s = env.style;
        let [file] = args else {
            let text = match env.session.csr_path() {
                Some(path) => format!("Current CSR: {}", s.cyan(&path.display().to_string())),
                None => format!("No CSR loaded. Usage: {} {}", s.bold("csr"), s.dim("<file>")),
            };
            return Ok(CommandOutput::Text(text));
        };

        let path = expand_tilde(file);
        let count = env.session.reload_map(&path)?;
        if !env.formatter.is_verbose() {
            return Ok(CommandOutput::None);
        }
        Ok(CommandOutput::Text(format!(
            "Loaded {} registers from {}",
            s.green(&count.to_string()),
            s.cyan(&path.display().to_string())
        )))
    }
}
