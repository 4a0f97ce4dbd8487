//! Register display lines.
//!
//! Two tiers: terse output is meant for scripts and pipes, verbose output is
//! the styled form used by interactive sessions.

use crate::codec::{format_hex, format_ip};
use crate::style::Style;

/// Builds display lines for register reads, writes and dumps.
#[derive(Debug, Clone, Copy)]
pub struct RegisterFormatter {
    style: Style,
    verbose: bool,
}

impl RegisterFormatter {
    pub fn new(style: Style, verbose: bool) -> Self {
        Self { style, verbose }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Full `name @ addr = value` line, with a dotted-quad hint for
    /// `*ip_address*` registers holding a 32-bit value.
    pub fn format_register(&self, address: u32, value: u64, name: Option<&str>) -> String {
        let s = &self.style;
        let hex = s.green(&format!("0x{}", format_hex(value)));
        match name {
            Some(name) => {
                let ip = match u32::try_from(value) {
                    Ok(v) if v > 0 && name.contains("ip_address") => {
                        format!(" ({})", s.dim(&format_ip(v)))
                    },
                    _ => String::new(),
                };
                format!(
                    "{} @ {} = {hex}{ip}",
                    s.cyan(name),
                    s.dim(&format!("0x{address:08x}"))
                )
            },
            None => format!("{} = {hex}", s.dim(&format!("[0x{address:08x}]"))),
        }
    }

    /// Output for `read`.
    pub fn read_line(&self, address: u32, value: u64, name: Option<&str>) -> String {
        if self.verbose {
            self.format_register(address, value, name)
        } else {
            format!("0x{}", format_hex(value))
        }
    }

    /// Output for `write`: the requested value, then the read-back.
    ///
    /// Terse output only shows the read-back.
    pub fn write_lines(
        &self,
        address: u32,
        requested: u64,
        readback: u64,
        name: Option<&str>,
    ) -> String {
        if !self.verbose {
            return format!("0x{}", format_hex(readback));
        }
        let s = &self.style;
        let target = match name {
            Some(name) => format!("{} @ {}", s.cyan(name), s.dim(&format!("0x{address:08x}"))),
            None => s.dim(&format!("[0x{address:08x}]")),
        };
        format!(
            "{target} {} {}\n{}",
            s.yellow("<="),
            s.green(&format!("0x{}", format_hex(requested))),
            self.format_register(address, readback, name)
        )
    }

    /// One line of a `regs` dump.
    pub fn dump_line(&self, address: u32, value: u64, name: &str) -> String {
        if !self.verbose {
            return format!("{name} 0x{value:08x}");
        }
        let s = &self.style;
        format!(
            "{} = {}\t{} {}",
            s.dim(&format!("[0x{address:08x}]")),
            s.green(&format!("0x{value:08x}")),
            s.dim("#"),
            s.cyan(name)
        )
    }
}
