//! LiteX `csr.csv` loader.
//!
//! Each line is `kind,name,value,size,mode`. Only `csr_register` lines and
//! the `config_csr_data_width` constant matter here:
//!
//! ```text
//! csr_base,ctrl,0xf0000000,,
//! csr_register,ctrl_reset,0xf0000000,1,rw
//! constant,config_csr_data_width,32,,
//! memory_region,sram,0x10000000,8192,cached
//! ```

use std::path::Path;

use ebcli_types::error::{EbError, Result};
use ebcli_types::regmap::{Access, RegisterDescriptor, RegisterMap};

const DEFAULT_DATA_WIDTH: u32 = 32;

/// Load and parse a `csr.csv` file.
pub fn load_csr(path: &Path) -> Result<RegisterMap> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| EbError::CsrFormat(format!("{}: {e}", path.display())))?;
    let map = parse_csr(&text).map_err(|e| match e {
        EbError::CsrFormat(msg) => EbError::CsrFormat(format!("{}: {msg}", path.display())),
        other => other,
    })?;
    log::info!("loaded {} registers from {}", map.len(), path.display());
    Ok(map)
}

struct RawRegister<'a> {
    line: usize,
    name: &'a str,
    address: u32,
    size: u32,
    access: Access,
}

/// Parse `csr.csv` contents.
///
/// The data width constant may appear anywhere in the file, so registers are
/// collected first and sized afterwards.
pub fn parse_csr(text: &str) -> Result<RegisterMap> {
    let mut data_width = DEFAULT_DATA_WIDTH;
    let mut raw = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let err = |what: &str| EbError::CsrFormat(format!("line {line_no}: {what}"));

        match fields[0] {
            "csr_register" => {
                if fields.len() < 3 {
                    return Err(err("csr_register needs a name and an address"));
                }
                let name = fields[1];
                if name.is_empty() {
                    return Err(err("empty register name"));
                }
                let address = parse_u32(fields[2])
                    .ok_or_else(|| err(&format!("invalid address '{}'", fields[2])))?;
                let size = match fields.get(3).copied() {
                    None | Some("") => 1,
                    Some(s) => parse_u32(s)
                        .filter(|&n| n > 0)
                        .ok_or_else(|| err(&format!("invalid size '{s}'")))?,
                };
                let access = match fields.get(4).copied() {
                    None | Some("") => Access::ReadWrite,
                    Some(m) => m
                        .parse::<Access>()
                        .map_err(|_| err(&format!("invalid mode '{m}'")))?,
                };
                raw.push(RawRegister {
                    line: line_no,
                    name,
                    address,
                    size,
                    access,
                });
            },
            "constant" if fields.get(1) == Some(&"config_csr_data_width") => {
                let value = fields.get(2).copied().unwrap_or("");
                data_width = parse_u32(value)
                    .filter(|w| matches!(w, 8 | 16 | 32))
                    .ok_or_else(|| err(&format!("unsupported csr data width '{value}'")))?;
            },
            _ => {},
        }
    }

    let mut map = RegisterMap::new();
    for r in raw {
        if u64::from(r.size) * u64::from(data_width) > 64 {
            return Err(EbError::CsrFormat(format!(
                "line {}: register '{}' is wider than 64 bits",
                r.line, r.name
            )));
        }
        map.insert(RegisterDescriptor {
            name: r.name.to_string(),
            address: r.address,
            size: r.size,
            data_width,
            access: r.access,
        })
        .map_err(|e| match e {
            EbError::CsrFormat(msg) => EbError::CsrFormat(format!("line {}: {msg}", r.line)),
            other => other,
        })?;
    }
    Ok(map)
}

fn parse_u32(s: &str) -> Option<u32> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}
