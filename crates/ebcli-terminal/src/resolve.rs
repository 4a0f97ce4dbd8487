//! Address resolution: numeric literals first, then register names.

use ebcli_types::error::{EbError, Result};
use ebcli_types::regmap::{RegisterDescriptor, RegisterMap};

use crate::codec::parse_int;

/// An address token after resolution.
///
/// When `descriptor` is set, accesses must go through it rather than the
/// raw bus so multi-word registers are handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAddress {
    pub address: u32,
    pub name: Option<String>,
    pub descriptor: Option<RegisterDescriptor>,
}

impl ResolvedAddress {
    pub fn raw(address: u32) -> Self {
        Self {
            address,
            name: None,
            descriptor: None,
        }
    }
}

/// Resolve `token` against the loaded map, if any.
///
/// Integer literals always win, even when a register shares the literal as
/// its name.
pub fn resolve(token: &str, map: Option<&RegisterMap>) -> Result<ResolvedAddress> {
    if let Some(addr) = parse_int(token) {
        let address = u32::try_from(addr)
            .map_err(|_| EbError::Value(format!("address 0x{addr:x} is wider than 32 bits")))?;
        return Ok(ResolvedAddress::raw(address));
    }
    let Some(map) = map else {
        return Err(EbError::MissingMap(format!("Register name '{token}'")));
    };
    let descriptor = map.get(token).ok_or_else(|| EbError::UnknownRegister {
        name: token.to_string(),
        available: map.names_sorted(),
    })?;
    Ok(ResolvedAddress {
        address: descriptor.address,
        name: Some(token.to_string()),
        descriptor: Some(descriptor.clone()),
    })
}
