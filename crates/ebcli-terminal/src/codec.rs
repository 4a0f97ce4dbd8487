//! Textual value encoding: integer literals, dotted quads and hex.

use ebcli_types::error::{EbError, Result};

/// Parse an integer literal: decimal, `0x`, `0o` or `0b`.
///
/// Prefixes are case-insensitive and `_` may separate digits. Decimal
/// literals may not have leading zeros (`010` is rejected, `00` is fine).
/// Signs are not accepted.
pub fn parse_int(text: &str) -> Option<u64> {
    let lower = text.trim().to_ascii_lowercase();
    let (digits, radix) = if let Some(rest) = lower.strip_prefix("0x") {
        (rest, 16)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (rest, 8)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (rest, 2)
    } else {
        (lower.as_str(), 10)
    };

    // A single `_` may follow a radix prefix (`0x_ff`).
    let digits = if radix == 10 {
        digits
    } else {
        digits.strip_prefix('_').unwrap_or(digits)
    };
    if digits.is_empty()
        || digits.starts_with('_')
        || digits.ends_with('_')
        || digits.contains("__")
    {
        return None;
    }
    let cleaned: String = digits.chars().filter(|&c| c != '_').collect();
    if !cleaned.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let leading_zero = cleaned.len() > 1 && cleaned.starts_with('0');
    if radix == 10 && leading_zero && cleaned.contains(|c: char| c != '0') {
        return None;
    }
    u64::from_str_radix(&cleaned, radix).ok()
}

/// Parse `a.b.c.d` with every octet a decimal number in `0..=255`.
fn parse_dotted_quad(text: &str) -> Option<u32> {
    let parts: Vec<&str> = text.trim().split('.').collect();
    if parts.len() != 4 {
        return None;
    }
    parts.iter().try_fold(0u32, |acc, part| {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let octet: u32 = part.parse().ok()?;
        (octet <= 255).then_some((acc << 8) | octet)
    })
}

/// Parse a register value. Dotted quads are tried before integer literals.
pub fn parse_value(text: &str) -> Result<u64> {
    if let Some(v) = parse_dotted_quad(text) {
        return Ok(u64::from(v));
    }
    parse_int(text).ok_or_else(|| {
        EbError::Value(format!(
            "'{text}' is neither an integer nor a dotted-quad address"
        ))
    })
}

/// Render a 32-bit value as `a.b.c.d`, most significant byte first.
pub fn format_ip(value: u32) -> String {
    let [a, b, c, d] = value.to_be_bytes();
    format!("{a}.{b}.{c}.{d}")
}

/// Lowercase hex without prefix, at least 8 digits, wider when needed.
pub fn format_hex(value: u64) -> String {
    let bits = 64 - value.leading_zeros() as usize;
    let width = bits.div_ceil(4).max(8);
    format!("{value:0width$x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn int_literals() {
        assert_eq!(parse_int("0"), Some(0));
        assert_eq!(parse_int("4096"), Some(4096));
        assert_eq!(parse_int("0x1000"), Some(0x1000));
        assert_eq!(parse_int("0XfF"), Some(0xff));
        assert_eq!(parse_int("0o17"), Some(0o17));
        assert_eq!(parse_int("0b101"), Some(0b101));
        assert_eq!(parse_int("0xf000_0800"), Some(0xf000_0800));
        assert_eq!(parse_int("0x_ff"), Some(0xff));
        assert_eq!(parse_int("00"), Some(0));
    }

    #[test]
    fn int_literal_rejections() {
        for bad in [
            "", "0x", "010", "-1", "+1", "1__0", "_1", "1_", "0b2", "0o8", "ctrl_reset", "1.2",
            "0x1g",
        ] {
            assert_eq!(parse_int(bad), None, "{bad:?} should not parse");
        }
    }

    #[test]
    fn int_overflow_is_none() {
        assert_eq!(parse_int("0xffffffffffffffff"), Some(u64::MAX));
        assert_eq!(parse_int("0x1_0000_0000_0000_0000"), None);
    }

    #[test]
    fn dotted_quad_is_big_endian() {
        assert_eq!(
            parse_value("192.168.1.50").unwrap(),
            (192 << 24) | (168 << 16) | (1 << 8) | 50
        );
        assert_eq!(parse_value("1.2.3.4").unwrap(), 0x0102_0304);
        assert_eq!(parse_value("0.0.0.0").unwrap(), 0);
    }

    #[test]
    fn dotted_quad_octets_allow_leading_zeros() {
        assert_eq!(parse_value("010.0.0.1").unwrap(), 0x0a00_0001);
    }

    #[test]
    fn value_falls_back_to_integer() {
        assert_eq!(parse_value("0xdeadbeef").unwrap(), 0xdead_beef);
        assert_eq!(parse_value("12").unwrap(), 12);
    }

    #[test]
    fn bad_values_rejected() {
        for bad in ["256.0.0.1", "1.2.3", "1.2.3.4.5", "a.b.c.d", "1..2.3", "zz"] {
            let err = parse_value(bad).unwrap_err();
            assert!(matches!(err, EbError::Value(_)), "{bad:?}");
        }
    }

    #[test]
    fn ip_formatting() {
        assert_eq!(format_ip(0xc0a8_0132), "192.168.1.50");
        assert_eq!(format_ip(0), "0.0.0.0");
        assert_eq!(format_ip(u32::MAX), "255.255.255.255");
    }

    #[test]
    fn hex_width() {
        assert_eq!(format_hex(0), "00000000");
        assert_eq!(format_hex(0x2a), "0000002a");
        assert_eq!(format_hex(0xffff_ffff), "ffffffff");
        assert_eq!(format_hex(0x1_0000_0000), "100000000");
        assert_eq!(format_hex(u64::MAX).len(), 16);
    }

    proptest! {
        #[test]
        fn ip_round_trip(x in any::<u32>()) {
            prop_assert_eq!(parse_value(&format_ip(x)).unwrap(), u64::from(x));
        }

        #[test]
        fn hex_parses_back(x in any::<u64>()) {
            let text = format!("0x{}", format_hex(x));
            prop_assert_eq!(parse_int(&text), Some(x));
            prop_assert!(format_hex(x).len() >= 8);
        }
    }
}
