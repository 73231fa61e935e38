//! Operand text encodings for IFJcode25.

/// Escapes a string literal for a `string@` operand.
///
/// Byte values 0…32, `#` (0x23) and `\` (0x5C) become `\ddd` with three
/// decimal digits; everything else is copied through verbatim.
pub fn escape_string(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    for byte in src.bytes() {
        if byte <= 32 || byte == b'#' || byte == b'\\' {
            out.push_str(&format!("\\{:03}", byte));
        } else {
            out.push(byte as char);
        }
    }
    out
}

/// Formats a float for a `float@` operand in C99 `%a` hexadecimal notation,
/// e.g. `0x1.8p+1` for 3.0.
pub fn hex_float(value: f64) -> String {
    let bits = value.to_bits();
    let sign = if bits >> 63 == 1 { "-" } else { "" };
    let biased = ((bits >> 52) & 0x7ff) as i64;
    let mantissa = bits & 0x000f_ffff_ffff_ffff;

    if biased == 0 && mantissa == 0 {
        return format!("{}0x0p+0", sign);
    }

    let (lead, exponent) = if biased == 0 {
        // Subnormal: no implicit leading one.
        (0, -1022)
    } else {
        (1, biased - 1023)
    };

    let mut frac = format!("{:013x}", mantissa);
    while frac.ends_with('0') {
        frac.pop();
    }

    if frac.is_empty() {
        format!("{}0x{}p{:+}", sign, lead, exponent)
    } else {
        format!("{}0x{}.{}p{:+}", sign, lead, frac, exponent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_plain_text() {
        assert_eq!(escape_string("hello"), "hello");
    }

    #[test]
    fn test_escape_whitespace_and_controls() {
        assert_eq!(escape_string("a b"), "a\\032b");
        assert_eq!(escape_string("hi\n"), "hi\\010");
        assert_eq!(escape_string("\t"), "\\009");
        assert_eq!(escape_string("\0"), "\\000");
    }

    #[test]
    fn test_escape_hash_and_backslash() {
        assert_eq!(escape_string("#"), "\\035");
        assert_eq!(escape_string("\\"), "\\092");
    }

    #[test]
    fn test_escape_keeps_utf8_tail_bytes() {
        // Multi-byte sequences pass through byte by byte.
        let escaped = escape_string("č");
        assert!(!escaped.contains('\\'));
    }

    #[test]
    fn test_hex_float_simple_values() {
        assert_eq!(hex_float(0.0), "0x0p+0");
        assert_eq!(hex_float(1.0), "0x1p+0");
        assert_eq!(hex_float(2.0), "0x1p+1");
        assert_eq!(hex_float(3.0), "0x1.8p+1");
        assert_eq!(hex_float(0.5), "0x1p-1");
        assert_eq!(hex_float(-1.5), "-0x1.8p+0");
    }

    #[test]
    fn test_hex_float_round_trips() {
        for value in [3.14, 0.1, 12345.6789, 1e-10, 2.5e3] {
            let text = hex_float(value);
            let (mantissa, exponent) = text[2..].split_once('p').unwrap();
            let exponent: i32 = exponent.parse().unwrap();
            let (int_part, frac_part) = match mantissa.split_once('.') {
                Some((i, f)) => (i, f),
                None => (mantissa, ""),
            };
            let mut parsed = i64::from_str_radix(int_part, 16).unwrap() as f64;
            for (pos, digit) in frac_part.chars().enumerate() {
                let d = digit.to_digit(16).unwrap() as f64;
                parsed += d * (16f64).powi(-(pos as i32 + 1));
            }
            parsed *= (2f64).powi(exponent);
            assert_eq!(parsed, value, "round trip failed for {}", text);
        }
    }
}
