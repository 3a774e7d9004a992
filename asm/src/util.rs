use crate::error::AsmError;

/// Number of significant bits in `num`.
pub fn bitsize(num: u64) -> u32 {
    64 - num.leading_zeros()
}

/// Converts a token to an integer. Besides plain decimal digits a
/// single alphabetic character converts to its ASCII code, and the
/// `\n`/`\t` escapes to 10/9.
pub fn sctoi(s: &str) -> Result<i64, AsmError> {
    if let Ok(num) = s.parse::<i64>() {
        return Ok(num);
    }
    let mut chars = s.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_alphabetic() {
            return Ok(c as i64);
        }
    }
    match s {
        "\\n" => Ok(10),
        "\\t" => Ok(9),
        _ => Err(AsmError::Syntax(format!("cannot parse `{s}` as a number"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitsize_counts_significant_bits() {
        assert_eq!(bitsize(0), 0);
        assert_eq!(bitsize(1), 1);
        assert_eq!(bitsize(0xFF), 8);
        assert_eq!(bitsize(0x100), 9);
        assert_eq!(bitsize(0x1234), 13);
    }

    #[test]
    fn sctoi_digits_and_chars() {
        assert_eq!(sctoi("42").unwrap(), 42);
        assert_eq!(sctoi("W").unwrap(), 'W' as i64);
        assert_eq!(sctoi("\\n").unwrap(), 10);
        assert_eq!(sctoi("\\t").unwrap(), 9);
        assert!(sctoi("4x2").is_err());
        assert!(sctoi("").is_err());
    }
}
