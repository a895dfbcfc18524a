//! Locale-independent numbers for config files.
//!
//! Every value rasputin writes uses `.` as the decimal separator, whatever the
//! process locale. Parsing is as lenient as `sscanf`: leading whitespace is
//! skipped and the longest numeric prefix is used, so `"25 "` or `"0.5\n"`
//! read fine while `"abc"` does not.

/// Fixed-point rendering with six decimals (`0.753` becomes `0.753000`).
pub fn format_float(value: f64) -> String {
    format!("{:.6}", value)
}

pub fn parse_float(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = sign_len(bytes);
    let digits_start = end;

    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut has_digits = end > digits_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start || has_digits {
            has_digits |= frac_end > frac_start;
            end = frac_end;
        }
    }

    if !has_digits {
        return None;
    }

    // Optional exponent, only taken if it is complete
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let exp_start = end + 1 + sign_len(&bytes[end + 1..]);
        let mut exp_end = exp_start;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_start {
            end = exp_end;
        }
    }

    text[..end].parse().ok()
}

pub fn parse_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = sign_len(bytes);
    let digits_start = end;

    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }

    if end == digits_start {
        return None;
    }
    text[..end].parse().ok()
}

/// A strictly positive integer that fits in `u32`, or `None`.
pub fn parse_positive(text: &str) -> Option<u32> {
    parse_int(text)
        .filter(|v| *v > 0)
        .and_then(|v| u32::try_from(v).ok())
}

fn sign_len(bytes: &[u8]) -> usize {
    match bytes.first() {
        Some(b'+') | Some(b'-') => 1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_dot_and_six_decimals() {
        assert_eq!(format_float(0.753), "0.753000");
        assert_eq!(format_float(-1.0), "-1.000000");
        assert_eq!(format_float(0.0), "0.000000");
    }

    #[test]
    fn float_round_trip() {
        let parsed = parse_float(&format_float(0.753)).unwrap();
        assert!((parsed - 0.753).abs() < 1e-6);

        let parsed = parse_float(&format_float(-0.25)).unwrap();
        assert!((parsed + 0.25).abs() < 1e-6);
    }

    #[test]
    fn float_prefix_parsing() {
        assert_eq!(parse_float("  0.5\n"), Some(0.5));
        assert_eq!(parse_float("1e-1x"), Some(0.1));
        assert_eq!(parse_float("2e"), Some(2.0));
        assert_eq!(parse_float(".5"), Some(0.5));
        assert_eq!(parse_float("3."), Some(3.0));
        assert_eq!(parse_float("-"), None);
        assert_eq!(parse_float("."), None);
        assert_eq!(parse_float("fast"), None);
    }

    #[test]
    fn comma_is_not_a_decimal_separator() {
        assert_eq!(parse_float("0,5"), Some(0.0));
    }

    #[test]
    fn int_parsing() {
        assert_eq!(parse_int("25"), Some(25));
        assert_eq!(parse_int(" -3 "), Some(-3));
        assert_eq!(parse_int("600ms"), Some(600));
        assert_eq!(parse_int(""), None);
        assert_eq!(parse_int("yes"), None);
    }

    #[test]
    fn positive_rejects_zero_and_negative() {
        assert_eq!(parse_positive("40"), Some(40));
        assert_eq!(parse_positive("0"), None);
        assert_eq!(parse_positive("-40"), None);
        assert_eq!(parse_positive("99999999999"), None);
    }
}
