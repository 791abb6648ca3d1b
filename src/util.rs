// Utility helpers for parsing and formatting.
//
// This module centralizes all the "dirty" CSV/number/date handling so the
// rest of the code can assume clean, typed values.
use chrono::{Datelike, NaiveDate};
use num_format::{Locale, ToFormattedString};

/// Characters removed from numeric cells before parsing: thousands
/// separators plus half- and full-width yen signs.
const NUMBER_NOISE: [char; 3] = [',', '¥', '￥'];

/// Trim a cell and drop separators/currency symbols.
///
/// Returns `None` for missing or blank cells.
pub fn clean_numeric(s: Option<&str>) -> Option<String> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let cleaned: String = s.chars().filter(|c| !NUMBER_NOISE.contains(c)).collect();
    let cleaned = cleaned.trim().to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Parse a count cell exactly: the cleaned text must be a non-negative
/// base-10 integer.
pub fn parse_u64_exact(s: &str) -> Option<u64> {
    s.strip_prefix('+').unwrap_or(s).parse::<u64>().ok()
}

/// Forgiving integer parse for count cells.
///
/// - `"1,000"` and `"¥5,000"` parse after stripping separators.
/// - Anything else keeps its leading digit run (`"12.7"` -> 12).
/// - No leading digit (blank, text, negative numbers) -> 0.
pub fn parse_u64_lenient(s: Option<&str>) -> u64 {
    let Some(cleaned) = clean_numeric(s) else {
        return 0;
    };
    if let Some(v) = parse_u64_exact(&cleaned) {
        return v;
    }
    let body = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    let digits: String = body.chars().take_while(|c| c.is_ascii_digit()).collect();
    // Saturate instead of wrapping on absurdly long digit runs.
    if digits.is_empty() {
        0
    } else {
        digits.parse::<u64>().unwrap_or(u64::MAX)
    }
}

/// Parse the longest leading prefix of `s` that is a finite float.
///
/// `"0.025"` -> 0.025, `"1.5%"` -> 1.5, `"abc"` -> `None`.
pub fn parse_f64_prefix(s: &str) -> Option<f64> {
    let s = s.trim();
    if let Ok(v) = s.parse::<f64>() {
        return v.is_finite().then_some(v);
    }
    let end = float_prefix_len(s.as_bytes());
    if end == 0 {
        return None;
    }
    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Length of the longest `[+-]digits[.digits][e[+-]digits]` prefix, or 0
/// when there is no mantissa digit. An exponent without digits is left out.
fn float_prefix_len(b: &[u8]) -> usize {
    let digits_from = |mut i: usize| {
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        i
    };
    let mut i = usize::from(matches!(b.first(), Some(b'+' | b'-')));
    let int_end = digits_from(i);
    let mut mantissa_digits = int_end - i;
    i = int_end;
    if b.get(i) == Some(&b'.') {
        let frac_end = digits_from(i + 1);
        mantissa_digits += frac_end - (i + 1);
        i = frac_end;
    }
    if mantissa_digits == 0 {
        return 0;
    }
    if matches!(b.get(i), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(b.get(i + 1), Some(b'+' | b'-')));
        let exp_start = i + 1 + sign;
        let exp_end = digits_from(exp_start);
        if exp_end > exp_start {
            i = exp_end;
        }
    }
    i
}

/// Accepted day formats, tried in order.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y年%m月%d日"];

pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    // Exports sometimes carry a time part; only the day matters.
    let day = s.split(|c: char| c == 'T' || c.is_whitespace()).next()?;
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(day, fmt).ok())
}

/// `M/D` without zero padding, e.g. `6/1`.
pub fn format_month_day(date: NaiveDate) -> String {
    format!("{}/{}", date.month(), date.day())
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - locale-aware thousands separators (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg && res.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// Yen amount rounded to whole units: `¥1,234`.
pub fn format_yen(n: f64) -> String {
    format!("¥{}", format_number(n, 0))
}

/// Percentage with two decimals: `12.34%`.
pub fn format_percent(n: f64) -> String {
    format!("{}%", format_number(n, 2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_counts_strip_separators_and_currency() {
        assert_eq!(parse_u64_lenient(Some("1,000")), 1000);
        assert_eq!(parse_u64_lenient(Some("¥5,000")), 5000);
        assert_eq!(parse_u64_lenient(Some("￥12,345")), 12345);
        assert_eq!(parse_u64_lenient(Some(" 42 ")), 42);
    }

    #[test]
    fn lenient_counts_degrade_to_zero() {
        assert_eq!(parse_u64_lenient(None), 0);
        assert_eq!(parse_u64_lenient(Some("")), 0);
        assert_eq!(parse_u64_lenient(Some("n/a")), 0);
        assert_eq!(parse_u64_lenient(Some("-5")), 0);
        assert_eq!(parse_u64_lenient(Some("12.7")), 12);
    }

    #[test]
    fn float_prefix_matches_leading_number() {
        assert_eq!(parse_f64_prefix("0.025"), Some(0.025));
        assert_eq!(parse_f64_prefix("1.5%"), Some(1.5));
        assert_eq!(parse_f64_prefix("3e"), Some(3.0));
        assert_eq!(parse_f64_prefix("abc"), None);
        assert_eq!(parse_f64_prefix("inf"), None);
        assert_eq!(parse_f64_prefix("-2.5e-1x"), Some(-0.25));
        assert_eq!(parse_f64_prefix(".5%"), Some(0.5));
        assert_eq!(parse_f64_prefix("1.5e+"), Some(1.5));
        assert_eq!(parse_f64_prefix("-."), None);
    }

    #[test]
    fn float_prefix_handles_long_junk() {
        let junk = format!("7{}", "e1".repeat(50_000));
        assert_eq!(parse_f64_prefix(&junk), Some(70.0));
        let dots = "1.".repeat(50_000);
        assert_eq!(parse_f64_prefix(&dots), Some(1.1));
    }

    #[test]
    fn dates_accept_common_export_formats() {
        let d = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(parse_date_safe(Some("2024-06-01")), Some(d));
        assert_eq!(parse_date_safe(Some("2024/6/1")), Some(d));
        assert_eq!(parse_date_safe(Some("2024-06-01 00:00:00")), Some(d));
        assert_eq!(parse_date_safe(Some("2024年6月1日")), Some(d));
        assert_eq!(parse_date_safe(Some("合計")), None);
        assert_eq!(parse_date_safe(Some("")), None);
        assert_eq!(parse_date_safe(None), None);
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-0.001, 2), "0.00");
        assert_eq!(format_number(-1500.0, 0), "-1,500");
        assert_eq!(format_yen(499.6), "¥500");
        assert_eq!(format_percent(10.0), "10.00%");
        assert_eq!(format_int(1_000_u64), "1,000");
        assert_eq!(format_month_day(NaiveDate::from_ymd_opt(2024, 6, 9).unwrap()), "6/9");
    }
}
