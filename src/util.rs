// Utility helpers for parsing and number formatting.
//
// This module centralizes the CSV number/date handling so the rest of the
// code can assume clean, typed values.
use chrono::{Datelike, NaiveDate};
use num_format::{Locale, ToFormattedString};

/// Date layouts seen in retail exports, tried in order.
const DATE_FORMATS: [&str; 5] = ["%m/%d/%Y", "%Y-%m-%d", "%m-%d-%Y", "%Y/%m/%d", "%d.%m.%Y"];

/// Two-digit-year export layout, tried only after the four-digit ones.
const SHORT_YEAR_FORMAT: &str = "%m/%d/%y";

/// Parse a currency-ish string into `f64`.
///
/// - Trims whitespace and a leading `$` (after an optional minus sign).
/// - Strips thousands separators like `","` before parsing.
/// - Rejects anything with alphabetic characters, so `NaN`/`inf` never sneak in.
/// - Rejects a second sign (`--5`) and values that overflow to infinity.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let (neg, rest) = match s.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, s),
    };
    let (dollar, rest) = match rest.strip_prefix('$') {
        Some(r) => (true, r),
        None => (false, rest),
    };
    if (neg || dollar) && rest.starts_with(['-', '+']) {
        return None;
    }
    let v = rest.replace(',', "").parse::<f64>().ok()?;
    if !v.is_finite() {
        return None;
    }
    Some(if neg { -v } else { v })
}

/// Parse a date in one of the known layouts.
///
/// `%Y` also matches one to three digits, so a four-digit year is required
/// there; `1/2/17` falls through to the two-digit-year layout instead.
pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .filter_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .find(|d| d.year() >= 1000)
        .or_else(|| NaiveDate::parse_from_str(s, SHORT_YEAR_FORMAT).ok())
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus locale thousands separators (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    // Past i64 the digits are kept ungrouped.
    let mut res = match int_part.parse::<i64>() {
        Ok(v) => v.to_formatted_string(&Locale::en),
        Err(_) => int_part.to_string(),
    };
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg && res.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", res)
    } else {
        res
    }
}

/// `$1,234.56`, with the sign in front of the currency symbol.
pub fn format_currency(n: f64) -> String {
    let s = format_number(n, 2);
    match s.strip_prefix('-') {
        Some(abs) => format!("-${}", abs),
        None => format!("${}", s),
    }
}

pub fn format_percent(n: f64) -> String {
    format!("{}%", format_number(n, 2))
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
