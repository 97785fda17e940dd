use chrono::NaiveDate;
use regex::Regex;

use super::patterns::Patterns;

/// Normalizes the date formats seen in tariff headers to ISO `YYYY-MM-DD`.
/// The cascade tries month-name forms first (`JUL 22, 2024`, `JUL 22 2024`,
/// `JUL-22-2024`), then `MM/DD/YYYY`, `YYYY-MM-DD`, and `MM-DD-YYYY`; a
/// pattern whose components do not form a real calendar date is rejected and
/// the next one tried.
pub fn normalize_date(patterns: &Patterns, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Some(date) = try_month_name(&patterns.date_month_name, raw) {
        return Some(date);
    }

    if let Some(date) = try_numeric(&patterns.date_slash, raw, NumericOrder::MonthDayYear) {
        return Some(date);
    }

    if let Some(date) = try_numeric(&patterns.date_iso, raw, NumericOrder::YearMonthDay) {
        return Some(date);
    }

    try_numeric(&patterns.date_dash_numeric, raw, NumericOrder::MonthDayYear)
}

#[derive(Clone, Copy)]
enum NumericOrder {
    MonthDayYear,
    YearMonthDay,
}

fn try_month_name(pattern: &Regex, raw: &str) -> Option<String> {
    let captures = pattern.captures(raw)?;
    let month = month_number(captures.get(1)?.as_str())?;
    let day = captures.get(2)?.as_str().parse::<u32>().ok()?;
    let year = captures.get(3)?.as_str().parse::<i32>().ok()?;
    format_valid(year, month, day)
}

fn try_numeric(pattern: &Regex, raw: &str, order: NumericOrder) -> Option<String> {
    let captures = pattern.captures(raw)?;
    let first = captures.get(1)?.as_str().parse::<u32>().ok()?;
    let second = captures.get(2)?.as_str().parse::<u32>().ok()?;
    let third = captures.get(3)?.as_str().parse::<u32>().ok()?;

    let (year, month, day) = match order {
        NumericOrder::MonthDayYear => (third as i32, first, second),
        NumericOrder::YearMonthDay => (first as i32, second, third),
    };

    format_valid(year, month, day)
}

fn format_valid(year: i32, month: u32, day: u32) -> Option<String> {
    NaiveDate::from_ymd_opt(year, month, day)
        .map(|date| date.format("%Y-%m-%d").to_string())
}

fn month_number(abbrev: &str) -> Option<u32> {
    match abbrev.to_ascii_uppercase().as_str() {
        "JAN" => Some(1),
        "FEB" => Some(2),
        "MAR" => Some(3),
        "APR" => Some(4),
        "MAY" => Some(5),
        "JUN" => Some(6),
        "JUL" => Some(7),
        "AUG" => Some(8),
        "SEP" => Some(9),
        "OCT" => Some(10),
        "NOV" => Some(11),
        "DEC" => Some(12),
        _ => None,
    }
}
