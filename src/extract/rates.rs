use std::collections::HashSet;

use tracing::debug;

use crate::model::{Currency, RateInfo};

use super::locations::{clean_location, extract_state};
use super::patterns::Patterns;

/// Lines considered part of a rate's context: the amount's own line plus this
/// many neighbors on each side.
const CONTEXT_WINDOW: usize = 3;

/// Candidate origins/destinations carrying any of these tokens are table
/// furniture, not places.
const LOCATION_STOPLIST: [&str; 11] = [
    "RATE",
    "CHARGE",
    "ADDITIONAL",
    "PROVISIONS",
    "LOW",
    "HIGH",
    "CAP",
    "TRAIN",
    "CAR",
    "EQUIPMENT",
    "SERVICE",
];

const TRAIN_TYPES: [&str; 7] = [
    "SINGLE CAR",
    "UNIT TRAIN",
    "SPLIT TRAIN",
    "25 CAR",
    "50 CAR",
    "100 CAR",
    "134 CAR",
];

const EQUIPMENT_TYPES: [&str; 4] = ["COVERED HOPPER", "GONDOLA", "TANK CAR", "BOXCAR"];

/// Text-mode rate extraction: every monetary amount is paired with the most
/// specific origin/destination the surrounding context window yields, then
/// validated and deduplicated. A malformed line never aborts the scan.
pub fn extract_rates_from_text(
    patterns: &Patterns,
    text: &str,
    currency: Currency,
) -> Vec<RateInfo> {
    let lines: Vec<&str> = text.lines().collect();
    let mut rates = Vec::<RateInfo>::new();

    for (index, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.len() < 10 {
            continue;
        }
        if !trimmed.contains('$') && !patterns.amount_decimal.is_match(trimmed) {
            continue;
        }

        let window = context_window(&lines, index);

        for amount in line_amounts(patterns, trimmed) {
            let Some(amount) = clean_rate_amount(&amount) else {
                continue;
            };

            let Some((origin, destination)) = locate_pair(patterns, &window, trimmed) else {
                debug!(line = %trimmed, "amount without a plausible location pair");
                continue;
            };

            let mut rate = RateInfo::new(
                clean_location(&origin),
                clean_location(&destination),
                amount,
                currency,
            );
            rate.origin_state = extract_state(&origin);
            rate.destination_state = extract_state(&destination);
            rate.train_type = keyword_in(&window, &TRAIN_TYPES);
            rate.equipment_type = keyword_in(&window, &EQUIPMENT_TYPES);
            rate.car_capacity_type = capacity_type(&window);
            rate.route_code = route_code(patterns, &window);

            if !rate.origin.is_empty() && !rate.destination.is_empty() {
                rates.push(rate);
            }
        }
    }

    dedup_rates(rates)
}

/// Drops any rate whose (origin, destination, amount) triple was already
/// seen; first occurrence wins. Running this on its own output is a no-op.
pub fn dedup_rates(rates: Vec<RateInfo>) -> Vec<RateInfo> {
    let mut seen = HashSet::<(String, String, String)>::new();
    rates
        .into_iter()
        .filter(|rate| {
            seen.insert((
                rate.origin.to_ascii_uppercase(),
                rate.destination.to_ascii_uppercase(),
                rate.rate_amount.clone(),
            ))
        })
        .collect()
}

/// Strips currency symbols and thousands separators and parses the result
/// as a decimal number, with no range check.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '.')
        .collect();
    cleaned.parse::<f64>().ok()
}

/// Parses via [`parse_amount`], then accepts only amounts in
/// (0.01, 10000.00], rendered with two decimals.
pub fn clean_rate_amount(raw: &str) -> Option<String> {
    let value = parse_amount(raw)?;
    if value > 0.01 && value <= 10000.0 {
        Some(format!("{value:.2}"))
    } else {
        None
    }
}

fn context_window(lines: &[&str], index: usize) -> String {
    let start = index.saturating_sub(CONTEXT_WINDOW);
    let end = (index + CONTEXT_WINDOW + 1).min(lines.len());
    lines[start..end].join("\n")
}

fn line_amounts(patterns: &Patterns, line: &str) -> Vec<String> {
    let mut amounts = Vec::<String>::new();

    for captures in patterns.amount_decimal.captures_iter(line) {
        if let Some(value) = captures.get(1) {
            amounts.push(value.as_str().to_string());
        }
    }

    // Dollar-prefixed integers ($950, $1,250) only; a bare integer is more
    // often an item number or a car count than a rate. Integers followed by
    // `,` or `.` are the leading digits of a larger amount and belong to the
    // decimal pattern, never a match of their own.
    for captures in patterns.amount_dollar_int.captures_iter(line) {
        if let Some(value) = captures.get(1) {
            amounts.push(value.as_str().to_string());
        }
    }

    amounts
}

/// Location-pair cascade: explicit `CITY ST to CITY ST`, then the comma
/// variant, then the first two state-suffixed phrases, then a bare `TO`
/// split. The amount's own line is searched before the wider window so a
/// neighboring rate line cannot steal the pair.
fn locate_pair(patterns: &Patterns, window: &str, line: &str) -> Option<(String, String)> {
    for scope in [line, window] {
        if let Some(pair) = pair_in_scope(patterns, scope) {
            return Some(pair);
        }
    }

    let upper = line.to_ascii_uppercase();
    if let Some(split) = upper.find(" TO ") {
        let origin = normalize_ws(&line[..split]);
        let destination = strip_amount_tail(&normalize_ws(&line[split + 4..]));
        let pair = (origin, destination);
        if plausible_pair(&pair) {
            return Some(pair);
        }
    }

    None
}

// Each pattern's matches are walked in order and the first plausible pair
// wins; an early match spanning table furniture must not mask a clean pair
// later in the scope.
fn pair_in_scope(patterns: &Patterns, scope: &str) -> Option<(String, String)> {
    for pattern in [&patterns.pair_city_state, &patterns.pair_city_comma_state] {
        for captures in pattern.captures_iter(scope) {
            let pair = (normalize_ws(&captures[1]), normalize_ws(&captures[2]));
            if plausible_pair(&pair) {
                return Some(pair);
            }
        }
    }

    for captures in patterns.pair_adjacent.captures_iter(scope) {
        let pair = (normalize_ws(&captures[1]), normalize_ws(&captures[2]));
        if plausible_pair(&pair) && pair.0 != pair.1 {
            return Some(pair);
        }
    }

    None
}

fn plausible_pair(pair: &(String, String)) -> bool {
    plausible_location(&pair.0) && plausible_location(&pair.1)
}

fn plausible_location(candidate: &str) -> bool {
    if candidate.len() < 4 {
        return false;
    }
    if !candidate.chars().any(|ch| ch.is_ascii_alphabetic()) {
        return false;
    }

    let upper = candidate.to_ascii_uppercase();
    !LOCATION_STOPLIST.iter().any(|stop| upper.contains(stop))
}

fn normalize_ws(value: &str) -> String {
    value.split_whitespace().collect::<Vec<&str>>().join(" ")
}

fn strip_amount_tail(value: &str) -> String {
    let mut kept = Vec::<&str>::new();
    for token in value.split_whitespace() {
        if token.starts_with('$') || token.chars().all(|ch| ch.is_ascii_digit() || ch == '.' || ch == ',') {
            break;
        }
        kept.push(token);
    }
    kept.join(" ")
}

fn keyword_in(window: &str, keywords: &[&'static str]) -> Option<String> {
    let upper = window.to_ascii_uppercase();
    keywords
        .iter()
        .find(|keyword| upper.contains(*keyword))
        .map(|keyword| (*keyword).to_string())
}

fn capacity_type(window: &str) -> Option<String> {
    let upper = window.to_ascii_uppercase();
    if upper.contains("HIGH CAP") {
        Some("HIGH CAP".to_string())
    } else if upper.contains("LOW CAP") {
        Some("LOW CAP".to_string())
    } else {
        None
    }
}

fn route_code(patterns: &Patterns, window: &str) -> Option<String> {
    if let Some(captures) = patterns.route_cp.captures(window) {
        return Some(format!("CP{}", &captures[1]));
    }
    if let Some(captures) = patterns.route_keyword.captures(window) {
        return Some(captures[1].to_string());
    }
    patterns
        .route_bare
        .captures(window)
        .map(|captures| captures[1].to_string())
}
