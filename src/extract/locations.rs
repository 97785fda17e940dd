use crate::util::{clean_text, truncate_chars};

use super::patterns::Patterns;

/// Two-letter codes accepted as a rate's state/province: 13 Canadian
/// provinces and territories followed by the 50 US states.
pub const STATE_PROVINCE_CODES: [&str; 63] = [
    "AB", "BC", "MB", "NB", "NL", "NS", "NT", "NU", "ON", "PE", "QC", "SK", "YT", // Canada
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ",
    "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT",
    "VA", "WA", "WV", "WI", "WY",
];

/// First whitespace token that is a known state/province code wins. Strings
/// naming more than one jurisdiction therefore resolve to the earliest
/// occurrence, which can misattribute the state for odd multi-state inputs.
pub fn extract_state(location: &str) -> Option<String> {
    location
        .split_whitespace()
        .map(|token| token.trim_matches(|ch: char| !ch.is_ascii_alphabetic()))
        .map(str::to_ascii_uppercase)
        .find(|token| STATE_PROVINCE_CODES.contains(&token.as_str()))
}

/// Strips OCR artifacts from a location string, collapsing whitespace and
/// capping the stored length. Casing is left exactly as the OCR produced it.
pub fn clean_location(location: &str) -> String {
    truncate_chars(&clean_text(location, 200), 50)
}

/// Document-level route summary: labeled ORIGIN/DESTINATION lines first,
/// then a FROM ... TO ... sentence as the fallback.
pub fn extract_route_summary(patterns: &Patterns, text: &str) -> (String, String) {
    let mut origin = first_capture(&patterns.origin_line, text);
    let mut destination = first_capture(&patterns.destination_line, text);

    if origin.is_empty() || destination.is_empty() {
        if let Some(captures) = patterns.from_to_sentence.captures(text) {
            if origin.is_empty() {
                origin = clean_text(captures.get(1).map_or("", |m| m.as_str()), 200);
            }
            if destination.is_empty() {
                destination = clean_text(captures.get(2).map_or("", |m| m.as_str()), 200);
            }
        }
    }

    (origin, destination)
}

fn first_capture(cascade: &[regex::Regex], text: &str) -> String {
    for pattern in cascade {
        if let Some(captures) = pattern.captures(text) {
            if let Some(value) = captures.get(1) {
                let cleaned = clean_text(value.as_str(), 200);
                if !cleaned.is_empty() {
                    return cleaned;
                }
            }
        }
    }
    String::new()
}
