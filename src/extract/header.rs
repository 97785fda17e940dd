use regex::Regex;
use tracing::warn;

use crate::model::HeaderInfo;
use crate::util::clean_text;

use super::dates::normalize_date;
use super::patterns::Patterns;

/// Runs each field's pattern cascade against the full text; the first match
/// wins and unmatched fields stay `None` so the reconciliation merge can
/// fill them from a parallel extraction.
pub fn extract_header(patterns: &Patterns, text: &str) -> HeaderInfo {
    let mut header = HeaderInfo {
        item_number: first_match(&patterns.item_number, text),
        revision: None,
        cprs_number: first_match(&patterns.cprs_number, text),
        issue_date: date_field(patterns, &patterns.issue_date, text, "issue_date"),
        effective_date: date_field(patterns, &patterns.effective_date, text, "effective_date"),
        expiration_date: date_field(patterns, &patterns.expiration_date, text, "expiration_date"),
        change_description: first_match(&patterns.change_description, text)
            .map(|value| clean_text(&value, 500)),
    };

    if let Some(raw) = first_match(&patterns.revision, text) {
        match raw.parse::<u32>() {
            Ok(revision) => header.revision = Some(revision),
            // Omitted rather than defaulted to 0: an absent revision and
            // revision zero mean different things downstream.
            Err(_) => warn!(value = %raw, "unparseable revision, omitting"),
        }
    }

    header
}

fn first_match(cascade: &[Regex], text: &str) -> Option<String> {
    for pattern in cascade {
        if let Some(captures) = pattern.captures(text) {
            if let Some(value) = captures.get(1) {
                let trimmed = value.as_str().trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
    }
    None
}

fn date_field(
    patterns: &Patterns,
    cascade: &[Regex],
    text: &str,
    field: &'static str,
) -> Option<String> {
    let raw = first_match(cascade, text)?;
    let normalized = normalize_date(patterns, &raw);
    if normalized.is_none() {
        warn!(field, value = %raw, "unrecognized date format, omitting");
    }
    normalized
}
