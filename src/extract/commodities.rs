use crate::model::CommodityInfo;
use crate::util::clean_text;

use super::patterns::Patterns;

const COMMODITY_KEYWORDS: [&str; 11] = [
    "WHEAT",
    "GRAIN",
    "CORN",
    "SOYBEAN",
    "BARLEY",
    "CANOLA",
    "FEED",
    "FLOUR",
    "MEAL",
    "BRAN",
    "SCREENINGS",
];

/// STCC-coded lines first, then bare commodity keywords. A keyword entry is
/// added only when no STCC-derived entry already carries the same name, so
/// the two code paths never produce duplicates.
pub fn extract_commodities(patterns: &Patterns, text: &str) -> Vec<CommodityInfo> {
    let mut commodities = Vec::<CommodityInfo>::new();

    for code_match in patterns.stcc.find_iter(text) {
        let code = code_match.as_str();
        let Some(line) = containing_line(text, code) else {
            continue;
        };

        let name = line.replace(code, " ");
        let name = name
            .trim_matches(|ch: char| !ch.is_ascii_alphanumeric())
            .trim()
            .to_string();

        if name.len() > 3 && !has_name(&commodities, &name) {
            commodities.push(CommodityInfo {
                name: clean_text(&name, 100),
                stcc_code: Some(code.split_whitespace().collect::<String>()),
                description: clean_text(line.trim(), 500),
            });
        }
    }

    let upper = text.to_ascii_uppercase();
    for keyword in COMMODITY_KEYWORDS {
        if upper.contains(keyword) && !name_mentions(&commodities, keyword) {
            commodities.push(CommodityInfo {
                name: keyword.to_string(),
                stcc_code: None,
                description: format!("{keyword} commodity"),
            });
        }
    }

    commodities
}

fn containing_line<'a>(text: &'a str, needle: &str) -> Option<&'a str> {
    text.lines().find(|line| line.contains(needle))
}

fn has_name(commodities: &[CommodityInfo], name: &str) -> bool {
    commodities
        .iter()
        .any(|commodity| commodity.name.eq_ignore_ascii_case(name))
}

// Substring check, so an STCC line naming "WHEAT FLOUR" also suppresses the
// bare WHEAT and FLOUR keywords.
fn name_mentions(commodities: &[CommodityInfo], keyword: &str) -> bool {
    commodities
        .iter()
        .any(|commodity| commodity.name.to_ascii_uppercase().contains(keyword))
}
