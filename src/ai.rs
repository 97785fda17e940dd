//! Parsing for the AI collaborator's extraction payload. The network call
//! itself is external; this module consumes the returned JSON, tolerates the
//! loose typing the model produces (numbers as strings and vice versa), and
//! re-validates every field before it can reach the reconciliation merge.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::extract::dates::normalize_date;
use crate::extract::locations::{clean_location, extract_state};
use crate::extract::patterns::Patterns;
use crate::extract::pipeline::assemble;
use crate::extract::rates::clean_rate_amount;
use crate::model::{
    CommodityInfo, Currency, DocumentRecord, ExtractionMethod, HeaderInfo, NoteInfo, NoteType,
    RateInfo,
};
use crate::util::clean_text;

#[derive(Debug, Default, Deserialize)]
struct AiPayload {
    #[serde(default)]
    header: AiHeader,
    #[serde(default)]
    commodities: Vec<AiCommodity>,
    #[serde(default)]
    rates: Vec<AiRate>,
    #[serde(default)]
    notes: Vec<AiNote>,
    #[serde(default)]
    origin_info: String,
    #[serde(default)]
    destination_info: String,
    #[serde(default)]
    currency: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AiHeader {
    #[serde(default)]
    item_number: Option<Value>,
    #[serde(default)]
    revision: Option<Value>,
    #[serde(default)]
    cprs_number: Option<String>,
    #[serde(default)]
    issue_date: Option<String>,
    #[serde(default)]
    effective_date: Option<String>,
    #[serde(default)]
    expiration_date: Option<String>,
    #[serde(default)]
    change_description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AiCommodity {
    #[serde(default)]
    name: String,
    #[serde(default)]
    stcc_code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AiRate {
    #[serde(default)]
    origin: String,
    #[serde(default)]
    destination: String,
    #[serde(default)]
    origin_state: Option<String>,
    #[serde(default)]
    destination_state: Option<String>,
    #[serde(default)]
    rate_amount: Option<Value>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    rate_category: Option<String>,
    #[serde(default)]
    train_type: Option<String>,
    #[serde(default)]
    equipment_type: Option<String>,
    #[serde(default)]
    car_capacity_type: Option<String>,
    #[serde(default)]
    route_code: Option<String>,
    #[serde(default)]
    additional_provisions: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AiNote {
    #[serde(default, rename = "type")]
    note_type: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    text: String,
}

/// Parses the collaborator's JSON into a `DocumentRecord`. When the payload
/// is not valid JSON as a whole, a recovery pass retries on the substring
/// between the first `{` and the last `}` before giving up.
pub fn parse_ai_payload(
    patterns: &Patterns,
    raw: &str,
    source_name: &str,
) -> Option<DocumentRecord> {
    let payload = match serde_json::from_str::<AiPayload>(raw) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "AI payload is not valid JSON, attempting recovery");
            let recovered = recover_json_object(raw)?;
            match serde_json::from_str::<AiPayload>(recovered) {
                Ok(payload) => payload,
                Err(err) => {
                    warn!(error = %err, "AI payload recovery failed");
                    return None;
                }
            }
        }
    };

    Some(convert_payload(patterns, payload, source_name))
}

fn recover_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&raw[start..=end])
}

fn convert_payload(patterns: &Patterns, payload: AiPayload, source_name: &str) -> DocumentRecord {
    let currency = currency_from(payload.currency.as_deref());

    let header = HeaderInfo {
        item_number: value_to_string(payload.header.item_number),
        revision: value_to_u32(payload.header.revision),
        cprs_number: non_empty(payload.header.cprs_number),
        issue_date: renormalize_date(patterns, payload.header.issue_date),
        effective_date: renormalize_date(patterns, payload.header.effective_date),
        expiration_date: renormalize_date(patterns, payload.header.expiration_date),
        change_description: non_empty(payload.header.change_description)
            .map(|value| clean_text(&value, 500)),
    };

    let commodities: Vec<CommodityInfo> = payload
        .commodities
        .into_iter()
        .filter(|commodity| !commodity.name.trim().is_empty())
        .map(|commodity| CommodityInfo {
            name: clean_text(commodity.name.trim(), 100),
            stcc_code: non_empty(commodity.stcc_code)
                .map(|code| code.split_whitespace().collect::<String>()),
            description: clean_text(commodity.description.unwrap_or_default().trim(), 500),
        })
        .collect();

    let rates: Vec<RateInfo> = payload
        .rates
        .into_iter()
        .filter_map(|rate| convert_rate(rate, currency))
        .collect();

    let notes: Vec<NoteInfo> = payload
        .notes
        .into_iter()
        .filter(|note| note.text.trim().len() >= 3)
        .enumerate()
        .map(|(index, note)| NoteInfo {
            note_type: note_type_from(note.note_type.as_deref(), &note.text),
            code: note.code.unwrap_or_default().trim().to_string(),
            text: clean_text(note.text.trim(), 500),
            sort_order: index as i64,
        })
        .collect();

    assemble(
        header,
        commodities,
        rates,
        notes,
        clean_text(&payload.origin_info, 200),
        clean_text(&payload.destination_info, 200),
        currency,
        source_name,
        "",
        0,
        ExtractionMethod::AiEnhanced,
        true,
    )
}

fn convert_rate(rate: AiRate, document_currency: Currency) -> Option<RateInfo> {
    let origin = clean_location(&rate.origin);
    let destination = clean_location(&rate.destination);
    let amount = clean_rate_amount(&value_to_string(rate.rate_amount)?)?;

    if origin.is_empty() || destination.is_empty() {
        return None;
    }

    let currency = rate
        .currency
        .as_deref()
        .map(|value| currency_from(Some(value)))
        .unwrap_or(document_currency);

    let mut converted = RateInfo::new(origin, destination, amount, currency);
    converted.origin_state = non_empty(rate.origin_state)
        .map(|code| code.to_ascii_uppercase())
        .or_else(|| extract_state(&rate.origin));
    converted.destination_state = non_empty(rate.destination_state)
        .map(|code| code.to_ascii_uppercase())
        .or_else(|| extract_state(&rate.destination));
    converted.rate_category = non_empty(rate.rate_category);
    converted.train_type = non_empty(rate.train_type);
    converted.equipment_type = non_empty(rate.equipment_type);
    converted.car_capacity_type = non_empty(rate.car_capacity_type);
    converted.route_code = non_empty(rate.route_code);
    converted.additional_provisions = non_empty(rate.additional_provisions);
    Some(converted)
}

fn renormalize_date(patterns: &Patterns, raw: Option<String>) -> Option<String> {
    normalize_date(patterns, &raw?)
}

/// Maps the synonyms the model has been seen to emit onto the canonical
/// note types; single letters are the equipment-note codes (A -, B -, ...).
fn note_type_from(raw: Option<&str>, text: &str) -> NoteType {
    let raw = raw.unwrap_or("").trim().to_ascii_uppercase();
    match raw.as_str() {
        "NUMBERED" => NoteType::Numbered,
        "ASTERISK" | "STAR" | "*" => NoteType::Asterisk,
        "PROVISION" | "PROV" => NoteType::Provision,
        "EQUIPMENT" | "EQUIP" => NoteType::Equipment,
        single if single.len() == 1 && single.chars().all(|ch| ch.is_ascii_uppercase()) => {
            NoteType::Equipment
        }
        "GENERAL" | "NOTE" => NoteType::General,
        _ => infer_note_type(text),
    }
}

fn infer_note_type(text: &str) -> NoteType {
    let trimmed = text.trim();
    let upper = trimmed.to_ascii_uppercase();

    if trimmed.starts_with('*') {
        NoteType::Asterisk
    } else if trimmed
        .chars()
        .next()
        .is_some_and(|ch| ch.is_ascii_digit())
    {
        NoteType::Numbered
    } else if ["EQUIPMENT", "CAR", "HOPPER"]
        .iter()
        .any(|keyword| upper.contains(keyword))
    {
        NoteType::Equipment
    } else if ["RATE", "CHARGE", "PROVISION"]
        .iter()
        .any(|keyword| upper.contains(keyword))
    {
        NoteType::Provision
    } else {
        NoteType::General
    }
}

fn currency_from(raw: Option<&str>) -> Currency {
    match raw.map(str::trim).map(str::to_ascii_uppercase).as_deref() {
        Some("CAD") | Some("CDN") | Some("CANADIAN") => Currency::Cad,
        _ => Currency::Usd,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn value_to_string(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(text) => {
            let trimmed = text.trim().to_string();
            (!trimmed.is_empty()).then_some(trimmed)
        }
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn value_to_u32(value: Option<Value>) -> Option<u32> {
    match value? {
        Value::String(text) => text.trim().parse::<u32>().ok(),
        Value::Number(number) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
        _ => None,
    }
}
