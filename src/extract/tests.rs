use super::commodities::extract_commodities;
use super::dates::normalize_date;
use super::header::extract_header;
use super::locations::{extract_route_summary, extract_state};
use super::merge::merge;
use super::notes::extract_notes;
use super::patterns::Patterns;
use super::pipeline::{AiOutcome, DocumentInput, DocumentSource, TariffPipeline, detect_currency};
use super::rates::{clean_rate_amount, dedup_rates, extract_rates_from_text, parse_amount};
use super::tables::extract_rates_from_table;
use crate::model::{Currency, NoteInfo, NoteType, RateInfo};

fn patterns() -> Patterns {
    Patterns::compile().expect("patterns compile")
}

fn source() -> DocumentSource {
    DocumentSource {
        name: "sample.pdf".to_string(),
        size_bytes: 1024,
    }
}

#[test]
fn normalize_date_equates_all_source_formats() {
    let patterns = patterns();
    for raw in [
        "JUL 22, 2024",
        "JUL 22 2024",
        "JUL-22-2024",
        "jul 22, 2024",
        "07/22/2024",
        "2024-07-22",
        "07-22-2024",
    ] {
        assert_eq!(
            normalize_date(&patterns, raw).as_deref(),
            Some("2024-07-22"),
            "format: {raw}"
        );
    }
}

#[test]
fn normalize_date_rejects_invalid_components_without_panicking() {
    let patterns = patterns();
    assert_eq!(normalize_date(&patterns, "FOO 99, 9999"), None);
    assert_eq!(normalize_date(&patterns, "FEB 30, 2024"), None);
    assert_eq!(normalize_date(&patterns, "13/45/2024"), None);
    assert_eq!(normalize_date(&patterns, ""), None);
    assert_eq!(normalize_date(&patterns, "no date here"), None);
}

#[test]
fn normalize_date_single_digit_day_is_zero_padded() {
    let patterns = patterns();
    assert_eq!(
        normalize_date(&patterns, "JAN 1, 2025").as_deref(),
        Some("2025-01-01")
    );
    assert_eq!(
        normalize_date(&patterns, "1/9/2025").as_deref(),
        Some("2025-01-09")
    );
}

#[test]
fn extract_state_finds_known_codes() {
    assert_eq!(extract_state("VANCOUVER BC").as_deref(), Some("BC"));
    assert_eq!(extract_state("CHICAGO, IL").as_deref(), Some("IL"));
    assert_eq!(extract_state("minneapolis mn").as_deref(), Some("MN"));
    assert_eq!(extract_state("UNKNOWN CITY"), None);
    assert_eq!(extract_state(""), None);
}

// First-match resolution is a known limitation: a leading token that happens
// to be a state code wins over the real state later in the string.
#[test]
fn extract_state_first_matching_token_wins_even_when_ambiguous() {
    assert_eq!(extract_state("LA CROSSE WI").as_deref(), Some("LA"));
}

#[test]
fn extract_header_pulls_all_fields() {
    let patterns = patterns();
    let text = "CANADIAN PACIFIC RAILWAY\nITEM: 70001 REVISION: 5\nCPRS 1234-A\nISSUED: JUL 22, 2024\nEFFECTIVE: AUG 01, 2024\nEXPIRES: JUL 31, 2025\nCHANGE: Rate increase on all lanes\n";

    let header = extract_header(&patterns, text);
    assert_eq!(header.item_number.as_deref(), Some("70001"));
    assert_eq!(header.revision, Some(5));
    assert_eq!(header.cprs_number.as_deref(), Some("1234-A"));
    assert_eq!(header.issue_date.as_deref(), Some("2024-07-22"));
    assert_eq!(header.effective_date.as_deref(), Some("2024-08-01"));
    assert_eq!(header.expiration_date.as_deref(), Some("2025-07-31"));
    assert_eq!(
        header.change_description.as_deref(),
        Some("Rate increase on all lanes")
    );
}

#[test]
fn extract_header_leaves_unmatched_fields_absent() {
    let patterns = patterns();
    let header = extract_header(&patterns, "nothing that looks like a tariff header");

    assert_eq!(header.item_number, None);
    assert_eq!(header.revision, None);
    assert_eq!(header.cprs_number, None);
    assert_eq!(header.issue_date, None);
}

#[test]
fn extract_header_omits_unparseable_revision() {
    let patterns = patterns();
    let header = extract_header(&patterns, "ITEM: 70001 REVISION: 99999999999");

    assert_eq!(header.item_number.as_deref(), Some("70001"));
    assert_eq!(header.revision, None);
}

#[test]
fn extract_header_omits_malformed_dates() {
    let patterns = patterns();
    let header = extract_header(&patterns, "ITEM: 70001\nISSUED: FOO 99, 9999\n");

    assert_eq!(header.item_number.as_deref(), Some("70001"));
    assert_eq!(header.issue_date, None);
}

#[test]
fn extract_commodities_parses_stcc_line() {
    let patterns = patterns();
    let text = "WHEAT                                    01 137 00\n";

    let commodities = extract_commodities(&patterns, text);
    assert_eq!(commodities.len(), 1);
    assert!(commodities[0].name.contains("WHEAT"));
    assert_eq!(commodities[0].stcc_code.as_deref(), Some("0113700"));
}

#[test]
fn extract_commodities_keyword_fallback_has_no_code() {
    let patterns = patterns();
    let commodities = extract_commodities(&patterns, "Applies on CORN shipments only\n");

    assert_eq!(commodities.len(), 1);
    assert_eq!(commodities[0].name, "CORN");
    assert_eq!(commodities[0].stcc_code, None);
    assert_eq!(commodities[0].description, "CORN commodity");
}

#[test]
fn extract_commodities_keyword_suppressed_by_stcc_entry() {
    let patterns = patterns();
    let text = "WHEAT FLOUR                              01 144 10\n";

    let commodities = extract_commodities(&patterns, text);
    let wheat_entries = commodities
        .iter()
        .filter(|commodity| commodity.name.to_ascii_uppercase().contains("WHEAT"))
        .count();
    assert_eq!(wheat_entries, 1);
    assert!(
        !commodities
            .iter()
            .any(|commodity| commodity.name == "FLOUR")
    );
}

#[test]
fn extract_rates_pairs_amount_with_to_pattern() {
    let patterns = patterns();
    let text = "VANCOUVER BC to CHICAGO IL $52.75\n";

    let rates = extract_rates_from_text(&patterns, text, Currency::Usd);
    assert_eq!(rates.len(), 1);
    assert!(rates[0].origin.contains("VANCOUVER"));
    assert!(rates[0].destination.contains("CHICAGO"));
    assert_eq!(rates[0].rate_amount, "52.75");
    assert_eq!(rates[0].origin_state.as_deref(), Some("BC"));
    assert_eq!(rates[0].destination_state.as_deref(), Some("IL"));
}

#[test]
fn extract_rates_handles_adjacent_pair_without_to() {
    let patterns = patterns();
    let text = "CALGARY AB   MINNEAPOLIS MN   61.20\n";

    let rates = extract_rates_from_text(&patterns, text, Currency::Usd);
    assert_eq!(rates.len(), 1);
    assert!(rates[0].origin.contains("CALGARY"));
    assert!(rates[0].destination.contains("MINNEAPOLIS"));
    assert_eq!(rates[0].rate_amount, "61.20");
}

#[test]
fn extract_rates_never_returns_invalid_entries() {
    let patterns = patterns();
    let text = "RATE CHARGE TABLE $52.75\nVANCOUVER BC to CHICAGO IL $0.00\nVANCOUVER BC to CHICAGO IL $99999.99\nLOW CAP HIGH CAP $44.10\n";

    let rates = extract_rates_from_text(&patterns, text, Currency::Usd);
    for rate in &rates {
        assert!(!rate.origin.is_empty());
        assert!(!rate.destination.is_empty());
        let amount = rate.rate_amount.parse::<f64>().expect("amount parses");
        assert!(amount > 0.01 && amount <= 10000.0);
    }
}

#[test]
fn extract_rates_classifies_service_attributes_from_context() {
    let patterns = patterns();
    let text = "UNIT TRAIN - HIGH CAP COVERED HOPPER - ROUTE: 0412\nVANCOUVER BC to CHICAGO IL $52.75\n";

    let rates = extract_rates_from_text(&patterns, text, Currency::Usd);
    assert_eq!(rates.len(), 1);
    assert_eq!(rates[0].train_type.as_deref(), Some("UNIT TRAIN"));
    assert_eq!(rates[0].car_capacity_type.as_deref(), Some("HIGH CAP"));
    assert_eq!(rates[0].equipment_type.as_deref(), Some("COVERED HOPPER"));
    assert_eq!(rates[0].route_code.as_deref(), Some("0412"));
}

#[test]
fn extract_rates_prefers_cp_route_codes() {
    let patterns = patterns();
    let text = "CP0412 via ROUTE: 9999\nVANCOUVER BC to CHICAGO IL $52.75\n";

    let rates = extract_rates_from_text(&patterns, text, Currency::Usd);
    assert_eq!(rates[0].route_code.as_deref(), Some("CP0412"));
}

#[test]
fn comma_grouped_decimal_amount_yields_a_single_rate() {
    let patterns = patterns();
    let text = "VANCOUVER BC to CHICAGO IL $1,250.50\n";

    let rates = extract_rates_from_text(&patterns, text, Currency::Usd);
    let amounts: Vec<&str> = rates.iter().map(|rate| rate.rate_amount.as_str()).collect();
    assert_eq!(amounts, vec!["1250.50"]);
}

#[test]
fn dollar_integer_with_thousands_separator_is_kept() {
    let patterns = patterns();
    let text = "CALGARY AB to MINNEAPOLIS MN $1,250 per car\n";

    let rates = extract_rates_from_text(&patterns, text, Currency::Usd);
    let amounts: Vec<&str> = rates.iter().map(|rate| rate.rate_amount.as_str()).collect();
    assert_eq!(amounts, vec!["1250.00"]);
}

#[test]
fn pair_search_skips_implausible_leading_match_in_window() {
    let patterns = patterns();
    let text = "CHARGE GROUPS AB to SERVICE AREA ON\nVANCOUVER BC to CHICAGO IL\nRate per car is $52.75 for this lane\n";

    let rates = extract_rates_from_text(&patterns, text, Currency::Usd);
    assert_eq!(rates.len(), 1);
    assert!(rates[0].origin.contains("VANCOUVER"));
    assert!(rates[0].destination.contains("CHICAGO"));
    assert_eq!(rates[0].rate_amount, "52.75");
}

#[test]
fn extract_rates_deduplicates_repeated_triples() {
    let patterns = patterns();
    let text = "VANCOUVER BC to CHICAGO IL $52.75\nVANCOUVER BC to CHICAGO IL $52.75\nVANCOUVER BC to CHICAGO IL $61.20\n";

    let rates = extract_rates_from_text(&patterns, text, Currency::Usd);
    let amounts: Vec<&str> = rates.iter().map(|rate| rate.rate_amount.as_str()).collect();
    assert_eq!(amounts, vec!["52.75", "61.20"]);
}

#[test]
fn dedup_rates_is_idempotent() {
    let mut rates = Vec::new();
    for amount in ["52.75", "52.75", "61.20"] {
        rates.push(RateInfo::new(
            "VANCOUVER BC".to_string(),
            "CHICAGO IL".to_string(),
            amount.to_string(),
            Currency::Usd,
        ));
    }

    let once = dedup_rates(rates);
    let twice = dedup_rates(once.clone());
    assert_eq!(once, twice);
    assert_eq!(once.len(), 2);
}

#[test]
fn clean_rate_amount_enforces_range_and_formatting() {
    assert_eq!(clean_rate_amount("$52.75").as_deref(), Some("52.75"));
    assert_eq!(clean_rate_amount("1,250.5").as_deref(), Some("1250.50"));
    assert_eq!(clean_rate_amount("$950").as_deref(), Some("950.00"));
    assert_eq!(clean_rate_amount("0.00"), None);
    assert_eq!(clean_rate_amount("0.01"), None);
    assert_eq!(clean_rate_amount("10000.00").as_deref(), Some("10000.00"));
    assert_eq!(clean_rate_amount("10000.01"), None);
    assert_eq!(clean_rate_amount("not a number"), None);
}

#[test]
fn table_mode_extracts_rates_with_full_confidence() {
    let patterns = patterns();
    let rows = vec![
        vec![
            "ORIGIN".to_string(),
            "DESTINATION".to_string(),
            "RATE".to_string(),
        ],
        vec![
            "VANCOUVER BC".to_string(),
            "CHICAGO IL".to_string(),
            "52.75".to_string(),
        ],
        vec![
            "CALGARY AB".to_string(),
            "MINNEAPOLIS MN".to_string(),
            "61.20".to_string(),
        ],
    ];

    let table = extract_rates_from_table(&patterns, &rows, Currency::Usd);
    assert_eq!(table.rates.len(), 2);
    assert_eq!(table.confidence, 1.0);
    assert_eq!(table.rates[0].origin_state.as_deref(), Some("BC"));
    assert_eq!(table.rates[1].rate_amount, "61.20");
}

#[test]
fn table_mode_tags_category_columns_from_header_letters() {
    let patterns = patterns();
    let rows = vec![
        vec![
            "ORIGIN".to_string(),
            "DESTINATION".to_string(),
            "A".to_string(),
            "B".to_string(),
        ],
        vec![
            "VANCOUVER BC".to_string(),
            "CHICAGO IL".to_string(),
            "52.75".to_string(),
            "58.10".to_string(),
        ],
    ];

    let table = extract_rates_from_table(&patterns, &rows, Currency::Usd);
    assert_eq!(table.rates.len(), 2);
    assert_eq!(table.rates[0].rate_category.as_deref(), Some("A"));
    assert_eq!(table.rates[1].rate_category.as_deref(), Some("B"));
}

#[test]
fn table_mode_splits_flat_rows_and_stops_at_section_header() {
    let patterns = patterns();
    let rows = vec![
        vec!["ORIGIN  DESTINATION  RATE".to_string()],
        vec!["VANCOUVER BC  CHICAGO IL  52.75".to_string()],
        vec!["NOTES".to_string()],
        vec!["CALGARY AB  MINNEAPOLIS MN  61.20".to_string()],
    ];

    let table = extract_rates_from_table(&patterns, &rows, Currency::Usd);
    assert_eq!(table.rates.len(), 1);
    assert!(table.rates[0].origin.contains("VANCOUVER"));
}

#[test]
fn table_mode_confidence_degrades_with_missing_rates() {
    let patterns = patterns();
    let rows = vec![
        vec![
            "ORIGIN".to_string(),
            "DESTINATION".to_string(),
            "RATE".to_string(),
        ],
        vec![
            "VANCOUVER BC".to_string(),
            "CHICAGO IL".to_string(),
            "52.75".to_string(),
        ],
        vec![
            "CALGARY AB".to_string(),
            "MINNEAPOLIS MN".to_string(),
            String::new(),
        ],
        vec![
            "WINNIPEG MB".to_string(),
            "KANSAS CITY MO".to_string(),
            String::new(),
        ],
    ];

    let table = extract_rates_from_table(&patterns, &rows, Currency::Usd);
    assert_eq!(table.rates.len(), 1);
    assert!(table.confidence < 1.0);
    assert!(table.confidence > 0.0);
}

#[test]
fn parse_amount_has_no_range_check() {
    assert_eq!(parse_amount("99999.00"), Some(99999.0));
    assert_eq!(parse_amount("$0.00"), Some(0.0));
    assert_eq!(parse_amount("not a number"), None);
}

// A well-formed but out-of-range value is still a parsed rate cell for the
// confidence score, even though no rate is emitted for it.
#[test]
fn table_mode_out_of_range_decimal_still_counts_as_parsed() {
    let patterns = patterns();
    let rows = vec![
        vec![
            "ORIGIN".to_string(),
            "DESTINATION".to_string(),
            "RATE".to_string(),
        ],
        vec![
            "VANCOUVER BC".to_string(),
            "CHICAGO IL".to_string(),
            "52.75".to_string(),
        ],
        vec![
            "CALGARY AB".to_string(),
            "MINNEAPOLIS MN".to_string(),
            "99999.00".to_string(),
        ],
    ];

    let table = extract_rates_from_table(&patterns, &rows, Currency::Usd);
    assert_eq!(table.rates.len(), 1);
    assert_eq!(table.rates[0].rate_amount, "52.75");
    assert_eq!(table.confidence, 1.0);
}

#[test]
fn table_mode_without_header_row_yields_nothing() {
    let patterns = patterns();
    let rows = vec![vec![
        "VANCOUVER BC".to_string(),
        "CHICAGO IL".to_string(),
        "52.75".to_string(),
    ]];

    let table = extract_rates_from_table(&patterns, &rows, Currency::Usd);
    assert!(table.rates.is_empty());
    assert_eq!(table.confidence, 0.0);
}

#[test]
fn extract_notes_classifies_by_priority_order() {
    let patterns = patterns();
    let text = "1. Rates are in US Dollars per car.\n* Applies on shipper-owned equipment.\nA - 100 ton covered hopper cars required.\nSubject to minimum weight of 194,000 lbs.\nRates apply via direct routes on carload traffic.\nshort\n";

    let notes = extract_notes(&patterns, text);
    assert_eq!(notes.len(), 5);

    assert_eq!(notes[0].note_type, NoteType::Numbered);
    assert_eq!(notes[0].code, "1");
    assert!(notes[0].text.contains("US Dollars"));

    assert_eq!(notes[1].note_type, NoteType::Asterisk);
    assert_eq!(notes[1].code, "*");

    assert_eq!(notes[2].note_type, NoteType::Equipment);
    assert_eq!(notes[2].code, "A");

    assert_eq!(notes[3].note_type, NoteType::Provision);
    assert_eq!(notes[4].note_type, NoteType::General);
}

#[test]
fn extract_notes_sort_order_is_strictly_increasing() {
    let patterns = patterns();
    let text = "1. First provision applies.\n2. Second provision applies.\n* Asterisk note on equipment.\n";

    let notes = extract_notes(&patterns, text);
    let orders: Vec<i64> = notes.iter().map(|note| note.sort_order).collect();
    assert_eq!(orders, vec![0, 1, 2]);
}

#[test]
fn extract_notes_skips_header_marker_lines() {
    let patterns = patterns();
    let text = "Subject to change, see ITEM: 70002 for details\n";

    let notes = extract_notes(&patterns, text);
    assert!(notes.is_empty());
}

#[test]
fn extract_notes_drops_unclassified_lines() {
    let patterns = patterns();
    let notes = extract_notes(&patterns, "CANADIAN PACIFIC RAILWAY COMPANY\n");
    assert!(notes.is_empty());
}

#[test]
fn detect_currency_defaults_to_usd() {
    let patterns = patterns();
    assert_eq!(
        detect_currency(&patterns, "Rates in US Dollars"),
        Currency::Usd
    );
    assert_eq!(
        detect_currency(&patterns, "All charges in CANADIAN funds"),
        Currency::Cad
    );
    assert_eq!(detect_currency(&patterns, "CDN currency applies"), Currency::Cad);
}

#[test]
fn extract_route_summary_prefers_labeled_lines() {
    let patterns = patterns();
    let text = "ORIGIN: VANCOUVER BC AND STATIONS\nDESTINATION: CHICAGO IL\n";

    let (origin, destination) = extract_route_summary(&patterns, text);
    assert!(origin.contains("VANCOUVER"));
    assert!(destination.contains("CHICAGO"));
}

#[test]
fn extract_route_summary_falls_back_to_from_to_sentence() {
    let patterns = patterns();
    let text = "Applies FROM VANCOUVER BC TO CHICAGO IL\n";

    let (origin, destination) = extract_route_summary(&patterns, text);
    assert!(origin.contains("VANCOUVER"));
    assert!(destination.contains("CHICAGO"));
}

#[test]
fn merge_without_ai_result_is_identity() {
    let pipeline = TariffPipeline::new().expect("pipeline");
    let record = pipeline.process(
        &DocumentInput::Text(
            "ITEM: 70001 REVISION: 5\nVANCOUVER BC to CHICAGO IL $52.75\n".to_string(),
        ),
        &source(),
        AiOutcome::NotAttempted,
    );

    assert_eq!(merge(record.clone(), None), record);
}

#[test]
fn merge_fills_header_gaps_but_never_overwrites() {
    let pipeline = TariffPipeline::new().expect("pipeline");
    let rule_based = pipeline.process(
        &DocumentInput::Text("ITEM: 70001\nVANCOUVER BC to CHICAGO IL $52.75\n".to_string()),
        &source(),
        AiOutcome::NotAttempted,
    );
    let mut ai_based = rule_based.clone();
    ai_based.header.item_number = Some("99999".to_string());
    ai_based.header.revision = Some(7);

    let merged = merge(rule_based, Some(ai_based));
    assert_eq!(merged.header.item_number.as_deref(), Some("70001"));
    assert_eq!(merged.header.revision, Some(7));
}

#[test]
fn merge_replaces_rates_only_when_ai_found_strictly_more() {
    let pipeline = TariffPipeline::new().expect("pipeline");
    let rule_based = pipeline.process(
        &DocumentInput::Text(
            "VANCOUVER BC to CHICAGO IL $52.75\n\n\n\n\n\nCALGARY AB to MINNEAPOLIS MN $61.20\n"
                .to_string(),
        ),
        &source(),
        AiOutcome::NotAttempted,
    );
    assert_eq!(rule_based.rates.len(), 2);

    let mut ai_smaller = rule_based.clone();
    ai_smaller.rates.truncate(1);
    let kept = merge(rule_based.clone(), Some(ai_smaller));
    assert_eq!(kept.rates.len(), 2);

    let mut ai_larger = rule_based.clone();
    ai_larger.rates.push(RateInfo::new(
        "WINNIPEG MB".to_string(),
        "KANSAS CITY MO".to_string(),
        "48.30".to_string(),
        Currency::Usd,
    ));
    let replaced = merge(rule_based, Some(ai_larger.clone()));
    assert_eq!(replaced.rates, ai_larger.rates);
}

#[test]
fn merge_unions_notes_by_text() {
    let pipeline = TariffPipeline::new().expect("pipeline");
    let rule_based = pipeline.process(
        &DocumentInput::Text("1. Rates are in US Dollars per car.\n".to_string()),
        &source(),
        AiOutcome::NotAttempted,
    );
    assert_eq!(rule_based.notes.len(), 1);

    let mut ai_based = rule_based.clone();
    ai_based.notes.push(NoteInfo {
        note_type: NoteType::Asterisk,
        code: "*".to_string(),
        text: "Applies on shipper-owned equipment.".to_string(),
        sort_order: 1,
    });

    let merged = merge(rule_based.clone(), Some(ai_based.clone()));
    assert_eq!(merged.notes.len(), 2);

    // Identical note text is not duplicated.
    let again = merge(merged.clone(), Some(ai_based));
    assert_eq!(again.notes.len(), 2);
}

#[test]
fn merge_adopts_longer_route_summary() {
    let pipeline = TariffPipeline::new().expect("pipeline");
    let rule_based = pipeline.process(
        &DocumentInput::Text(
            "ORIGIN: VANCOUVER\nDESTINATION: CHICAGO IL AND STATIONS\nVANCOUVER BC to CHICAGO IL $52.75\n"
                .to_string(),
        ),
        &source(),
        AiOutcome::NotAttempted,
    );
    assert!(!rule_based.destination_info.is_empty());

    let mut ai_based = rule_based.clone();
    ai_based.origin_info = "VANCOUVER BC AND GROUP STATIONS".to_string();
    ai_based.destination_info = "CH".to_string();

    let merged = merge(rule_based.clone(), Some(ai_based));
    assert_eq!(merged.origin_info, "VANCOUVER BC AND GROUP STATIONS");
    assert_eq!(merged.destination_info, rule_based.destination_info);
}

#[test]
fn pipeline_end_to_end_extracts_header_rate_and_note() {
    let pipeline = TariffPipeline::new().expect("pipeline");
    let text = "ITEM: 70001 REVISION: 5\nVANCOUVER BC to CHICAGO IL $52.75\n1. Rates are in US Dollars per car.\n";

    let record = pipeline.process(
        &DocumentInput::Text(text.to_string()),
        &source(),
        AiOutcome::NotAttempted,
    );

    assert_eq!(record.header.item_number.as_deref(), Some("70001"));
    assert_eq!(record.header.revision, Some(5));

    assert!(
        record
            .rates
            .iter()
            .any(|rate| rate.origin.contains("VANCOUVER")
                && rate.destination.contains("CHICAGO")
                && rate.rate_amount == "52.75")
    );

    assert!(
        record
            .notes
            .iter()
            .any(|note| note.note_type == NoteType::Numbered && note.code == "1")
    );

    let metadata = &record.processing_metadata;
    assert!(metadata.extraction_success);
    assert_eq!(metadata.rates_extracted, record.rates.len());
    assert_eq!(metadata.notes_extracted, record.notes.len());
}

#[test]
fn pipeline_empty_input_yields_unsuccessful_empty_record() {
    let pipeline = TariffPipeline::new().expect("pipeline");
    let record = pipeline.process(
        &DocumentInput::Text(String::new()),
        &source(),
        AiOutcome::NotAttempted,
    );

    assert!(record.rates.is_empty());
    assert!(record.notes.is_empty());
    assert!(record.commodities.is_empty());
    assert!(!record.processing_metadata.extraction_success);
}

#[test]
fn pipeline_tags_fallback_method_when_ai_failed() {
    let pipeline = TariffPipeline::new().expect("pipeline");
    let record = pipeline.process(
        &DocumentInput::Text("VANCOUVER BC to CHICAGO IL $52.75\n".to_string()),
        &source(),
        AiOutcome::Failed,
    );

    assert_eq!(
        record.processing_metadata.extraction_method.as_str(),
        "RULE_BASED_FALLBACK"
    );
}

#[test]
fn pipeline_table_input_uses_table_extractor() {
    let pipeline = TariffPipeline::new().expect("pipeline");
    let rows = vec![
        vec![
            "ORIGIN".to_string(),
            "DESTINATION".to_string(),
            "RATE".to_string(),
        ],
        vec![
            "VANCOUVER BC".to_string(),
            "CHICAGO IL".to_string(),
            "52.75".to_string(),
        ],
    ];

    let record = pipeline.process(&DocumentInput::Table(rows), &source(), AiOutcome::NotAttempted);
    assert_eq!(record.rates.len(), 1);
    assert_eq!(record.rates[0].rate_amount, "52.75");
}

#[test]
fn record_serializes_with_canonical_keys() {
    let pipeline = TariffPipeline::new().expect("pipeline");
    let record = pipeline.process(
        &DocumentInput::Text("ITEM: 70001\nVANCOUVER BC to CHICAGO IL $52.75\n".to_string()),
        &source(),
        AiOutcome::NotAttempted,
    );

    let value = serde_json::to_value(&record).expect("record serializes");
    let object = value.as_object().expect("record is an object");
    let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        vec![
            "commodities",
            "currency",
            "destination_info",
            "header",
            "notes",
            "origin_info",
            "pdf_name",
            "processing_metadata",
            "rates",
            "raw_text",
        ]
    );
    assert_eq!(object["currency"], "USD");
}
