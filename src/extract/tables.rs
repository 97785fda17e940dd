use tracing::debug;

use crate::model::{Currency, RateInfo};

use super::locations::{clean_location, extract_state};
use super::patterns::Patterns;
use super::rates::{clean_rate_amount, dedup_rates, parse_amount};

const HEADER_KEYWORDS: [&str; 4] = ["ORIGIN", "DESTINATION", "RATE", "CHARGE"];

/// Table-mode extraction result. The confidence score describes extraction
/// quality for optional filtering by the caller; it never gates which rates
/// reach the record.
#[derive(Debug, Clone)]
pub struct TableExtraction {
    pub rates: Vec<RateInfo>,
    pub confidence: f64,
}

/// Extracts rates from pre-segmented table rows. Flat single-cell rows are
/// re-split on runs of whitespace; the first recognized header row starts the
/// data region, which ends at a blank row or a new all-caps section header.
pub fn extract_rates_from_table(
    patterns: &Patterns,
    rows: &[Vec<String>],
    currency: Currency,
) -> TableExtraction {
    let rows: Vec<Vec<String>> = rows.iter().map(|row| split_flat_row(patterns, row)).collect();

    let Some(header_idx) = find_header_row(&rows) else {
        debug!("no table header row recognized");
        return TableExtraction {
            rates: Vec::new(),
            confidence: 0.0,
        };
    };

    let categories = header_categories(&rows[header_idx]);

    let mut rates = Vec::<RateInfo>::new();
    let mut rows_seen = 0usize;
    let mut rows_with_rate = 0usize;
    let mut rows_with_pair = 0usize;
    let mut rate_cells = 0usize;
    let mut rate_cells_parsed = 0usize;

    for row in rows.iter().skip(header_idx + 1) {
        if row_is_blank(row) || is_section_header(row) {
            break;
        }
        rows_seen += 1;

        let origin = row.first().map(|cell| cell.trim()).unwrap_or_default();
        let destination = row.get(1).map(|cell| cell.trim()).unwrap_or_default();
        let has_pair = !origin.is_empty() && !destination.is_empty();
        if has_pair {
            rows_with_pair += 1;
        }

        let mut row_rate_found = false;
        for (col, cell) in row.iter().enumerate().skip(2) {
            let cell = cell.trim();
            if !looks_numeric(cell) {
                continue;
            }
            rate_cells += 1;

            // Parsing and range-checking are tallied separately: a
            // well-formed but out-of-range value still counts as a parsed
            // rate cell for the confidence score.
            if parse_amount(cell).is_none() {
                debug!(cell, "numeric-looking cell did not parse as a rate");
                continue;
            }
            rate_cells_parsed += 1;
            row_rate_found = true;

            let Some(amount) = clean_rate_amount(cell) else {
                debug!(cell, "rate value outside the accepted range");
                continue;
            };

            if !has_pair {
                continue;
            }

            let mut rate = RateInfo::new(
                clean_location(origin),
                clean_location(destination),
                amount,
                currency,
            );
            rate.origin_state = extract_state(origin);
            rate.destination_state = extract_state(destination);
            rate.rate_category = categories
                .iter()
                .find(|(category_col, _)| *category_col == col)
                .map(|(_, letter)| letter.clone());
            rates.push(rate);
        }

        if row_rate_found {
            rows_with_rate += 1;
        }
    }

    let confidence = confidence_score(
        rows_seen,
        rows_with_rate,
        rows_with_pair,
        rate_cells,
        rate_cells_parsed,
    );

    TableExtraction {
        rates: dedup_rates(rates),
        confidence,
    }
}

/// Mean of three checks: >=80% of rows carry a rate value, >=60% carry both
/// endpoints, >=80% of rate cells parse as plain decimals.
fn confidence_score(
    rows_seen: usize,
    rows_with_rate: usize,
    rows_with_pair: usize,
    rate_cells: usize,
    rate_cells_parsed: usize,
) -> f64 {
    if rows_seen == 0 {
        return 0.0;
    }

    let rows = rows_seen as f64;
    let checks = [
        rows_with_rate as f64 / rows >= 0.8,
        rows_with_pair as f64 / rows >= 0.6,
        rate_cells > 0 && rate_cells_parsed as f64 / rate_cells as f64 >= 0.8,
    ];

    checks.iter().filter(|passed| **passed).count() as f64 / checks.len() as f64
}

fn split_flat_row(patterns: &Patterns, row: &[String]) -> Vec<String> {
    if row.len() == 1 {
        patterns
            .cell_split
            .split(row[0].trim())
            .map(str::to_string)
            .collect()
    } else {
        row.to_vec()
    }
}

fn find_header_row(rows: &[Vec<String>]) -> Option<usize> {
    rows.iter().position(|row| {
        let joined = row.join(" ").to_ascii_uppercase();
        HEADER_KEYWORDS
            .iter()
            .filter(|keyword| joined.contains(*keyword))
            .count()
            >= 2
    })
}

/// Single-letter header cells (A, B, C...) label extra rate columns.
fn header_categories(header: &[String]) -> Vec<(usize, String)> {
    header
        .iter()
        .enumerate()
        .filter(|(_, cell)| {
            let cell = cell.trim();
            cell.len() == 1 && cell.chars().all(|ch| ch.is_ascii_uppercase())
        })
        .map(|(col, cell)| (col, cell.trim().to_string()))
        .collect()
}

fn row_is_blank(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

/// A lone all-caps cell with no digits reads as the start of a new document
/// section (NOTES, PROVISIONS, ...), ending the rate table.
fn is_section_header(row: &[String]) -> bool {
    let non_empty: Vec<&str> = row
        .iter()
        .map(|cell| cell.trim())
        .filter(|cell| !cell.is_empty())
        .collect();

    non_empty.len() == 1
        && non_empty[0].chars().any(|ch| ch.is_ascii_alphabetic())
        && !non_empty[0].chars().any(|ch| ch.is_ascii_digit())
        && non_empty[0] == non_empty[0].to_ascii_uppercase()
}

fn looks_numeric(cell: &str) -> bool {
    !cell.is_empty()
        && cell.chars().any(|ch| ch.is_ascii_digit())
        && cell
            .chars()
            .all(|ch| ch.is_ascii_digit() || matches!(ch, '.' | ',' | '$' | ' '))
}
