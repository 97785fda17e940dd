use anyhow::{Context, Result};
use regex::Regex;

/// Regex set compiled once per pipeline and reused across documents.
#[derive(Debug)]
pub struct Patterns {
    pub item_number: Vec<Regex>,
    pub revision: Vec<Regex>,
    pub cprs_number: Vec<Regex>,
    pub issue_date: Vec<Regex>,
    pub effective_date: Vec<Regex>,
    pub expiration_date: Vec<Regex>,
    pub change_description: Vec<Regex>,

    pub date_month_name: Regex,
    pub date_slash: Regex,
    pub date_iso: Regex,
    pub date_dash_numeric: Regex,

    pub stcc: Regex,
    pub amount_decimal: Regex,
    pub amount_dollar_int: Regex,
    pub pair_city_state: Regex,
    pub pair_city_comma_state: Regex,
    pub pair_adjacent: Regex,
    pub route_cp: Regex,
    pub route_keyword: Regex,
    pub route_bare: Regex,

    pub cell_split: Regex,

    pub note_numbered: Regex,
    pub note_equipment: Regex,

    pub origin_line: Vec<Regex>,
    pub destination_line: Vec<Regex>,
    pub from_to_sentence: Regex,
    pub currency_cad: Regex,
}

impl Patterns {
    pub fn compile() -> Result<Self> {
        Ok(Self {
            item_number: compile_all(&[
                r"(?i)ITEM\s*(?:NO\.?|NUMBER)\s*:?\s*(\d+)",
                r"(?i)ITEM\s*:?\s*(\d+)",
            ])?,
            revision: compile_all(&[r"(?i)REVISION\s*:?\s*(\d+)", r"(?i)REV\.?\s*:?\s*(\d+)"])?,
            cprs_number: compile_all(&[
                r"(?i)CPRS\s*:?\s*(\d+-[A-Z])",
                r"(?i)CPRS\s+([A-Z0-9][A-Z0-9-]+)",
            ])?,
            issue_date: compile_all(&[r"(?i)ISSUE(?:D|\s*DATE)?\s*:?\s*([A-Z0-9][A-Z0-9 ,/-]+)"])?,
            effective_date: compile_all(&[
                r"(?i)EFFECTIVE(?:\s*DATE)?\s*:?\s*([A-Z0-9][A-Z0-9 ,/-]+)",
            ])?,
            expiration_date: compile_all(&[
                r"(?i)EXPIR\w*(?:\s*DATE)?\s*:?\s*([A-Z0-9][A-Z0-9 ,/-]+)",
            ])?,
            change_description: compile_all(&[r"(?i)CHANGE\s*:?\s*([^\n]+)"])?,

            date_month_name: Regex::new(r"(?i)\b([A-Z]{3})[\s-]+(\d{1,2}),?[\s-]+(\d{4})\b")
                .context("failed to compile month-name date regex")?,
            date_slash: Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b")
                .context("failed to compile slash date regex")?,
            date_iso: Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b")
                .context("failed to compile iso date regex")?,
            date_dash_numeric: Regex::new(r"\b(\d{1,2})-(\d{1,2})-(\d{4})\b")
                .context("failed to compile dash date regex")?,

            stcc: Regex::new(r"\d{2}\s+\d{3}\s+\d{2}")
                .context("failed to compile stcc regex")?,
            amount_decimal: Regex::new(r"\$?(\d{1,5}(?:,\d{3})*\.\d{1,2})")
                .context("failed to compile decimal amount regex")?,
            amount_dollar_int: Regex::new(r"\$(\d{1,3}(?:,\d{3})+|\d{1,5})(?:[^,.\d]|$)")
                .context("failed to compile dollar amount regex")?,
            pair_city_state: Regex::new(
                r"([A-Z][A-Za-z.\s]+?\s[A-Z]{2})\s+(?:to|TO|To)\s+([A-Z][A-Za-z.\s]+?\s[A-Z]{2})\b",
            )
            .context("failed to compile city-state pair regex")?,
            pair_city_comma_state: Regex::new(
                r"([A-Z][A-Za-z.\s]+?,\s*[A-Z]{2})\s+(?:to|TO|To)\s+([A-Z][A-Za-z.\s]+?,\s*[A-Z]{2})\b",
            )
            .context("failed to compile city-comma-state pair regex")?,
            pair_adjacent: Regex::new(
                r"([A-Z][A-Za-z.\s]+?\s[A-Z]{2})\s+([A-Z][A-Za-z.\s]+?\s[A-Z]{2})\b",
            )
            .context("failed to compile adjacent pair regex")?,
            route_cp: Regex::new(r"(?i)\bCP(\d{3,4})\b")
                .context("failed to compile CP route regex")?,
            route_keyword: Regex::new(r"(?i)ROUTE\s*:?\s*(\d{3,4})\b")
                .context("failed to compile route keyword regex")?,
            route_bare: Regex::new(r"\b(\d{4})\b")
                .context("failed to compile bare route regex")?,

            cell_split: Regex::new(r"\t+|\s{2,}")
                .context("failed to compile table cell split regex")?,

            note_numbered: Regex::new(r"^(\d+)[.)\-:]?\s+(.+)$")
                .context("failed to compile numbered note regex")?,
            note_equipment: Regex::new(r"^([A-Z])\s*-\s+(.+)$")
                .context("failed to compile equipment note regex")?,

            origin_line: compile_all(&[
                r"(?i)ORIGIN\s*:?\s+([^\n_]+)",
                r"(?i)\bFROM\s*:\s*([^\n_]+)",
            ])?,
            destination_line: compile_all(&[
                r"(?i)DESTINATION\s*:?\s+([^\n_]+)",
                r"(?i)\bTO\s*:\s*([^\n_]+)",
            ])?,
            from_to_sentence: Regex::new(r"(?i)\bFROM\s+(.+?)\s+TO\s+([^\n]+)")
                .context("failed to compile from-to regex")?,
            currency_cad: Regex::new(r"(?i)\b(CAD|CDN|CANADIAN)\b|C\$")
                .context("failed to compile currency regex")?,
        })
    }
}

fn compile_all(sources: &[&str]) -> Result<Vec<Regex>> {
    sources
        .iter()
        .map(|source| {
            Regex::new(source).with_context(|| format!("failed to compile pattern: {source}"))
        })
        .collect()
}
