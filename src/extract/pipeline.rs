use anyhow::Result;
use tracing::{info, warn};

use crate::model::{
    CommodityInfo, Currency, DocumentRecord, ExtractionMethod, HeaderInfo, NoteInfo,
    ProcessingMetadata, RateInfo,
};
use crate::util::{now_utc_string, truncate_chars};

use super::commodities::extract_commodities;
use super::header::extract_header;
use super::locations::extract_route_summary;
use super::merge::merge;
use super::notes::extract_notes;
use super::patterns::Patterns;
use super::rates::extract_rates_from_text;
use super::tables::extract_rates_from_table;

/// Raw text shorter than this is treated as an empty document.
const MIN_TEXT_CHARS: usize = 10;

/// Stored raw text is capped at this many characters.
const RAW_TEXT_LIMIT: usize = 10_000;

/// One OCR document: either flat text or pre-segmented table rows.
#[derive(Debug, Clone)]
pub enum DocumentInput {
    Text(String),
    Table(Vec<Vec<String>>),
}

impl DocumentInput {
    fn flat_text(&self) -> String {
        match self {
            DocumentInput::Text(text) => text.clone(),
            DocumentInput::Table(rows) => rows
                .iter()
                .map(|row| row.join("  "))
                .collect::<Vec<String>>()
                .join("\n"),
        }
    }
}

/// Outcome of the optional AI collaborator for this document.
#[derive(Debug, Clone)]
pub enum AiOutcome {
    NotAttempted,
    Succeeded(DocumentRecord),
    Failed,
}

/// Identity of the source document, used for metadata only.
#[derive(Debug, Clone)]
pub struct DocumentSource {
    pub name: String,
    pub size_bytes: u64,
}

/// The extraction pipeline. Stateless across documents apart from the regex
/// set compiled once at construction; safe to reuse for a whole batch.
#[derive(Debug)]
pub struct TariffPipeline {
    patterns: Patterns,
}

impl TariffPipeline {
    pub fn new() -> Result<Self> {
        Ok(Self {
            patterns: Patterns::compile()?,
        })
    }

    pub fn patterns(&self) -> &Patterns {
        &self.patterns
    }

    /// Runs the full pipeline: independent extractors over the same text,
    /// reconciliation against the AI result, then record assembly.
    pub fn process(
        &self,
        input: &DocumentInput,
        source: &DocumentSource,
        ai: AiOutcome,
    ) -> DocumentRecord {
        let text = input.flat_text();

        if text.trim().len() < MIN_TEXT_CHARS {
            warn!(source = %source.name, "insufficient text, producing empty record");
            return self.empty_record(source, &ai);
        }

        let currency = detect_currency(&self.patterns, &text);
        let header = extract_header(&self.patterns, &text);
        let commodities = extract_commodities(&self.patterns, &text);
        let notes = extract_notes(&self.patterns, &text);
        let (origin_info, destination_info) = extract_route_summary(&self.patterns, &text);

        let rates = match input {
            DocumentInput::Text(_) => extract_rates_from_text(&self.patterns, &text, currency),
            DocumentInput::Table(rows) => {
                let table = extract_rates_from_table(&self.patterns, rows, currency);
                info!(
                    rates = table.rates.len(),
                    confidence = table.confidence,
                    "table-mode rate extraction"
                );
                table.rates
            }
        };

        let rule_based = assemble(
            header,
            commodities,
            rates,
            notes,
            origin_info,
            destination_info,
            currency,
            &source.name,
            &text,
            source.size_bytes,
            method_for(&ai),
            true,
        );

        let merged = match ai {
            AiOutcome::Succeeded(ai_record) => merge(rule_based, Some(ai_record)),
            _ => merge(rule_based, None),
        };

        finalize_counts(merged)
    }

    fn empty_record(&self, source: &DocumentSource, ai: &AiOutcome) -> DocumentRecord {
        assemble(
            HeaderInfo::default(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
            String::new(),
            String::new(),
            Currency::Usd,
            &source.name,
            "",
            source.size_bytes,
            method_for(ai),
            false,
        )
    }
}

fn method_for(ai: &AiOutcome) -> ExtractionMethod {
    match ai {
        AiOutcome::NotAttempted => ExtractionMethod::RuleBasedOnly,
        AiOutcome::Succeeded(_) => ExtractionMethod::AiEnhanced,
        AiOutcome::Failed => ExtractionMethod::RuleBasedFallback,
    }
}

/// Pure record construction: truncates the stored raw text and fills the
/// processing metadata from the supplied sequences.
#[allow(clippy::too_many_arguments)]
pub fn assemble(
    header: HeaderInfo,
    commodities: Vec<CommodityInfo>,
    rates: Vec<RateInfo>,
    notes: Vec<NoteInfo>,
    origin_info: String,
    destination_info: String,
    currency: Currency,
    source_name: &str,
    raw_text: &str,
    file_size_bytes: u64,
    extraction_method: ExtractionMethod,
    extraction_success: bool,
) -> DocumentRecord {
    let metadata = ProcessingMetadata {
        rates_extracted: rates.len(),
        notes_extracted: notes.len(),
        commodities_extracted: commodities.len(),
        text_length: raw_text.chars().count(),
        file_size_bytes,
        extraction_method,
        extraction_success,
        processed_at: now_utc_string(),
    };

    DocumentRecord {
        header,
        commodities,
        rates,
        notes,
        origin_info,
        destination_info,
        currency,
        pdf_name: source_name.to_string(),
        raw_text: truncate_chars(raw_text, RAW_TEXT_LIMIT),
        processing_metadata: metadata,
    }
}

// The merge step can change sequence lengths; counts are recomputed so the
// stored metadata always matches the record.
fn finalize_counts(mut record: DocumentRecord) -> DocumentRecord {
    record.processing_metadata.rates_extracted = record.rates.len();
    record.processing_metadata.notes_extracted = record.notes.len();
    record.processing_metadata.commodities_extracted = record.commodities.len();
    record
}

pub fn detect_currency(patterns: &Patterns, text: &str) -> Currency {
    if patterns.currency_cad.is_match(text) {
        Currency::Cad
    } else {
        Currency::Usd
    }
}
