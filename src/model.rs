use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "CAD")]
    Cad,
}

impl Currency {
    pub fn as_str(self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Cad => "CAD",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteType {
    #[serde(rename = "NUMBERED")]
    Numbered,
    #[serde(rename = "ASTERISK")]
    Asterisk,
    #[serde(rename = "PROVISION")]
    Provision,
    #[serde(rename = "EQUIPMENT")]
    Equipment,
    #[serde(rename = "GENERAL")]
    General,
}

impl NoteType {
    pub fn as_str(self) -> &'static str {
        match self {
            NoteType::Numbered => "NUMBERED",
            NoteType::Asterisk => "ASTERISK",
            NoteType::Provision => "PROVISION",
            NoteType::Equipment => "EQUIPMENT",
            NoteType::General => "GENERAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionMethod {
    #[serde(rename = "RULE_BASED_ONLY")]
    RuleBasedOnly,
    #[serde(rename = "AI_ENHANCED")]
    AiEnhanced,
    #[serde(rename = "RULE_BASED_FALLBACK")]
    RuleBasedFallback,
}

impl ExtractionMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            ExtractionMethod::RuleBasedOnly => "RULE_BASED_ONLY",
            ExtractionMethod::AiEnhanced => "AI_ENHANCED",
            ExtractionMethod::RuleBasedFallback => "RULE_BASED_FALLBACK",
        }
    }
}

/// Header block of a tariff item. Fields stay `None` when the source text
/// never matched; the reconciliation merge may fill them in later but never
/// overwrites a value the rule-based pass already found.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaderInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cprs_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommodityInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stcc_code: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateInfo {
    pub origin: String,
    pub destination: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_state: Option<String>,
    pub rate_amount: String,
    pub currency: Currency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub train_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipment_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub car_capacity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_provisions: Option<String>,
}

impl RateInfo {
    pub fn new(
        origin: String,
        destination: String,
        rate_amount: String,
        currency: Currency,
    ) -> Self {
        Self {
            origin,
            destination,
            origin_state: None,
            destination_state: None,
            rate_amount,
            currency,
            rate_category: None,
            train_type: None,
            equipment_type: None,
            car_capacity_type: None,
            route_code: None,
            additional_provisions: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteInfo {
    #[serde(rename = "type")]
    pub note_type: NoteType,
    pub code: String,
    pub text: String,
    pub sort_order: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    pub rates_extracted: usize,
    pub notes_extracted: usize,
    pub commodities_extracted: usize,
    pub text_length: usize,
    pub file_size_bytes: u64,
    pub extraction_method: ExtractionMethod,
    pub extraction_success: bool,
    pub processed_at: String,
}

/// Canonical per-document record handed to the persistence sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub header: HeaderInfo,
    pub commodities: Vec<CommodityInfo>,
    pub rates: Vec<RateInfo>,
    pub notes: Vec<NoteInfo>,
    pub origin_info: String,
    pub destination_info: String,
    pub currency: Currency,
    pub pdf_name: String,
    pub raw_text: String,
    pub processing_metadata: ProcessingMetadata,
}

/// Result of processing one document. The extracted record always survives;
/// the database id is present only when the sink accepted the record.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
    pub record: DocumentRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceEntry {
    pub filename: String,
    pub sha256: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestCounts {
    pub documents_processed: usize,
    pub documents_saved: usize,
    pub documents_failed: usize,
    pub rates_extracted: usize,
    pub notes_extracted: usize,
    pub commodities_extracted: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub started_at: String,
    pub updated_at: String,
    pub input_dir: String,
    pub db_path: String,
    pub counts: IngestCounts,
    pub sources: Vec<SourceEntry>,
    pub warnings: Vec<String>,
}
