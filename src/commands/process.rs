use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::ai::parse_ai_payload;
use crate::cli::{InputMode, ProcessArgs};
use crate::extract::{AiOutcome, DocumentInput, DocumentSource, TariffPipeline};
use crate::model::ProcessOutcome;
use crate::store::{open_database, save_document};
use crate::util::{ensure_directory, write_json_pretty};

pub fn run(args: ProcessArgs) -> Result<()> {
    let pipeline = TariffPipeline::new()?;

    let source = document_source(&args.input)?;
    let input = load_input(&args.input, args.input_mode)?;
    let ai = load_ai_outcome(&pipeline, args.ai_result.as_deref(), &source.name);

    info!(
        source = %source.name,
        mode = args.input_mode.as_str(),
        "processing document"
    );

    let record = pipeline.process(&input, &source, ai);

    info!(
        rates = record.rates.len(),
        notes = record.notes.len(),
        commodities = record.commodities.len(),
        method = record.processing_metadata.extraction_method.as_str(),
        "extraction complete"
    );

    let mut outcome = ProcessOutcome {
        record,
        document_id: None,
        database_error: None,
    };

    if args.dry_run {
        info!("dry run, skipping database save");
    } else {
        let db_path = resolve_db_path(&args.cache_root, args.db_path.as_deref())?;
        match open_database(&db_path).and_then(|mut connection| {
            save_document(&mut connection, &outcome.record)
        }) {
            Ok(document_id) => outcome.document_id = Some(document_id),
            // The extracted record is still valid output; the save failure
            // travels alongside it instead of aborting the command.
            Err(err) => {
                warn!(error = %err, "database save failed, keeping extracted record");
                outcome.database_error = Some(format!("{err:#}"));
            }
        }
    }

    match &args.output {
        Some(path) => {
            write_json_pretty(path, &outcome)?;
            info!(path = %path.display(), "wrote processed record");
        }
        None => {
            let rendered = serde_json::to_string_pretty(&outcome)
                .context("failed to render outcome json")?;
            println!("{rendered}");
        }
    }

    Ok(())
}

pub fn document_source(path: &Path) -> Result<DocumentSource> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let size_bytes = fs::metadata(path)
        .with_context(|| format!("failed to stat {}", path.display()))?
        .len();

    Ok(DocumentSource { name, size_bytes })
}

fn load_input(path: &Path, mode: InputMode) -> Result<DocumentInput> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    match mode {
        InputMode::Text => Ok(DocumentInput::Text(raw)),
        InputMode::Table => {
            let rows: Vec<Vec<String>> = serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse table rows from {}", path.display()))?;
            Ok(DocumentInput::Table(rows))
        }
    }
}

/// Any failure while reading or parsing the AI payload degrades to the
/// rule-based fallback; the pipeline never blocks on AI availability.
fn load_ai_outcome(
    pipeline: &TariffPipeline,
    ai_result: Option<&Path>,
    source_name: &str,
) -> AiOutcome {
    let Some(path) = ai_result else {
        return AiOutcome::NotAttempted;
    };

    match fs::read_to_string(path) {
        Ok(raw) => match parse_ai_payload(pipeline.patterns(), &raw, source_name) {
            Some(record) => AiOutcome::Succeeded(record),
            None => AiOutcome::Failed,
        },
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to read AI payload");
            AiOutcome::Failed
        }
    }
}

pub fn resolve_db_path(cache_root: &Path, db_path: Option<&Path>) -> Result<PathBuf> {
    let path = match db_path {
        Some(path) => path.to_path_buf(),
        None => cache_root.join("cptariff.sqlite"),
    };
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }
    Ok(path)
}
