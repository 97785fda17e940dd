use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::IngestArgs;
use crate::extract::{AiOutcome, DocumentInput, TariffPipeline};
use crate::model::{IngestCounts, IngestRunManifest, SourceEntry};
use crate::store::{open_database, save_document};
use crate::util::{ensure_directory, now_utc_string, sha256_file, utc_compact_string, write_json_pretty};

const MANIFEST_VERSION: u32 = 1;

pub fn run(args: IngestArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    if !args.input_dir.is_dir() {
        bail!("input dir does not exist: {}", args.input_dir.display());
    }

    let manifest_dir = args.cache_root.join("manifests");
    ensure_directory(&manifest_dir)?;
    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!("ingest_run_{}.json", utc_compact_string(started_ts)))
    });

    let db_path = super::process::resolve_db_path(&args.cache_root, args.db_path.as_deref())?;
    let mut connection = open_database(&db_path)?;

    info!(
        input_dir = %args.input_dir.display(),
        db_path = %db_path.display(),
        run_id = %run_id,
        "starting ingest"
    );

    let pipeline = TariffPipeline::new()?;

    let inputs = select_inputs(collect_text_files(&args)?, args.max_docs);

    let mut counts = IngestCounts::default();
    let mut sources = Vec::<SourceEntry>::new();
    let mut warnings = Vec::<String>::new();

    for path in &inputs {
        ingest_file(
            &pipeline,
            &mut connection,
            path,
            &mut counts,
            &mut sources,
            &mut warnings,
        );
    }

    let manifest = IngestRunManifest {
        manifest_version: MANIFEST_VERSION,
        run_id,
        started_at,
        updated_at: now_utc_string(),
        input_dir: args.input_dir.display().to_string(),
        db_path: db_path.display().to_string(),
        counts,
        sources,
        warnings,
    };
    write_json_pretty(&manifest_path, &manifest)?;

    info!(
        processed = manifest.counts.documents_processed,
        saved = manifest.counts.documents_saved,
        failed = manifest.counts.documents_failed,
        manifest = %manifest_path.display(),
        "ingest complete"
    );

    Ok(())
}

/// Processes one file of the batch. Every failure mode (unreadable file,
/// non-UTF-8 content, database rejection) lands in `warnings` and the
/// failure counter; nothing here aborts the batch.
fn ingest_file(
    pipeline: &TariffPipeline,
    connection: &mut Connection,
    path: &Path,
    counts: &mut IngestCounts,
    sources: &mut Vec<SourceEntry>,
    warnings: &mut Vec<String>,
) {
    let source = match super::process::document_source(path) {
        Ok(source) => source,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "skipping unreadable file");
            warnings.push(format!("{}: {err:#}", path.display()));
            counts.documents_failed += 1;
            return;
        }
    };

    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "skipping unreadable file");
            warnings.push(format!("{}: {err}", path.display()));
            counts.documents_failed += 1;
            return;
        }
    };

    match sha256_file(path) {
        Ok(sha256) => sources.push(SourceEntry {
            filename: source.name.clone(),
            sha256,
            size_bytes: source.size_bytes,
        }),
        Err(err) => warnings.push(format!("{}: {err:#}", path.display())),
    }

    let record = pipeline.process(
        &DocumentInput::Text(text),
        &source,
        AiOutcome::NotAttempted,
    );
    counts.documents_processed += 1;
    counts.rates_extracted += record.rates.len();
    counts.notes_extracted += record.notes.len();
    counts.commodities_extracted += record.commodities.len();

    match save_document(connection, &record) {
        Ok(document_id) => {
            counts.documents_saved += 1;
            info!(source = %source.name, document_id, "ingested document");
        }
        Err(err) => {
            warn!(source = %source.name, error = %err, "database save failed");
            warnings.push(format!("{}: {err:#}", source.name));
            counts.documents_failed += 1;
        }
    }
}

/// Sorted so runs over the same directory process documents in the same
/// order; `max_docs` caps the batch after sorting.
fn select_inputs(mut files: Vec<PathBuf>, max_docs: Option<usize>) -> Vec<PathBuf> {
    files.sort();
    if let Some(max_docs) = max_docs {
        files.truncate(max_docs);
    }
    files
}

fn collect_text_files(args: &IngestArgs) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(&args.input_dir)
        .with_context(|| format!("failed to read {}", args.input_dir.display()))?;

    let mut files = Vec::<PathBuf>::new();
    for entry in entries {
        let entry = entry
            .with_context(|| format!("failed to read entry in {}", args.input_dir.display()))?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "txt") {
            files.push(path);
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ensure_schema;

    #[test]
    fn unreadable_file_is_a_warning_and_the_batch_continues() {
        let dir = std::env::temp_dir().join(format!("cptariff-ingest-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("create scratch dir");
        let readable = dir.join("good.txt");
        fs::write(&readable, "ITEM: 70001\nVANCOUVER BC to CHICAGO IL $52.75\n")
            .expect("write readable file");
        let unreadable = dir.join("bad.txt");
        fs::write(&unreadable, [0xff_u8, 0xfe, 0x00, 0xff]).expect("write non-utf8 file");

        let mut connection = Connection::open_in_memory().expect("open in-memory db");
        ensure_schema(&connection).expect("schema");
        let pipeline = TariffPipeline::new().expect("pipeline");

        let mut counts = IngestCounts::default();
        let mut sources = Vec::new();
        let mut warnings = Vec::new();
        for path in select_inputs(vec![readable, unreadable], None) {
            ingest_file(
                &pipeline,
                &mut connection,
                &path,
                &mut counts,
                &mut sources,
                &mut warnings,
            );
        }

        assert_eq!(counts.documents_processed, 1);
        assert_eq!(counts.documents_saved, 1);
        assert_eq!(counts.documents_failed, 1);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("bad.txt"));
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].filename, "good.txt");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn select_inputs_sorts_and_caps_the_batch() {
        let files = vec![
            PathBuf::from("docs/b.txt"),
            PathBuf::from("docs/c.txt"),
            PathBuf::from("docs/a.txt"),
        ];

        let selected = select_inputs(files.clone(), None);
        assert_eq!(
            selected,
            vec![
                PathBuf::from("docs/a.txt"),
                PathBuf::from("docs/b.txt"),
                PathBuf::from("docs/c.txt"),
            ]
        );

        let capped = select_inputs(files, Some(2));
        assert_eq!(
            capped,
            vec![PathBuf::from("docs/a.txt"), PathBuf::from("docs/b.txt")]
        );
    }
}
