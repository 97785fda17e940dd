//! SQLite persistence sink for extracted tariff records. A document and its
//! child rows are written inside one transaction; the caller receives the
//! generated document id or an error it is expected to downgrade to a
//! warning (persistence failure never discards extraction work).

use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use tracing::info;

use crate::model::DocumentRecord;
use crate::util::now_utc_string;

pub fn open_database(path: &Path) -> Result<Connection> {
    let connection = Connection::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;
    Ok(connection)
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

pub fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS tariff_documents (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              item_number TEXT,
              revision INTEGER,
              cprs_number TEXT,
              issue_date TEXT,
              effective_date TEXT,
              expiration_date TEXT,
              change_description TEXT,
              origin_info TEXT,
              destination_info TEXT,
              currency TEXT NOT NULL,
              pdf_name TEXT NOT NULL,
              raw_text TEXT,
              extraction_method TEXT NOT NULL,
              extraction_success INTEGER NOT NULL,
              created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tariff_commodities (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              tariff_document_id INTEGER NOT NULL,
              commodity_name TEXT NOT NULL,
              stcc_code TEXT,
              description TEXT,
              FOREIGN KEY(tariff_document_id) REFERENCES tariff_documents(id)
            );

            CREATE TABLE IF NOT EXISTS tariff_rates (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              tariff_document_id INTEGER NOT NULL,
              origin TEXT NOT NULL,
              destination TEXT NOT NULL,
              origin_state TEXT,
              destination_state TEXT,
              rate_amount TEXT NOT NULL,
              currency TEXT NOT NULL,
              rate_category TEXT,
              train_type TEXT,
              equipment_type TEXT,
              car_capacity_type TEXT,
              route_code TEXT,
              additional_provisions TEXT,
              FOREIGN KEY(tariff_document_id) REFERENCES tariff_documents(id)
            );

            CREATE TABLE IF NOT EXISTS tariff_notes (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              tariff_document_id INTEGER NOT NULL,
              note_type TEXT NOT NULL,
              note_code TEXT,
              note_text TEXT NOT NULL,
              sort_order INTEGER NOT NULL,
              FOREIGN KEY(tariff_document_id) REFERENCES tariff_documents(id)
            );

            CREATE INDEX IF NOT EXISTS idx_documents_item
              ON tariff_documents(item_number, revision);
            CREATE INDEX IF NOT EXISTS idx_rates_document
              ON tariff_rates(tariff_document_id);
            CREATE INDEX IF NOT EXISTS idx_notes_document
              ON tariff_notes(tariff_document_id);
            CREATE INDEX IF NOT EXISTS idx_commodities_document
              ON tariff_commodities(tariff_document_id);
            ",
        )
        .context("failed to ensure tariff schema")
}

/// Saves a record and all of its child rows as a single transaction,
/// returning the generated document id.
pub fn save_document(connection: &mut Connection, record: &DocumentRecord) -> Result<i64> {
    let tx = connection
        .transaction()
        .context("failed to begin save transaction")?;

    tx.execute(
        "
        INSERT INTO tariff_documents (
          item_number, revision, cprs_number, issue_date, effective_date,
          expiration_date, change_description, origin_info, destination_info,
          currency, pdf_name, raw_text, extraction_method, extraction_success,
          created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
        ",
        params![
            record.header.item_number,
            record.header.revision,
            record.header.cprs_number,
            record.header.issue_date,
            record.header.effective_date,
            record.header.expiration_date,
            record.header.change_description,
            record.origin_info,
            record.destination_info,
            record.currency.as_str(),
            record.pdf_name,
            record.raw_text,
            record.processing_metadata.extraction_method.as_str(),
            record.processing_metadata.extraction_success as i64,
            now_utc_string(),
        ],
    )
    .context("failed to insert tariff document")?;

    let document_id = tx.last_insert_rowid();

    {
        let mut statement = tx
            .prepare(
                "
                INSERT INTO tariff_commodities (
                  tariff_document_id, commodity_name, stcc_code, description
                ) VALUES (?1, ?2, ?3, ?4)
                ",
            )
            .context("failed to prepare commodity insert")?;
        for commodity in &record.commodities {
            statement
                .execute(params![
                    document_id,
                    commodity.name,
                    commodity.stcc_code,
                    commodity.description,
                ])
                .context("failed to insert commodity")?;
        }

        let mut statement = tx
            .prepare(
                "
                INSERT INTO tariff_rates (
                  tariff_document_id, origin, destination, origin_state,
                  destination_state, rate_amount, currency, rate_category,
                  train_type, equipment_type, car_capacity_type, route_code,
                  additional_provisions
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                ",
            )
            .context("failed to prepare rate insert")?;
        for rate in &record.rates {
            statement
                .execute(params![
                    document_id,
                    rate.origin,
                    rate.destination,
                    rate.origin_state,
                    rate.destination_state,
                    rate.rate_amount,
                    rate.currency.as_str(),
                    rate.rate_category,
                    rate.train_type,
                    rate.equipment_type,
                    rate.car_capacity_type,
                    rate.route_code,
                    rate.additional_provisions,
                ])
                .context("failed to insert rate")?;
        }

        let mut statement = tx
            .prepare(
                "
                INSERT INTO tariff_notes (
                  tariff_document_id, note_type, note_code, note_text, sort_order
                ) VALUES (?1, ?2, ?3, ?4, ?5)
                ",
            )
            .context("failed to prepare note insert")?;
        for note in &record.notes {
            statement
                .execute(params![
                    document_id,
                    note.note_type.as_str(),
                    note.code,
                    note.text,
                    note.sort_order,
                ])
                .context("failed to insert note")?;
        }
    }

    tx.commit().context("failed to commit document save")?;

    info!(
        document_id,
        rates = record.rates.len(),
        notes = record.notes.len(),
        commodities = record.commodities.len(),
        "document saved"
    );

    Ok(document_id)
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct DatabaseStats {
    pub documents: i64,
    pub rates: i64,
    pub notes: i64,
    pub commodities: i64,
    pub by_method: Vec<(String, i64)>,
}

pub fn collect_stats(connection: &Connection) -> Result<DatabaseStats> {
    let count = |sql: &str| -> Result<i64> {
        connection
            .query_row(sql, [], |row| row.get(0))
            .with_context(|| format!("failed to run: {sql}"))
    };

    let mut stats = DatabaseStats {
        documents: count("SELECT COUNT(*) FROM tariff_documents")?,
        rates: count("SELECT COUNT(*) FROM tariff_rates")?,
        notes: count("SELECT COUNT(*) FROM tariff_notes")?,
        commodities: count("SELECT COUNT(*) FROM tariff_commodities")?,
        by_method: Vec::new(),
    };

    let mut statement = connection
        .prepare(
            "SELECT extraction_method, COUNT(*) FROM tariff_documents
             GROUP BY extraction_method ORDER BY extraction_method",
        )
        .context("failed to prepare method breakdown query")?;
    let rows = statement
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
        .context("failed to query method breakdown")?;
    for row in rows {
        stats.by_method.push(row.context("failed to read method breakdown row")?);
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        CommodityInfo, Currency, DocumentRecord, ExtractionMethod, HeaderInfo, NoteInfo, NoteType,
        ProcessingMetadata, RateInfo,
    };

    fn sample_record() -> DocumentRecord {
        let mut rate = RateInfo::new(
            "VANCOUVER BC".to_string(),
            "CHICAGO IL".to_string(),
            "52.75".to_string(),
            Currency::Usd,
        );
        rate.origin_state = Some("BC".to_string());
        rate.destination_state = Some("IL".to_string());

        DocumentRecord {
            header: HeaderInfo {
                item_number: Some("70001".to_string()),
                revision: Some(5),
                ..HeaderInfo::default()
            },
            commodities: vec![CommodityInfo {
                name: "WHEAT".to_string(),
                stcc_code: Some("0113700".to_string()),
                description: "WHEAT 01 137 00".to_string(),
            }],
            rates: vec![rate],
            notes: vec![NoteInfo {
                note_type: NoteType::Numbered,
                code: "1".to_string(),
                text: "Rates are in US Dollars per car.".to_string(),
                sort_order: 0,
            }],
            origin_info: String::new(),
            destination_info: String::new(),
            currency: Currency::Usd,
            pdf_name: "sample.pdf".to_string(),
            raw_text: "ITEM: 70001".to_string(),
            processing_metadata: ProcessingMetadata {
                rates_extracted: 1,
                notes_extracted: 1,
                commodities_extracted: 1,
                text_length: 11,
                file_size_bytes: 0,
                extraction_method: ExtractionMethod::RuleBasedOnly,
                extraction_success: true,
                processed_at: now_utc_string(),
            },
        }
    }

    fn in_memory() -> Connection {
        let connection = Connection::open_in_memory().expect("open in-memory db");
        ensure_schema(&connection).expect("schema");
        connection
    }

    #[test]
    fn save_document_returns_id_and_persists_children() {
        let mut connection = in_memory();

        let id = save_document(&mut connection, &sample_record()).expect("save succeeds");
        assert!(id > 0);

        let stats = collect_stats(&connection).expect("stats");
        assert_eq!(stats.documents, 1);
        assert_eq!(stats.rates, 1);
        assert_eq!(stats.notes, 1);
        assert_eq!(stats.commodities, 1);
        assert_eq!(
            stats.by_method,
            vec![("RULE_BASED_ONLY".to_string(), 1)]
        );
    }

    #[test]
    fn revisions_of_the_same_item_coexist() {
        let mut connection = in_memory();

        let first = save_document(&mut connection, &sample_record()).expect("first save");
        let mut second_record = sample_record();
        second_record.header.revision = Some(6);
        let second = save_document(&mut connection, &second_record).expect("second save");

        assert_ne!(first, second);
        let stats = collect_stats(&connection).expect("stats");
        assert_eq!(stats.documents, 2);
    }

    #[test]
    fn note_sort_order_round_trips() {
        let mut connection = in_memory();
        let mut record = sample_record();
        record.notes.push(NoteInfo {
            note_type: NoteType::Asterisk,
            code: "*".to_string(),
            text: "Applies to shipper-owned cars.".to_string(),
            sort_order: 1,
        });

        let id = save_document(&mut connection, &record).expect("save succeeds");

        let orders: Vec<i64> = connection
            .prepare(
                "SELECT sort_order FROM tariff_notes
                 WHERE tariff_document_id = ?1 ORDER BY sort_order",
            )
            .expect("prepare")
            .query_map([id], |row| row.get(0))
            .expect("query")
            .collect::<Result<Vec<i64>, _>>()
            .expect("rows");
        assert_eq!(orders, vec![0, 1]);
    }
}
