use anyhow::Result;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::store::{collect_stats, open_database};

pub fn run(args: StatusArgs) -> Result<()> {
    let db_path = super::process::resolve_db_path(&args.cache_root, args.db_path.as_deref())?;

    if !db_path.exists() {
        warn!(path = %db_path.display(), "database missing, nothing ingested yet");
        return Ok(());
    }

    let connection = open_database(&db_path)?;
    let stats = collect_stats(&connection)?;

    info!(
        documents = stats.documents,
        rates = stats.rates,
        notes = stats.notes,
        commodities = stats.commodities,
        "database contents"
    );
    for (method, count) in &stats.by_method {
        info!(method = %method, count, "extraction method breakdown");
    }

    Ok(())
}
