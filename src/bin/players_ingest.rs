use anyhow::{Context, Result};

use football_docs::config::AppConfig;
use football_docs::ingest;
use football_docs::logging::init_tracing;
use football_docs::mapper::RecordMapper;
use football_docs::player::player_validator;
use football_docs::store::DocumentStore;

// Non-interactive load: reset, ingest, report. No timings or menu.
fn main() -> Result<()> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let config = AppConfig::from_env(&args)?;
    init_tracing()?;

    let mut store = DocumentStore::connect(&config.db_uri)
        .with_context(|| format!("connect to {}", config.db_uri))?;
    ingest::reset_collection(&mut store, &config.collection, &player_validator())?;

    let mut mapper = RecordMapper::seeded(config.start_year.clone(), config.start_year_seed);
    let summary = ingest::ingest_csv(
        &mut store,
        &config.collection,
        &config.csv_path,
        &config.selection,
        &mut mapper,
    )?;
    let info = store.describe_collection(&config.collection)?;

    println!("Players ingest complete");
    println!("DB: {}", store.location());
    println!("Source: {}", config.csv_path.display());
    println!(
        "Rows: {} read, {} selected ({} with team prefix '{}')",
        summary.rows_read,
        summary.rows_selected,
        summary.priority_rows,
        config.selection.team_prefix
    );
    println!("Documents inserted: {}", summary.documents_inserted);
    println!(
        "Collection '{}': {} documents, created {}",
        info.name, info.documents, info.created_at
    );
    println!("start_year policy: {}", mapper.start_year_policy());

    Ok(())
}
