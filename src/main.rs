use std::io;

use anyhow::{Context, Result};
use tracing::info;

use football_docs::config::AppConfig;
use football_docs::ingest;
use football_docs::logging::init_tracing;
use football_docs::mapper::RecordMapper;
use football_docs::menu::{MenuContext, run_menu};
use football_docs::player::player_validator;
use football_docs::queries;
use football_docs::store::DocumentStore;

fn main() -> Result<()> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let config = AppConfig::from_env(&args)?;
    init_tracing()?;

    let mut store = DocumentStore::connect(&config.db_uri)
        .with_context(|| format!("connect to {}", config.db_uri))?;
    info!(location = store.location(), "document store opened");

    let validator = player_validator();
    ingest::reset_collection(&mut store, &config.collection, &validator)?;

    let mut mapper = RecordMapper::seeded(config.start_year.clone(), config.start_year_seed);
    info!(policy = %mapper.start_year_policy(), "start_year derivation");
    let summary = ingest::ingest_csv(
        &mut store,
        &config.collection,
        &config.csv_path,
        &config.selection,
        &mut mapper,
    )?;
    println!(
        "{} players inserted ({} of {} rows selected, {} with team prefix '{}')",
        summary.documents_inserted,
        summary.rows_selected,
        summary.rows_read,
        summary.priority_rows,
        config.selection.team_prefix
    );

    for (idx, timing) in queries::measure_query_time(&store, &config.collection, &config.nationality)?
        .iter()
        .enumerate()
    {
        println!(
            "Query {}: {} took {:.4} seconds. Results: {}",
            idx + 1,
            timing.label,
            timing.elapsed.as_secs_f64(),
            timing.results
        );
    }

    for change in queries::uppercase_names(&mut store, &config.collection, config.uppercase_sample)? {
        println!("Updated {} to {}", change.before, change.after);
    }

    let ctx = MenuContext {
        store: &store,
        collection: &config.collection,
        nationality: &config.nationality,
    };
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    run_menu(&ctx, stdin.lock(), &mut stdout)
}
