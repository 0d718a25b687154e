use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::Rng;
use tracing::{info, warn};

use crate::mapper::RecordMapper;
use crate::schema::Validator;
use crate::selection::{SelectionPolicy, select_rows};
use crate::source::{SourceRow, load_csv};
use crate::store::{CollectionStatus, DocId, DocumentStore};

#[derive(Debug, Clone)]
pub struct IngestSummary {
    pub source: Option<PathBuf>,
    pub rows_read: usize,
    pub rows_selected: usize,
    pub priority_rows: usize,
    pub documents_inserted: usize,
    pub ids: Vec<DocId>,
}

/// Drops the collection if present, then declares it again with `validator`.
pub fn reset_collection(
    store: &mut DocumentStore,
    name: &str,
    validator: &Validator,
) -> Result<CollectionStatus> {
    if store.has_collection(name)? {
        store
            .drop_collection(name)
            .with_context(|| format!("drop collection {name}"))?;
    }
    declare_collection(store, name, validator)
}

pub fn declare_collection(
    store: &mut DocumentStore,
    name: &str,
    validator: &Validator,
) -> Result<CollectionStatus> {
    let status = store
        .ensure_collection(name, validator)
        .with_context(|| format!("declare collection {name}"))?;
    match status {
        CollectionStatus::Created => info!(collection = name, "collection created"),
        CollectionStatus::AlreadyExists => {
            info!(collection = name, "collection already exists, keeping it")
        }
    }
    Ok(status)
}

pub fn ingest_csv<R: Rng>(
    store: &mut DocumentStore,
    collection: &str,
    path: &Path,
    selection: &SelectionPolicy,
    mapper: &mut RecordMapper<R>,
) -> Result<IngestSummary> {
    let rows = load_csv(path)?;
    info!(path = %path.display(), rows = rows.len(), "source table loaded");
    let mut summary = ingest_rows(store, collection, &rows, selection, mapper)?;
    summary.source = Some(path.to_path_buf());
    Ok(summary)
}

pub fn ingest_rows<R: Rng>(
    store: &mut DocumentStore,
    collection: &str,
    rows: &[SourceRow],
    selection: &SelectionPolicy,
    mapper: &mut RecordMapper<R>,
) -> Result<IngestSummary> {
    let selected = select_rows(rows, selection);
    info!(
        selected = selected.len(),
        priority = selected.priority,
        prefix = %selection.team_prefix,
        "rows selected for load"
    );

    let players = mapper
        .map_rows(&selected.rows)
        .context("map source rows to player documents")?;
    let mut documents = Vec::with_capacity(players.len());
    for player in &players {
        documents.push(
            player
                .to_document()
                .with_context(|| format!("serialize player {}", player.player_id))?,
        );
    }

    let ids = if documents.is_empty() {
        warn!(collection = %collection, "no records found to insert");
        Vec::new()
    } else {
        store
            .insert_many(collection, &documents)
            .with_context(|| format!("insert players into {collection}"))?
    };

    Ok(IngestSummary {
        source: None,
        rows_read: rows.len(),
        rows_selected: selected.len(),
        priority_rows: selected.priority,
        documents_inserted: ids.len(),
        ids,
    })
}
