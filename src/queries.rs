use std::io::{self, Write};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::info;

use crate::filter::{Filter, Update};
use crate::store::{DocId, DocumentStore, FindOptions, StoredDocument};

pub const START_YEAR_THRESHOLD: i32 = 2020;
pub const TEAM_PREFIX: &str = "Manchester";
pub const DEFAULT_NATIONALITY: &str = "es ESP";

pub fn players_started_after(
    store: &DocumentStore,
    collection: &str,
    year: i32,
) -> Result<Vec<StoredDocument>> {
    store
        .find(collection, &Filter::gt("start_year", year))
        .with_context(|| format!("find players with start_year > {year}"))
}

pub fn players_by_team_prefix(
    store: &DocumentStore,
    collection: &str,
    prefix: &str,
    case_insensitive: bool,
) -> Result<Vec<StoredDocument>> {
    let filter = Filter::prefix("team.name", prefix, case_insensitive)
        .with_context(|| format!("build team prefix filter for `{prefix}`"))?;
    store
        .find(collection, &filter)
        .with_context(|| format!("find players whose team starts with `{prefix}`"))
}

pub fn players_by_nationality(
    store: &DocumentStore,
    collection: &str,
    country: &str,
) -> Result<Vec<StoredDocument>> {
    store
        .find(collection, &Filter::eq("nationality", country))
        .with_context(|| format!("find players with nationality `{country}`"))
}

#[derive(Debug, Clone)]
pub struct QueryTiming {
    pub label: String,
    pub elapsed: Duration,
    pub results: usize,
}

/// Times the three fixed queries; the team query here is case-insensitive.
pub fn measure_query_time(
    store: &DocumentStore,
    collection: &str,
    nationality: &str,
) -> Result<Vec<QueryTiming>> {
    let mut out = Vec::with_capacity(3);

    let started = Instant::now();
    let results = players_started_after(store, collection, START_YEAR_THRESHOLD)?.len();
    out.push(QueryTiming {
        label: format!("start_year > {START_YEAR_THRESHOLD}"),
        elapsed: started.elapsed(),
        results,
    });

    let started = Instant::now();
    let results = players_by_team_prefix(store, collection, TEAM_PREFIX, true)?.len();
    out.push(QueryTiming {
        label: format!("team.name ^{TEAM_PREFIX} (case-insensitive)"),
        elapsed: started.elapsed(),
        results,
    });

    let started = Instant::now();
    let results = players_by_nationality(store, collection, nationality)?.len();
    out.push(QueryTiming {
        label: format!("nationality = {nationality}"),
        elapsed: started.elapsed(),
        results,
    });

    for timing in &out {
        info!(
            query = %timing.label,
            elapsed_ms = timing.elapsed.as_secs_f64() * 1000.0,
            results = timing.results,
            "query timed"
        );
    }
    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameChange {
    pub id: DocId,
    pub before: String,
    pub after: String,
}

/// Upper-cases `name` on the first `sample` documents in identity order.
pub fn uppercase_names(
    store: &mut DocumentStore,
    collection: &str,
    sample: usize,
) -> Result<Vec<NameChange>> {
    let docs = store
        .find_with(collection, &Filter::All, &FindOptions::limit(sample))
        .context("load uppercase sample")?;

    let mut changes = Vec::with_capacity(docs.len());
    for doc in docs {
        let Some(before) = doc.get("name").and_then(|v| v.as_str()).map(str::to_string) else {
            continue;
        };
        let after = before.to_uppercase();
        store
            .update_one(collection, &Filter::Id(doc.id), &Update::set("name", after.clone()))
            .with_context(|| format!("uppercase name of document {}", doc.id))?;
        info!(id = %doc.id, before = %before, after = %after, "name normalized");
        changes.push(NameChange {
            id: doc.id,
            before,
            after,
        });
    }
    Ok(changes)
}

pub fn print_documents<W: Write>(out: &mut W, docs: &[StoredDocument]) -> io::Result<()> {
    for doc in docs {
        writeln!(out, "{}", doc.to_json_line())?;
    }
    writeln!(out, "({} documents)", docs.len())
}
