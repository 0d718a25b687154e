use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use crate::mapper::StartYearPolicy;
use crate::player::PLAYERS_COLLECTION;
use crate::queries::DEFAULT_NATIONALITY;
use crate::selection::{
    DEFAULT_LOAD_TARGET, DEFAULT_PRIORITY_QUOTA, DEFAULT_TEAM_PREFIX, SelectionPolicy,
};

const DEFAULT_CSV: &str = "all_players.csv";
const CACHE_DIR: &str = "football_docs";
const DB_FILE: &str = "women_football.sqlite";
const DEFAULT_UPPERCASE_SAMPLE: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub csv_path: PathBuf,
    pub db_uri: String,
    pub collection: String,
    pub selection: SelectionPolicy,
    pub start_year: StartYearPolicy,
    pub start_year_seed: Option<u64>,
    pub uppercase_sample: usize,
    pub nationality: String,
}

impl AppConfig {
    /// Reads `.env`, then the process environment, then `--csv` / `--db` flags.
    pub fn from_env(args: &[String]) -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok(), args)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>, args: &[String]) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let csv_path = parse_flag(args, "--csv")
            .or_else(|| var("PLAYERS_CSV"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CSV));

        let db_uri = parse_flag(args, "--db")
            .or_else(|| var("PLAYERS_DB_URI"))
            .or_else(|| default_db_uri(&var))
            .unwrap_or_else(|| format!("sqlite://{DB_FILE}"));

        let start_year = match var("START_YEAR_SOURCE") {
            Some(raw) => raw
                .parse::<StartYearPolicy>()
                .map_err(|err| anyhow!("START_YEAR_SOURCE: {err}"))?,
            None => StartYearPolicy::default(),
        };
        let start_year_seed = match var("START_YEAR_SEED") {
            Some(raw) => Some(
                raw.trim()
                    .parse::<u64>()
                    .with_context(|| format!("START_YEAR_SEED: invalid seed `{raw}`"))?,
            ),
            None => None,
        };

        Ok(Self {
            csv_path,
            db_uri,
            collection: var("PLAYERS_COLLECTION").unwrap_or_else(|| PLAYERS_COLLECTION.to_string()),
            selection: SelectionPolicy {
                team_prefix: var("PRIORITY_TEAM_PREFIX")
                    .unwrap_or_else(|| DEFAULT_TEAM_PREFIX.to_string()),
                priority_quota: parse_usize(&var, "PRIORITY_QUOTA", DEFAULT_PRIORITY_QUOTA)?,
                target: parse_usize(&var, "LOAD_TARGET", DEFAULT_LOAD_TARGET)?,
            },
            start_year,
            start_year_seed,
            uppercase_sample: parse_usize(&var, "UPPERCASE_SAMPLE", DEFAULT_UPPERCASE_SAMPLE)?,
            nationality: var("NATIONALITY_FILTER").unwrap_or_else(|| DEFAULT_NATIONALITY.to_string()),
        })
    }
}

fn parse_usize(var: &impl Fn(&str) -> Option<String>, key: &str, default: usize) -> Result<usize> {
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .with_context(|| format!("{key}: expected a non-negative integer, got `{raw}`")),
        None => Ok(default),
    }
}

fn default_db_uri(var: &impl Fn(&str) -> Option<String>) -> Option<String> {
    // Prefer XDG cache, fall back to ~/.cache.
    let dir = var("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(|| var("HOME").map(|home| PathBuf::from(home).join(".cache")))?;
    Some(format!(
        "sqlite://{}",
        dir.join(CACHE_DIR).join(DB_FILE).display()
    ))
}

fn parse_flag(args: &[String], flag: &str) -> Option<String> {
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}
