use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use csv::ReaderBuilder;

/// Cell texts read as missing, matching pandas' default `na_values`.
pub const NA_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// One input row keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRow {
    line: u64,
    cells: HashMap<String, String>,
}

impl SourceRow {
    pub fn new(line: u64) -> Self {
        Self {
            line,
            cells: HashMap::new(),
        }
    }

    pub fn with(mut self, column: &str, value: &str) -> Self {
        self.cells.insert(column.to_string(), value.to_string());
        self
    }

    pub fn line(&self) -> u64 {
        self.line
    }

    /// The cell text, or `None` when the column is absent or the cell is an NA marker.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .get(column)
            .map(String::as_str)
            .filter(|cell| !is_na(cell))
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.cells.contains_key(column)
    }
}

pub fn is_na(cell: &str) -> bool {
    NA_MARKERS.contains(&cell.trim())
}

pub fn load_csv(path: &Path) -> Result<Vec<SourceRow>> {
    let file = File::open(path).with_context(|| format!("open csv {}", path.display()))?;
    read_csv(file).with_context(|| format!("read csv {}", path.display()))
}

pub fn read_csv<R: Read>(reader: R) -> Result<Vec<SourceRow>> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader.headers().context("read csv headers")?.clone();
    let headers = dedup_headers(headers.iter());

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("parse csv record {}", idx + 1))?;
        // Header is line 1.
        let line = record
            .position()
            .map(|pos| pos.line())
            .unwrap_or(idx as u64 + 2);
        // Short rows are kept; their missing cells read as NA.
        if record.len() > headers.len() {
            bail!(
                "line {line}: expected {} fields, saw {}",
                headers.len(),
                record.len()
            );
        }
        let cells = headers
            .iter()
            .zip(record.iter())
            .map(|(name, cell)| (name.clone(), cell.to_string()))
            .collect();
        rows.push(SourceRow { line, cells });
    }
    Ok(rows)
}

// Repeated headers get `.1`, `.2`, ... suffixes so no column shadows another.
fn dedup_headers<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::new();
    for name in names {
        let name = name.trim().to_string();
        let count = seen.entry(name.clone()).or_insert(0);
        if *count == 0 {
            out.push(name);
        } else {
            out.push(format!("{name}.{count}"));
        }
        *count += 1;
    }
    out
}
