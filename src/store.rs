use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::filter::{Filter, PathConflict, Update};
use crate::schema::{Validator, Violation};

pub const MEMORY_URI: &str = "sqlite::memory:";
const SQLITE_SCHEME: &str = "sqlite://";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocId(pub i64);

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: DocId,
    pub body: Value,
}

impl StoredDocument {
    pub fn get(&self, path: &str) -> Option<&Value> {
        crate::filter::lookup(&self.body, path)
    }

    /// The body with `_id` prepended, the way listings print it.
    pub fn to_json_line(&self) -> String {
        let mut out = Map::new();
        out.insert("_id".to_string(), Value::from(self.id.0));
        if let Some(fields) = self.body.as_object() {
            out.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        Value::Object(out).to_string()
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("collection `{0}` already exists")]
    CollectionExists(String),
    #[error("collection `{0}` does not exist")]
    CollectionMissing(String),
    #[error("{target} rejected by validator: {}", join_violations(.violations))]
    Validation {
        target: String,
        violations: Vec<Violation>,
    },
    #[error("document is not a JSON object")]
    NotAnObject,
    #[error("unsupported connection string `{0}`")]
    BadUri(String),
    #[error(transparent)]
    Update(#[from] PathConflict),
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    Created,
    AlreadyExists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Results are always ordered by identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FindOptions {
    pub limit: Option<usize>,
    pub order: SortOrder,
}

impl FindOptions {
    pub fn limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            order: SortOrder::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOutcome {
    pub matched: usize,
    pub modified: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionInfo {
    pub name: String,
    pub created_at: String,
    pub documents: usize,
}

/// SQLite-backed document collections with per-collection validators.
pub struct DocumentStore {
    conn: Connection,
    location: String,
}

impl DocumentStore {
    /// Accepts `sqlite://<path>`, `sqlite::memory:`, or a bare file path.
    pub fn connect(uri: &str) -> Result<Self, StoreError> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(StoreError::BadUri(uri.to_string()));
        }
        if uri == MEMORY_URI {
            return Self::open_in_memory();
        }
        if let Some(path) = uri.strip_prefix(SQLITE_SCHEME) {
            if path.is_empty() {
                return Err(StoreError::BadUri(uri.to_string()));
            }
            return Self::open(Path::new(path));
        }
        if uri.contains("://") {
            return Err(StoreError::BadUri(uri.to_string()));
        }
        Self::open(Path::new(uri))
    }

    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(path)?;
        init_schema(&conn)?;
        Ok(Self {
            conn,
            location: PathBuf::from(path).display().to_string(),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self {
            conn,
            location: MEMORY_URI.to_string(),
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn collection_names(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM collections ORDER BY name ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn has_collection(&self, name: &str) -> Result<bool, StoreError> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM collections WHERE name = ?1",
                params![name],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn create_collection(&mut self, name: &str, validator: &Validator) -> Result<(), StoreError> {
        if self.has_collection(name)? {
            return Err(StoreError::CollectionExists(name.to_string()));
        }
        let validator_json = serde_json::to_string(validator)?;
        self.conn.execute(
            "INSERT INTO collections (name, validator_json, created_at) VALUES (?1, ?2, ?3)",
            params![name, validator_json, Utc::now().to_rfc3339()],
        )?;
        debug!(collection = name, "collection created");
        Ok(())
    }

    /// Creates the collection unless it already exists; other failures propagate.
    pub fn ensure_collection(
        &mut self,
        name: &str,
        validator: &Validator,
    ) -> Result<CollectionStatus, StoreError> {
        if self.has_collection(name)? {
            return Ok(CollectionStatus::AlreadyExists);
        }
        self.create_collection(name, validator)?;
        Ok(CollectionStatus::Created)
    }

    /// Returns whether the collection existed.
    pub fn drop_collection(&mut self, name: &str) -> Result<bool, StoreError> {
        let tx = self.conn.transaction()?;
        let removed_docs = tx.execute("DELETE FROM documents WHERE collection = ?1", params![name])?;
        let removed = tx.execute("DELETE FROM collections WHERE name = ?1", params![name])?;
        tx.commit()?;
        if removed > 0 {
            info!(collection = name, documents = removed_docs, "collection dropped");
        }
        Ok(removed > 0)
    }

    pub fn validator(&self, name: &str) -> Result<Validator, StoreError> {
        let raw = self
            .conn
            .query_row(
                "SELECT validator_json FROM collections WHERE name = ?1",
                params![name],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .ok_or_else(|| StoreError::CollectionMissing(name.to_string()))?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn describe_collection(&self, name: &str) -> Result<CollectionInfo, StoreError> {
        let created_at = self
            .conn
            .query_row(
                "SELECT created_at FROM collections WHERE name = ?1",
                params![name],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .ok_or_else(|| StoreError::CollectionMissing(name.to_string()))?;
        let documents = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            params![name],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(CollectionInfo {
            name: name.to_string(),
            created_at,
            documents: usize::try_from(documents).unwrap_or_default(),
        })
    }

    pub fn insert_one(&mut self, name: &str, document: &Value) -> Result<DocId, StoreError> {
        let ids = self.insert_many(name, std::slice::from_ref(document))?;
        ids.into_iter()
            .next()
            .ok_or_else(|| StoreError::CollectionMissing(name.to_string()))
    }

    /// Validates every document first; nothing is written if any is rejected.
    pub fn insert_many(&mut self, name: &str, documents: &[Value]) -> Result<Vec<DocId>, StoreError> {
        let validator = self.validator(name)?;
        for (idx, doc) in documents.iter().enumerate() {
            if !doc.is_object() {
                return Err(StoreError::NotAnObject);
            }
            validator
                .validate(doc)
                .map_err(|violations| StoreError::Validation {
                    target: format!("document {idx}"),
                    violations,
                })?;
        }

        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        let mut ids = Vec::with_capacity(documents.len());
        {
            let mut stmt = tx.prepare(
                "INSERT INTO documents (collection, body, updated_at) VALUES (?1, ?2, ?3)",
            )?;
            for doc in documents {
                let body = serde_json::to_string(doc)?;
                stmt.execute(params![name, body, now])?;
                ids.push(DocId(tx.last_insert_rowid()));
            }
        }
        tx.commit()?;
        debug!(collection = name, inserted = ids.len(), "documents inserted");
        Ok(ids)
    }

    pub fn find(&self, name: &str, filter: &Filter) -> Result<Vec<StoredDocument>, StoreError> {
        self.find_with(name, filter, &FindOptions::default())
    }

    pub fn find_with(
        &self,
        name: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        if !self.has_collection(name)? {
            return Err(StoreError::CollectionMissing(name.to_string()));
        }
        if options.limit == Some(0) {
            return Ok(Vec::new());
        }

        let pinned = filter.pinned_id();
        let mut sql = String::from("SELECT doc_id, body FROM documents WHERE collection = ?1");
        if pinned.is_some() {
            sql.push_str(" AND doc_id = ?2");
        }
        sql.push_str(match options.order {
            SortOrder::Ascending => " ORDER BY doc_id ASC",
            SortOrder::Descending => " ORDER BY doc_id DESC",
        });
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = match pinned {
            Some(id) => stmt.query_map(params![name, id.0], read_document_row)?,
            None => stmt.query_map(params![name], read_document_row)?,
        };

        let mut out = Vec::new();
        for row in rows {
            let (id, body) = row?;
            let id = DocId(id);
            let body: Value = serde_json::from_str(&body)?;
            if !filter.matches(id, &body) {
                continue;
            }
            out.push(StoredDocument { id, body });
            if options.limit.is_some_and(|limit| out.len() >= limit) {
                break;
            }
        }
        Ok(out)
    }

    pub fn find_by_id(&self, name: &str, id: DocId) -> Result<Option<StoredDocument>, StoreError> {
        let mut found = self.find_with(name, &Filter::Id(id), &FindOptions::limit(1))?;
        Ok(found.pop())
    }

    pub fn count(&self, name: &str, filter: &Filter) -> Result<usize, StoreError> {
        if !matches!(filter, Filter::All) {
            return Ok(self.find(name, filter)?.len());
        }
        if !self.has_collection(name)? {
            return Err(StoreError::CollectionMissing(name.to_string()));
        }
        let total: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(total as usize)
    }

    /// Applies `update` to the first matching document (by identity) and re-validates it.
    pub fn update_one(
        &mut self,
        name: &str,
        filter: &Filter,
        update: &Update,
    ) -> Result<UpdateOutcome, StoreError> {
        let Some(mut doc) = self
            .find_with(name, filter, &FindOptions::limit(1))?
            .pop()
        else {
            return Ok(UpdateOutcome::default());
        };

        if !update.apply(&mut doc.body)? {
            return Ok(UpdateOutcome {
                matched: 1,
                modified: 0,
            });
        }

        let validator = self.validator(name)?;
        validator
            .validate(&doc.body)
            .map_err(|violations| StoreError::Validation {
                target: format!("document _id={}", doc.id),
                violations,
            })?;

        let body = serde_json::to_string(&doc.body)?;
        self.conn.execute(
            "UPDATE documents SET body = ?1, updated_at = ?2 WHERE doc_id = ?3",
            params![body, Utc::now().to_rfc3339(), doc.id.0],
        )?;
        Ok(UpdateOutcome {
            matched: 1,
            modified: 1,
        })
    }
}

fn read_document_row(row: &Row<'_>) -> rusqlite::Result<(i64, String)> {
    Ok((row.get(0)?, row.get(1)?))
}

fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS collections (
            name TEXT PRIMARY KEY,
            validator_json TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS documents (
            doc_id INTEGER PRIMARY KEY AUTOINCREMENT,
            collection TEXT NOT NULL,
            body TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection, doc_id);
        "#,
    )?;
    Ok(())
}
