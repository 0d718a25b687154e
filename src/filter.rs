use std::cmp::Ordering;

use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::store::DocId;

/// Predicate over stored documents. Paths are dotted (`team.name`).
#[derive(Debug, Clone)]
pub enum Filter {
    All,
    Id(DocId),
    Eq(String, Value),
    Gt(String, Value),
    Gte(String, Value),
    Lt(String, Value),
    Lte(String, Value),
    Regex(String, Regex),
    And(Vec<Filter>),
}

impl Filter {
    pub fn eq(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(path.into(), value.into())
    }

    pub fn gt(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Gt(path.into(), value.into())
    }

    pub fn gte(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Gte(path.into(), value.into())
    }

    pub fn lt(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Lt(path.into(), value.into())
    }

    pub fn lte(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Lte(path.into(), value.into())
    }

    pub fn regex(
        path: impl Into<String>,
        pattern: &str,
        case_insensitive: bool,
    ) -> Result<Self, regex::Error> {
        let re = RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .build()?;
        Ok(Filter::Regex(path.into(), re))
    }

    /// Anchored literal prefix match.
    pub fn prefix(
        path: impl Into<String>,
        prefix: &str,
        case_insensitive: bool,
    ) -> Result<Self, regex::Error> {
        Self::regex(path, &format!("^{}", regex::escape(prefix)), case_insensitive)
    }

    /// The single document id this filter is pinned to, if any.
    pub fn pinned_id(&self) -> Option<DocId> {
        match self {
            Filter::Id(id) => Some(*id),
            Filter::And(filters) => filters.iter().find_map(Filter::pinned_id),
            _ => None,
        }
    }

    pub fn matches(&self, id: DocId, doc: &Value) -> bool {
        match self {
            Filter::All => true,
            Filter::Id(want) => *want == id,
            Filter::Eq(path, want) => {
                lookup(doc, path).is_some_and(|have| values_equal(have, want))
            }
            Filter::Gt(path, bound) => compare_at(doc, path, bound) == Some(Ordering::Greater),
            Filter::Gte(path, bound) => matches!(
                compare_at(doc, path, bound),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Filter::Lt(path, bound) => compare_at(doc, path, bound) == Some(Ordering::Less),
            Filter::Lte(path, bound) => matches!(
                compare_at(doc, path, bound),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Filter::Regex(path, re) => lookup(doc, path)
                .and_then(Value::as_str)
                .is_some_and(|s| re.is_match(s)),
            Filter::And(filters) => filters.iter().all(|f| f.matches(id, doc)),
        }
    }
}

pub fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(doc, |current, key| current.as_object()?.get(key))
}

fn compare_at(doc: &Value, path: &str, bound: &Value) -> Option<Ordering> {
    compare(lookup(doc, path)?, bound)
}

// Only same-kind values are ordered; anything else never matches a range filter.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                return Some(x.cmp(&y));
            }
            x.as_f64()?.partial_cmp(&y.as_f64()?)
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => compare(a, b) == Some(Ordering::Equal),
        _ => a == b,
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot set `{path}`: `{blocked_at}` is not an object")]
pub struct PathConflict {
    pub path: String,
    pub blocked_at: String,
}

/// Partial document update, applied as a sequence of `$set` assignments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    set: Vec<(String, Value)>,
}

impl Update {
    pub fn set(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::default().and_set(path, value)
    }

    pub fn and_set(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set.push((path.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Returns whether the document changed.
    pub fn apply(&self, doc: &mut Value) -> Result<bool, PathConflict> {
        let mut changed = false;
        for (path, value) in &self.set {
            changed |= set_path(doc, path, value.clone())?;
        }
        Ok(changed)
    }
}

fn set_path(doc: &mut Value, path: &str, value: Value) -> Result<bool, PathConflict> {
    let conflict = |blocked_at: &str| PathConflict {
        path: path.to_string(),
        blocked_at: blocked_at.to_string(),
    };

    let keys: Vec<&str> = path.split('.').collect();
    let Some((last, parents)) = keys.split_last() else {
        return Err(conflict(path));
    };

    let mut current = doc;
    let mut walked = String::new();
    for key in parents {
        let Some(map) = current.as_object_mut() else {
            return Err(conflict(display_walked(&walked)));
        };
        if !walked.is_empty() {
            walked.push('.');
        }
        walked.push_str(key);
        current = map
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    let Some(map) = current.as_object_mut() else {
        return Err(conflict(display_walked(&walked)));
    };
    if map.get(*last) == Some(&value) {
        return Ok(false);
    }
    map.insert(last.to_string(), value);
    Ok(true)
}

fn display_walked(walked: &str) -> &str {
    if walked.is_empty() { "(document)" } else { walked }
}
