//! In-memory `CollectionClient` used by unit and integration tests.
//!
//! Gated behind the `test-support` feature (and `cfg(test)`).

use crate::client::CollectionClient;
use crate::error::{StoreError, StoreResult};
use crate::query::{CollectionQuery, Predicate};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// In-memory store that evaluates queries by linear scan.
///
/// Every executed query is recorded, including ones the store rejects, so
/// tests can assert which round trips were (or were not) issued.
#[derive(Default)]
pub struct MemoryStore {
    collections: HashMap<String, Vec<Value>>,
    failing: HashSet<String>,
    executed: Mutex<Vec<CollectionQuery>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add rows to `collection`, keeping insertion order.
    pub fn with_rows<I>(mut self, collection: &str, rows: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .extend(rows);
        self
    }

    /// Make every query against `collection` fail with a 500 status.
    pub fn failing_on(mut self, collection: &str) -> Self {
        self.failing.insert(collection.to_string());
        self
    }

    /// Queries executed so far, in call order.
    pub fn executed(&self) -> Vec<CollectionQuery> {
        self.executed
            .lock()
            .map(|executed| executed.clone())
            .unwrap_or_default()
    }

    /// Number of queries executed against `collection`.
    pub fn calls_to(&self, collection: &str) -> usize {
        self.executed()
            .iter()
            .filter(|query| query.collection() == collection)
            .count()
    }
}

#[async_trait]
impl CollectionClient for MemoryStore {
    async fn execute(&self, query: &CollectionQuery) -> StoreResult<Vec<Value>> {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(query.clone());
        }
        query.validate()?;

        if self.failing.contains(query.collection()) {
            return Err(StoreError::Status {
                collection: query.collection().to_string(),
                status: 500,
                body: "injected failure".to_string(),
            });
        }

        let rows = self
            .collections
            .get(query.collection())
            .map(Vec::as_slice)
            .unwrap_or_default();

        Ok(rows
            .iter()
            .filter(|row| query.predicates().iter().all(|p| matches(row, p)))
            .map(|row| project(row, query.columns()))
            .collect())
    }
}

fn literal_of(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => "null".to_string(),
        Some(other) => other.to_string(),
    }
}

fn matches(row: &Value, predicate: &Predicate) -> bool {
    let actual = literal_of(row.get(predicate.column()));
    match predicate {
        Predicate::Eq { literal, .. } => &actual == literal,
        Predicate::In { literals, .. } => literals.contains(&actual),
    }
}

fn project(row: &Value, columns: &[String]) -> Value {
    if columns.is_empty() {
        return row.clone();
    }
    let projected: Map<String, Value> = columns
        .iter()
        .filter_map(|column| row.get(column).map(|v| (column.clone(), v.clone())))
        .collect();
    Value::Object(projected)
}
