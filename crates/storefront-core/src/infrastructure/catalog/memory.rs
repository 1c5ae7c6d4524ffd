//! In-memory catalog adapter
//!
//! Holds a [`CatalogSnapshot`] (records per entity plus schemas) and answers
//! [`CatalogPort`] calls by evaluating conditions as specifications. Used by
//! the CLI against exported snapshots and by tests as a fixture store.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::catalog::{CatalogPort, Condition, EntityMeta, ListQuery, OrderBy, Record};
use crate::domain::specification::{AllOf, AnyOf, Specification, spec};
use crate::error::{Error, Result};

/// Serializable catalog content
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// Records keyed by entity name
    #[serde(default)]
    pub entities: HashMap<String, Vec<Record>>,
    /// Schemas keyed by entity name
    #[serde(default)]
    pub meta: HashMap<String, EntityMeta>,
}

/// Catalog port backed by an in-memory snapshot
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    snapshot: RwLock<CatalogSnapshot>,
    unavailable: AtomicBool,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Self {
        Self {
            snapshot: RwLock::new(snapshot),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Parse a JSON snapshot
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: CatalogSnapshot = serde_json::from_str(json)?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Load a JSON snapshot from disk
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Catalog(format!("Failed to read snapshot {}: {}", path.display(), e))
        })?;
        Self::from_json(&contents)
    }

    /// Builder-style: add records of one entity type
    pub fn with_records(self, entity: &str, records: Vec<Record>) -> Self {
        self.insert_all(entity, records);
        self
    }

    /// Builder-style: register a schema
    pub fn with_meta(self, meta: EntityMeta) -> Self {
        if let Ok(mut snapshot) = self.snapshot.write() {
            snapshot.meta.insert(meta.name.clone(), meta);
        }
        self
    }

    pub fn insert(&self, entity: &str, record: Record) {
        self.insert_all(entity, vec![record]);
    }

    fn insert_all(&self, entity: &str, records: Vec<Record>) {
        if let Ok(mut snapshot) = self.snapshot.write() {
            snapshot
                .entities
                .entry(entity.to_string())
                .or_default()
                .extend(records);
        }
    }

    /// Simulate an outage: every port call fails until re-enabled
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, AtomicOrdering::SeqCst);
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, CatalogSnapshot>> {
        if self.unavailable.load(AtomicOrdering::SeqCst) {
            return Err(Error::CatalogUnavailable("in-memory catalog is offline".to_string()));
        }
        self.snapshot
            .read()
            .map_err(|_| Error::Catalog("catalog snapshot lock poisoned".to_string()))
    }

    /// Turn one condition into a record specification, resolving child-table
    /// conditions to the set of matching parents.
    fn condition_spec(
        snapshot: &CatalogSnapshot,
        condition: &Condition,
    ) -> Box<dyn Specification<Record>> {
        match &condition.table {
            Some(table) => {
                let parents: HashSet<String> = snapshot
                    .entities
                    .get(table)
                    .map(|rows| {
                        rows.iter()
                            .filter(|row| condition.matches(row))
                            .filter_map(|row| row.text("parent"))
                            .collect()
                    })
                    .unwrap_or_default();
                Box::new(spec(move |r: &Record| {
                    r.name().is_some_and(|name| parents.contains(&name))
                }))
            }
            None => {
                let condition = condition.clone();
                Box::new(spec(move |r: &Record| condition.matches(r)))
            }
        }
    }

    fn select<'a>(
        snapshot: &'a CatalogSnapshot,
        entity: &str,
        filters: &[Condition],
        or_filters: &[Condition],
    ) -> Vec<&'a Record> {
        let Some(records) = snapshot.entities.get(entity) else {
            return Vec::new();
        };

        let all = AllOf::new(
            filters
                .iter()
                .map(|c| Self::condition_spec(snapshot, c))
                .collect(),
        );
        let any = AnyOf::new(
            or_filters
                .iter()
                .map(|c| Self::condition_spec(snapshot, c))
                .collect(),
        );
        let matcher = all.and(any);

        records.iter().filter(|r| matcher.is_satisfied_by(r)).collect()
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .unwrap_or(0.0)
            .total_cmp(&y.as_f64().unwrap_or(0.0)),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn compare_records(a: &Record, b: &Record, order: &[OrderBy]) -> Ordering {
    for key in order {
        let ord = compare_values(a.value(&key.field), b.value(&key.field));
        let ord = if key.descending { ord.reverse() } else { ord };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

#[async_trait]
impl CatalogPort for InMemoryCatalog {
    async fn list(&self, entity: &str, query: &ListQuery) -> Result<Vec<Record>> {
        let snapshot = self.read()?;
        let mut matched = Self::select(&snapshot, entity, &query.filters, &query.or_filters);

        if !query.order_by.is_empty() {
            matched.sort_by(|a, b| compare_records(a, b, &query.order_by));
        }

        let mut rows: Vec<Record> = matched
            .into_iter()
            .map(|r| {
                if query.fields.is_empty() {
                    r.clone()
                } else {
                    r.project(&query.fields)
                }
            })
            .collect();

        if query.distinct {
            let mut seen = HashSet::new();
            rows.retain(|r| seen.insert(Value::Object(r.as_map().clone()).to_string()));
        }

        let rows = rows.into_iter().skip(query.start);
        Ok(match query.limit {
            Some(limit) => rows.take(limit).collect(),
            None => rows.collect(),
        })
    }

    async fn count(
        &self,
        entity: &str,
        filters: &[Condition],
        or_filters: &[Condition],
    ) -> Result<u64> {
        let snapshot = self.read()?;
        Ok(Self::select(&snapshot, entity, filters, or_filters).len() as u64)
    }

    async fn get_value(&self, entity: &str, key: &str, field: &str) -> Result<Option<Value>> {
        let snapshot = self.read()?;
        Ok(snapshot
            .entities
            .get(entity)
            .and_then(|rows| rows.iter().find(|r| r.name().as_deref() == Some(key)))
            .and_then(|r| r.get(field))
            .filter(|v| !v.is_null())
            .cloned())
    }

    async fn get_meta(&self, entity: &str) -> Result<Option<EntityMeta>> {
        let snapshot = self.read()?;
        Ok(snapshot.meta.get(entity).cloned())
    }
}
