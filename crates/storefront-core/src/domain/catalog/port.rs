//! Catalog access port
//!
//! Read-only capability over the external catalog record store. Every
//! component consumes the catalog through [`CatalogPort`]; records cross the
//! port as loosely typed [`Record`]s and are parsed into domain types right
//! after.

use std::fmt;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::coerce;
use crate::error::Result;

/// Entity names known to the storefront.
pub mod entities {
    /// Storefront projection of master items
    pub const CATALOG_ITEM: &str = "catalog_item";
    /// Hierarchical categories
    pub const ITEM_GROUP: &str = "item_group";
    /// Secondary group membership of items (`parent`, `item_group`)
    pub const ITEM_GROUP_LINK: &str = "item_group_link";
    /// Variant attribute values (`parent`, `attribute`, `attribute_value`)
    pub const ITEM_VARIANT_ATTRIBUTE: &str = "item_variant_attribute";
}

/// A single record as returned by the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field setter
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Field value or `Null` when absent
    pub fn value(&self, field: &str) -> &Value {
        self.0.get(field).unwrap_or(&Value::Null)
    }

    /// Textual form of a field; `None` for missing, null and empty values
    pub fn text(&self, field: &str) -> Option<String> {
        self.get(field).and_then(coerce::to_text)
    }

    /// The record key
    pub fn name(&self) -> Option<String> {
        self.text("name")
    }

    /// Keep only the requested fields
    pub fn project(&self, fields: &[String]) -> Record {
        let map = fields
            .iter()
            .map(|f| (f.clone(), self.value(f).clone()))
            .collect();
        Record(map)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Parse into a typed domain record
    pub fn parse<T: DeserializeOwned>(self) -> Result<T> {
        Ok(serde_json::from_value(Value::Object(self.0))?)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Non-empty values of one field, in record order
pub fn pluck(records: &[Record], field: &str) -> Vec<String> {
    records.iter().filter_map(|r| r.text(field)).collect()
}

/// Comparison operators understood by the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    NotEq,
    In,
    /// SQL-style pattern with `%` wildcards, case-insensitive
    Like,
    IsSet,
    IsNotSet,
    Ge,
    Le,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::In => "in",
            Self::Like => "like",
            Self::IsSet => "is set",
            Self::IsNotSet => "is not set",
            Self::Ge => ">=",
            Self::Le => "<=",
        };
        f.write_str(s)
    }
}

/// A single filter condition.
///
/// With `table` set, the condition targets a child table keyed by `parent`
/// and matches records having at least one child row that satisfies it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    pub field: String,
    pub op: Operator,
    #[serde(default)]
    pub value: Value,
}

impl Condition {
    pub fn new(field: impl Into<String>, op: Operator, value: impl Into<Value>) -> Self {
        Self {
            table: None,
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Eq, value)
    }

    pub fn not_eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::NotEq, value)
    }

    pub fn is_in<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        Self::new(field, Operator::In, Value::Array(values))
    }

    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(field, Operator::Like, Value::String(pattern.into()))
    }

    pub fn is_set(field: impl Into<String>) -> Self {
        Self::new(field, Operator::IsSet, Value::Null)
    }

    pub fn is_not_set(field: impl Into<String>) -> Self {
        Self::new(field, Operator::IsNotSet, Value::Null)
    }

    pub fn ge(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Ge, value)
    }

    pub fn le(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Le, value)
    }

    /// Retarget this condition at a child table
    pub fn in_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Evaluate the field comparison against one record.
    ///
    /// Child-table resolution is left to the adapter; this only looks at
    /// `record[field]`.
    pub fn matches(&self, record: &Record) -> bool {
        let actual = record.value(&self.field);
        match self.op {
            Operator::Eq => loose_eq(actual, &self.value),
            Operator::NotEq => !loose_eq(actual, &self.value),
            Operator::In => match &self.value {
                Value::Array(options) => options.iter().any(|o| loose_eq(actual, o)),
                single => loose_eq(actual, single),
            },
            Operator::Like => match (coerce::to_text(actual), self.value.as_str()) {
                (Some(text), Some(pattern)) => like_match(&text, pattern),
                _ => false,
            },
            Operator::IsSet => coerce::to_text(actual).is_some(),
            Operator::IsNotSet => coerce::to_text(actual).is_none(),
            Operator::Ge => {
                !actual.is_null() && coerce::to_f64(actual) >= coerce::to_f64(&self.value)
            }
            Operator::Le => {
                !actual.is_null() && coerce::to_f64(actual) <= coerce::to_f64(&self.value)
            }
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(table) = &self.table {
            write!(f, "{}.", table)?;
        }
        write!(f, "{} {} {}", self.field, self.op, self.value)
    }
}

/// Canonical scalar text used for equality: booleans become `1`/`0` and
/// integral floats lose their fraction, so `1`, `1.0`, `true` and `"1"` agree.
fn canonical(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Some((f as i64).to_string()),
            _ => Some(n.to_string()),
        },
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn loose_eq(actual: &Value, expected: &Value) -> bool {
    canonical(actual) == canonical(expected)
}

/// Case-insensitive match of `text` against a pattern with `%` wildcards.
pub fn like_match(text: &str, pattern: &str) -> bool {
    let text = text.to_lowercase();
    let pattern = pattern.to_lowercase();
    let parts: Vec<&str> = pattern.split('%').collect();

    if parts.len() == 1 {
        return text == pattern;
    }

    let first = parts[0];
    let last = parts[parts.len() - 1];
    if !text.starts_with(first) {
        return false;
    }

    let mut cursor = first.len();
    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        match text[cursor..].find(part) {
            Some(pos) => cursor += pos + part.len(),
            None => return false,
        }
    }

    text.len() >= cursor + last.len() && text[cursor..].ends_with(last)
}

/// Sort key for list queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, if self.descending { "desc" } else { "asc" })
    }
}

/// Parameters of a `list` call.
///
/// `filters` are AND-ed; `or_filters`, when present, must match at least once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListQuery {
    pub filters: Vec<Condition>,
    pub or_filters: Vec<Condition>,
    /// Fields to return; empty means every field
    pub fields: Vec<String>,
    pub distinct: bool,
    pub order_by: Vec<OrderBy>,
    pub start: usize,
    pub limit: Option<usize>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.filters.push(condition);
        self
    }

    pub fn filters(mut self, conditions: impl IntoIterator<Item = Condition>) -> Self {
        self.filters.extend(conditions);
        self
    }

    pub fn or_filters(mut self, conditions: impl IntoIterator<Item = Condition>) -> Self {
        self.or_filters.extend(conditions);
        self
    }

    pub fn fields(mut self, fields: &[&str]) -> Self {
        self.fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn start(mut self, start: usize) -> Self {
        self.start = start;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Field types relevant to faceting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Link,
    Check,
    Select,
    TableMultiselect,
    #[serde(other)]
    Other,
}

/// Schema entry for one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMeta {
    pub name: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub label: Option<String>,
    /// Entity type referenced by Link / TableMultiselect fields
    #[serde(default)]
    pub link_target: Option<String>,
}

/// Schema of one entity type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityMeta {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldMeta>,
}

impl EntityMeta {
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn field(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Read-only access to the catalog record store
#[async_trait]
pub trait CatalogPort: Send + Sync {
    /// List records of an entity type
    async fn list(&self, entity: &str, query: &ListQuery) -> Result<Vec<Record>>;

    /// Count records matching the filters
    async fn count(
        &self,
        entity: &str,
        filters: &[Condition],
        or_filters: &[Condition],
    ) -> Result<u64>;

    /// Read one field of one record
    async fn get_value(&self, entity: &str, key: &str, field: &str) -> Result<Option<Value>>;

    /// Schema of an entity type, `None` when the type is unknown
    async fn get_meta(&self, entity: &str) -> Result<Option<EntityMeta>>;
}
