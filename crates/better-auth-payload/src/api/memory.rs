// In-memory Payload document store.
//
// Holds documents per registered collection in `HashMap<String, Vec<Value>>`
// behind a `tokio::sync::RwLock`, and evaluates Payload where trees, sorting,
// selection and pagination the way a local Payload instance would at depth 0.
// Data is lost when the last clone is dropped.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use regex::RegexBuilder;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use better_auth_core::utils::generate_id;

use super::{BulkResult, FindArgs, PaginatedDocs, PayloadApi};
use crate::error::{PayloadError, PayloadResult};
use crate::id::{DocumentId, IdType};
use crate::query::{Select, DEFAULT_LIMIT};
use crate::where_clause::{FieldCondition, PayloadOperator, PayloadWhere};

type Store = HashMap<String, Vec<Value>>;

/// Payload's document API over process memory.
#[derive(Debug, Clone)]
pub struct MemoryPayload {
    collections: Arc<HashSet<String>>,
    store: Arc<RwLock<Store>>,
    id_type: IdType,
    next_id: Arc<AtomicI64>,
}

impl MemoryPayload {
    /// Empty store with the given collections registered and text ids.
    pub fn new<I, S>(collections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            collections: Arc::new(collections.into_iter().map(Into::into).collect()),
            store: Arc::new(RwLock::new(HashMap::new())),
            id_type: IdType::Text,
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }

    /// Assign ids of the given type to created documents.
    pub fn with_id_type(mut self, id_type: IdType) -> Self {
        self.id_type = id_type;
        self
    }

    /// Insert a document as-is, bypassing id and timestamp assignment.
    pub async fn seed(&self, collection: &str, doc: Value) -> PayloadResult<()> {
        self.ensure(collection)?;
        self.store
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(doc);
        Ok(())
    }

    /// Every stored document of a collection, in insertion order.
    pub async fn documents(&self, collection: &str) -> Vec<Value> {
        self.store
            .read()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    fn ensure(&self, collection: &str) -> PayloadResult<()> {
        if self.has_collection(collection) {
            Ok(())
        } else {
            Err(PayloadError::collection_not_found(collection))
        }
    }

    fn next_id(&self) -> Value {
        match self.id_type {
            IdType::Text => Value::String(generate_id()),
            IdType::Number => Value::from(self.next_id.fetch_add(1, AtomicOrdering::SeqCst)),
        }
    }
}

#[async_trait]
impl PayloadApi for MemoryPayload {
    fn collections(&self) -> Vec<&str> {
        self.collections.iter().map(String::as_str).collect()
    }

    fn has_collection(&self, slug: &str) -> bool {
        self.collections.contains(slug)
    }

    async fn create(
        &self,
        collection: &str,
        data: Value,
        select: Option<&Select>,
    ) -> PayloadResult<Value> {
        self.ensure(collection)?;
        let mut doc = match data {
            Value::Object(obj) => obj,
            other => {
                return Err(PayloadError::Api {
                    status: 400,
                    message: format!("document data must be an object, got {other}"),
                })
            }
        };

        if doc.get("id").map_or(true, Value::is_null) {
            doc.insert("id".to_string(), self.next_id());
        }
        let now = Value::String(timestamp());
        doc.entry("createdAt").or_insert_with(|| now.clone());
        doc.entry("updatedAt").or_insert(now);

        let doc = Value::Object(doc);
        self.store
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(doc.clone());
        Ok(project(&doc, select))
    }

    async fn find(&self, collection: &str, args: &FindArgs) -> PayloadResult<PaginatedDocs> {
        self.ensure(collection)?;
        let store = self.store.read().await;
        let mut docs: Vec<&Value> = store
            .get(collection)
            .map(|docs| docs.iter().filter(|d| matches(d, &args.filter)).collect())
            .unwrap_or_default();

        if let Some(sort) = &args.sort {
            sort_docs(&mut docs, sort);
        }

        let total_docs = docs.len() as u64;
        let limit = args.limit.unwrap_or(DEFAULT_LIMIT);
        if !args.pagination || limit == 0 {
            return Ok(PaginatedDocs {
                docs: docs.into_iter().map(|d| project(d, args.select.as_ref())).collect(),
                total_docs,
                limit: total_docs,
                page: Some(1),
                total_pages: 1,
                has_next_page: false,
            });
        }

        let page = args.page.filter(|p| *p > 0).unwrap_or(1);
        let total_pages = total_docs.div_ceil(limit).max(1);
        let start = ((page - 1) * limit) as usize;
        Ok(PaginatedDocs {
            docs: docs
                .into_iter()
                .skip(start)
                .take(limit as usize)
                .map(|d| project(d, args.select.as_ref()))
                .collect(),
            total_docs,
            limit,
            page: Some(page),
            total_pages,
            has_next_page: page < total_pages,
        })
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
        select: Option<&Select>,
    ) -> PayloadResult<Option<Value>> {
        self.ensure(collection)?;
        let store = self.store.read().await;
        let id = id.to_value();
        Ok(store
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| has_id(d, &id)))
            .map(|d| project(d, select)))
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
        data: Value,
    ) -> PayloadResult<Option<Value>> {
        self.ensure(collection)?;
        let mut store = self.store.write().await;
        let id = id.to_value();
        let updated = store
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| has_id(d, &id)))
            .map(|doc| {
                merge_update(doc, &data);
                doc.clone()
            });
        Ok(updated)
    }

    async fn update_where(
        &self,
        collection: &str,
        filter: &PayloadWhere,
        data: Value,
    ) -> PayloadResult<BulkResult> {
        self.ensure(collection)?;
        let mut store = self.store.write().await;
        let mut result = BulkResult::default();
        if let Some(docs) = store.get_mut(collection) {
            for doc in docs.iter_mut().filter(|d| matches(d, filter)) {
                merge_update(doc, &data);
                result.docs.push(doc.clone());
            }
        }
        Ok(result)
    }

    async fn delete_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> PayloadResult<Option<Value>> {
        self.ensure(collection)?;
        let mut store = self.store.write().await;
        let id = id.to_value();
        let Some(docs) = store.get_mut(collection) else {
            return Ok(None);
        };
        Ok(docs
            .iter()
            .position(|d| has_id(d, &id))
            .map(|index| docs.remove(index)))
    }

    async fn delete_where(
        &self,
        collection: &str,
        filter: &PayloadWhere,
    ) -> PayloadResult<BulkResult> {
        self.ensure(collection)?;
        let mut store = self.store.write().await;
        let mut result = BulkResult::default();
        if let Some(docs) = store.get_mut(collection) {
            let (removed, kept): (Vec<Value>, Vec<Value>) = std::mem::take(docs)
                .into_iter()
                .partition(|d| matches(d, filter));
            *docs = kept;
            result.docs = removed;
        }
        Ok(result)
    }

    async fn count(&self, collection: &str, filter: &PayloadWhere) -> PayloadResult<u64> {
        self.ensure(collection)?;
        let store = self.store.read().await;
        Ok(store
            .get(collection)
            .map(|docs| docs.iter().filter(|d| matches(d, filter)).count() as u64)
            .unwrap_or(0))
    }
}

// ─── Document helpers ───────────────────────────────────────────

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn has_id(doc: &Value, id: &Value) -> bool {
    doc.get("id").is_some_and(|v| loose_eq(v, id))
}

/// Merge update data into a document. `id` is immutable.
fn merge_update(doc: &mut Value, data: &Value) {
    if let (Some(doc), Some(data)) = (doc.as_object_mut(), data.as_object()) {
        for (key, value) in data.iter().filter(|(k, _)| k.as_str() != "id") {
            doc.insert(key.clone(), value.clone());
        }
        doc.insert("updatedAt".to_string(), Value::String(timestamp()));
    }
}

/// Apply a `{ field: true }` projection. `id` is always returned.
fn project(doc: &Value, select: Option<&Select>) -> Value {
    let (Some(select), Some(obj)) = (select, doc.as_object()) else {
        return doc.clone();
    };
    let selected: Map<String, Value> = obj
        .iter()
        .filter(|(k, _)| k.as_str() == "id" || select.get(*k).is_some_and(|v| v == &Value::Bool(true)))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Value::Object(selected)
}

/// Sort by a Payload sort string (`field` or `-field`). Missing values sort first.
fn sort_docs(docs: &mut [&Value], sort: &str) {
    let (field, descending) = match sort.strip_prefix('-') {
        Some(field) => (field, true),
        None => (sort, false),
    };
    docs.sort_by(|a, b| {
        let ord = match (a.get(field), b.get(field)) {
            (Some(a), Some(b)) => compare(a, b).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
}

// ─── Where evaluation ───────────────────────────────────────────

fn matches(doc: &Value, filter: &PayloadWhere) -> bool {
    match filter {
        PayloadWhere::And(nodes) => nodes.iter().all(|n| matches(doc, n)),
        PayloadWhere::Or(nodes) => nodes.is_empty() || nodes.iter().any(|n| matches(doc, n)),
        PayloadWhere::Field(cond) => match doc.get(&cond.field) {
            Some(value) => matches_condition(relation_id(value), cond),
            None => matches_condition(&Value::Null, cond),
        },
    }
}

fn matches_condition(value: &Value, cond: &FieldCondition) -> bool {
    let target = &cond.value;
    match cond.op {
        PayloadOperator::Equals => loose_eq(value, target),
        PayloadOperator::NotEquals => !loose_eq(value, target),
        PayloadOperator::LessThan => compare(value, target) == Some(Ordering::Less),
        PayloadOperator::LessThanEqual => {
            matches!(compare(value, target), Some(Ordering::Less | Ordering::Equal))
        }
        PayloadOperator::GreaterThan => compare(value, target) == Some(Ordering::Greater),
        PayloadOperator::GreaterThanEqual => {
            matches!(compare(value, target), Some(Ordering::Greater | Ordering::Equal))
        }
        PayloadOperator::In => is_in(value, target),
        PayloadOperator::NotIn => !is_in(value, target),
        PayloadOperator::Contains => contains(value, target),
        PayloadOperator::Like => match (value, target) {
            (Value::String(text), Value::String(pattern)) => like(text, pattern),
            _ => false,
        },
    }
}

/// A populated relationship compares by its id.
fn relation_id(value: &Value) -> &Value {
    match value {
        Value::Object(obj) => obj.get("id").unwrap_or(value),
        other => other,
    }
}

/// Equality that treats `"12"` and `12` as the same id.
fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(s), Value::Number(n)) | (Value::Number(n), Value::String(s)) => {
            s == &n.to_string()
        }
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => {
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(x), Ok(y)) => Some(x.cmp(&y)),
                _ => Some(x.cmp(y)),
            }
        }
        (Value::Number(x), Value::String(y)) => x.as_f64()?.partial_cmp(&y.parse::<f64>().ok()?),
        (Value::String(x), Value::Number(y)) => x.parse::<f64>().ok()?.partial_cmp(&y.as_f64()?),
        _ => None,
    }
}

fn is_in(value: &Value, target: &Value) -> bool {
    let Value::Array(candidates) = target else {
        return false;
    };
    match value {
        Value::Array(items) => items
            .iter()
            .any(|item| candidates.iter().any(|c| loose_eq(relation_id(item), c))),
        value => candidates.iter().any(|c| loose_eq(value, c)),
    }
}

/// Case-insensitive substring match; for `hasMany` fields, membership.
fn contains(value: &Value, target: &Value) -> bool {
    match (value, target) {
        (_, Value::Array(targets)) => targets.iter().any(|t| contains(value, t)),
        (Value::String(text), Value::String(needle)) => {
            text.to_lowercase().contains(&needle.to_lowercase())
        }
        (Value::Array(items), needle) => items.iter().any(|item| loose_eq(item, needle)),
        _ => false,
    }
}

/// Payload's `like`: case-insensitive. `%` anchors the pattern like SQL
/// `LIKE`; without `%`, every word of the pattern must appear in the text.
fn like(text: &str, pattern: &str) -> bool {
    if !pattern.contains('%') {
        let text = text.to_lowercase();
        return pattern
            .to_lowercase()
            .split_whitespace()
            .all(|word| text.contains(word));
    }

    let body = pattern
        .split('%')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    match RegexBuilder::new(&format!("^{body}$"))
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
    {
        Ok(re) => re.is_match(text),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> MemoryPayload {
        MemoryPayload::new(["users", "sessions"])
    }

    fn eq(field: &str, value: Value) -> PayloadWhere {
        PayloadWhere::field(field, PayloadOperator::Equals, value)
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_timestamps() {
        let api = store();
        let doc = api
            .create("users", json!({ "email": "a@b.com" }), None)
            .await
            .unwrap();
        assert_eq!(doc["id"].as_str().unwrap().len(), 21);
        assert!(doc["createdAt"].is_string());
        assert_eq!(doc["createdAt"], doc["updatedAt"]);
    }

    #[tokio::test]
    async fn test_numeric_ids() {
        let api = store().with_id_type(IdType::Number);
        let first = api.create("users", json!({}), None).await.unwrap();
        let second = api.create("users", json!({}), None).await.unwrap();
        assert_eq!(first["id"], 1);
        assert_eq!(second["id"], 2);
        let found = api
            .find_by_id("users", &DocumentId::Text("2".into()), None)
            .await
            .unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_unknown_collection() {
        let err = store()
            .count("accounts", &PayloadWhere::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PayloadError::CollectionNotFound { .. }));
    }

    #[tokio::test]
    async fn test_find_paginates_and_sorts() {
        let api = store();
        for n in 0..25 {
            api.create("users", json!({ "rank": n }), None).await.unwrap();
        }
        let args = FindArgs {
            sort: Some("-rank".into()),
            limit: Some(10),
            page: Some(3),
            ..FindArgs::filter(PayloadWhere::default())
        };
        let page = api.find("users", &args).await.unwrap();
        assert_eq!(page.total_docs, 25);
        assert_eq!(page.total_pages, 3);
        assert!(!page.has_next_page);
        let ranks: Vec<i64> = page.docs.iter().map(|d| d["rank"].as_i64().unwrap()).collect();
        assert_eq!(ranks, vec![4, 3, 2, 1, 0]);

        let all = api
            .find(
                "users",
                &FindArgs {
                    pagination: false,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(all.docs.len(), 25);
    }

    #[tokio::test]
    async fn test_select_keeps_id() {
        let api = store();
        let mut select = Select::new();
        select.insert("email".into(), Value::Bool(true));
        let doc = api
            .create("users", json!({ "email": "a@b.com", "name": "A" }), Some(&select))
            .await
            .unwrap();
        let keys: Vec<&String> = doc.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 2);
        assert!(doc.get("id").is_some());
        assert!(doc.get("name").is_none());
    }

    #[tokio::test]
    async fn test_update_and_delete_where() {
        let api = store();
        for token in ["a", "b", "c"] {
            api.create("sessions", json!({ "token": token, "user": "u1" }), None)
                .await
                .unwrap();
        }
        let filter = PayloadWhere::Or(vec![eq("token", json!("a")), eq("token", json!("c"))]);
        let updated = api
            .update_where("sessions", &filter, json!({ "user": "u2", "id": "ignored" }))
            .await
            .unwrap();
        assert_eq!(updated.docs.len(), 2);
        assert!(updated.docs.iter().all(|d| d["user"] == "u2" && d["id"] != "ignored"));

        let deleted = api
            .delete_where("sessions", &eq("user", json!("u2")))
            .await
            .unwrap();
        assert_eq!(deleted.docs.len(), 2);
        assert_eq!(api.documents("sessions").await.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_by_id_returns_document() {
        let api = store();
        let doc = api.create("users", json!({ "email": "x" }), None).await.unwrap();
        let id = DocumentId::from_value(&doc["id"]).unwrap();
        let removed = api.delete_by_id("users", &id).await.unwrap().unwrap();
        assert_eq!(removed["email"], "x");
        assert!(api.delete_by_id("users", &id).await.unwrap().is_none());
    }

    #[test]
    fn test_condition_operators() {
        let doc = json!({
            "email": "Alice@Example.com",
            "age": 30,
            "tags": ["a", "b"],
            "user": { "id": "u1" },
            "expiresAt": "2025-01-01T00:00:00.000Z"
        });
        let check = |field: &str, op, value: Value| matches(&doc, &PayloadWhere::field(field, op, value));

        assert!(check("user", PayloadOperator::Equals, json!("u1")));
        assert!(check("age", PayloadOperator::Equals, json!("30")));
        assert!(check("missing", PayloadOperator::Equals, Value::Null));
        assert!(check("age", PayloadOperator::GreaterThanEqual, json!(30)));
        assert!(check("age", PayloadOperator::LessThan, json!(31)));
        assert!(check(
            "expiresAt",
            PayloadOperator::LessThan,
            json!("2025-01-01T01:00:00+00:00")
        ));
        assert!(check("email", PayloadOperator::In, json!(["Alice@Example.com"])));
        assert!(check("tags", PayloadOperator::In, json!(["b", "z"])));
        assert!(check("email", PayloadOperator::NotIn, json!(["bob"])));
        assert!(check("email", PayloadOperator::Contains, json!("example")));
        assert!(check("tags", PayloadOperator::Contains, json!("a")));
        assert!(check("email", PayloadOperator::Like, json!("alice%")));
        assert!(check("email", PayloadOperator::Like, json!("%.com")));
        assert!(!check("email", PayloadOperator::Like, json!("%alice")));
    }

    #[test]
    fn test_like_words() {
        assert!(like("The quick brown fox", "fox quick"));
        assert!(!like("The quick brown fox", "fox slow"));
        assert!(like("abc", "a%c"));
        assert!(!like("ab", "ab%b"));
    }

    #[test]
    fn test_like_patterns_are_literal() {
        assert!(like("A.B@Example.com", "a.b%"));
        assert!(!like("axb@example.com", "a.b%"));
        assert!(like("(admin)+ops", "%)+op%"));
        assert!(like("x", "%x%"));
        assert!(!like("abc", "%x%"));
        assert!(like("line one\nline two", "line%two"));
    }
}
