// Payload document API: the downstream contract the adapter drives.
//
// Mirrors Payload's operations: create, find, findByID, update (by id or by
// where), delete (by id or by where) and count. Every call is made with
// `depth: 0`, so relationships come back as ids.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PayloadResult;
use crate::id::DocumentId;
use crate::query::Select;
use crate::where_clause::PayloadWhere;

pub mod memory;
pub mod rest;

pub use memory::MemoryPayload;
pub use rest::PayloadRestClient;

/// Arguments of a `find` call.
#[derive(Debug, Clone, Default)]
pub struct FindArgs {
    pub filter: PayloadWhere,
    /// Sort string (`field` or `-field`).
    pub sort: Option<String>,
    pub select: Option<Select>,
    /// Page size; ignored when `pagination` is false.
    pub limit: Option<u64>,
    /// One-based page number.
    pub page: Option<u64>,
    /// When false, every matching document is returned.
    pub pagination: bool,
}

impl FindArgs {
    pub fn filter(filter: PayloadWhere) -> Self {
        Self {
            filter,
            pagination: true,
            ..Default::default()
        }
    }
}

/// Payload's paginated result envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedDocs {
    pub docs: Vec<Value>,
    pub total_docs: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub total_pages: u64,
    #[serde(default)]
    pub has_next_page: bool,
}

/// Result of an update or delete by where.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkResult {
    #[serde(default)]
    pub docs: Vec<Value>,
    #[serde(default)]
    pub errors: Vec<Value>,
}

/// Payload's document API for a set of registered collections.
#[async_trait]
pub trait PayloadApi: Send + Sync + fmt::Debug {
    /// Slugs of the registered collections.
    fn collections(&self) -> Vec<&str>;

    /// Whether `slug` is a registered collection.
    fn has_collection(&self, slug: &str) -> bool {
        self.collections().contains(&slug)
    }

    /// Insert one document and return it.
    async fn create(
        &self,
        collection: &str,
        data: Value,
        select: Option<&Select>,
    ) -> PayloadResult<Value>;

    /// Query documents.
    async fn find(&self, collection: &str, args: &FindArgs) -> PayloadResult<PaginatedDocs>;

    /// Fetch one document by id. `None` when it does not exist.
    async fn find_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
        select: Option<&Select>,
    ) -> PayloadResult<Option<Value>>;

    /// Update one document by id. `None` when it does not exist.
    async fn update_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
        data: Value,
    ) -> PayloadResult<Option<Value>>;

    /// Update every document matching `filter`.
    async fn update_where(
        &self,
        collection: &str,
        filter: &PayloadWhere,
        data: Value,
    ) -> PayloadResult<BulkResult>;

    /// Delete one document by id, returning it. `None` when it does not exist.
    async fn delete_by_id(&self, collection: &str, id: &DocumentId)
        -> PayloadResult<Option<Value>>;

    /// Delete every document matching `filter`.
    async fn delete_where(&self, collection: &str, filter: &PayloadWhere)
        -> PayloadResult<BulkResult>;

    /// Count documents matching `filter`.
    async fn count(&self, collection: &str, filter: &PayloadWhere) -> PayloadResult<u64>;
}
