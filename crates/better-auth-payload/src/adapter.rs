// PayloadAdapter: better-auth's storage contract over Payload's document API.
//
// Every operation resolves the model's collection, translates filters, sort
// and selection, calls the `PayloadApi`, and transforms the documents back
// into better-auth records. Failures are logged and then either swallowed
// into the operation's empty value or surfaced, per `ErrorPolicy`.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use serde_json::Value;

use better_auth_core::db::adapter::{
    Adapter, AdapterResult, FindManyQuery, SchemaFile, WhereClause,
};
use better_auth_core::db::schema::AuthSchema;
use better_auth_core::error::BetterAuthError;

use crate::api::{FindArgs, PayloadApi, PayloadRestClient};
use crate::config::{ErrorPolicy, PayloadAdapterConfig, PayloadRestConfig};
use crate::error::{PayloadError, PayloadResult};
use crate::id::DocumentId;
use crate::naming::NameResolver;
use crate::query::{convert_select, convert_sort, page_for, Select};
use crate::schema_gen::schema_file;
use crate::transform::{transform_input, transform_output, InputAction};
use crate::where_clause::{convert_where, multiple_ids_query, single_id_query};

/// Debug record, emitted only with `enable_debug_logs`.
macro_rules! debug_log {
    ($adapter:expr, $($arg:tt)+) => {
        if $adapter.config.enable_debug_logs {
            tracing::debug!("[payload-db-adapter] {}", format_args!($($arg)+));
        }
    };
}

static NULL: Value = Value::Null;

fn or_null(doc: &Option<Value>) -> &Value {
    doc.as_ref().unwrap_or(&NULL)
}

/// better-auth adapter backed by Payload CMS.
///
/// # Usage
///
/// ```rust,ignore
/// use better_auth_core::db::schema::AuthSchema;
/// use better_auth_payload::{PayloadAdapter, PayloadAdapterConfig, PayloadRestConfig};
///
/// let rest = PayloadRestConfig::from_env()?;
/// let adapter = PayloadAdapter::rest(
///     rest,
///     &AuthSchema::core_schema(),
///     PayloadAdapterConfig { use_plural: true, ..Default::default() },
/// )?;
/// ```
#[derive(Debug, Clone)]
pub struct PayloadAdapter {
    api: Arc<dyn PayloadApi>,
    resolver: Arc<NameResolver>,
    config: PayloadAdapterConfig,
}

impl PayloadAdapter {
    /// Adapter over any Payload API implementation. Names are resolved once
    /// from `schema`.
    pub fn new(api: Arc<dyn PayloadApi>, schema: &AuthSchema, config: PayloadAdapterConfig) -> Self {
        Self {
            api,
            resolver: Arc::new(NameResolver::new(schema, &config)),
            config,
        }
    }

    /// Adapter over Payload's REST API. With no collections configured, the
    /// slugs resolved from `schema` are registered.
    pub fn rest(
        mut rest: PayloadRestConfig,
        schema: &AuthSchema,
        config: PayloadAdapterConfig,
    ) -> Result<Self, BetterAuthError> {
        let resolver = NameResolver::new(schema, &config);
        if rest.collections.is_empty() {
            rest.collections = resolver
                .collections()
                .map(|(_, slug)| slug.to_string())
                .collect();
        }
        let client =
            PayloadRestClient::new(rest).map_err(|e| BetterAuthError::Config(e.to_string()))?;
        Ok(Self {
            api: Arc::new(client),
            resolver: Arc::new(resolver),
            config,
        })
    }

    pub fn config(&self) -> &PayloadAdapterConfig {
        &self.config
    }

    pub fn resolver(&self) -> &NameResolver {
        &self.resolver
    }

    pub fn api(&self) -> &Arc<dyn PayloadApi> {
        &self.api
    }

    /// The registered collection slug for `model`.
    fn slug<'a>(&'a self, model: &str) -> PayloadResult<&'a str> {
        match self.resolver.collection_slug(model) {
            Some(slug) if self.api.has_collection(slug) => Ok(slug),
            _ => Err(PayloadError::collection_not_found(model)),
        }
    }

    /// Log a failed operation and apply the error policy.
    fn settle<T: Default>(&self, operation: &str, model: &str, result: PayloadResult<T>) -> AdapterResult<T> {
        match result {
            Ok(value) => Ok(value),
            Err(err) => {
                tracing::error!(operation, model, error = %err, "[payload-db-adapter] Error in {operation}");
                match self.config.error_policy {
                    ErrorPolicy::Swallow => Ok(T::default()),
                    ErrorPolicy::Propagate => Err(err.into()),
                }
            }
        }
    }

    /// Point lookups for `ids`, in order, at most `max_concurrent_lookups` in
    /// flight. Missing documents are skipped; any error fails the batch.
    async fn find_by_ids(
        &self,
        slug: &str,
        ids: &[DocumentId],
        select: Option<&Select>,
    ) -> PayloadResult<Vec<Value>> {
        let lookups: Vec<_> = ids
            .iter()
            .map(|id| self.api.find_by_id(slug, id, select))
            .collect();
        let found: Vec<Option<Value>> = stream::iter(lookups)
            .buffered(self.config.max_concurrent_lookups.max(1))
            .try_collect()
            .await?;
        Ok(found.into_iter().flatten().collect())
    }

    // ─── Operations ──────────────────────────────────────────────

    async fn create_record(
        &self,
        model: &str,
        data: Value,
        select: Option<&[String]>,
    ) -> PayloadResult<Option<Value>> {
        let start = Instant::now();
        let slug = self.slug(model)?;
        let data = transform_input(&self.resolver, model, data, InputAction::Create);
        let select = convert_select(&self.resolver, model, select);
        debug_log!(self, "create {slug}: {data}");

        let doc = self.api.create(slug, data, select.as_ref()).await?;
        let record = transform_output(&self.resolver, model, Some(doc));
        debug_log!(self, "create result {slug} in {:?}: {}", start.elapsed(), or_null(&record));
        Ok(record)
    }

    async fn find_one_record(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
        select: Option<&[String]>,
    ) -> PayloadResult<Option<Value>> {
        let start = Instant::now();
        let slug = self.slug(model)?;
        let filter = convert_where(&self.resolver, model, where_clauses)?;
        let select = convert_select(&self.resolver, model, select);

        let doc = match single_id_query(&filter) {
            Some(id) => {
                debug_log!(self, "findOneByID {slug}: {id}");
                self.api.find_by_id(slug, &id, select.as_ref()).await?
            }
            None => {
                debug_log!(self, "findOneByWhere {slug}: {}", filter.to_json());
                let args = FindArgs {
                    limit: Some(1),
                    select,
                    ..FindArgs::filter(filter)
                };
                self.api.find(slug, &args).await?.docs.into_iter().next()
            }
        };

        let record = transform_output(&self.resolver, model, doc);
        debug_log!(self, "findOne result {slug} in {:?}: {}", start.elapsed(), or_null(&record));
        Ok(record)
    }

    async fn find_many_records(&self, model: &str, query: FindManyQuery) -> PayloadResult<Vec<Value>> {
        let start = Instant::now();
        let slug = self.slug(model)?;
        let filter = convert_where(&self.resolver, model, &query.where_clauses)?;
        let select = convert_select(&self.resolver, model, query.select.as_deref());

        let docs = if let Some(ids) = multiple_ids_query(&filter).filter(|ids| !ids.is_empty()) {
            debug_log!(self, "findManyByMultipleIDs {slug}: {} ids", ids.len());
            self.find_by_ids(slug, &ids, select.as_ref()).await?
        } else if let Some(id) = single_id_query(&filter) {
            debug_log!(self, "findManyBySingleID {slug}: {id}");
            self.api
                .find_by_id(slug, &id, select.as_ref())
                .await?
                .into_iter()
                .collect()
        } else {
            debug_log!(self, "findManyByWhere {slug}: {}", filter.to_json());
            let limit = query.limit.filter(|l| *l > 0).map(|l| l as u64);
            let offset = query.offset.filter(|o| *o > 0).map(|o| o as u64);
            let sort = convert_sort(&self.resolver, model, query.sort_by.as_ref());
            match limit {
                Some(limit) => {
                    let args = FindArgs {
                        sort,
                        select,
                        limit: Some(limit),
                        page: Some(page_for(offset, Some(limit))),
                        ..FindArgs::filter(filter)
                    };
                    self.api.find(slug, &args).await?.docs
                }
                None => {
                    let args = FindArgs {
                        filter,
                        sort,
                        select,
                        pagination: false,
                        ..Default::default()
                    };
                    let docs = self.api.find(slug, &args).await?.docs;
                    docs.into_iter()
                        .skip(offset.unwrap_or(0) as usize)
                        .collect()
                }
            }
        };

        let records: Vec<Value> = docs
            .into_iter()
            .filter_map(|doc| transform_output(&self.resolver, model, Some(doc)))
            .collect();
        debug_log!(self, "findMany result {slug} in {:?}: {} docs", start.elapsed(), records.len());
        Ok(records)
    }

    async fn update_record(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
        data: Value,
    ) -> PayloadResult<Option<Value>> {
        let start = Instant::now();
        let slug = self.slug(model)?;
        let filter = convert_where(&self.resolver, model, where_clauses)?;
        let data = transform_input(&self.resolver, model, data, InputAction::Update);
        debug_log!(self, "update {slug}: {data}");

        let doc = match single_id_query(&filter) {
            Some(id) => {
                debug_log!(self, "updateByID {slug}: {id}");
                self.api.update_by_id(slug, &id, data).await?
            }
            None => {
                debug_log!(self, "updateByWhere {slug}: {}", filter.to_json());
                self.api
                    .update_where(slug, &filter, data)
                    .await?
                    .docs
                    .into_iter()
                    .next()
            }
        };

        let record = transform_output(&self.resolver, model, doc);
        debug_log!(self, "update result {slug} in {:?}: {}", start.elapsed(), or_null(&record));
        Ok(record)
    }

    async fn update_many_records(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
        data: Value,
    ) -> PayloadResult<i64> {
        let start = Instant::now();
        let slug = self.slug(model)?;
        let filter = convert_where(&self.resolver, model, where_clauses)?;
        let data = transform_input(&self.resolver, model, data, InputAction::Update);
        debug_log!(self, "updateMany {slug}: {} {data}", filter.to_json());

        let result = self.api.update_where(slug, &filter, data).await?;
        debug_log!(
            self,
            "updateMany result {slug} in {:?}: {} updated, {} errors",
            start.elapsed(),
            result.docs.len(),
            result.errors.len()
        );
        Ok(result.docs.len() as i64)
    }

    async fn delete_record(&self, model: &str, where_clauses: &[WhereClause]) -> PayloadResult<()> {
        let start = Instant::now();
        let slug = self.slug(model)?;
        let filter = convert_where(&self.resolver, model, where_clauses)?;

        let deleted = match single_id_query(&filter) {
            Some(id) => {
                debug_log!(self, "deleteByID {slug}: {id}");
                self.api.delete_by_id(slug, &id).await?
            }
            None => {
                debug_log!(self, "deleteByWhere {slug}: {}", filter.to_json());
                self.api.delete_where(slug, &filter).await?.docs.into_iter().next()
            }
        };
        debug_log!(self, "delete result {slug} in {:?}: {}", start.elapsed(), or_null(&deleted));
        Ok(())
    }

    async fn delete_many_records(&self, model: &str, where_clauses: &[WhereClause]) -> PayloadResult<i64> {
        let start = Instant::now();
        let slug = self.slug(model)?;
        let filter = convert_where(&self.resolver, model, where_clauses)?;
        debug_log!(self, "deleteMany {slug}: {}", filter.to_json());

        let result = self.api.delete_where(slug, &filter).await?;
        debug_log!(
            self,
            "deleteMany result {slug} in {:?}: {} deleted",
            start.elapsed(),
            result.docs.len()
        );
        Ok(result.docs.len() as i64)
    }

    async fn count_records(&self, model: &str, where_clauses: &[WhereClause]) -> PayloadResult<i64> {
        let start = Instant::now();
        let slug = self.slug(model)?;
        let filter = convert_where(&self.resolver, model, where_clauses)?;
        debug_log!(self, "count {slug}: {}", filter.to_json());

        let total = self.api.count(slug, &filter).await?;
        debug_log!(self, "count result {slug} in {:?}: {total}", start.elapsed());
        Ok(i64::try_from(total).unwrap_or(i64::MAX))
    }
}

#[async_trait]
impl Adapter for PayloadAdapter {
    fn id(&self) -> &str {
        "payload"
    }

    async fn create(
        &self,
        model: &str,
        data: Value,
        select: Option<&[String]>,
    ) -> AdapterResult<Option<Value>> {
        let result = self.create_record(model, data, select).await;
        self.settle("create", model, result)
    }

    async fn find_one(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
        select: Option<&[String]>,
    ) -> AdapterResult<Option<Value>> {
        let result = self.find_one_record(model, where_clauses, select).await;
        self.settle("findOne", model, result)
    }

    async fn find_many(&self, model: &str, query: FindManyQuery) -> AdapterResult<Vec<Value>> {
        let result = self.find_many_records(model, query).await;
        self.settle("findMany", model, result)
    }

    async fn count(&self, model: &str, where_clauses: &[WhereClause]) -> AdapterResult<i64> {
        let result = self.count_records(model, where_clauses).await;
        self.settle("count", model, result)
    }

    async fn update(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
        data: Value,
    ) -> AdapterResult<Option<Value>> {
        let result = self.update_record(model, where_clauses, data).await;
        self.settle("update", model, result)
    }

    async fn update_many(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
        data: Value,
    ) -> AdapterResult<i64> {
        let result = self.update_many_records(model, where_clauses, data).await;
        self.settle("updateMany", model, result)
    }

    async fn delete(&self, model: &str, where_clauses: &[WhereClause]) -> AdapterResult<()> {
        let result = self.delete_record(model, where_clauses).await;
        self.settle("delete", model, result)
    }

    async fn delete_many(&self, model: &str, where_clauses: &[WhereClause]) -> AdapterResult<i64> {
        let result = self.delete_many_records(model, where_clauses).await;
        self.settle("deleteMany", model, result)
    }

    async fn create_schema(
        &self,
        schema: &AuthSchema,
        file: Option<&str>,
    ) -> AdapterResult<SchemaFile> {
        let resolver = NameResolver::new(schema, &self.config);
        Ok(schema_file(schema, &resolver, file))
    }
}
