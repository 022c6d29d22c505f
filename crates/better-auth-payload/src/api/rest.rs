// Payload REST API client.
//
// Routes (relative to `{base_url}{api_route}`):
//   POST   /{slug}             create
//   GET    /{slug}             find
//   GET    /{slug}/count       count
//   GET    /{slug}/{id}        findByID
//   PATCH  /{slug}/{id}        update by id
//   PATCH  /{slug}?where...    update by where
//   DELETE /{slug}/{id}        delete by id
//   DELETE /{slug}?where...    delete by where
//
// Queries travel as Payload's bracketed query string and always carry
// `depth=0`.

use std::collections::HashSet;

use async_trait::async_trait;
use reqwest::{header, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use super::{BulkResult, FindArgs, PaginatedDocs, PayloadApi};
use crate::config::PayloadRestConfig;
use crate::error::{PayloadError, PayloadResult};
use crate::id::DocumentId;
use crate::query::Select;
use crate::where_clause::{flatten_query, PayloadWhere};

/// Payload's document API over HTTP.
#[derive(Debug, Clone)]
pub struct PayloadRestClient {
    client: reqwest::Client,
    api_base: Url,
    authorization: Option<String>,
    collections: HashSet<String>,
}

impl PayloadRestClient {
    pub fn new(config: PayloadRestConfig) -> PayloadResult<Self> {
        Self::with_client(config, reqwest::Client::new())
    }

    /// Build on a preconfigured `reqwest::Client` (timeouts, proxies, TLS).
    pub fn with_client(config: PayloadRestConfig, client: reqwest::Client) -> PayloadResult<Self> {
        let mut api_base = Url::parse(&config.base_url)?;
        api_base
            .path_segments_mut()
            .map_err(|_| PayloadError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(config.api_route.split('/').filter(|s| !s.is_empty()));

        let authorization = config
            .api_key
            .map(|key| format!("{} API-Key {key}", config.auth_collection));

        Ok(Self {
            client,
            api_base,
            authorization,
            collections: config.collections.into_iter().collect(),
        })
    }

    /// `{api_base}/{collection}[/{segment}]?depth=0`
    fn url(&self, collection: &str, segment: Option<&str>) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.push(collection);
            if let Some(segment) = segment {
                path.push(segment);
            }
        }
        url.query_pairs_mut().append_pair("depth", "0");
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header(header::ACCEPT, "application/json");
        match &self.authorization {
            Some(auth) => builder.header(header::AUTHORIZATION, auth.as_str()),
            None => builder,
        }
    }

    /// Send a request and decode its JSON body. With `missing_ok`, a 404
    /// yields `None`.
    async fn send(&self, builder: RequestBuilder, missing_ok: bool) -> PayloadResult<Option<Value>> {
        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND && missing_ok {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.json::<Value>().await.ok();
            return Err(PayloadError::Api {
                status: status.as_u16(),
                message: body
                    .as_ref()
                    .and_then(error_message)
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string()),
            });
        }

        Ok(Some(response.json::<Value>().await?))
    }

    async fn send_required(&self, builder: RequestBuilder) -> PayloadResult<Value> {
        self.send(builder, false)
            .await?
            .ok_or_else(|| PayloadError::InvalidResponse("empty response".to_string()))
    }
}

/// First message of Payload's `{ errors: [{ message }] }` error body.
fn error_message(body: &Value) -> Option<String> {
    body.get("errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.iter().find_map(|e| e.get("message")?.as_str()))
        .or_else(|| body.get("message")?.as_str())
        .map(String::from)
}

/// The `doc` of a `{ doc, message }` envelope.
fn envelope_doc(mut body: Value) -> PayloadResult<Value> {
    let doc = body.get_mut("doc").map(Value::take);
    match doc {
        Some(doc) if !doc.is_null() => Ok(doc),
        _ => Err(PayloadError::InvalidResponse(format!(
            "expected a `doc` field in {body}"
        ))),
    }
}

fn decode<T: DeserializeOwned>(body: Value) -> PayloadResult<T> {
    serde_json::from_value(body).map_err(|e| PayloadError::InvalidResponse(e.to_string()))
}

fn append_where(url: &mut Url, filter: &PayloadWhere) {
    if !filter.is_empty() {
        url.query_pairs_mut().extend_pairs(filter.to_query_pairs());
    }
}

fn append_select(url: &mut Url, select: Option<&Select>) {
    if let Some(select) = select {
        let mut pairs = Vec::new();
        flatten_query("select", &Value::Object(select.clone()), &mut pairs);
        url.query_pairs_mut().extend_pairs(pairs);
    }
}

#[async_trait]
impl PayloadApi for PayloadRestClient {
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
        let mut url = self.url(collection, None);
        append_select(&mut url, select);
        let body = self
            .send_required(self.request(Method::POST, url).json(&data))
            .await?;
        envelope_doc(body)
    }

    async fn find(&self, collection: &str, args: &FindArgs) -> PayloadResult<PaginatedDocs> {
        let mut url = self.url(collection, None);
        append_where(&mut url, &args.filter);
        append_select(&mut url, args.select.as_ref());
        {
            let mut query = url.query_pairs_mut();
            if let Some(sort) = &args.sort {
                query.append_pair("sort", sort);
            }
            if args.pagination {
                if let Some(limit) = args.limit {
                    query.append_pair("limit", &limit.to_string());
                }
                if let Some(page) = args.page {
                    query.append_pair("page", &page.to_string());
                }
            } else {
                query.append_pair("pagination", "false");
            }
        }
        decode(self.send_required(self.request(Method::GET, url)).await?)
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
        select: Option<&Select>,
    ) -> PayloadResult<Option<Value>> {
        let mut url = self.url(collection, Some(&id.to_string()));
        append_select(&mut url, select);
        self.send(self.request(Method::GET, url), true).await
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
        data: Value,
    ) -> PayloadResult<Option<Value>> {
        let url = self.url(collection, Some(&id.to_string()));
        match self.send(self.request(Method::PATCH, url).json(&data), true).await? {
            Some(body) => envelope_doc(body).map(Some),
            None => Ok(None),
        }
    }

    async fn update_where(
        &self,
        collection: &str,
        filter: &PayloadWhere,
        data: Value,
    ) -> PayloadResult<BulkResult> {
        let mut url = self.url(collection, None);
        append_where(&mut url, filter);
        decode(
            self.send_required(self.request(Method::PATCH, url).json(&data))
                .await?,
        )
    }

    async fn delete_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> PayloadResult<Option<Value>> {
        let url = self.url(collection, Some(&id.to_string()));
        match self.send(self.request(Method::DELETE, url), true).await? {
            Some(body) => envelope_doc(body).map(Some),
            None => Ok(None),
        }
    }

    async fn delete_where(
        &self,
        collection: &str,
        filter: &PayloadWhere,
    ) -> PayloadResult<BulkResult> {
        let mut url = self.url(collection, None);
        append_where(&mut url, filter);
        decode(self.send_required(self.request(Method::DELETE, url)).await?)
    }

    async fn count(&self, collection: &str, filter: &PayloadWhere) -> PayloadResult<u64> {
        let mut url = self.url(collection, Some("count"));
        append_where(&mut url, filter);
        let body = self.send_required(self.request(Method::GET, url)).await?;
        body.get("totalDocs")
            .and_then(Value::as_u64)
            .ok_or_else(|| PayloadError::InvalidResponse(format!("expected `totalDocs` in {body}")))
    }
}
