//! REST client tests against a mocked Payload server.
//!
//! Covers: routes and query strings per operation, API-key auth, response
//! envelopes, 404 handling, error bodies, and the adapter end to end.

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use better_auth_core::db::adapter::{Adapter, FindManyQuery, SortBy, WhereClause};
use better_auth_core::db::schema::AuthSchema;
use better_auth_payload::api::PayloadApi;
use better_auth_payload::id::DocumentId;
use better_auth_payload::query::Select;
use better_auth_payload::{
    ErrorPolicy, PayloadAdapter, PayloadAdapterConfig, PayloadError, PayloadRestClient,
    PayloadRestConfig,
};

const AUTH_HEADER: &str = "users API-Key secret";

fn rest_config(server: &MockServer) -> PayloadRestConfig {
    PayloadRestConfig::new(server.uri())
        .with_api_key("secret")
        .with_collections(["user", "session", "account", "verification"])
}

fn client(server: &MockServer) -> PayloadRestClient {
    PayloadRestClient::new(rest_config(server)).unwrap()
}

fn adapter(server: &MockServer, error_policy: ErrorPolicy) -> PayloadAdapter {
    PayloadAdapter::rest(
        rest_config(server),
        &AuthSchema::core_schema(),
        PayloadAdapterConfig {
            error_policy,
            ..Default::default()
        },
    )
    .unwrap()
}

fn paginated(docs: serde_json::Value) -> serde_json::Value {
    let total = docs.as_array().map_or(0, Vec::len);
    json!({
        "docs": docs,
        "totalDocs": total,
        "limit": 10,
        "page": 1,
        "totalPages": 1,
        "hasNextPage": false,
        "hasPrevPage": false,
        "pagingCounter": 1
    })
}

// ── Client routes ───────────────────────────────────────────────

#[tokio::test]
async fn create_posts_to_collection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/user"))
        .and(query_param("depth", "0"))
        .and(header("authorization", AUTH_HEADER))
        .and(body_json(json!({ "email": "a@b.com" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "doc": { "id": "abc", "email": "a@b.com" },
            "message": "User successfully created."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let doc = client(&server)
        .create("user", json!({ "email": "a@b.com" }), None)
        .await
        .unwrap();
    assert_eq!(doc, json!({ "id": "abc", "email": "a@b.com" }));
}

#[tokio::test]
async fn find_by_id_with_select() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user/abc"))
        .and(query_param("select[email]", "true"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "abc", "email": "a@b.com" })),
        )
        .mount(&server)
        .await;

    let mut select = Select::new();
    select.insert("email".to_string(), json!(true));
    let doc = client(&server)
        .find_by_id("user", &DocumentId::from("abc"), Some(&select))
        .await
        .unwrap();
    assert_eq!(doc.unwrap()["email"], "a@b.com");
}

#[tokio::test]
async fn find_by_id_not_found_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "errors": [{ "message": "Not Found" }] })),
        )
        .mount(&server)
        .await;

    let doc = client(&server)
        .find_by_id("user", &DocumentId::from("missing"), None)
        .await
        .unwrap();
    assert!(doc.is_none());
}

#[tokio::test]
async fn count_reads_total_docs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/session/count"))
        .and(query_param("where[user][equals]", "u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "totalDocs": 3 })))
        .mount(&server)
        .await;

    let adapter = adapter(&server, ErrorPolicy::Propagate);
    let total = adapter
        .count("session", &[WhereClause::eq("userId", "u1")])
        .await
        .unwrap();
    assert_eq!(total, 3);
}

#[tokio::test]
async fn error_body_message_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user/count"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "errors": [{ "message": "You are not allowed to perform this action." }]
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .count("user", &Default::default())
        .await
        .unwrap_err();
    match err {
        PayloadError::Api { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "You are not allowed to perform this action.");
        }
        other => panic!("expected an API error, got {other:?}"),
    }
}

#[tokio::test]
async fn error_without_body_uses_status_reason() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user/count"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client(&server)
        .count("user", &Default::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Internal Server Error"));
}

// ── Adapter over REST ───────────────────────────────────────────

#[tokio::test]
async fn adapter_create_and_find_one() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/session"))
        .and(body_json(json!({
            "token": "t",
            "user": "u1",
            "expiresAt": "2025-01-01T00:00:00.000Z"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "doc": {
                "id": "s1",
                "token": "t",
                "user": "u1",
                "expiresAt": "2025-01-01T00:00:00.000Z",
                "createdAt": "2025-01-01T00:00:00.000Z",
                "updatedAt": "2025-01-01T00:00:00.000Z"
            },
            "message": "Session successfully created."
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/session"))
        .and(query_param("where[token][equals]", "t"))
        .and(query_param("limit", "1"))
        .and(query_param("depth", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(paginated(json!([{
            "id": "s1",
            "token": "t",
            "user": { "id": "u1", "email": "a@b.com" }
        }]))))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = adapter(&server, ErrorPolicy::Propagate);
    let created = adapter
        .create(
            "session",
            json!({ "token": "t", "userId": "u1", "expiresAt": 1_735_689_600_000i64 }),
            None,
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(created["id"], "s1");
    assert_eq!(created["userId"], "u1");
    assert!(created.get("user").is_none());

    let found = adapter
        .find_one("session", &[WhereClause::eq("token", "t")], None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found["userId"], "u1");
}

#[tokio::test]
async fn adapter_find_many_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user"))
        .and(query_param("limit", "5"))
        .and(query_param("page", "3"))
        .and(query_param("sort", "-createdAt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(paginated(json!([
            { "id": "u11", "email": "k@b.com" },
            { "id": "u12", "email": "l@b.com" }
        ]))))
        .expect(1)
        .mount(&server)
        .await;

    let docs = adapter(&server, ErrorPolicy::Propagate)
        .find_many(
            "user",
            FindManyQuery {
                limit: Some(5),
                offset: Some(10),
                sort_by: Some(SortBy::desc("createdAt")),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0]["id"], "u11");
}

#[tokio::test]
async fn adapter_find_many_without_limit_disables_pagination() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/verification"))
        .and(query_param("pagination", "false"))
        .and(query_param("where[identifier][equals]", "reset"))
        .respond_with(ResponseTemplate::new(200).set_body_json(paginated(json!([
            { "id": "v1", "identifier": "reset" },
            { "id": "v2", "identifier": "reset" }
        ]))))
        .expect(1)
        .mount(&server)
        .await;

    let docs = adapter(&server, ErrorPolicy::Propagate)
        .find_many(
            "verification",
            FindManyQuery::filter(vec![WhereClause::eq("identifier", "reset")]),
        )
        .await
        .unwrap();
    assert_eq!(docs.len(), 2);
}

#[tokio::test]
async fn adapter_update_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/user/abc"))
        .and(body_json(json!({ "name": "B" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "doc": { "id": "abc", "name": "B" },
            "message": "Updated successfully."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let updated = adapter(&server, ErrorPolicy::Propagate)
        .update("user", &[WhereClause::eq("id", "abc")], json!({ "name": "B" }))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated["name"], "B");
}

#[tokio::test]
async fn adapter_update_many_counts_docs() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/session"))
        .and(query_param("where[user][equals]", "u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "docs": [{ "id": "s1" }, { "id": "s2" }],
            "errors": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let updated = adapter(&server, ErrorPolicy::Propagate)
        .update_many(
            "session",
            &[WhereClause::eq("userId", "u1")],
            json!({ "ipAddress": "127.0.0.1" }),
        )
        .await
        .unwrap();
    assert_eq!(updated, 2);
}

#[tokio::test]
async fn adapter_delete_many_counts_docs() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/verification"))
        .and(query_param("where[identifier][equals]", "reset"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "docs": [{ "id": "v1" }],
            "errors": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let deleted = adapter(&server, ErrorPolicy::Propagate)
        .delete_many("verification", &[WhereClause::eq("identifier", "reset")])
        .await
        .unwrap();
    assert_eq!(deleted, 1);
}

#[tokio::test]
async fn adapter_swallows_server_errors_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user/count"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "errors": [{ "message": "Something went wrong." }]
        })))
        .mount(&server)
        .await;

    let count = adapter(&server, ErrorPolicy::Swallow)
        .count("user", &[])
        .await
        .unwrap();
    assert_eq!(count, 0);

    let err = adapter(&server, ErrorPolicy::Propagate)
        .count("user", &[])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Something went wrong."));
}

#[tokio::test]
async fn adapter_skips_unregistered_collections() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "totalDocs": 1 })))
        .expect(0)
        .mount(&server)
        .await;

    let adapter = PayloadAdapter::rest(
        PayloadRestConfig::new(server.uri()).with_collections(["user"]),
        &AuthSchema::core_schema(),
        PayloadAdapterConfig::default(),
    )
    .unwrap();
    assert_eq!(adapter.count("session", &[]).await.unwrap(), 0);
}

#[tokio::test]
async fn adapter_registers_schema_slugs_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/count"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "totalDocs": 3 })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = PayloadAdapter::rest(
        PayloadRestConfig::new(server.uri()),
        &AuthSchema::core_schema(),
        PayloadAdapterConfig {
            use_plural: true,
            error_policy: ErrorPolicy::Propagate,
            ..Default::default()
        },
    )
    .unwrap();
    assert!(adapter.api().has_collection("users"));
    assert!(adapter.api().has_collection("verifications"));
    assert_eq!(adapter.count("user", &[]).await.unwrap(), 3);
}

#[test]
fn rest_adapter_rejects_invalid_url() {
    let err = PayloadAdapter::rest(
        PayloadRestConfig::new("::not a url::"),
        &AuthSchema::core_schema(),
        PayloadAdapterConfig::default(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("Invalid Payload URL"));
}
