// better-auth-payload: Payload CMS database adapter for better-auth.
//
// Persists better-auth's users, sessions, accounts and verifications as
// Payload documents. The adapter speaks to Payload through the `PayloadApi`
// trait: `PayloadRestClient` talks to a running Payload server, while
// `MemoryPayload` keeps documents in process for tests and local development.

pub mod adapter;
pub mod api;
pub mod config;
pub mod error;
pub mod id;
pub mod naming;
pub mod query;
pub mod schema_gen;
pub mod transform;
pub mod where_clause;

pub use adapter::PayloadAdapter;
pub use api::{MemoryPayload, PayloadApi, PayloadRestClient};
pub use config::{ErrorPolicy, PayloadAdapterConfig, PayloadRestConfig};
pub use error::PayloadError;
pub use id::IdType;
pub use schema_gen::generate_schema;
