pub mod adapter;
pub mod schema;

pub use adapter::{Adapter, AdapterResult, FindManyQuery, SchemaFile, WhereClause};
pub use schema::{AuthSchema, AuthTable, FieldType, SchemaField};
