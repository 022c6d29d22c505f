//! Core contract for better-auth storage backends.
//!
//! - [`db::adapter`]: the [`Adapter`] trait and its query vocabulary
//! - [`db::schema`]: the auth schema DSL backends generate declarations from
//! - [`error`]: the shared [`BetterAuthError`]
//! - [`env`]: environment detection and `tracing` bootstrap

pub mod db;
pub mod env;
pub mod error;
pub mod utils;

// Re-exports for convenience
pub use db::adapter::Adapter;
pub use db::schema::AuthSchema;
pub use error::BetterAuthError;
