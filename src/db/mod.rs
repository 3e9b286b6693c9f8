//! Component cache: models and schema for the persisted component table.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `actor.rs`: ractor-owned pool; all access goes through `CacheHandle`

pub mod actor;
pub mod models;
pub mod schema;

pub use actor::{CacheHandle, spawn};
pub use models::DbComponentRow;
pub use schema::SQLITE_INIT;
