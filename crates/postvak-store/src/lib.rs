//! # postvak-store
//!
//! SQLite persistence for the Postvak messaging subsystem.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed helpers for every domain model.
//! Field-length constraints on messages live in the schema; callers observe
//! them only as a rejected insert.

pub mod database;
pub mod messages;
pub mod migrations;
pub mod models;
pub mod sessions;
pub mod users;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use models::*;
