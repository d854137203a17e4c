//! Database module: typed rows, schema and storage handles.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for initializing the database (SQLite)
//! - `sqlite.rs`: pool setup, schema init and legacy upgrades
//! - `admins.rs` / `feedback.rs`: per-table storage handles

pub mod admins;
pub mod feedback;
pub mod models;
pub mod schema;
pub mod sqlite;

pub use admins::AdminsStorage;
pub use feedback::FeedbackStorage;
pub use models::{AdminAccount, Feedback};
pub use schema::SQLITE_INIT;
pub use sqlite::{SqlitePool, connect, init_schema};
