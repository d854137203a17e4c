use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct AdminAccount {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub force_change: bool,
    pub session_version: i64,
}

/// One submitted contact message. `created_at` is UTC, assigned by SQLite.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Feedback {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: NaiveDateTime,
}
