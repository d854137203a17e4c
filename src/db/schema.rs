//! SQL DDL for the admin and feedback tables.

/// SQLite schema with:
/// - `admins`: one row per `username` (UNIQUE), Argon2 PHC `password_hash`,
///   `force_change` BOOLEAN (stored as INTEGER 0/1, new accounts start at 1),
///   `session_version` bumped whenever issued sessions must stop working
/// - `feedback`: `created_at` filled by SQLite in UTC (`YYYY-MM-DD HH:MM:SS`)
/// - index on `feedback(created_at)` for the newest-first listing
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS admins (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT UNIQUE NOT NULL,
    password_hash TEXT NOT NULL,
    force_change INTEGER NOT NULL DEFAULT 1,
    session_version INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS feedback (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    message TEXT NOT NULL,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_feedback_created_at ON feedback(created_at);
"#;

/// Columns missing from `admins` tables created by the older tooling, with the
/// DDL that adds each. Existing accounts keep their password, so the
/// backfilled `force_change` is 0.
pub const ADMINS_UPGRADES: [(&str, &str); 2] = [
    (
        "force_change",
        "ALTER TABLE admins ADD COLUMN force_change INTEGER NOT NULL DEFAULT 0",
    ),
    (
        "session_version",
        "ALTER TABLE admins ADD COLUMN session_version INTEGER NOT NULL DEFAULT 0",
    ),
];
