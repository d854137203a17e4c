use crate::db::schema::{ADMINS_UPGRADES, SQLITE_INIT};
use crate::error::FolioError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

pub type SqlitePool = Pool<Sqlite>;

/// Open (creating if missing) the SQLite database behind `database_url`.
/// Writers that hit a locked database wait up to `busy_timeout` instead of
/// failing right away.
pub async fn connect(database_url: &str) -> Result<SqlitePool, FolioError> {
    let connect_opts = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5));
    let pool = SqlitePoolOptions::new().connect_with(connect_opts).await?;
    Ok(pool)
}

/// Create the tables and bring older databases up to date.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), FolioError> {
    // sqlx::query runs a single statement, so split the bundled DDL
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }

    for (column, ddl) in ADMINS_UPGRADES {
        if !admins_has_column(pool, column).await? {
            sqlx::query(ddl).execute(pool).await?;
            info!(column, "added column to legacy admins table");
        }
    }
    Ok(())
}

async fn admins_has_column(pool: &SqlitePool, column: &str) -> Result<bool, FolioError> {
    let rec: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM pragma_table_info('admins') WHERE name = ?")
            .bind(column)
            .fetch_one(pool)
            .await?;
    Ok(rec.0 > 0)
}
