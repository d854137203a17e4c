use crate::db::models::AdminAccount;
use crate::db::sqlite::SqlitePool;
use crate::error::FolioError;

#[derive(Clone)]
pub struct AdminsStorage {
    pool: SqlitePool,
}

impl AdminsStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn count(&self) -> Result<i64, FolioError> {
        let rec: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM admins")
            .fetch_one(&self.pool)
            .await?;
        Ok(rec.0)
    }

    pub async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AdminAccount>, FolioError> {
        let account = sqlx::query_as::<_, AdminAccount>(
            "SELECT id, username, password_hash, force_change, session_version \
             FROM admins WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    /// Insert a new account. Returns the row id.
    pub async fn insert(
        &self,
        username: &str,
        password_hash: &str,
        force_change: bool,
    ) -> Result<i64, FolioError> {
        let res = sqlx::query(
            "INSERT INTO admins (username, password_hash, force_change) VALUES (?, ?, ?)",
        )
        .bind(username)
        .bind(password_hash)
        .bind(force_change)
        .execute(&self.pool)
        .await?;
        Ok(res.last_insert_rowid())
    }

    /// Replace the hash and force-change flag, and invalidate sessions issued
    /// so far. Returns the new session version, or `None` when the username
    /// is unknown.
    pub async fn update_password(
        &self,
        username: &str,
        password_hash: &str,
        force_change: bool,
    ) -> Result<Option<i64>, FolioError> {
        let version: Option<(i64,)> = sqlx::query_as(
            "UPDATE admins \
             SET password_hash = ?, force_change = ?, session_version = session_version + 1 \
             WHERE username = ? RETURNING session_version",
        )
        .bind(password_hash)
        .bind(force_change)
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(version.map(|v| v.0))
    }

    /// Invalidate every session issued for `username`. Returns rows touched.
    pub async fn bump_session_version(&self, username: &str) -> Result<u64, FolioError> {
        let res =
            sqlx::query("UPDATE admins SET session_version = session_version + 1 WHERE username = ?")
                .bind(username)
                .execute(&self.pool)
                .await?;
        Ok(res.rows_affected())
    }

    /// Create the account or overwrite its hash, in one transaction. An
    /// existing account also loses its open sessions. Returns `true` when a new
    /// row was created.
    pub async fn upsert(
        &self,
        username: &str,
        password_hash: &str,
        force_change: bool,
    ) -> Result<bool, FolioError> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM admins WHERE username = ?")
            .bind(username)
            .fetch_optional(&mut *tx)
            .await?;

        if existing.is_some() {
            sqlx::query(
                "UPDATE admins \
                 SET password_hash = ?, force_change = ?, session_version = session_version + 1 \
                 WHERE username = ?",
            )
            .bind(password_hash)
            .bind(force_change)
            .bind(username)
            .execute(&mut *tx)
            .await?;
        } else {
            sqlx::query(
                "INSERT INTO admins (username, password_hash, force_change) VALUES (?, ?, ?)",
            )
            .bind(username)
            .bind(password_hash)
            .bind(force_change)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(existing.is_none())
    }
}
