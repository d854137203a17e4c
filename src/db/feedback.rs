use crate::db::models::Feedback;
use crate::db::sqlite::SqlitePool;
use crate::error::FolioError;

/// `?1` is the LIKE pattern, or NULL for "no filter".
const MATCH_FILTER: &str = r#"(?1 IS NULL
    OR name LIKE ?1 ESCAPE '\'
    OR email LIKE ?1 ESCAPE '\'
    OR message LIKE ?1 ESCAPE '\')"#;

const NEWEST_FIRST: &str = "ORDER BY created_at DESC, id DESC";

#[derive(Clone)]
pub struct FeedbackStorage {
    pool: SqlitePool,
}

impl FeedbackStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert one record and return it as stored, timestamp included.
    pub async fn insert(
        &self,
        name: &str,
        email: &str,
        message: &str,
    ) -> Result<Feedback, FolioError> {
        let row = sqlx::query_as::<_, Feedback>(
            r#"INSERT INTO feedback (name, email, message) VALUES (?, ?, ?)
               RETURNING id, name, email, message, created_at"#,
        )
        .bind(name)
        .bind(email)
        .bind(message)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn count_matching(&self, pattern: Option<&str>) -> Result<i64, FolioError> {
        let sql = format!("SELECT COUNT(*) FROM feedback WHERE {MATCH_FILTER}");
        let rec: (i64,) = sqlx::query_as(&sql)
            .bind(pattern)
            .fetch_one(&self.pool)
            .await?;
        Ok(rec.0)
    }

    pub async fn page_matching(
        &self,
        pattern: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Feedback>, FolioError> {
        let sql = format!(
            "SELECT id, name, email, message, created_at FROM feedback \
             WHERE {MATCH_FILTER} {NEWEST_FIRST} LIMIT ?2 OFFSET ?3"
        );
        let rows = sqlx::query_as::<_, Feedback>(&sql)
            .bind(pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn all_matching(&self, pattern: Option<&str>) -> Result<Vec<Feedback>, FolioError> {
        let sql = format!(
            "SELECT id, name, email, message, created_at FROM feedback \
             WHERE {MATCH_FILTER} {NEWEST_FIRST}"
        );
        let rows = sqlx::query_as::<_, Feedback>(&sql)
            .bind(pattern)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Returns the number of rows removed (0 or 1).
    pub async fn delete_by_id(&self, id: i64) -> Result<u64, FolioError> {
        let res = sqlx::query("DELETE FROM feedback WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }
}
