//! SQLite-backed store of memo revisions and topic tags.
//!
//! Every mutation of a topic's revisions runs in one transaction while holding
//! that topic's lock, and its first statement is a write so the SQLite write
//! lock is taken up front.

use async_trait::async_trait;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use super::TopicLocks;
use crate::backend::{now_timestamp, Backend};
use crate::errors::AppError;
use crate::models::{Memo, MemoId, Topic, TopicId};
use crate::search::Keyword;

const MEMO_COLUMNS: &str = "id, topic_id, timestamp, latest, content";

/// Database repository for all store operations.
pub struct Repository {
    pool: SqlitePool,
    locks: TopicLocks,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            locks: TopicLocks::new(),
        }
    }

    /// Insert a revision with an explicit timestamp, bypassing the clock.
    pub async fn insert_at(
        &self,
        topic_id: &TopicId,
        timestamp: i64,
        content: &str,
    ) -> Result<Memo, AppError> {
        self.append(topic_id, Some(timestamp), content).await
    }

    async fn append(
        &self,
        topic_id: &TopicId,
        timestamp: Option<i64>,
        content: &str,
    ) -> Result<Memo, AppError> {
        let _guard = self.locks.acquire(topic_id).await;
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE memo SET latest = 0 WHERE topic_id = ? AND latest = 1")
            .bind(topic_id.as_str())
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query(
            "SELECT MAX(timestamp) AS newest, (SELECT COALESCE(MAX(seq), 0) FROM memo) AS seq FROM memo WHERE topic_id = ?",
        )
        .bind(topic_id.as_str())
        .fetch_one(&mut *tx)
        .await?;
        let newest: Option<i64> = row.get("newest");
        let seq: i64 = row.get("seq");

        let timestamp = match timestamp {
            Some(explicit) => explicit,
            None => newest.map_or(now_timestamp(), |n| n.max(now_timestamp())),
        };
        let id = MemoId::generate();

        sqlx::query(
            "INSERT INTO memo (id, topic_id, timestamp, seq, latest, content) VALUES (?, ?, ?, ?, 0, ?)",
        )
        .bind(id.as_str())
        .bind(topic_id.as_str())
        .bind(timestamp)
        .bind(seq + 1)
        .bind(content)
        .execute(&mut *tx)
        .await?;

        promote_latest(&mut tx, topic_id).await?;
        let memo = fetch_memo(&mut tx, &id).await?;

        tx.commit().await?;

        tracing::debug!(topic_id = %topic_id, memo_id = %memo.id, "Revision created");
        Ok(memo)
    }
}

/// Flag the newest surviving revision of a topic as latest (ties: last inserted).
async fn promote_latest(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    topic_id: &TopicId,
) -> Result<(), AppError> {
    sqlx::query(
        r#"UPDATE memo SET latest = (id = (
               SELECT id FROM memo WHERE topic_id = ?1 ORDER BY timestamp DESC, seq DESC LIMIT 1
           ))
           WHERE topic_id = ?1"#,
    )
    .bind(topic_id.as_str())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn fetch_memo(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    id: &MemoId,
) -> Result<Memo, AppError> {
    let row = sqlx::query(&format!("SELECT {MEMO_COLUMNS} FROM memo WHERE id = ?"))
        .bind(id.as_str())
        .fetch_one(&mut **tx)
        .await?;
    Ok(memo_from_row(&row))
}

#[async_trait]
impl Backend for Repository {
    async fn list_topics(&self, keyword: &str) -> Result<Vec<Topic>, AppError> {
        let keyword = Keyword::parse(keyword);

        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {MEMO_COLUMNS} FROM memo WHERE latest = 1"
        ));

        if !keyword.words.is_empty() {
            query.push(" AND topic_id IN (SELECT DISTINCT topic_id FROM memo WHERE ");
            let mut words = query.separated(" OR ");
            for word in &keyword.words {
                words
                    .push("instr(content, ")
                    .push_bind_unseparated(word.clone())
                    .push_unseparated(") > 0");
            }
            query.push(")");
        }

        if !keyword.tags.is_empty() {
            query.push(" AND topic_id IN (SELECT topic_id FROM topic_tag WHERE name IN (");
            let mut tags = query.separated(", ");
            for tag in &keyword.tags {
                tags.push_bind(tag.clone());
            }
            query.push("))");
        }

        query.push(" ORDER BY timestamp DESC, topic_id");

        let rows = query.build().fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .map(|row| Topic::from_latest(&memo_from_row(row)))
            .collect())
    }

    async fn get_memo(&self, topic_id: &TopicId, id: Option<&MemoId>) -> Result<Memo, AppError> {
        let row = match id {
            Some(id) => {
                sqlx::query(&format!(
                    "SELECT {MEMO_COLUMNS} FROM memo WHERE topic_id = ? AND id = ?"
                ))
                .bind(topic_id.as_str())
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {MEMO_COLUMNS} FROM memo WHERE topic_id = ? AND latest = 1"
                ))
                .bind(topic_id.as_str())
                .fetch_optional(&self.pool)
                .await?
            }
        };

        match (row, id) {
            (Some(row), _) => Ok(memo_from_row(&row)),
            (None, None) => Ok(Memo::empty(topic_id.clone())),
            (None, Some(id)) => {
                if self.list_memos(topic_id).await?.is_empty() {
                    Ok(Memo::empty(topic_id.clone()))
                } else {
                    Err(AppError::NotFound(format!("Memo {} not found", id)))
                }
            }
        }
    }

    async fn list_memos(&self, topic_id: &TopicId) -> Result<Vec<Memo>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {MEMO_COLUMNS} FROM memo WHERE topic_id = ? ORDER BY timestamp DESC, seq DESC"
        ))
        .bind(topic_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(memo_from_row).collect())
    }

    async fn create_memo(&self, topic_id: &TopicId, content: &str) -> Result<Memo, AppError> {
        self.append(topic_id, None, content).await
    }

    async fn delete_memo(&self, topic_id: &TopicId, id: &MemoId) -> Result<usize, AppError> {
        let _guard = self.locks.acquire(topic_id).await;
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM memo WHERE topic_id = ? AND id = ?")
            .bind(topic_id.as_str())
            .bind(id.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            tracing::debug!(topic_id = %topic_id, memo_id = %id, "Revision already gone");
        }

        let remaining: i64 = sqlx::query("SELECT COUNT(*) AS remaining FROM memo WHERE topic_id = ?")
            .bind(topic_id.as_str())
            .fetch_one(&mut *tx)
            .await?
            .get("remaining");

        if remaining > 0 {
            promote_latest(&mut tx, topic_id).await?;
        } else {
            sqlx::query("DELETE FROM topic_tag WHERE topic_id = ?")
                .bind(topic_id.as_str())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(usize::try_from(remaining).unwrap_or_default())
    }

    async fn list_tags(&self, topic_id: &TopicId) -> Result<Vec<String>, AppError> {
        let rows = sqlx::query("SELECT name FROM topic_tag WHERE topic_id = ? ORDER BY name")
            .bind(topic_id.as_str())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|row| row.get("name")).collect())
    }

    async fn add_tag(&self, topic_id: &TopicId, tag: &str) -> Result<(), AppError> {
        // Same lock as delete_memo; tags never outlive the last revision.
        let _guard = self.locks.acquire(topic_id).await;
        let revisions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM memo WHERE topic_id = ?")
            .bind(topic_id.as_str())
            .fetch_one(&self.pool)
            .await?;
        if revisions == 0 {
            return Err(AppError::Validation(format!(
                "Save memo before adding tag. '{}'",
                tag
            )));
        }

        let result = sqlx::query("INSERT OR IGNORE INTO topic_tag (topic_id, name) VALUES (?, ?)")
            .bind(topic_id.as_str())
            .bind(tag)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(format!("Tag {} already exists", tag)));
        }
        Ok(())
    }

    async fn remove_tag(&self, topic_id: &TopicId, tag: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM topic_tag WHERE topic_id = ? AND name = ?")
            .bind(topic_id.as_str())
            .bind(tag)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Tag {} not found", tag)));
        }
        Ok(())
    }
}

// Helper functions for row conversion

fn memo_from_row(row: &sqlx::sqlite::SqliteRow) -> Memo {
    let id: String = row.get("id");
    let topic_id: String = row.get("topic_id");
    let latest: i64 = row.get("latest");
    Memo {
        id: MemoId::new(id),
        topic_id: TopicId::new(topic_id),
        timestamp: row.get("timestamp"),
        latest: latest != 0,
        content: row.get("content"),
    }
}
