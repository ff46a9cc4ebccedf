//! 任务队列的 SQLite 持久化（sqlx）。
//!
//! 所有“先读后写”的操作都压成单条语句，
//! 并发调用不会破坏“同一 URL 最多一个活跃任务”的约束。

use std::path::Path;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use time::OffsetDateTime;

use super::models::{Job, JobStatus};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS jobs (
    id            TEXT PRIMARY KEY,
    url           TEXT NOT NULL,
    status        TEXT NOT NULL,
    error_message TEXT,
    created_at    TEXT NOT NULL,
    completed_at  TEXT
);
CREATE INDEX IF NOT EXISTS idx_jobs_status_created ON jobs(status, created_at);
"#;

#[derive(Clone)]
pub struct JobStore {
    pool: SqlitePool,
}

impl JobStore {
    pub async fn open(path: &Path) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// 测试用内存库。单连接，否则每个连接各有一份 :memory:。
    #[cfg(test)]
    pub async fn open_in_memory() -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// 无同 URL 活跃任务时插入；重复则返回 false（静默跳过）。
    /// 查重和插入是同一条语句，两个并发 enqueue 不会同时通过查重。
    pub async fn insert_if_no_active(&self, job: &Job) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO jobs (id, url, status, error_message, created_at, completed_at) \
             SELECT ?, ?, ?, ?, ?, ? \
             WHERE NOT EXISTS ( \
                 SELECT 1 FROM jobs WHERE url = ? AND status IN ('pending', 'processing') \
             )",
        )
        .bind(&job.id)
        .bind(&job.url)
        .bind(job.status.as_str())
        .bind(&job.error_message)
        .bind(job.created_at)
        .bind(job.completed_at)
        .bind(&job.url)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_active(&self) -> Result<Vec<Job>, sqlx::Error> {
        sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs WHERE status IN ('pending', 'processing') \
             ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn list_terminal(&self, limit: u32) -> Result<Vec<Job>, sqlx::Error> {
        sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs WHERE status IN ('completed', 'failed') \
             ORDER BY completed_at DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn delete(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// 无条件重置为 pending 并清空错误信息；不存在返回 None。
    pub async fn reset_to_pending(&self, id: &str) -> Result<Option<Job>, sqlx::Error> {
        sqlx::query_as::<_, Job>(
            "UPDATE jobs SET status = 'pending', error_message = NULL WHERE id = ? RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn clear_terminal(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM jobs WHERE status IN ('completed', 'failed')")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// 原子认领最旧的 pending 任务：置为 processing 并返回。
    pub async fn claim_next_pending(&self) -> Result<Option<Job>, sqlx::Error> {
        sqlx::query_as::<_, Job>(
            "UPDATE jobs SET status = 'processing' WHERE id = ( \
                 SELECT id FROM jobs WHERE status = 'pending' ORDER BY created_at LIMIT 1 \
             ) RETURNING *",
        )
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn mark_terminal(
        &self,
        id: &str,
        status: JobStatus,
        error_message: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE jobs SET status = ?, error_message = ?, completed_at = ? WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(error_message)
        .bind(OffsetDateTime::now_utc())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// 启动恢复：上次进程异常退出遗留的 processing 任务退回 pending。
    pub async fn reset_processing(&self) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("UPDATE jobs SET status = 'pending' WHERE status = 'processing'")
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}
