//! 队列生命周期规则。
//!
//! 状态机：`pending → processing → {completed | failed}`；
//! 终态任务可经 `retry` 无条件回到 `pending`。
//!
//! 对外分两个口子：
//! - [`QueueManager`] — API 调用方的操作集合
//! - [`WorkerQueue`]  — worker 专用的特权写入（认领、回报终态）
//!
//! 调用方永远不直接改 `status` / `error_message` / `completed_at`。

use thiserror::Error;
use tracing::info;

use super::models::{Job, JobStatus};
use super::store::JobStore;

pub const DEFAULT_HISTORY_LIMIT: u32 = 50;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("job not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

#[derive(Clone)]
pub struct QueueManager {
    store: JobStore,
}

impl QueueManager {
    pub fn new(store: JobStore) -> Self {
        Self { store }
    }

    /// 逐个入队；同 URL 已有活跃任务时静默跳过（幂等策略，不是错误）。
    /// 返回值保持输入顺序、不含被跳过的 URL。
    /// 中途失败不回滚已入队的任务。
    pub async fn enqueue(&self, urls: &[String]) -> Result<Vec<Job>, QueueError> {
        let mut added = Vec::new();
        for url in urls {
            let job = Job::new(url.clone());
            if self.store.insert_if_no_active(&job).await? {
                info!(target: "queue", id = %job.id, url = %job.url, "job enqueued");
                added.push(job);
            }
        }
        Ok(added)
    }

    pub async fn list_active(&self) -> Result<Vec<Job>, QueueError> {
        Ok(self.store.list_active().await?)
    }

    /// 不论状态，直接删除任务记录。
    pub async fn remove(&self, id: &str) -> Result<(), QueueError> {
        if !self.store.delete(id).await? {
            return Err(QueueError::NotFound(id.to_string()));
        }
        info!(target: "queue", id = %id, "job removed");
        Ok(())
    }

    /// 无条件重试：不限于 failed，completed 也可以重新排队。
    pub async fn retry(&self, id: &str) -> Result<Job, QueueError> {
        let job = self
            .store
            .reset_to_pending(id)
            .await?
            .ok_or_else(|| QueueError::NotFound(id.to_string()))?;
        info!(target: "queue", id = %id, "job reset to pending");
        Ok(job)
    }

    pub async fn list_history(&self, limit: u32) -> Result<Vec<Job>, QueueError> {
        Ok(self.store.list_terminal(limit).await?)
    }

    pub async fn clear_history(&self) -> Result<u64, QueueError> {
        let removed = self.store.clear_terminal().await?;
        info!(target: "queue", removed, "history cleared");
        Ok(removed)
    }
}

/// worker 特权口：唯一允许写 `status`/`error_message`/`completed_at` 终态字段的入口。
#[derive(Clone)]
pub struct WorkerQueue {
    store: JobStore,
}

impl WorkerQueue {
    pub fn new(store: JobStore) -> Self {
        Self { store }
    }

    pub async fn claim_next_pending(&self) -> Result<Option<Job>, QueueError> {
        Ok(self.store.claim_next_pending().await?)
    }

    pub async fn mark_completed(&self, id: &str) -> Result<(), QueueError> {
        if !self
            .store
            .mark_terminal(id, JobStatus::Completed, None)
            .await?
        {
            return Err(QueueError::NotFound(id.to_string()));
        }
        Ok(())
    }

    pub async fn mark_failed(&self, id: &str, message: &str) -> Result<(), QueueError> {
        if !self
            .store
            .mark_terminal(id, JobStatus::Failed, Some(message))
            .await?
        {
            return Err(QueueError::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// 启动时调用：崩溃遗留的 processing 任务退回 pending。
    pub async fn recover_interrupted(&self) -> Result<u64, QueueError> {
        Ok(self.store.reset_processing().await?)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    async fn setup() -> (QueueManager, WorkerQueue) {
        let store = JobStore::open_in_memory().await.unwrap();
        (QueueManager::new(store.clone()), WorkerQueue::new(store))
    }

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    // created_at/completed_at 排序断言依赖时间戳严格递增
    async fn tick() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    #[tokio::test]
    async fn enqueue_suppresses_duplicate_active_url() {
        let (queue, _) = setup().await;

        let first = queue.enqueue(&urls(&["https://v.test/a"])).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].status, JobStatus::Pending);

        let second = queue.enqueue(&urls(&["https://v.test/a"])).await.unwrap();
        assert!(second.is_empty());

        assert_eq!(queue.list_active().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn enqueue_keeps_input_order_minus_skips() {
        let (queue, _) = setup().await;
        queue.enqueue(&urls(&["https://v.test/b"])).await.unwrap();

        let added = queue
            .enqueue(&urls(&["https://v.test/a", "https://v.test/b", "https://v.test/c"]))
            .await
            .unwrap();
        let added_urls: Vec<&str> = added.iter().map(|j| j.url.as_str()).collect();
        assert_eq!(added_urls, ["https://v.test/a", "https://v.test/c"]);
    }

    #[tokio::test]
    async fn terminal_job_does_not_block_reenqueue() {
        let (queue, worker) = setup().await;

        let job = &queue.enqueue(&urls(&["https://v.test/a"])).await.unwrap()[0];
        let claimed = worker.claim_next_pending().await.unwrap().unwrap();
        worker.mark_completed(&claimed.id).await.unwrap();

        let again = queue.enqueue(&urls(&["https://v.test/a"])).await.unwrap();
        assert_eq!(again.len(), 1);
        assert_ne!(again[0].id, job.id);
    }

    #[tokio::test]
    async fn retry_is_unconditional_and_clears_error() {
        let (queue, worker) = setup().await;

        let job = &queue.enqueue(&urls(&["https://v.test/a"])).await.unwrap()[0];
        let claimed = worker.claim_next_pending().await.unwrap().unwrap();
        worker.mark_failed(&claimed.id, "network unreachable").await.unwrap();

        let retried = queue.retry(&job.id).await.unwrap();
        assert_eq!(retried.status, JobStatus::Pending);
        assert_eq!(retried.error_message, None);

        // completed 状态同样可重试
        let claimed = worker.claim_next_pending().await.unwrap().unwrap();
        worker.mark_completed(&claimed.id).await.unwrap();
        let retried = queue.retry(&job.id).await.unwrap();
        assert_eq!(retried.status, JobStatus::Pending);
    }

    #[tokio::test]
    async fn remove_and_retry_report_not_found() {
        let (queue, _) = setup().await;

        assert!(matches!(
            queue.remove("no-such-id").await,
            Err(QueueError::NotFound(_))
        ));
        assert!(matches!(
            queue.retry("no-such-id").await,
            Err(QueueError::NotFound(_))
        ));
        assert!(queue.list_active().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn history_orders_by_completion_desc_and_truncates() {
        let (queue, worker) = setup().await;

        for url in ["https://v.test/1", "https://v.test/2", "https://v.test/3"] {
            queue.enqueue(&urls(&[url])).await.unwrap();
            let claimed = worker.claim_next_pending().await.unwrap().unwrap();
            worker.mark_completed(&claimed.id).await.unwrap();
            tick().await;
        }

        let history = queue.list_history(2).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].url, "https://v.test/3");
        assert_eq!(history[1].url, "https://v.test/2");
    }

    #[tokio::test]
    async fn clear_history_removes_terminal_jobs_only() {
        let (queue, worker) = setup().await;

        queue
            .enqueue(&urls(&["https://v.test/done", "https://v.test/waiting"]))
            .await
            .unwrap();
        let claimed = worker.claim_next_pending().await.unwrap().unwrap();
        worker.mark_failed(&claimed.id, "boom").await.unwrap();

        assert_eq!(queue.clear_history().await.unwrap(), 1);
        let active = queue.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].url, "https://v.test/waiting");
    }

    #[tokio::test]
    async fn claim_takes_oldest_pending_and_flips_status() {
        let (queue, worker) = setup().await;

        queue.enqueue(&urls(&["https://v.test/old"])).await.unwrap();
        tick().await;
        queue.enqueue(&urls(&["https://v.test/new"])).await.unwrap();

        let claimed = worker.claim_next_pending().await.unwrap().unwrap();
        assert_eq!(claimed.url, "https://v.test/old");
        assert_eq!(claimed.status, JobStatus::Processing);

        let claimed = worker.claim_next_pending().await.unwrap().unwrap();
        assert_eq!(claimed.url, "https://v.test/new");

        assert!(worker.claim_next_pending().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn recover_interrupted_resets_processing_only() {
        let (queue, worker) = setup().await;

        queue
            .enqueue(&urls(&["https://v.test/a", "https://v.test/b"]))
            .await
            .unwrap();
        worker.claim_next_pending().await.unwrap().unwrap();

        assert_eq!(worker.recover_interrupted().await.unwrap(), 1);
        let active = queue.list_active().await.unwrap();
        assert!(active.iter().all(|j| j.status == JobStatus::Pending));
    }
}
