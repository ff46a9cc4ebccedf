//! 下载 worker：认领 pending 任务，调用外部下载器，回报终态。
//!
//! worker 是 `status`/`completed_at`/`error_message` 的唯一写入方
//! （通过 [`WorkerQueue`] 特权口）。下载本身交给外部命令行工具
//! （默认 yt-dlp），产物落到配置的下载目录里。

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::process::Command;
use tokio::sync::Notify;
use tracing::{error, info, warn};

use crate::base_system::context::Config;
use crate::queue::manager::WorkerQueue;
use crate::queue::models::Job;

const ERROR_TAIL_CHARS: usize = 500;

#[derive(Clone)]
pub struct WorkerHandle {
    running: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl WorkerHandle {
    fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
            wake: Arc::new(Notify::new()),
        }
    }

    pub fn start(&self) {
        if !self.running.swap(true, Ordering::SeqCst) {
            info!(target: "worker", "worker started");
        }
        self.wake.notify_one();
    }

    /// 叫醒正在等轮询间隔的 worker（不改变运行状态）。
    pub fn poke(&self) {
        self.wake.notify_one();
    }

    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!(target: "worker", "worker stopped (current download finishes)");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// 启动 worker 循环任务，返回控制句柄。
pub fn spawn(queue: WorkerQueue, config: Arc<Mutex<Config>>) -> WorkerHandle {
    let handle = WorkerHandle::new();
    let loop_handle = handle.clone();
    tokio::spawn(async move {
        run_loop(queue, config, loop_handle).await;
    });
    handle
}

async fn run_loop(queue: WorkerQueue, config: Arc<Mutex<Config>>, handle: WorkerHandle) {
    loop {
        if !handle.is_running() {
            handle.wake.notified().await;
            continue;
        }

        let snapshot = config.lock().unwrap().clone();

        match queue.claim_next_pending().await {
            Ok(Some(job)) => {
                process_job(&queue, &snapshot, job).await;
            }
            Ok(None) => {
                let poll = Duration::from_secs(snapshot.worker_poll_secs.max(1));
                tokio::select! {
                    _ = tokio::time::sleep(poll) => {}
                    _ = handle.wake.notified() => {}
                }
            }
            Err(err) => {
                error!(target: "worker", error = %err, "failed to claim next job");
                tokio::time::sleep(Duration::from_secs(snapshot.worker_poll_secs.max(1))).await;
            }
        }
    }
}

async fn process_job(queue: &WorkerQueue, config: &Config, job: Job) {
    info!(target: "worker", id = %job.id, url = %job.url, "download started");

    let outcome = run_downloader(config, &job.url).await;
    let report = match outcome {
        Ok(()) => {
            info!(target: "worker", id = %job.id, "download completed");
            queue.mark_completed(&job.id).await
        }
        Err(message) => {
            warn!(target: "worker", id = %job.id, error = %message, "download failed");
            queue.mark_failed(&job.id, &message).await
        }
    };

    // 任务可能在下载期间被调用方删掉，终态写不进去只记一笔。
    if let Err(err) = report {
        warn!(target: "worker", id = %job.id, error = %err, "could not record job outcome");
    }
}

async fn run_downloader(config: &Config, url: &str) -> Result<(), String> {
    let root = config.download_root();
    if let Err(err) = std::fs::create_dir_all(&root) {
        return Err(format!("cannot create download dir: {err}"));
    }

    let output = Command::new(&config.downloader_command)
        .args(&config.downloader_args)
        .arg("-P")
        .arg(&root)
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|err| format!("cannot run {}: {err}", config.downloader_command))?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(format!(
        "{} exited with {}: {}",
        config.downloader_command,
        output.status,
        tail(stderr.trim(), ERROR_TAIL_CHARS)
    ))
}

fn tail(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth_back(max_chars.saturating_sub(1)) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_keeps_short_text_intact() {
        assert_eq!(tail("short error", 500), "short error");
    }

    #[test]
    fn tail_truncates_from_the_front() {
        let text = "x".repeat(600) + "tail";
        let out = tail(&text, 500);
        assert_eq!(out.chars().count(), 500);
        assert!(out.ends_with("tail"));
    }
}
