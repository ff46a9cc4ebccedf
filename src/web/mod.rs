//! Web API 服务器。

mod error;
mod router;
mod routes;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use tracing::{info, warn};

use crate::base_system::context::Config;
use crate::queue::manager::{QueueManager, WorkerQueue};
use crate::queue::store::JobStore;
use crate::worker;
use state::AppState;

const DEFAULT_BIND: &str = "127.0.0.1:8642";

pub fn run(config: Config, config_path: PathBuf, data_dir: Option<PathBuf>) -> Result<()> {
    let bind_raw = std::env::var("VDM_WEB_ADDR").unwrap_or_else(|_| DEFAULT_BIND.to_string());
    let bind_addrs: Vec<SocketAddr> = parse_bind_addrs(&bind_raw)?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    rt.block_on(run_async(bind_addrs, config, config_path, data_dir))
}

fn parse_bind_addr(raw: &str) -> Result<SocketAddr> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(anyhow!("empty bind addr"));
    }

    // Standard formats:
    // - IPv4: 127.0.0.1:8642
    // - IPv6: [::1]:8642
    if let Ok(a) = s.parse::<SocketAddr>() {
        return Ok(a);
    }

    Err(anyhow!(
        "invalid VDM_WEB_ADDR: '{s}'. Use '127.0.0.1:8642' or '[::1]:8642' (IPv6 needs brackets). For multiple binds, separate by comma: '0.0.0.0:8642,[::]:8642'."
    ))
}

fn parse_bind_addrs(raw: &str) -> Result<Vec<SocketAddr>> {
    let parts: Vec<&str> = raw
        .split([',', ';'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    if parts.is_empty() {
        return Err(anyhow!("empty VDM_WEB_ADDR"));
    }

    let mut out = Vec::with_capacity(parts.len());
    for p in parts {
        let a = parse_bind_addr(p)?;
        if !out.contains(&a) {
            out.push(a);
        }
    }

    Ok(out)
}

async fn run_async(
    bind_addrs: Vec<SocketAddr>,
    config: Config,
    config_path: PathBuf,
    data_dir: Option<PathBuf>,
) -> Result<()> {
    let db_path = config.database_path(data_dir.as_deref());
    let store = JobStore::open(&db_path).await?;
    info!(target: "startup", db = %db_path.display(), "job store opened");

    let worker_queue = WorkerQueue::new(store.clone());
    let recovered = worker_queue.recover_interrupted().await?;
    if recovered > 0 {
        info!(target: "startup", recovered, "processing jobs reset to pending after restart");
    }

    let config = Arc::new(Mutex::new(config));
    let worker_handle = worker::spawn(worker_queue, config.clone());

    let state = AppState {
        bind_addrs: Arc::new(bind_addrs.clone()),
        config,
        config_path: Arc::new(config_path),
        queue: QueueManager::new(store),
        worker: worker_handle,
    };

    // Shared shutdown trigger for all listeners.
    let notify = Arc::new(tokio::sync::Notify::new());
    {
        let notify = notify.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            notify.notify_waiters();
        });
    }

    let mut servers = Vec::new();
    for bind in bind_addrs {
        let listener = match tokio::net::TcpListener::bind(bind).await {
            Ok(l) => l,
            Err(e) => {
                // On some platforms, binding both [::]:PORT and 0.0.0.0:PORT can fail with
                // AddrInUse because IPv6 listener may already accept IPv4 (dual-stack).
                // If at least one listener has started, treat AddrInUse as non-fatal.
                if !servers.is_empty() && e.kind() == std::io::ErrorKind::AddrInUse {
                    warn!(target: "web", bind = %bind, error = %e, "bind failed (AddrInUse), likely already covered by another listener; skipping");
                    continue;
                }
                return Err(anyhow!(e).context(format!("bind failed: {bind}")));
            }
        };

        info!(target: "web", "API listening on http://{bind}/ (set VDM_WEB_ADDR to override)");
        println!("API listening on http://{bind}/");

        let app = router::build_router(state.clone());
        let notify = notify.clone();
        servers.push(tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
            )
            .with_graceful_shutdown(async move {
                notify.notified().await;
            })
            .await
        }));
    }

    if servers.is_empty() {
        return Err(anyhow!("no listeners started (check VDM_WEB_ADDR)"));
    }

    println!("Press Ctrl+C to stop.");

    for h in servers {
        h.await
            .map_err(|e| anyhow!("server task join failed: {e}"))?
            .map_err(|e| anyhow!(e))?;
    }

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    println!("Stopping server...");
}
