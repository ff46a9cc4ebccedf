use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::base_system::context::Config;
use crate::queue::manager::QueueManager;
use crate::worker::WorkerHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) bind_addrs: Arc<Vec<SocketAddr>>,
    // allow runtime updates via PUT /api/settings
    pub(crate) config: Arc<Mutex<Config>>,
    pub(crate) config_path: Arc<PathBuf>,
    pub(crate) queue: QueueManager,
    pub(crate) worker: WorkerHandle,
}

impl AppState {
    /// 每个请求都重新读一次下载根目录，设置改了立即生效。
    pub(crate) fn download_root(&self) -> PathBuf {
        self.config.lock().unwrap().download_root()
    }
}
