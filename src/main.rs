//! Video Download Manager — 视频下载队列服务器（Rust 实现）。
//!
//! 本 crate 负责：下载任务队列（入队/去重/重试/历史）、下载目录内
//! 影片文件的安全访问（列表/串流/改名/删除）、设置持久化与 Web API。
//!
//! 代码结构（读代码入口）：
//! - `base_system`：配置/日志等基础设施
//! - `queue`：任务模型、SQLite 存储与生命周期规则
//! - `media`：下载目录扫描与防目录穿越的文件操作
//! - `worker`：认领 pending 任务并调用外部下载器（默认 yt-dlp）
//! - `web`：axum 路由与错误映射

use std::path::Path;

use anyhow::{Result, anyhow};
use clap::Parser;
use tracing::info;

mod base_system;
mod media;
mod queue;
mod web;
mod worker;

use base_system::config::{config_path, load_or_create};
use base_system::context::Config;
use base_system::logging::{LogOptions, LogSystem};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Parser)]
#[command(name = "video-download-manager")]
#[command(about = "Video download queue server")]
struct Cli {
    /// 启用调试日志输出
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// 显示版本信息后退出
    #[arg(long, default_value_t = false)]
    version: bool,

    /// 数据目录路径（存放 config.yml / queue.db / logs，方便 Docker 挂载）
    #[arg(long)]
    data_dir: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("Video Download Manager v{VERSION}");
        return Ok(());
    }

    let data_dir = cli.data_dir.as_deref().map(Path::new);
    let _log = init_logging(cli.debug, data_dir)?;

    let config =
        load_or_create::<Config>(data_dir).map_err(|e| anyhow!(e.to_string()))?;
    let config_file = config_path::<Config>(data_dir);

    info!(target: "startup", "Video Download Manager v{VERSION}");
    web::run(config, config_file, data_dir.map(|p| p.to_path_buf()))
}

fn init_logging(debug: bool, base_dir: Option<&Path>) -> Result<LogSystem> {
    let opts = LogOptions {
        debug,
        use_color: true,
        archive_on_exit: true,
        console: true,
    };
    LogSystem::init_with_base(opts, base_dir).map_err(|e| anyhow!(e))
}
