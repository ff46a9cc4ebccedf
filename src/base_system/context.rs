//! 全局配置结构（Config）与默认值。
//!
//! 该模块同时提供生成 `config.yml` 的字段元信息。

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::config::{ConfigSpec, FieldMeta};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // 下载配置
    #[serde(default = "default_download_path")]
    pub download_path: String,
    #[serde(default = "default_false")]
    pub headless_mode: bool,
    #[serde(default = "default_true")]
    pub auto_remove: bool,
    #[serde(default = "default_true")]
    pub show_notification: bool,

    // 存储配置
    #[serde(default = "default_database_file")]
    pub database_file: String,

    // 下载器配置
    #[serde(default = "default_downloader_command")]
    pub downloader_command: String,
    #[serde(default)]
    pub downloader_args: Vec<String>,
    #[serde(default = "default_worker_poll_secs")]
    pub worker_poll_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            download_path: default_download_path(),
            headless_mode: default_false(),
            auto_remove: default_true(),
            show_notification: default_true(),
            database_file: default_database_file(),
            downloader_command: default_downloader_command(),
            downloader_args: Vec::new(),
            worker_poll_secs: default_worker_poll_secs(),
        }
    }
}

impl Config {
    /// 影片保存根目录。相对路径相对于进程工作目录。
    pub fn download_root(&self) -> PathBuf {
        PathBuf::from(&self.download_path)
    }

    /// SQLite 数据库文件路径；`--data-dir` 指定时放到数据目录下。
    pub fn database_path(&self, base_dir: Option<&Path>) -> PathBuf {
        match base_dir {
            Some(base) => base.join(&self.database_file),
            None => PathBuf::from(&self.database_file),
        }
    }
}

impl ConfigSpec for Config {
    const FILE_NAME: &'static str = "config.yml";

    fn fields() -> &'static [FieldMeta] {
        const FIELDS: &[FieldMeta] = &[
            FieldMeta {
                name: "download_path",
                description: "影片保存目录（相对路径基于工作目录）",
            },
            FieldMeta {
                name: "headless_mode",
                description: "下载器是否以无界面模式运行（由前端/下载器自行解释）",
            },
            FieldMeta {
                name: "auto_remove",
                description: "下载完成后是否自动从队列页移除（前端行为开关）",
            },
            FieldMeta {
                name: "show_notification",
                description: "下载完成后是否弹出通知（前端行为开关）",
            },
            FieldMeta {
                name: "database_file",
                description: "任务队列 SQLite 数据库文件名",
            },
            FieldMeta {
                name: "downloader_command",
                description: "外部下载器可执行文件（默认 yt-dlp）",
            },
            FieldMeta {
                name: "downloader_args",
                description: "传给下载器的附加参数列表",
            },
            FieldMeta {
                name: "worker_poll_secs",
                description: "队列为空时 worker 轮询间隔（秒）",
            },
        ];
        FIELDS
    }
}

fn default_false() -> bool {
    false
}

fn default_true() -> bool {
    true
}

fn default_download_path() -> String {
    "./downloads".to_string()
}

fn default_database_file() -> String {
    "queue.db".to_string()
}

fn default_downloader_command() -> String {
    "yt-dlp".to_string()
}

fn default_worker_poll_secs() -> u64 {
    3
}
