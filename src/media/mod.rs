//! 下载目录内影片文件的只读/管理访问。
//!
//! 子模块：
//! - `library` — 扫描下载目录，列出影片文件
//! - `access`  — open/rename/delete，所有产生路径的操作都做包含性检查
//!
//! 影片文件不进数据库：目录里有什么就是什么，删了就没了。

pub mod access;
pub mod library;

/// 允许的影片扩展名（小写比较）。
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "avi", "mkv"];

pub(crate) fn is_video_ext(ext: &str) -> bool {
    VIDEO_EXTENSIONS.contains(&ext)
}
