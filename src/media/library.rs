//! 下载目录扫描。

use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use super::is_video_ext;

#[derive(Debug, Clone, Serialize)]
pub struct VideoFile {
    pub filename: String,
    pub size: u64,
    pub created_ms: Option<u64>,
    pub modified_ms: Option<u64>,
}

/// 列出根目录直属的影片文件，按修改时间倒序。
///
/// 根目录不存在按空列表处理（尚未下载过任何东西），不算错误。
pub fn list_videos(root: &Path) -> io::Result<Vec<VideoFile>> {
    if !root.exists() {
        return Ok(Vec::new());
    }

    let mut out = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        let meta = match entry.metadata() {
            Ok(m) => m,
            Err(_) => continue,
        };
        if !meta.is_file() {
            continue;
        }

        let path = entry.path();
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        if !is_video_ext(&ext) {
            continue;
        }

        let filename = match path.file_name().and_then(|s| s.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };

        out.push(VideoFile {
            filename,
            size: meta.len(),
            created_ms: meta.created().ok().and_then(system_time_ms),
            modified_ms: meta.modified().ok().and_then(system_time_ms),
        });
    }

    out.sort_by(|a, b| {
        b.modified_ms
            .cmp(&a.modified_ms)
            .then_with(|| a.filename.cmp(&b.filename))
    });
    Ok(out)
}

fn system_time_ms(t: SystemTime) -> Option<u64> {
    t.duration_since(UNIX_EPOCH)
        .ok()
        .map(|d| d.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_root_yields_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(list_videos(&missing).unwrap().is_empty());
    }

    #[test]
    fn filters_extensions_and_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.mp4"), b"x").unwrap();
        std::fs::write(dir.path().join("b.MKV"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("sub.mp4")).unwrap();

        let names: Vec<String> = list_videos(dir.path())
            .unwrap()
            .into_iter()
            .map(|v| v.filename)
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"a.mp4".to_string()));
        assert!(names.contains(&"b.MKV".to_string()));
    }

    #[test]
    fn sorts_by_modified_desc() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("old.mp4"), b"x").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));
        std::fs::write(dir.path().join("new.mp4"), b"x").unwrap();

        let names: Vec<String> = list_videos(dir.path())
            .unwrap()
            .into_iter()
            .map(|v| v.filename)
            .collect();
        assert_eq!(names, ["new.mp4", "old.mp4"]);
    }
}
