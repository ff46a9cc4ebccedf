//! open/rename/delete 与共享的包含性检查。
//!
//! 检查分两层：先做词法筛查（绝对路径、`..`、盘符前缀一律拒绝，
//! 不管目标存不存在），再对真实路径做 canonicalize 后的前缀比较，
//! 兜住符号链接逃逸。canonicalize 失败一律按拒绝处理，绝不“修正”路径。

use std::fs;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("file not found")]
    NotFound,
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("a file with this name already exists")]
    Conflict,
    #[error("access denied")]
    AccessDenied,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 词法筛查：只接受相对、不含 `..` 的路径。
fn screen_name(name: &str) -> Result<PathBuf, AccessError> {
    if name.is_empty() {
        return Err(AccessError::NotFound);
    }

    let p = Path::new(name);
    if p.is_absolute() {
        return Err(AccessError::AccessDenied);
    }

    let mut out = PathBuf::new();
    for c in p.components() {
        match c {
            Component::CurDir => {}
            Component::Normal(seg) => out.push(seg),
            Component::ParentDir | Component::Prefix(_) | Component::RootDir => {
                return Err(AccessError::AccessDenied);
            }
        }
    }

    if out.as_os_str().is_empty() {
        return Err(AccessError::NotFound);
    }
    Ok(out)
}

fn canonical_root(root: &Path) -> Result<PathBuf, AccessError> {
    fs::canonicalize(root).map_err(|_| AccessError::AccessDenied)
}

/// 对已存在的路径做包含性检查，返回其规范路径。
fn ensure_contained(root_canon: &Path, path: &Path) -> Result<PathBuf, AccessError> {
    let canon = fs::canonicalize(path).map_err(|_| AccessError::AccessDenied)?;
    if !canon.starts_with(root_canon) {
        return Err(AccessError::AccessDenied);
    }
    Ok(canon)
}

/// 解析 `root/name` 为可读文件的规范路径；流式传输由调用方处理。
pub fn open(root: &Path, name: &str) -> Result<PathBuf, AccessError> {
    let rel = screen_name(name)?;
    if !root.exists() {
        return Err(AccessError::NotFound);
    }

    let path = root.join(rel);
    let meta = fs::metadata(&path).map_err(|_| AccessError::NotFound)?;
    if !meta.is_file() {
        return Err(AccessError::NotFound);
    }

    let root_canon = canonical_root(root)?;
    ensure_contained(&root_canon, &path)
}

/// 删除 `root/name`，检查与 [`open`] 相同。不可恢复。
pub fn delete(root: &Path, name: &str) -> Result<(), AccessError> {
    let canon = open(root, name)?;
    fs::remove_file(&canon)?;
    Ok(())
}

/// 重命名，返回实际使用的新文件名。
///
/// 原文件的扩展名是权威的：新名字没带（不区分大小写）就补上。
/// 新名字等于原名字时视为无操作，直接成功返回。
pub fn rename(root: &Path, old_name: &str, new_name: &str) -> Result<String, AccessError> {
    let old_rel = screen_name(old_name)?;
    if !root.exists() {
        return Err(AccessError::NotFound);
    }

    let old_path = root.join(old_rel);
    let meta = fs::metadata(&old_path).map_err(|_| AccessError::NotFound)?;
    if !meta.is_file() {
        return Err(AccessError::NotFound);
    }

    let trimmed = new_name.trim();
    if trimmed.is_empty() {
        return Err(AccessError::InvalidArgument("new name cannot be empty"));
    }

    let final_name = match old_path.extension().and_then(|s| s.to_str()) {
        Some(ext) => {
            let suffix = format!(".{}", ext.to_ascii_lowercase());
            if trimmed.to_ascii_lowercase().ends_with(&suffix) {
                trimmed.to_string()
            } else {
                format!("{trimmed}.{ext}")
            }
        }
        None => trimmed.to_string(),
    };

    let new_rel = screen_name(&final_name)?;
    let new_path = root.join(new_rel);

    if new_path == old_path {
        return Ok(final_name);
    }
    if fs::symlink_metadata(&new_path).is_ok() {
        return Err(AccessError::Conflict);
    }

    let root_canon = canonical_root(root)?;
    ensure_contained(&root_canon, &old_path)?;

    // 新路径尚不存在，对其父目录做包含性检查。
    let parent = new_path.parent().ok_or(AccessError::AccessDenied)?;
    ensure_contained(&root_canon, parent)?;

    fs::rename(&old_path, &new_path)?;
    Ok(final_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root_with(files: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for f in files {
            fs::write(dir.path().join(f), b"video-bytes").unwrap();
        }
        dir
    }

    #[test]
    fn open_resolves_plain_filename() {
        let dir = root_with(&["clip.mp4"]);
        let canon = open(dir.path(), "clip.mp4").unwrap();
        assert!(canon.ends_with("clip.mp4"));
    }

    #[test]
    fn open_missing_file_is_not_found() {
        let dir = root_with(&[]);
        assert!(matches!(
            open(dir.path(), "ghost.mp4"),
            Err(AccessError::NotFound)
        ));
    }

    #[test]
    fn missing_root_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            open(&missing, "clip.mp4"),
            Err(AccessError::NotFound)
        ));
    }

    #[test]
    fn traversal_names_are_denied_even_when_target_exists() {
        let dir = root_with(&["a.mp4"]);
        // 根外造一个真实存在的文件
        let outside = dir.path().parent().unwrap().join("secret.mp4");
        let _ = fs::write(&outside, b"top secret");

        assert!(matches!(
            open(dir.path(), "../secret.mp4"),
            Err(AccessError::AccessDenied)
        ));
        assert!(matches!(
            open(dir.path(), "../../etc/passwd"),
            Err(AccessError::AccessDenied)
        ));
        assert!(matches!(
            delete(dir.path(), "../secret.mp4"),
            Err(AccessError::AccessDenied)
        ));
        assert!(matches!(
            rename(dir.path(), "a.mp4", "../../x.mp4"),
            Err(AccessError::AccessDenied)
        ));
        assert!(matches!(
            open(dir.path(), "/etc/passwd"),
            Err(AccessError::AccessDenied)
        ));

        let _ = fs::remove_file(&outside);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_escape_is_denied() {
        let dir = root_with(&[]);
        let outside = dir.path().parent().unwrap().join("outside.mp4");
        fs::write(&outside, b"x").unwrap();
        std::os::unix::fs::symlink(&outside, dir.path().join("link.mp4")).unwrap();

        assert!(matches!(
            open(dir.path(), "link.mp4"),
            Err(AccessError::AccessDenied)
        ));

        let _ = fs::remove_file(&outside);
    }

    #[test]
    fn delete_removes_file() {
        let dir = root_with(&["gone.mp4"]);
        delete(dir.path(), "gone.mp4").unwrap();
        assert!(!dir.path().join("gone.mp4").exists());
    }

    #[test]
    fn rename_appends_original_extension() {
        let dir = root_with(&["clip.mp4"]);
        assert_eq!(rename(dir.path(), "clip.mp4", "myclip").unwrap(), "myclip.mp4");
        assert!(dir.path().join("myclip.mp4").exists());
    }

    #[test]
    fn rename_does_not_duplicate_extension() {
        let dir = root_with(&["clip.mp4"]);
        assert_eq!(
            rename(dir.path(), "clip.mp4", "myclip.MP4").unwrap(),
            "myclip.MP4"
        );
        assert!(dir.path().join("myclip.MP4").exists());
    }

    #[test]
    fn rename_conflict_leaves_both_files() {
        let dir = root_with(&["a.mp4", "b.mp4"]);
        assert!(matches!(
            rename(dir.path(), "a.mp4", "b"),
            Err(AccessError::Conflict)
        ));
        assert!(dir.path().join("a.mp4").exists());
        assert!(dir.path().join("b.mp4").exists());
    }

    #[test]
    fn rename_to_same_name_is_noop_success() {
        let dir = root_with(&["a.mp4"]);
        assert_eq!(rename(dir.path(), "a.mp4", "a").unwrap(), "a.mp4");
        assert!(dir.path().join("a.mp4").exists());
    }

    #[test]
    fn rename_rejects_blank_new_name() {
        let dir = root_with(&["a.mp4"]);
        assert!(matches!(
            rename(dir.path(), "a.mp4", "   "),
            Err(AccessError::InvalidArgument(_))
        ));
    }

    #[test]
    fn rename_missing_source_is_not_found() {
        let dir = root_with(&[]);
        assert!(matches!(
            rename(dir.path(), "ghost.mp4", "x"),
            Err(AccessError::NotFound)
        ));
    }
}
