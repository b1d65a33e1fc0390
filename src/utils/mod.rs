use std::fs;
use std::path::Path;
use std::time::SystemTime;

use anyhow::{Context, Result};
use tracing::debug;
use walkdir::WalkDir;

pub mod markdown;

/// 清空输出目录时保留的版本控制目录
pub const VCS_DIRS: [&str; 3] = [".git", ".hg", ".svn"];

/// 递归合并复制目录：同名文件覆盖，目录合并而不是替换
pub fn copy_tree(src: &Path, dst: &Path) -> Result<usize> {
    let mut copied = 0;
    fs::create_dir_all(dst).with_context(|| format!("创建目录失败: {}", dst.display()))?;

    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry.with_context(|| format!("遍历目录失败: {}", src.display()))?;
        let relative = entry.path().strip_prefix(src)?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("创建目录失败: {}", target.display()))?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            // fs::copy 复制内容和权限位，修改时间另外设置
            fs::copy(entry.path(), &target).with_context(|| {
                format!("复制文件失败: {} -> {}", entry.path().display(), target.display())
            })?;
            let modified = entry.metadata()?.modified()?;
            set_modified(&target, modified)
                .with_context(|| format!("设置修改时间失败: {}", target.display()))?;
            copied += 1;
        }
    }

    debug!("Copied {} files from {} to {}", copied, src.display(), dst.display());
    Ok(copied)
}

fn set_modified(path: &Path, modified: SystemTime) -> std::io::Result<()> {
    // 只读文件无法以写方式打开，退回只读句柄
    let file = fs::OpenOptions::new()
        .write(true)
        .open(path)
        .or_else(|_| fs::File::open(path))?;
    file.set_modified(modified)
}

/// 删除目录下所有文件和子目录，版本控制目录除外
pub fn clear_dir(dir: &Path) -> Result<()> {
    for entry in fs::read_dir(dir).with_context(|| format!("读取目录失败: {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name();
        if entry.file_type()?.is_dir() {
            if VCS_DIRS.iter().any(|vcs| name == *vcs) {
                continue;
            }
            fs::remove_dir_all(&path)
                .with_context(|| format!("删除目录失败: {}", path.display()))?;
        } else {
            fs::remove_file(&path).with_context(|| format!("删除文件失败: {}", path.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_tree_merges_into_existing_directories() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        fs::create_dir_all(src.path().join("css")).unwrap();
        fs::write(src.path().join("css/site.css"), "new").unwrap();
        fs::create_dir_all(dst.path().join("css")).unwrap();
        fs::write(dst.path().join("css/site.css"), "old").unwrap();
        fs::write(dst.path().join("css/keep.css"), "keep").unwrap();

        assert_eq!(copy_tree(src.path(), dst.path()).unwrap(), 1);
        assert_eq!(fs::read_to_string(dst.path().join("css/site.css")).unwrap(), "new");
        assert!(dst.path().join("css/keep.css").exists());
    }

    #[test]
    fn copy_tree_keeps_modification_times() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let source = src.path().join("img/logo.svg");
        fs::create_dir_all(source.parent().unwrap()).unwrap();
        fs::write(&source, "<svg/>").unwrap();
        let old = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000_000);
        fs::OpenOptions::new()
            .write(true)
            .open(&source)
            .unwrap()
            .set_modified(old)
            .unwrap();

        copy_tree(src.path(), dst.path()).unwrap();

        let copied = fs::metadata(dst.path().join("img/logo.svg")).unwrap();
        assert_eq!(copied.modified().unwrap(), old);
    }

    #[test]
    fn clear_dir_keeps_version_control() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".git/objects")).unwrap();
        fs::create_dir_all(dir.path().join("assets/js")).unwrap();
        fs::write(dir.path().join("index.html"), "x").unwrap();

        clear_dir(dir.path()).unwrap();
        let left: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(left, vec![std::ffi::OsString::from(".git")]);
    }
}
