//! # File System Helpers / 文件系统辅助函数
//!
//! Path expansion for configuration values and small helpers around the
//! local results directory.
//!
//! 配置值的路径展开，以及围绕本地结果目录的小型辅助函数。

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Expands `~` and environment variables in `path`, then anchors relative
/// results at `base`.
///
/// # Arguments
/// * `path` - Raw path as written in the config file
/// * `base` - Directory relative paths are resolved against
///
/// # Returns
/// The expanded path, or an error if a referenced variable is undefined
pub fn expand_path(path: &Path, base: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw)
        .with_context(|| format!("Failed to expand path: {raw}"))?;
    let expanded = PathBuf::from(expanded.as_ref());

    if expanded.is_absolute() || expanded.as_os_str().is_empty() {
        Ok(expanded)
    } else {
        Ok(base.join(expanded))
    }
}

/// Names of the immediate subdirectories of `dir`. A missing `dir` yields nothing.
/// `dir` 的直接子目录名。`dir` 不存在时返回空列表。
pub fn subdirectory_names(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)
        .with_context(|| format!("Failed to list directory: {}", dir.display()))?
    {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(names)
}

/// Creates the parent directory of `path` if it does not exist yet.
pub fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

/// Last path component as a string, used to name uploaded objects.
pub fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("Path has no file name: {}", path.display()))
}
