// ============================================================================
// 次级备份：把主归档复制到次级备份目录并校验
// 该阶段的任何失败都返回 CopyError，由命令层降级为警告
// ============================================================================

use std::path::{Path, PathBuf};

use crate::services::packer::file_digest;
use crate::utils::error::{AppError, AppResult};

/// 复制主归档到 `destination`，覆盖已存在的同名文件
///
/// 自动创建缺失的上级目录；复制完成后比对 SHA-256，
/// 不一致视为复制失败。返回实际写入的路径。
pub fn copy_to_secondary(
    archive_path: &Path,
    destination: &Path,
    expected_digest: &str,
) -> AppResult<PathBuf> {
    if is_same_path(archive_path, destination) {
        return Err(AppError::CopyError(format!(
            "次级备份路径与主归档是同一个文件：{}",
            destination.display()
        )));
    }

    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::CopyError(format!("无法创建目录 {}: {}", parent.display(), e))
        })?;
    }

    std::fs::copy(archive_path, destination).map_err(|e| {
        AppError::CopyError(format!(
            "无法复制 {} → {}: {}",
            archive_path.display(),
            destination.display(),
            e
        ))
    })?;

    let copied_digest = file_digest(destination)
        .map_err(|e| AppError::CopyError(format!("无法校验 {}: {}", destination.display(), e)))?;
    if copied_digest != expected_digest {
        return Err(AppError::CopyError(format!(
            "校验失败 {}：期望 {}，实际 {}",
            destination.display(),
            expected_digest,
            copied_digest
        )));
    }

    Ok(destination.to_path_buf())
}

/// 两个路径都存在且规范化后相同
///
/// 同一文件上执行 `fs::copy` 会先截断目标，导致主归档被清空。
fn is_same_path(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
