// ============================================================================
// 扫描服务：递归遍历当前目录，按排除规则收集待打包文件
// 纯 Rust 函数，方便单元测试
// ============================================================================

use std::path::{Path, PathBuf};

use crate::services::exclusion::ExclusionSet;
use crate::utils::error::AppResult;

/// 深度优先收集 `root` 下所有未被排除的文件
///
/// - 根目录自身的名称从不参与匹配
/// - 目录名命中规则时整棵子树被跳过，其中的文件不再逐个判断
/// - 同一目录内先收集文件，再按名称顺序进入子目录
/// - `skip` 为本次要写入的归档路径（已规范化），避免把旧归档打进新归档
///
/// 符号链接会被跟随；链接循环由 walkdir 检测并作为致命错误返回，
/// 名称命中排除规则的悬空或循环链接直接跳过。
pub fn collect_files(
    root: &Path,
    exclusions: &ExclusionSet,
    skip: Option<&Path>,
) -> AppResult<Vec<PathBuf>> {
    let walker = walkdir::WalkDir::new(root)
        .follow_links(true)
        .sort_by(|a, b| {
            // 文件排在目录之前，同类按名称排序，保证归档顺序可复现
            a.file_type()
                .is_dir()
                .cmp(&b.file_type().is_dir())
                .then_with(|| a.file_name().cmp(b.file_name()))
        })
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            if exclusions.is_excluded(&name) {
                log::debug!("排除：{}", e.path().display());
                return false;
            }
            true
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if is_excluded_error(&err, exclusions) => {
                // 跟随链接发生在名称过滤之前，悬空或循环链接的错误需按名称补判
                log::debug!("排除（无法解析的链接）：{}", err);
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        let file_type = entry.file_type();

        if file_type.is_dir() {
            continue;
        }
        if !file_type.is_file() {
            // 管道、套接字等特殊文件无法作为普通文件读取
            log::debug!("跳过非普通文件：{}", entry.path().display());
            continue;
        }
        if let Some(target) = skip {
            if is_same_file(entry.path(), target) {
                log::debug!("跳过目标归档自身：{}", entry.path().display());
                continue;
            }
        }

        log::debug!("收集：{}", entry.path().display());
        files.push(entry.into_path());
    }

    log::info!("共收集 {} 个文件：{}", files.len(), root.display());
    Ok(files)
}

/// 出错条目的名称命中排除规则；根目录自身不参与判断
fn is_excluded_error(err: &walkdir::Error, exclusions: &ExclusionSet) -> bool {
    if err.depth() == 0 {
        return false;
    }
    err.path()
        .and_then(Path::file_name)
        .is_some_and(|name| exclusions.is_excluded(&name.to_string_lossy()))
}

/// 先比较文件名，名称相同时才做规范化路径比较
fn is_same_file(candidate: &Path, canonical_target: &Path) -> bool {
    if candidate.file_name() != canonical_target.file_name() {
        return false;
    }
    std::fs::canonicalize(candidate)
        .map(|p| p == canonical_target)
        .unwrap_or(false)
}

// ============================================================================
// 单元测试
// ============================================================================
