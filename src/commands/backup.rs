// ============================================================================
// 备份命令
// 负责：命令行参数定义、串联 排除规则 → 扫描 → 打包 → 次级备份
// ============================================================================

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::models::dtos::{BackupReport, SecondaryOutcome};
use crate::services::exclusion::ExclusionSet;
use crate::services::mirror::copy_to_secondary;
use crate::services::packer::{
    archive_file_name, create_zip_from_files, file_digest, prepare_destination,
    project_folder_name, target_archive_path,
};
use crate::services::scanner::collect_files;
use crate::utils::error::AppResult;

/// 把当前目录打包为 ZIP 备份，放到主备份目录下的项目子目录中
#[derive(Parser, Debug, Clone)]
#[command(name = "quick-backup")]
#[command(author, version, about, long_about = None)]
pub struct BackupArgs {
    /// 归档名称，缺少 .zip 后缀时自动补上
    #[arg(allow_hyphen_values = true)]
    pub archive_name: String,

    /// 排除规则文件：每行一条正则，忽略大小写，只匹配文件名或目录名
    #[arg(allow_hyphen_values = true)]
    pub exclusions_file: PathBuf,

    /// 主备份目录
    #[arg(allow_hyphen_values = true)]
    pub primary_backup_folder: PathBuf,

    /// 次级备份目录（可选），复制失败只发出警告
    #[arg(allow_hyphen_values = true)]
    pub secondary_backup_folder: Option<PathBuf>,
}

/// 执行一次备份
///
/// `root` 为遍历根目录（通常是当前工作目录）。
/// 排除规则文件缺失时在任何写操作之前返回错误；
/// 主归档阶段的错误全部致命，次级备份的错误记录在返回结果中。
pub fn backup(root: &Path, args: &BackupArgs) -> AppResult<BackupReport> {
    // 1. 加载排除规则
    let exclusions = ExclusionSet::load(&args.exclusions_file)?;

    // 2. 计算目标路径
    let project = project_folder_name(root)?;
    let file_name = archive_file_name(&args.archive_name);
    let archive_path = target_archive_path(&args.primary_backup_folder, &project, &file_name);

    // 3. 收集文件，旧归档若位于根目录下则跳过
    let existing_archive = std::fs::canonicalize(&archive_path).ok();
    let files = collect_files(root, &exclusions, existing_archive.as_deref())?;

    // 4. 创建目录、删除旧归档并写入新归档
    prepare_destination(&archive_path)?;
    let summary = create_zip_from_files(root, &files, &archive_path)?;
    let digest = file_digest(&archive_path)?;
    log::info!(
        "已创建归档 {}（{} 个条目，{} 字节）",
        archive_path.display(),
        summary.entry_count,
        summary.archive_bytes
    );

    // 5. 次级备份，失败不影响主归档
    let secondary = match &args.secondary_backup_folder {
        None => SecondaryOutcome::NotRequested,
        Some(folder) => {
            let destination = target_archive_path(folder, &project, &file_name);
            match copy_to_secondary(&archive_path, &destination, &digest) {
                Ok(path) => SecondaryOutcome::Copied(path),
                Err(e) => {
                    log::debug!("次级备份降级为警告: {:?}", e);
                    SecondaryOutcome::Failed(e.to_string())
                }
            }
        }
    };

    Ok(BackupReport {
        archive_path,
        entry_count: summary.entry_count,
        archive_bytes: summary.archive_bytes,
        digest,
        secondary,
    })
}

// ============================================================================
// 单元测试
// ============================================================================
