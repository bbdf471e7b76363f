// ============================================================================
// 数据传输对象定义
// 备份流程的结果结构，仅包含字段定义
// ⛔ 禁止：包含复杂的业务逻辑方法
// ============================================================================

use std::path::PathBuf;

/// 次级备份阶段的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecondaryOutcome {
    /// 未提供次级备份目录
    NotRequested,
    /// 复制并校验成功，携带次级归档路径
    Copied(PathBuf),
    /// 复制失败（非致命），携带错误描述
    Failed(String),
}

/// 一次备份的结果，由 `commands::backup::backup` 返回
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupReport {
    /// 主归档路径
    pub archive_path: PathBuf,
    /// 写入归档的文件数
    pub entry_count: usize,
    /// 主归档大小（字节）
    pub archive_bytes: u64,
    /// 主归档 SHA-256（小写十六进制）
    pub digest: String,
    pub secondary: SecondaryOutcome,
}
