// ============================================================================
// 统一错误类型定义
// 使用 thiserror 派生宏，所有服务函数统一返回 AppResult
// ============================================================================

use std::path::PathBuf;

use thiserror::Error;

/// 应用统一错误枚举
///
/// 除 `CopyError` 外，所有变体都会终止本次备份。
/// `CopyError` 只在次级备份阶段产生，由命令层降级为警告。
#[derive(Debug, Error)]
pub enum AppError {
    /// 排除规则文件不存在
    #[error("排除规则文件不存在：{}", .0.display())]
    ExclusionsNotFound(PathBuf),

    /// 排除规则中的正则表达式无法编译
    #[error("排除规则第 {line} 行不是合法的正则表达式 `{pattern}`：{source}")]
    InvalidPattern {
        line: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// 遍历目录失败（权限不足、文件消失、符号链接循环等）
    #[error("扫描目录失败：{0}")]
    ScanError(String),

    /// 写入 ZIP 归档失败
    #[error("打包 ZIP 失败：{0}")]
    ArchiveError(String),

    /// 复制到次级备份目录失败
    #[error("复制到次级备份失败：{0}")]
    CopyError(String),

    /// 当前目录没有可用作项目子目录名的最后一段路径（如文件系统根目录）
    #[error("无法从路径确定项目目录名：{}", .0.display())]
    ProjectNameError(PathBuf),

    /// 文件系统 IO 错误
    #[error("IO 错误：{0}")]
    IoError(#[from] std::io::Error),
}

/// 便捷类型别名，统一项目内的 Result 签名
pub type AppResult<T> = Result<T, AppError>;

impl From<walkdir::Error> for AppError {
    fn from(err: walkdir::Error) -> Self {
        match err.loop_ancestor() {
            Some(ancestor) => AppError::ScanError(format!(
                "检测到符号链接循环：{} 指向其祖先目录 {}",
                err.path().map(|p| p.display().to_string()).unwrap_or_default(),
                ancestor.display()
            )),
            None => AppError::ScanError(err.to_string()),
        }
    }
}

impl From<zip::result::ZipError> for AppError {
    fn from(err: zip::result::ZipError) -> Self {
        AppError::ArchiveError(err.to_string())
    }
}
