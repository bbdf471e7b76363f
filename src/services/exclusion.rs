// ============================================================================
// 排除规则：从文本文件加载正则表达式，按名称判断是否排除
// 纯 Rust 函数，方便单元测试
// ============================================================================

use std::path::Path;

use regex::{Regex, RegexBuilder};

use crate::utils::error::{AppError, AppResult};

/// 排除规则集合
///
/// 每行一条正则，忽略大小写、不锚定（名称中任意位置匹配即可）。
/// 只针对文件名或目录名本身匹配，从不针对完整路径。加载后不可变。
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    patterns: Vec<Regex>,
}

impl ExclusionSet {
    /// 从排除规则文件加载
    ///
    /// 文件不存在时返回 `ExclusionsNotFound`，调用方据此在任何写操作之前中止。
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.is_file() {
            return Err(AppError::ExclusionsNotFound(path.to_path_buf()));
        }
        // 非 UTF-8 字节按替换字符处理，不因编码问题中止
        let bytes = std::fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes);
        let set = Self::parse(&text)?;
        log::info!(
            "已加载 {} 条排除规则：{}",
            set.len(),
            path.display()
        );
        Ok(set)
    }

    /// 解析规则文本：去除首尾空白后为空的行直接跳过
    ///
    /// 开头的 UTF-8 BOM 会被去掉（记事本等编辑器默认写入）。
    /// 任意一行编译失败都会使整个加载失败，不做逐行容错。
    pub fn parse(text: &str) -> AppResult<Self> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut patterns = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let regex = RegexBuilder::new(trimmed)
                .case_insensitive(true)
                .build()
                .map_err(|source| AppError::InvalidPattern {
                    line: idx + 1,
                    pattern: trimmed.to_string(),
                    source,
                })?;
            patterns.push(regex);
        }
        Ok(Self { patterns })
    }

    /// 名称命中任意一条规则即排除
    pub fn is_excluded(&self, name: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(name))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

// ============================================================================
// 单元测试
// ============================================================================
