// ============================================================================
// 业务层：纯 Rust 核心逻辑
// ✅ 特点：不依赖命令行解析与输出，方便写 #[test]
// ⛔ 禁止：直接向终端打印结果
// ============================================================================

pub mod exclusion;
pub mod mirror;
pub mod packer;
pub mod scanner;
