// ============================================================================
// 命令层：命令行入口，只负责组装参数与调用 services
// ============================================================================

pub mod backup;
