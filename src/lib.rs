// ============================================================================
// [总线] 程序的组装车间
// ✅ 只能做：pub mod 暴露子模块、初始化日志、解析参数、输出结果
// ⛔ 禁止：直接实现备份逻辑
// ============================================================================

pub mod commands;
pub mod models;
pub mod services;
pub mod utils;

use std::process::ExitCode;

use clap::Parser;

use crate::commands::backup::{backup, BackupArgs};
use crate::models::dtos::{BackupReport, SecondaryOutcome};

// ============================================================================
// 应用入口
// ============================================================================

/// 命令行入口：参数个数不对时由 clap 打印用法并以状态码 2 退出，不产生任何副作用
pub fn run() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_target(false)
        .init();

    let args = BackupArgs::parse();

    let root = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("quick-backup: 无法获取当前目录: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match backup(&root, &args) {
        Ok(report) => {
            print_report(&report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("quick-backup: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_report(report: &BackupReport) {
    println!(
        "已创建归档：{}（{} 个文件，{} 字节）",
        report.archive_path.display(),
        report.entry_count,
        report.archive_bytes
    );
    println!("SHA-256：{}", report.digest);
    match &report.secondary {
        SecondaryOutcome::NotRequested => {}
        SecondaryOutcome::Copied(path) => {
            println!("已复制到次级备份：{}", path.display());
        }
        SecondaryOutcome::Failed(message) => {
            eprintln!("警告：{}", message);
        }
    }
}
