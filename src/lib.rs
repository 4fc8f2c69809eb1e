//! # Shard Runner Library / Shard Runner 库
//!
//! This library provides the core functionality for the Shard Runner tool,
//! which splits an instrumentation test suite into shards, runs each shard as
//! a job on a remote test lab, and tracks every run in an on-disk ledger so
//! it can be re-polled or re-reported after a restart.
//!
//! 此库为 Shard Runner 工具提供核心功能：将插桩测试套件拆分为分片，
//! 在远程测试实验室中将每个分片作为作业运行，并在磁盘账本中跟踪每次运行，
//! 以便在重启后重新轮询或重新生成报告。
//!
//! ## Modules / 模块
//!
//! - `core` - Run engine: ledger, dispatch, polling, artifacts, orchestration
//! - `infra` - Remote collaborators and file system helpers
//! - `reporting` - Console and HTML reports
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 运行引擎：账本、分发、轮询、产物、编排
//! - `infra` - 远程协作者和文件系统辅助函数
//! - `reporting` - 控制台和 HTML 报告
//! - `cli` - 命令行接口和命令

pub mod cli;
pub mod core;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use crate::core::config;
pub use crate::core::ledger;
pub use crate::core::models;

/// Picks the UI language from the system locale.
///
/// Tries the full locale first (e.g. "zh-CN"), then the language part only
/// (e.g. "en" from "en-US"), and finally falls back to "en".
pub fn detect_locale() -> String {
    let locale = sys_locale::get_locale().unwrap_or_else(|| "en".to_string());
    let available_locales = rust_i18n::available_locales!();

    if available_locales.contains(&locale.as_str()) {
        locale
    } else {
        locale
            .split('-')
            .next()
            .filter(|lang_code| available_locales.contains(lang_code))
            .unwrap_or("en")
            .to_string()
    }
}

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
