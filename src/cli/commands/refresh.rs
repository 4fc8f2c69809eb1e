//! # Refresh Command Module / 刷新命令模块
//!
//! Picks up the most recent run from the results directory, checks in on
//! its unfinished jobs once, and re-renders the reports.
//!
//! 从结果目录中找到最近一次运行，对其未完成作业检查一次，并重新生成报告。

use anyhow::Result;
use std::path::PathBuf;

use crate::cli::commands::{build_orchestrator, load_config};

/// Executes the refresh command.
///
/// # Arguments
/// * `config` - Path to the run configuration file
/// * `html` - Optional path for an HTML report
/// * `explicit_lang` - Whether `--lang` was given
pub async fn execute(config: PathBuf, html: Option<PathBuf>, explicit_lang: bool) -> Result<()> {
    let run_config = load_config(&config, explicit_lang)?;
    let orchestrator = build_orchestrator(run_config, html)?;
    orchestrator.refresh_last_run().await?;
    Ok(())
}
