//! # Run Command Module / 运行命令模块
//!
//! This module implements the `run` command, which starts a new sharded run
//! according to the run configuration.
//!
//! 此模块实现了 `run` 命令，根据运行配置启动一次新的分片运行。

use anyhow::Result;
use colored::*;
use std::path::PathBuf;

use crate::cli::commands::{build_orchestrator, load_config};
use crate::core::planner::{self, Overrides, RunPlan};
use crate::infra::t;

fn print_plan(plan: &RunPlan) {
    println!("{}", t!("run.plan_banner").bold());
    println!("  {}", t!("run.plan_shards", count = plan.shard_count).cyan());
    let wait = if plan.wait_for_results {
        t!("run.plan_wait_blocking")
    } else {
        t!("run.plan_wait_detached")
    };
    println!("  {}", wait.cyan());
    match &plan.test_targets {
        Some(targets) => {
            println!("  {}", t!("run.plan_targets", count = targets.len()).cyan());
            for target in targets {
                println!("    - {}", target);
            }
        }
        None => println!("  {}", t!("run.plan_full_suite").cyan()),
    }
    println!();
}

/// Executes the run command with the provided arguments.
///
/// # Arguments
/// * `config` - Path to the run configuration file
/// * `overrides` - Shard count and wait overrides from the command line
/// * `html` - Optional path for an HTML report
/// * `explicit_lang` - Whether `--lang` was given, which wins over the config language
pub async fn execute(
    config: PathBuf,
    overrides: Overrides,
    html: Option<PathBuf>,
    explicit_lang: bool,
) -> Result<()> {
    let run_config = load_config(&config, explicit_lang)?;
    let plan = planner::plan_run(&run_config, overrides)?;
    print_plan(&plan);

    let orchestrator = build_orchestrator(run_config, html)?;
    let ledger = orchestrator.new_run(&plan).await?;

    if !plan.wait_for_results {
        println!("{}", t!("run.detached_hint", run = &ledger.run_path).yellow());
    }
    Ok(())
}
