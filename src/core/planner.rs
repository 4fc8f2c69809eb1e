//! # Run Planner Module / 运行计划模块
//!
//! Combines the configuration file with command-line overrides into the
//! concrete plan a run executes: how many shards, whether to block, and which
//! test selectors each shard carries.
//!
//! 将配置文件与命令行覆盖项合并为一次运行实际执行的计划：
//! 分片数量、是否阻塞等待，以及每个分片携带的测试选择器。

use crate::core::config::RunConfig;
use crate::core::error::ConfigError;

/// A resolved run plan.
/// 已解析的运行计划。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub shard_count: usize,
    pub wait_for_results: bool,
    /// Shared by every shard. `None` runs the full suite.
    /// 所有分片共享。`None` 表示运行整个测试套件。
    pub test_targets: Option<Vec<String>>,
}

/// Overrides taken from the command line.
/// 来自命令行的覆盖项。
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub shards: Option<usize>,
    pub wait: bool,
    pub no_wait: bool,
}

/// Renders method filters as class-level selectors.
/// 将方法过滤器渲染为类级别的选择器。
pub fn test_targets(methods: &[String]) -> Option<Vec<String>> {
    if methods.is_empty() {
        None
    } else {
        Some(methods.iter().map(|m| format!("class {m}")).collect())
    }
}

/// Creates the plan for a new run.
///
/// # Arguments
/// * `config` - The loaded run configuration
/// * `overrides` - Command-line overrides; a shard override replaces the config value
///
/// # Returns
/// The resolved plan, or a `ConfigError` if the combination is invalid
pub fn plan_run(config: &RunConfig, overrides: Overrides) -> Result<RunPlan, ConfigError> {
    if overrides.wait && overrides.no_wait {
        return Err(ConfigError::ConflictingWait);
    }

    let shard_count = overrides.shards.unwrap_or(config.shard_count);
    if shard_count == 0 {
        return Err(ConfigError::ZeroShards);
    }

    let wait_for_results = if overrides.wait {
        true
    } else if overrides.no_wait {
        false
    } else {
        config.wait_for_results
    };

    Ok(RunPlan {
        shard_count,
        wait_for_results,
        test_targets: test_targets(&config.test_methods),
    })
}
