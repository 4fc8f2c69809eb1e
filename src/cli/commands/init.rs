//! # Init Command Module / 初始化命令模块
//!
//! This module implements the `init` command, which creates a new run
//! configuration file, either from an interactive wizard or from defaults.
//!
//! 此模块实现了 `init` 命令，通过交互式向导或默认值创建新的运行配置文件。

use anyhow::{Context, Result};
use colored::*;
use dialoguer::{Confirm, Input, theme::ColorfulTheme};
use std::{fs, path::Path};

use crate::infra::fs::ensure_parent;
use crate::infra::t;

/// Answers collected by the wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitAnswers {
    pub project: String,
    pub app_apk: String,
    pub test_apk: String,
    pub results_bucket: String,
    pub shard_count: usize,
    pub wait_for_results: bool,
}

impl Default for InitAnswers {
    fn default() -> Self {
        Self {
            project: "my-project".to_string(),
            app_apk: "app/build/outputs/apk/debug/app-debug.apk".to_string(),
            test_apk: "app/build/outputs/apk/androidTest/debug/app-debug-androidTest.apk"
                .to_string(),
            results_bucket: "my-test-results".to_string(),
            shard_count: 1,
            wait_for_results: true,
        }
    }
}

/// Renders the commented configuration file for `answers`.
/// 根据 `answers` 渲染带注释的配置文件。
pub fn render_config(answers: &InitAnswers) -> String {
    format!(
        r#"# Shard Runner configuration / Shard Runner 配置

# Language for console messages / 控制台消息的语言
language = "en"

# Remote project the jobs run in / 作业所在的远程项目
project = "{project}"

# Input packages, relative to this file / 输入包，相对于此文件
app_apk = "{app_apk}"
test_apk = "{test_apk}"

# Bucket for inputs and results / 用于输入和结果的存储桶
results_bucket = "{bucket}"

# Local directory holding one folder per run / 本地目录，每次运行一个文件夹
results_dir = "results"

# Number of shards (override with --shards) / 分片数量（可用 --shards 覆盖）
shard_count = {shards}

# Block until every job finishes (override with --wait / --no-wait)
# 阻塞等待所有作业完成（可用 --wait / --no-wait 覆盖）
wait_for_results = {wait}

# Only run these test methods; empty runs the whole suite
# 仅运行这些测试方法；为空则运行整个测试套件
test_methods = []

[device]
model = "NexusLowRes"
version = "26"
locale = "en"
orientation = "portrait"
"#,
        project = answers.project,
        app_apk = answers.app_apk,
        test_apk = answers.test_apk,
        bucket = answers.results_bucket,
        shards = answers.shard_count,
        wait = answers.wait_for_results,
    )
}

fn ask(theme: &ColorfulTheme) -> Result<InitAnswers> {
    let defaults = InitAnswers::default();
    Ok(InitAnswers {
        project: Input::with_theme(theme)
            .with_prompt(t!("init.prompt_project").to_string())
            .default(defaults.project)
            .interact_text()?,
        app_apk: Input::with_theme(theme)
            .with_prompt(t!("init.prompt_app_apk").to_string())
            .default(defaults.app_apk)
            .interact_text()?,
        test_apk: Input::with_theme(theme)
            .with_prompt(t!("init.prompt_test_apk").to_string())
            .default(defaults.test_apk)
            .interact_text()?,
        results_bucket: Input::with_theme(theme)
            .with_prompt(t!("init.prompt_bucket").to_string())
            .default(defaults.results_bucket)
            .interact_text()?,
        shard_count: Input::with_theme(theme)
            .with_prompt(t!("init.prompt_shards").to_string())
            .default(defaults.shard_count)
            .validate_with(|n: &usize| {
                if *n > 0 {
                    Ok(())
                } else {
                    Err(t!("init.shards_positive").to_string())
                }
            })
            .interact_text()?,
        wait_for_results: Confirm::with_theme(theme)
            .with_prompt(t!("init.prompt_wait").to_string())
            .default(defaults.wait_for_results)
            .interact()?,
    })
}

fn confirm_overwrite(output: &Path, theme: &ColorfulTheme) -> Result<bool> {
    Confirm::with_theme(theme)
        .with_prompt(t!("init.overwrite_prompt", path = output.display()).to_string())
        .default(false)
        .interact()
        .context(t!("init.confirmation_failed").to_string())
}

/// Executes the init command with the provided arguments.
///
/// # Arguments
/// * `output` - Path for the new configuration file
/// * `force` - Whether to overwrite an existing file
/// * `non_interactive` - Write defaults without prompting
pub fn execute(output: impl AsRef<Path>, force: bool, non_interactive: bool) -> Result<()> {
    let output = output.as_ref();
    let theme = ColorfulTheme::default();

    if output.exists() && !force {
        let overwrite = !non_interactive && confirm_overwrite(output, &theme)?;
        if !overwrite {
            println!("{}", t!("init.file_exists", path = output.display()).red());
            println!("{}", t!("init.use_force").yellow());
            return Ok(());
        }
    }

    let answers = if non_interactive {
        InitAnswers::default()
    } else {
        ask(&theme)?
    };

    ensure_parent(output)?;
    fs::write(output, render_config(&answers))
        .with_context(|| t!("init.write_failed", path = output.display()).to_string())?;

    println!("{}", t!("init.success", path = output.display()).green());
    println!("{}", t!("init.next_steps"));
    Ok(())
}
