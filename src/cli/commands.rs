//! # CLI Commands / 命令行命令

pub mod init;
pub mod refresh;
pub mod run;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::config::{RunConfig, load_run_config};
use crate::core::orchestrator::Orchestrator;
use crate::infra::http::{HttpExecutionService, HttpStorage};
use crate::infra::t;
use crate::reporting::{CostSummary, HtmlReport, ResultSummary};

/// Loads the config file and switches to its language unless `--lang` was given.
pub(crate) fn load_config(path: &Path, explicit_lang: bool) -> Result<RunConfig> {
    let config = load_run_config(path)
        .with_context(|| t!("cli.config_load_failed", path = path.display()).to_string())?;
    if !explicit_lang {
        rust_i18n::set_locale(&config.language);
    }
    Ok(config)
}

/// Wires the HTTP collaborators and the standard reports into an orchestrator.
pub(crate) fn build_orchestrator(config: RunConfig, html: Option<PathBuf>) -> Result<Orchestrator> {
    config.validate()?;
    let service = Arc::new(HttpExecutionService::new(&config)?);
    let storage = Arc::new(HttpStorage::new(&config.endpoints, config.mock)?);

    let mut orchestrator = Orchestrator::new(config, service, storage)
        .with_reporter(Box::new(CostSummary))
        .with_reporter(Box::new(ResultSummary));
    if let Some(path) = html {
        orchestrator = orchestrator.with_reporter(Box::new(HtmlReport::new(path)));
    }
    Ok(orchestrator)
}
