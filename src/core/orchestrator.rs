//! # Run Orchestrator / 运行编排器
//!
//! Top-level sequencing of a run. The orchestrator owns the ledger for the
//! duration of each phase; concurrent fetches only ever see read-only ids and
//! every mutation is applied here, after the phase's join.
//!
//! 一次运行的顶层编排。编排器在每个阶段期间拥有账本；
//! 并发获取只会看到只读的 id，所有变更都在阶段汇合之后于此处应用。

use anyhow::Result;
use colored::*;
use std::sync::Arc;
use std::time::Duration;

use crate::core::artifacts::{FetchSummary, fetch_artifacts};
use crate::core::config::RunConfig;
use crate::core::dispatch::{dispatch_shards, upload_inputs};
use crate::core::ledger::LedgerStore;
use crate::core::models::{RunLedger, RunPath};
use crate::core::planner::RunPlan;
use crate::core::poll::{POLL_INTERVAL, Stopwatch, poll_ledger, refresh_ledger};
use crate::infra::client::{ExecutionService, ObjectStorage};
use crate::infra::t;
use crate::reporting::console::Reporter;

/// Drives new runs and refreshes of the latest run.
/// 驱动新运行以及对最近一次运行的刷新。
pub struct Orchestrator {
    config: RunConfig,
    service: Arc<dyn ExecutionService>,
    storage: Arc<dyn ObjectStorage>,
    store: LedgerStore,
    reporters: Vec<Box<dyn Reporter>>,
    poll_interval: Duration,
}

impl Orchestrator {
    pub fn new(
        config: RunConfig,
        service: Arc<dyn ExecutionService>,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        let store = LedgerStore::new(config.results_dir.clone());
        Self {
            config,
            service,
            storage,
            store,
            reporters: Vec::new(),
            poll_interval: POLL_INTERVAL,
        }
    }

    /// Adds a report rendered after polling or refreshing.
    pub fn with_reporter(mut self, reporter: Box<dyn Reporter>) -> Self {
        self.reporters.push(reporter);
        self
    }

    /// Overrides the delay between two fetches of a polled job.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Starts a new run: upload, dispatch, persist, and optionally block until done.
    ///
    /// # Arguments
    /// * `plan` - Shard count, wait flag and test targets for this run
    ///
    /// # Returns
    /// The ledger as it stands at the end of the run
    pub async fn new_run(&self, plan: &RunPlan) -> Result<RunLedger> {
        self.config.validate()?;

        let stopwatch = Stopwatch::start();
        let run_path = RunPath::generate();
        println!("{}", t!("run.starting", run = &run_path).bold());

        println!("  {}", t!("run.uploading"));
        let inputs = upload_inputs(self.storage.as_ref(), &self.config, &run_path).await?;

        let mut ledger =
            dispatch_shards(self.service.as_ref(), &self.config, plan, &run_path, &inputs).await?;
        self.store.persist(&ledger)?;

        println!(
            "  {}",
            t!("run.jobs_created", count = ledger.len(), elapsed = stopwatch.check()).green()
        );
        println!(
            "  {}",
            self.config.storage_browser_url(run_path.as_str()).underline()
        );
        println!();

        if plan.wait_for_results {
            poll_ledger(
                self.service.as_ref(),
                &self.store,
                &mut ledger,
                self.poll_interval,
            )
            .await?;
            self.store.persist(&ledger)?;
            self.run_reports(&ledger)?;
            self.fetch(&mut ledger).await?;
        }

        Ok(ledger)
    }

    /// Reloads the most recent run, refreshes it once, reports and fetches artifacts.
    /// 重新加载最近一次运行，刷新一次，然后生成报告并获取产物。
    pub async fn refresh_last_run(&self) -> Result<RunLedger> {
        let mut ledger = self.store.load_latest()?;
        println!("{}", t!("run.loading", run = &ledger.run_path).bold());

        if refresh_ledger(self.service.as_ref(), &mut ledger).await? {
            println!("  {}", t!("ledger.updating"));
            self.store.persist(&ledger)?;
        }

        self.run_reports(&ledger)?;
        self.fetch(&mut ledger).await?;
        Ok(ledger)
    }

    /// Renders every configured report in order.
    pub fn run_reports(&self, ledger: &RunLedger) -> Result<()> {
        for reporter in &self.reporters {
            reporter.render(ledger)?;
        }
        Ok(())
    }

    async fn fetch(&self, ledger: &mut RunLedger) -> Result<FetchSummary> {
        if self.config.mock {
            println!("{}", t!("artifacts.mock_skip").yellow());
            return Ok(FetchSummary::default());
        }
        fetch_artifacts(self.storage.as_ref(), &self.store, ledger).await
    }
}
