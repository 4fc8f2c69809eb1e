//! # Run Ledger Persistence / 运行账本持久化
//!
//! The ledger file is the single source of truth for a run. It is written
//! after creation and after every mutation, and it is the only thing a
//! restarted process consults.
//!
//! 账本文件是一次运行的唯一事实来源。它在创建后以及每次变更后写入，
//! 并且是重启后的进程唯一会查阅的内容。
//!
//! Layout: `<results_dir>/<run_path>/matrix_ids.json`

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::RunError;
use crate::core::models::{JobRecord, RunLedger, RunPath};
use crate::infra::fs::{ensure_parent, subdirectory_names};

/// Fixed name of the ledger file inside a run directory.
pub const LEDGER_FILE: &str = "matrix_ids.json";

/// Reads and writes ledgers under one local results root.
/// 在一个本地结果根目录下读写账本。
#[derive(Debug, Clone)]
pub struct LedgerStore {
    results_dir: PathBuf,
}

impl LedgerStore {
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
        }
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    /// Location of the ledger file for `run_path`.
    pub fn ledger_path(&self, run_path: &RunPath) -> PathBuf {
        self.results_dir.join(run_path.as_str()).join(LEDGER_FILE)
    }

    /// Writes the job map as pretty, key-sorted JSON. Parent directories are created.
    /// 将作业映射写为格式化、键有序的 JSON。会创建父目录。
    pub fn persist(&self, ledger: &RunLedger) -> Result<PathBuf> {
        let path = self.ledger_path(&ledger.run_path);
        ensure_parent(&path)?;
        let json = serde_json::to_string_pretty(&ledger.jobs)
            .context("Failed to serialize run ledger")?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write ledger: {}", path.display()))?;
        tracing::debug!(path = %path.display(), jobs = ledger.len(), "ledger persisted");
        Ok(path)
    }

    /// Exact inverse of [`LedgerStore::persist`].
    /// [`LedgerStore::persist`] 的精确逆操作。
    pub fn load(&self, run_path: &RunPath) -> Result<RunLedger> {
        let path = self.ledger_path(run_path);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read ledger: {}", path.display()))?;
        let jobs: BTreeMap<String, JobRecord> = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse ledger: {}", path.display()))?;
        Ok(RunLedger {
            run_path: run_path.clone(),
            jobs,
        })
    }

    /// The most recently created run, by the timestamp embedded in each directory name.
    /// Directories whose names carry no timestamp are ignored.
    ///
    /// 按每个目录名中嵌入的时间戳选出最近创建的运行。
    /// 名称中不含时间戳的目录会被忽略。
    pub fn latest_run(&self) -> Result<RunPath> {
        let latest = subdirectory_names(&self.results_dir)?
            .into_iter()
            .map(RunPath::from)
            .filter_map(|run| match run.created_at() {
                Ok(created) => Some((created, run)),
                Err(e) => {
                    tracing::debug!(error = %e, "skipping directory");
                    None
                }
            })
            .max();

        latest
            .map(|(_, run)| run)
            .ok_or_else(|| RunError::NoRuns(self.results_dir.display().to_string()).into())
    }

    /// Loads the ledger of [`LedgerStore::latest_run`].
    pub fn load_latest(&self) -> Result<RunLedger> {
        let run_path = self.latest_run()?;
        self.load(&run_path)
    }
}
