//! # Data Models Module / 数据模型模块
//!
//! This module defines the data structures shared by every phase of a run:
//! the remote job lifecycle, the snapshot the execution service returns, and
//! the locally persisted job records that make up a run ledger.
//!
//! 此模块定义了运行各阶段共享的数据结构：
//! 远程作业生命周期、执行服务返回的快照，以及组成运行账本的本地持久化作业记录。

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::core::error::RunError;

/// Lifecycle state of a remote job (and of each of its test executions).
/// 远程作业（及其每个测试执行）的生命周期状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Validating,
    Pending,
    Running,
    Finished,
    Error,
    Invalid,
    Cancelled,
    UnsupportedEnvironment,
    IncompatibleEnvironment,
    IncompatibleArchitecture,
    /// Any state this client does not know about. Treated as still running.
    /// 此客户端不认识的任何状态。视为仍在运行。
    #[serde(other)]
    Unspecified,
}

impl JobState {
    /// Every state value, for exhaustive checks.
    pub const ALL: [JobState; 11] = [
        JobState::Validating,
        JobState::Pending,
        JobState::Running,
        JobState::Finished,
        JobState::Error,
        JobState::Invalid,
        JobState::Cancelled,
        JobState::UnsupportedEnvironment,
        JobState::IncompatibleEnvironment,
        JobState::IncompatibleArchitecture,
        JobState::Unspecified,
    ];

    /// `true` once no further transition can happen.
    /// 一旦不会再发生任何状态转换，返回 `true`。
    pub fn completed(self) -> bool {
        matches!(
            self,
            JobState::Finished
                | JobState::Error
                | JobState::Invalid
                | JobState::Cancelled
                | JobState::UnsupportedEnvironment
                | JobState::IncompatibleEnvironment
                | JobState::IncompatibleArchitecture
        )
    }

    /// Exact complement of [`JobState::completed`].
    /// [`JobState::completed`] 的精确补集。
    pub fn in_progress(self) -> bool {
        !self.completed()
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobState::Validating => "VALIDATING",
            JobState::Pending => "PENDING",
            JobState::Running => "RUNNING",
            JobState::Finished => "FINISHED",
            JobState::Error => "ERROR",
            JobState::Invalid => "INVALID",
            JobState::Cancelled => "CANCELLED",
            JobState::UnsupportedEnvironment => "UNSUPPORTED_ENVIRONMENT",
            JobState::IncompatibleEnvironment => "INCOMPATIBLE_ENVIRONMENT",
            JobState::IncompatibleArchitecture => "INCOMPATIBLE_ARCHITECTURE",
            JobState::Unspecified => "UNSPECIFIED",
        };
        f.write_str(name)
    }
}

/// Success/failure classification of a job.
/// 作业的成功/失败分类。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
    #[default]
    Unknown,
}

/// Result reported for a single test execution.
/// 单个测试执行报告的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionOutcome {
    Success,
    Failure,
    Inconclusive,
    Skipped,
}

/// Detailed progress stream of a test execution.
/// 测试执行的详细进度流。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestDetails {
    /// All progress messages so far. The service resends the full list each time.
    /// 到目前为止的所有进度消息。服务每次都会重新发送完整列表。
    #[serde(default)]
    pub progress_messages: Vec<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// One device execution inside a job.
/// 作业内的一次设备执行。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestExecution {
    pub id: String,
    pub state: JobState,
    #[serde(default)]
    pub details: Option<TestDetails>,
    #[serde(default)]
    pub outcome: Option<ExecutionOutcome>,
    /// Wall-clock seconds billed for this execution, once known.
    #[serde(default)]
    pub duration_secs: Option<u64>,
    /// Ran on a physical device rather than a virtual one.
    #[serde(default)]
    pub physical_device: bool,
}

impl TestExecution {
    /// A failing or error condition on this execution.
    /// 此执行处于失败或错误状态。
    pub fn failed(&self) -> bool {
        self.state == JobState::Error || self.outcome == Some(ExecutionOutcome::Failure)
    }
}

/// Snapshot of a job as returned by the execution service on submit or refresh.
/// 执行服务在提交或刷新时返回的作业快照。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub job_id: String,
    pub state: JobState,
    #[serde(default)]
    pub executions: Vec<TestExecution>,
    /// `bucket/prefix` under which the job writes its results.
    pub result_storage: String,
    #[serde(default)]
    pub web_link: String,
}

impl JobStatus {
    /// Progress stream of the first execution, which is the one polled in detail.
    /// 第一个执行的进度流，即详细轮询的那个。
    pub fn details(&self) -> Option<&TestDetails> {
        self.executions.first().and_then(|e| e.details.as_ref())
    }

    /// Outcome of a terminal job; `Unknown` while it is still running.
    /// 终止作业的结果；仍在运行时为 `Unknown`。
    pub fn outcome(&self) -> Outcome {
        if self.state.in_progress() {
            Outcome::Unknown
        } else if self.executions.iter().any(TestExecution::failed) {
            Outcome::Failure
        } else {
            Outcome::Success
        }
    }

    /// Billable minutes as `(physical, virtual)`. Each execution rounds up.
    /// 可计费分钟数 `(物理, 虚拟)`。每个执行向上取整。
    pub fn billable_minutes(&self) -> (u64, u64) {
        self.executions
            .iter()
            .fold((0, 0), |(physical, virtual_), execution| {
                let minutes = execution.duration_secs.unwrap_or(0).div_ceil(60);
                if execution.physical_device {
                    (physical + minutes, virtual_)
                } else {
                    (physical, virtual_ + minutes)
                }
            })
    }
}

/// Locally tracked state of one submitted shard job.
/// 一个已提交分片作业的本地跟踪状态。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: String,
    pub state: JobState,
    pub outcome: Outcome,
    /// `bucket/prefix` scoped to this job.
    pub storage_path: String,
    pub web_link: String,
    /// Set once the failure artifacts are on disk. Never reset.
    pub downloaded: bool,
    #[serde(default)]
    pub billable_physical_minutes: u64,
    #[serde(default)]
    pub billable_virtual_minutes: u64,
}

impl JobRecord {
    pub fn from_status(status: &JobStatus) -> Self {
        let mut record = Self {
            job_id: status.job_id.clone(),
            state: status.state,
            outcome: Outcome::Unknown,
            storage_path: status.result_storage.clone(),
            web_link: status.web_link.clone(),
            downloaded: false,
            billable_physical_minutes: 0,
            billable_virtual_minutes: 0,
        };
        record.apply_terminal(status);
        record
    }

    /// Applies a fresh remote snapshot. Returns `true` if anything changed.
    /// The job id and the `downloaded` flag are never touched.
    ///
    /// 应用新的远程快照。如有任何变化则返回 `true`。
    /// 作业 id 和 `downloaded` 标志永远不会被修改。
    pub fn update(&mut self, status: &JobStatus) -> bool {
        let before = self.clone();
        self.state = status.state;
        if !status.web_link.is_empty() {
            self.web_link = status.web_link.clone();
        }
        if !status.result_storage.is_empty() {
            self.storage_path = status.result_storage.clone();
        }
        self.apply_terminal(status);
        *self != before
    }

    fn apply_terminal(&mut self, status: &JobStatus) {
        if status.state.completed() {
            self.outcome = status.outcome();
            let (physical, virtual_) = status.billable_minutes();
            self.billable_physical_minutes = physical;
            self.billable_virtual_minutes = virtual_;
        }
    }

    /// Bucket part of [`JobRecord::storage_path`].
    pub fn root_bucket(&self) -> &str {
        self.storage_path
            .split_once('/')
            .map_or(self.storage_path.as_str(), |(bucket, _)| bucket)
    }

    /// Object prefix part of [`JobRecord::storage_path`].
    pub fn path_without_root_bucket(&self) -> &str {
        self.storage_path
            .split_once('/')
            .map_or("", |(_, prefix)| prefix)
    }
}

/// Identity of one run: the remote storage prefix and the local ledger directory name.
/// Format: `YYYY-MM-DD_HH.MM.SS.ffffff_<pid>`.
///
/// 一次运行的标识：远程存储前缀和本地账本目录名。
/// 格式：`YYYY-MM-DD_HH.MM.SS.ffffff_<pid>`。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunPath(String);

impl RunPath {
    /// Generates a fresh run path from the local clock.
    /// 根据本地时钟生成新的运行路径。
    pub fn generate() -> Self {
        let stamp = Local::now().format("%Y-%m-%d_%H.%M.%S%.6f");
        Self(format!("{stamp}_{:x}", std::process::id()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Creation time embedded in the name: the date before the first `_`,
    /// then the first three `.`-separated fields after it.
    ///
    /// 名称中嵌入的创建时间：第一个 `_` 之前的日期，
    /// 以及其后以 `.` 分隔的前三个字段。
    pub fn created_at(&self) -> Result<NaiveDateTime, RunError> {
        let unparsable = || RunError::UnparsableRunPath(self.0.clone());
        let (date, rest) = self.0.split_once('_').ok_or_else(unparsable)?;
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| unparsable())?;

        let fields: Vec<&str> = rest.splitn(4, '.').take(3).collect();
        if fields.len() != 3 {
            return Err(unparsable());
        }
        let time = NaiveTime::parse_from_str(&fields.join(":"), "%H:%M:%S")
            .map_err(|_| unparsable())?;

        Ok(NaiveDateTime::new(date, time))
    }
}

impl From<&str> for RunPath {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RunPath {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for RunPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// All jobs of one run, keyed by job id.
/// 一次运行的所有作业，以作业 id 为键。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLedger {
    pub run_path: RunPath,
    pub jobs: BTreeMap<String, JobRecord>,
}

impl RunLedger {
    pub fn new(run_path: RunPath) -> Self {
        Self {
            run_path,
            jobs: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Ids of every job that is not yet terminal.
    /// 所有尚未终止的作业 id。
    pub fn in_progress_ids(&self) -> Vec<String> {
        self.jobs
            .values()
            .filter(|record| record.state.in_progress())
            .map(|record| record.job_id.clone())
            .collect()
    }

    /// Counts of (success, failure, unknown) outcomes.
    /// (成功, 失败, 未知) 结果的计数。
    pub fn outcome_counts(&self) -> (usize, usize, usize) {
        self.jobs
            .values()
            .fold((0, 0, 0), |(ok, failed, unknown), record| match record.outcome {
                Outcome::Success => (ok + 1, failed, unknown),
                Outcome::Failure => (ok, failed + 1, unknown),
                Outcome::Unknown => (ok, failed, unknown + 1),
            })
    }
}
