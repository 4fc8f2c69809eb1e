//! # Poll State Machine / 轮询状态机
//!
//! Two ways to bring the ledger up to date with the execution service:
//!
//! - blocking poll: walks every unfinished job and re-fetches it at a fixed
//!   interval until it reaches a terminal state. There is no timeout.
//! - non-blocking refresh: one concurrent fetch per unfinished job, applied
//!   after all of them have returned.
//!
//! 将账本与执行服务同步的两种方式：
//!
//! - 阻塞轮询：逐个处理未完成的作业，以固定间隔重新获取，直到进入终止状态。没有超时。
//! - 非阻塞刷新：为每个未完成作业并发获取一次，全部返回后再统一应用。

use anyhow::Result;
use colored::*;
use futures::future::join_all;
use std::time::{Duration, Instant};

use crate::core::ledger::LedgerStore;
use crate::core::models::{JobState, JobStatus, Outcome, RunLedger};
use crate::infra::client::ExecutionService;
use crate::infra::t;

/// Delay between two fetches of the same job during a blocking poll.
/// 阻塞轮询期间同一作业两次获取之间的间隔。
pub const POLL_INTERVAL: Duration = Duration::from_secs(6);

/// Elapsed-time helper for console lines.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started: Instant,
}

impl Stopwatch {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    /// Elapsed time as `MMm SSs`.
    pub fn check(&self) -> String {
        let secs = self.started.elapsed().as_secs();
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}

/// Something worth showing to the user after one fetch.
/// 一次获取之后值得展示给用户的信息。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    Progress(String),
    Error(String),
    State(JobState),
}

/// Remembers what has already been shown for one job so nothing is printed twice.
/// 记住某个作业已经展示过的内容，确保不会重复打印。
#[derive(Debug, Default)]
pub struct ProgressTracker {
    seen_messages: usize,
    last_state: Option<JobState>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of progress messages already reported.
    pub fn seen_messages(&self) -> usize {
        self.seen_messages
    }

    /// Turns a fresh snapshot into the events not yet reported.
    /// The error message, if any, is reported on every snapshot that carries it.
    ///
    /// 将新的快照转换为尚未报告的事件。
    /// 错误消息（如果有）会在每个携带它的快照上报告。
    pub fn observe(&mut self, status: &JobStatus) -> Vec<PollEvent> {
        let mut events = Vec::new();

        if let Some(details) = status.details() {
            let messages = &details.progress_messages;
            if messages.len() > self.seen_messages {
                events.extend(
                    messages[self.seen_messages..]
                        .iter()
                        .cloned()
                        .map(PollEvent::Progress),
                );
                self.seen_messages = messages.len();
            }
            if let Some(error) = &details.error_message {
                events.push(PollEvent::Error(error.clone()));
            }
        }

        if self.last_state != Some(status.state) {
            self.last_state = Some(status.state);
            events.push(PollEvent::State(status.state));
        }

        events
    }
}

fn print_event(stopwatch: &Stopwatch, job_id: &str, event: &PollEvent) {
    let line = match event {
        PollEvent::Progress(message) => message.normal(),
        PollEvent::Error(message) => t!("poll.error", message = message).red(),
        PollEvent::State(state) if state.completed() => state.to_string().bold(),
        PollEvent::State(state) => state.to_string().cyan(),
    };
    println!("  {} {} {}", stopwatch.check().dimmed(), job_id, line);
}

/// Blocks until `job_id` reaches a terminal state and returns its final status.
///
/// # Arguments
/// * `service` - The execution service
/// * `job_id` - Job to follow
/// * `interval` - Delay between fetches, normally [`POLL_INTERVAL`]
/// * `stopwatch` - Clock the console timestamps are relative to
pub async fn poll_job(
    service: &dyn ExecutionService,
    job_id: &str,
    interval: Duration,
    stopwatch: &Stopwatch,
) -> Result<JobStatus> {
    let mut tracker = ProgressTracker::new();
    loop {
        let status = service.refresh(job_id).await?;
        for event in tracker.observe(&status) {
            print_event(stopwatch, job_id, &event);
        }
        if status.state.completed() {
            return Ok(status);
        }
        tokio::time::sleep(interval).await;
    }
}

/// Polls every unfinished job of `ledger`, one after another, until all are terminal.
/// The ledger is persisted after each job's update.
///
/// 逐个轮询 `ledger` 中所有未完成的作业，直到全部终止。
/// 每个作业更新后都会持久化账本。
pub async fn poll_ledger(
    service: &dyn ExecutionService,
    store: &LedgerStore,
    ledger: &mut RunLedger,
    interval: Duration,
) -> Result<()> {
    let pending = ledger.in_progress_ids();
    println!("{}", t!("poll.banner", count = pending.len()).bold());

    let stopwatch = Stopwatch::start();
    for job_id in &pending {
        let status = poll_job(service, job_id, interval, &stopwatch).await?;
        if let Some(record) = ledger.jobs.get_mut(job_id) {
            if record.update(&status) {
                store.persist(ledger)?;
            }
        }
    }

    for job_id in &pending {
        if let Some(record) = ledger.jobs.get(job_id) {
            if record.outcome == Outcome::Failure {
                println!("{}", t!("poll.failed_job", link = &record.web_link).red());
            }
        }
    }
    println!();
    Ok(())
}

/// Fetches every unfinished job exactly once, concurrently, and applies the
/// results after all fetches have returned. Returns `true` if any record changed.
///
/// 并发地对每个未完成作业恰好获取一次，在所有获取返回后应用结果。
/// 如有任何记录发生变化，返回 `true`。
pub async fn refresh_ledger(service: &dyn ExecutionService, ledger: &mut RunLedger) -> Result<bool> {
    let pending = ledger.in_progress_ids();
    if pending.is_empty() {
        println!("{}", t!("refresh.nothing_pending").green());
        return Ok(false);
    }
    println!("{}", t!("refresh.banner", count = pending.len()).bold());

    let results = join_all(pending.iter().map(|job_id| service.refresh(job_id))).await;
    let statuses = results.into_iter().collect::<Result<Vec<_>>>()?;

    let mut dirty = false;
    for (job_id, status) in pending.iter().zip(&statuses) {
        println!("  {} {}", status.state.to_string().cyan(), job_id);
        if let Some(record) = ledger.jobs.get_mut(job_id) {
            dirty |= record.update(status);
        }
    }
    Ok(dirty)
}
