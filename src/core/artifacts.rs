//! # Artifact Filter / 产物过滤器
//!
//! Downloads the test-result documents and screenshots of failed jobs.
//! Only terminal, failed, not-yet-downloaded jobs are listed at all, and a
//! file already present locally is never fetched again.
//!
//! 下载失败作业的测试结果文档和截图。
//! 只会列出已终止、失败且尚未下载的作业，本地已存在的文件永远不会被再次获取。

use anyhow::Result;
use colored::*;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Component, Path, PathBuf};

use crate::core::ledger::LedgerStore;
use crate::core::models::{JobRecord, Outcome, RunLedger};
use crate::infra::client::{ObjectRef, ObjectStorage};
use crate::infra::fs::ensure_parent;
use crate::infra::t;

static TEST_RESULT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|/)test_result_\d+\.xml$").expect("valid test result pattern"));

static SCREENSHOT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|/)artifacts/.+\.png$").expect("valid screenshot pattern"));

/// `true` for structured test-result documents and screenshot images.
/// 对结构化测试结果文档和截图图片返回 `true`。
pub fn is_artifact(object_name: &str) -> bool {
    TEST_RESULT_RE.is_match(object_name) || SCREENSHOT_RE.is_match(object_name)
}

/// A job is scanned only if it is terminal, failed and not downloaded yet.
/// 仅当作业已终止、失败且尚未下载时才会被扫描。
pub fn needs_download(record: &JobRecord) -> bool {
    record.state.completed() && !record.downloaded && record.outcome == Outcome::Failure
}

/// Counters of one fetch pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub jobs_scanned: usize,
    pub downloaded: usize,
    pub skipped: usize,
    /// Objects whose names would land outside the results directory.
    pub rejected: usize,
}

/// Local destination of `object` under `results_dir`, or `None` if the object
/// name would resolve outside it (absolute, `..`, or an empty name).
/// `object` 在 `results_dir` 下的本地目标路径；如果对象名会解析到其外部则返回 `None`。
pub fn local_path(results_dir: &Path, object: &ObjectRef) -> Option<PathBuf> {
    let name = Path::new(&object.name);
    let mut components = name.components().peekable();
    components.peek()?;
    if components.all(|c| matches!(c, Component::Normal(_))) {
        Some(results_dir.join(name))
    } else {
        None
    }
}

/// Object prefix listed for one job, ending in `/` so sibling jobs never match.
fn job_prefix(record: &JobRecord) -> String {
    let prefix = record.path_without_root_bucket().trim_end_matches('/');
    if prefix.is_empty() {
        String::new()
    } else {
        format!("{prefix}/")
    }
}

/// Downloads the artifacts of every qualifying job, flags those jobs as
/// downloaded, and persists the ledger once if any job was updated.
///
/// # Arguments
/// * `storage` - The object store
/// * `store` - Ledger store; its results directory is the download root
/// * `ledger` - The run ledger, updated in place
///
/// # Returns
/// Counts of scanned jobs, downloaded files, already-present files and refused names
pub async fn fetch_artifacts(
    storage: &dyn ObjectStorage,
    store: &LedgerStore,
    ledger: &mut RunLedger,
) -> Result<FetchSummary> {
    println!("{}", t!("artifacts.banner").bold());
    let mut summary = FetchSummary::default();

    let qualifying: Vec<String> = ledger
        .jobs
        .values()
        .filter(|record| needs_download(record))
        .map(|record| record.job_id.clone())
        .collect();

    for job_id in &qualifying {
        let Some(record) = ledger.jobs.get_mut(job_id) else {
            continue;
        };
        summary.jobs_scanned += 1;

        let objects = storage
            .list(record.root_bucket(), &job_prefix(record))
            .await?;
        for object in objects.iter().filter(|o| is_artifact(&o.name)) {
            let Some(destination) = local_path(store.results_dir(), object) else {
                println!("  {}", t!("artifacts.unsafe_name", path = &object.name).yellow());
                tracing::warn!(object = %object, "refusing to write outside the results directory");
                summary.rejected += 1;
                continue;
            };
            if destination.exists() {
                println!("  {}", t!("artifacts.already_downloaded", path = &object.name).dimmed());
                summary.skipped += 1;
                continue;
            }
            println!("  {}", t!("artifacts.downloading", path = &object.name));
            ensure_parent(&destination)?;
            storage.download(object, &destination).await?;
            summary.downloaded += 1;
        }

        record.downloaded = true;
    }

    if summary.jobs_scanned > 0 {
        println!("  {}", t!("ledger.updating"));
        store.persist(ledger)?;
    }
    tracing::info!(?summary, "artifact fetch finished");
    Ok(summary)
}
