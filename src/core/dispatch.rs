//! # Shard Dispatcher / 分片分发器
//!
//! Uploads the two input packages side by side, then fans out one job
//! submission per shard and joins on all of them before building the ledger.
//! A failed task never aborts its siblings: every peer finishes first, then
//! the first error is reported.
//!
//! 并行上传两个输入包，然后为每个分片发起一次作业提交，
//! 在构建账本之前等待所有提交完成。失败的任务不会中止其兄弟任务：
//! 所有任务先完成，然后报告第一个错误。

use anyhow::{Context, Result};
use futures::future::join_all;
use std::path::Path;

use crate::core::config::RunConfig;
use crate::core::error::RunError;
use crate::core::models::{JobRecord, RunLedger, RunPath};
use crate::core::planner::RunPlan;
use crate::infra::client::{ExecutionService, JobRequest, ObjectRef, ObjectStorage, ShardIndex};
use crate::infra::fs::file_name;

/// Remote locations of the uploaded inputs.
/// 已上传输入的远程位置。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedInputs {
    pub app: ObjectRef,
    pub test: ObjectRef,
}

async fn upload_one(
    storage: &dyn ObjectStorage,
    local: &Path,
    bucket: &str,
    run_path: &RunPath,
) -> Result<ObjectRef> {
    let name = format!("{}/{}", run_path, file_name(local)?);
    storage
        .upload(local, bucket, &name)
        .await
        .with_context(|| format!("Failed to upload {}", local.display()))
}

/// Uploads the app and test packages concurrently. Both must finish before
/// any shard is submitted.
///
/// 并发上传应用包和测试包。两者都必须在提交任何分片之前完成。
pub async fn upload_inputs(
    storage: &dyn ObjectStorage,
    config: &RunConfig,
    run_path: &RunPath,
) -> Result<UploadedInputs> {
    let bucket = config.results_bucket.as_str();
    let (app, test) = tokio::join!(
        upload_one(storage, &config.app_apk, bucket, run_path),
        upload_one(storage, &config.test_apk, bucket, run_path),
    );
    Ok(UploadedInputs {
        app: app?,
        test: test?,
    })
}

/// Builds the request every shard sends; only the shard index differs.
/// 构建每个分片发送的请求；只有分片索引不同。
pub fn shard_request(
    config: &RunConfig,
    plan: &RunPlan,
    run_path: &RunPath,
    inputs: &UploadedInputs,
    index: usize,
) -> JobRequest {
    JobRequest {
        project: config.project.clone(),
        app: inputs.app.clone(),
        test: inputs.test.clone(),
        result_prefix: format!("{}/{}", config.results_bucket, run_path),
        device: config.device.clone(),
        test_targets: plan.test_targets.clone(),
        use_orchestrator: config.use_orchestrator,
        shard: ShardIndex {
            index,
            count: plan.shard_count,
        },
    }
}

/// Submits `plan.shard_count` jobs concurrently and assembles the new ledger.
///
/// # Arguments
/// * `service` - The execution service
/// * `config` - Run configuration
/// * `plan` - Resolved plan (shard count and test targets)
/// * `run_path` - Identity of this run
/// * `inputs` - Already-uploaded input packages
///
/// # Returns
/// A ledger with exactly one record per shard. Any failed submission fails the
/// whole dispatch once every shard has returned.
pub async fn dispatch_shards(
    service: &dyn ExecutionService,
    config: &RunConfig,
    plan: &RunPlan,
    run_path: &RunPath,
    inputs: &UploadedInputs,
) -> Result<RunLedger> {
    let requests: Vec<JobRequest> = (0..plan.shard_count)
        .map(|index| shard_request(config, plan, run_path, inputs, index))
        .collect();

    let results = join_all(requests.iter().map(|request| service.submit(request))).await;

    let mut ledger = RunLedger::new(run_path.clone());
    for (index, result) in results.into_iter().enumerate() {
        let status = result.map_err(|source| RunError::Submission { index, source })?;
        let record = JobRecord::from_status(&status);
        if ledger.jobs.insert(record.job_id.clone(), record).is_some() {
            return Err(RunError::DuplicateJob(status.job_id).into());
        }
    }
    tracing::info!(run = %run_path, jobs = ledger.len(), "shards dispatched");
    Ok(ledger)
}
