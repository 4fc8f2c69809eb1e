//! # Run Orchestrator Integration Tests / 运行编排器集成测试
//!
//! Drives whole runs against in-process doubles of the execution service and
//! the object store: upload, fan-out, poll, report, fetch, and refresh of the
//! latest run from disk.
//!
//! 使用执行服务和对象存储的进程内替身驱动完整运行：上传、扇出、轮询、
//! 报告、获取产物，以及从磁盘刷新最近一次运行。

mod common;

use common::{BUCKET, FakeExecutionService, FakeStorage, call_log};
use shard_runner::config::{Endpoints, RunConfig};
use shard_runner::core::error::RunError;
use shard_runner::core::orchestrator::Orchestrator;
use shard_runner::core::planner::{Overrides, plan_run};
use shard_runner::models::{ExecutionOutcome, JobState, Outcome};
use shard_runner::reporting::{CostSummary, HtmlReport, ResultSummary};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

fn seed_results(storage: &FakeStorage, jobs: usize) {
    for n in 0..jobs {
        storage.put(BUCKET, &format!("run/job-{n}/test_result_0.xml"), b"<testsuite/>");
        storage.put(BUCKET, &format!("run/job-{n}/artifacts/shot.png"), b"png");
        storage.put(BUCKET, &format!("run/job-{n}/logcat"), b"log");
    }
}

fn orchestrator(
    config: RunConfig,
    service: &Arc<FakeExecutionService>,
    storage: &Arc<FakeStorage>,
) -> Orchestrator {
    Orchestrator::new(config, service.clone(), storage.clone())
        .with_poll_interval(Duration::ZERO)
        .with_reporter(Box::new(CostSummary))
        .with_reporter(Box::new(ResultSummary))
}

#[tokio::test]
async fn test_blocking_run_with_every_shard_failing() {
    let dir = common::scratch();
    let config = common::test_config(dir.path());
    let log = call_log();
    let service = Arc::new(FakeExecutionService::new(log.clone()).with_outcome(ExecutionOutcome::Failure));
    let storage = Arc::new(FakeStorage::new(log));
    seed_results(&storage, 3);

    let plan = plan_run(&config, Overrides::default()).unwrap();
    let runner = orchestrator(config, &service, &storage);
    let ledger = runner.new_run(&plan).await.unwrap();

    assert_eq!(ledger.len(), plan.shard_count);
    assert!(ledger.in_progress_ids().is_empty());
    for record in ledger.jobs.values() {
        assert_eq!(record.state, JobState::Finished);
        assert_eq!(record.outcome, Outcome::Failure);
        assert!(record.downloaded, "{} should be downloaded", record.job_id);
    }

    let mut prefixes = storage.listed_prefixes();
    prefixes.sort();
    assert_eq!(prefixes, vec!["run/job-0/", "run/job-1/", "run/job-2/"]);
    // Two artifacts per job; the log is filtered out.
    assert_eq!(storage.download_count(), 6);

    let persisted = runner.store().load(&ledger.run_path).unwrap();
    assert_eq!(persisted, ledger);
}

#[tokio::test]
async fn test_uploads_finish_before_any_submission() {
    let dir = common::scratch();
    let config = common::test_config(dir.path());
    let log = call_log();
    let service = Arc::new(FakeExecutionService::new(log.clone()));
    let storage = Arc::new(FakeStorage::new(log.clone()));

    let plan = plan_run(
        &config,
        Overrides {
            no_wait: true,
            ..Overrides::default()
        },
    )
    .unwrap();
    let ledger = orchestrator(config, &service, &storage)
        .new_run(&plan)
        .await
        .unwrap();

    let calls = log.lock().unwrap().clone();
    assert_eq!(calls.len(), 5);
    assert!(calls[..2].iter().all(|c| c.starts_with("upload:")));
    assert!(calls[2..].iter().all(|c| c.starts_with("submit:")));
    assert!(calls.contains(&format!("upload:{}/app-debug.apk", ledger.run_path)));
    assert!(calls.contains(&format!("upload:{}/app-debug-androidTest.apk", ledger.run_path)));
}

#[tokio::test]
async fn test_every_shard_request_carries_its_index() {
    let dir = common::scratch();
    let mut config = common::test_config(dir.path());
    config.test_methods = vec!["com.example.LoginTest".to_string()];
    let service = Arc::new(FakeExecutionService::new(call_log()));
    let storage = Arc::new(FakeStorage::new(call_log()));

    let plan = plan_run(
        &config,
        Overrides {
            shards: Some(4),
            no_wait: true,
            ..Overrides::default()
        },
    )
    .unwrap();
    let ledger = orchestrator(config, &service, &storage)
        .new_run(&plan)
        .await
        .unwrap();

    let requests = service.submitted.lock().unwrap().clone();
    assert_eq!(requests.len(), 4);
    let indexes: BTreeSet<usize> = requests.iter().map(|r| r.shard.index).collect();
    assert_eq!(indexes, (0..4).collect::<BTreeSet<_>>());
    for request in &requests {
        assert_eq!(request.shard.count, 4);
        assert_eq!(request.result_prefix, format!("{BUCKET}/{}", ledger.run_path));
        assert_eq!(
            request.test_targets,
            Some(vec!["class com.example.LoginTest".to_string()])
        );
        assert_eq!(request.app.bucket, BUCKET);
    }
}

#[tokio::test]
async fn test_detached_run_does_not_poll() {
    let dir = common::scratch();
    let config = common::test_config(dir.path());
    let service = Arc::new(FakeExecutionService::new(call_log()));
    let storage = Arc::new(FakeStorage::new(call_log()));

    let plan = plan_run(
        &config,
        Overrides {
            no_wait: true,
            ..Overrides::default()
        },
    )
    .unwrap();
    let runner = orchestrator(config, &service, &storage);
    let ledger = runner.new_run(&plan).await.unwrap();

    assert_eq!(service.refresh_count(), 0);
    assert_eq!(ledger.in_progress_ids().len(), 3);
    assert!(runner.store().ledger_path(&ledger.run_path).is_file());
    assert!(storage.listed_prefixes().is_empty());
}

#[tokio::test]
async fn test_failed_submission_fails_the_run_after_all_shards_return() {
    let dir = common::scratch();
    let config = common::test_config(dir.path());
    let service = Arc::new(FakeExecutionService::new(call_log()).failing_shard(1));
    let storage = Arc::new(FakeStorage::new(call_log()));

    let plan = plan_run(&config, Overrides::default()).unwrap();
    let runner = orchestrator(config, &service, &storage);
    let err = runner.new_run(&plan).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<RunError>(),
        Some(RunError::Submission { index: 1, .. })
    ));
    let rendered = format!("{err:#}");
    assert_eq!(rendered, "shard 1 could not be submitted: quota exceeded");
    assert_eq!(rendered.matches("quota exceeded").count(), 1);
    assert_eq!(service.submitted.lock().unwrap().len(), 3);
    assert!(runner.store().latest_run().is_err(), "no ledger is written");
}

#[tokio::test]
async fn test_refresh_last_run_until_done() {
    let dir = common::scratch();
    let config = common::test_config(dir.path());
    let service = Arc::new(FakeExecutionService::new(call_log()).with_outcome(ExecutionOutcome::Failure));
    let storage = Arc::new(FakeStorage::new(call_log()));
    seed_results(&storage, 3);

    let plan = plan_run(
        &config,
        Overrides {
            no_wait: true,
            ..Overrides::default()
        },
    )
    .unwrap();
    let runner = orchestrator(config, &service, &storage);
    let started = runner.new_run(&plan).await.unwrap();

    let first = runner.refresh_last_run().await.unwrap();
    assert_eq!(first.run_path, started.run_path);
    assert_eq!(service.refresh_count(), 3);
    assert!(first.jobs.values().all(|r| r.state == JobState::Running));
    assert!(storage.listed_prefixes().is_empty());

    let second = runner.refresh_last_run().await.unwrap();
    assert_eq!(service.refresh_count(), 6);
    assert!(second.jobs.values().all(|r| r.downloaded));
    assert_eq!(storage.download_count(), 6);

    // Everything is terminal and downloaded now.
    let third = runner.refresh_last_run().await.unwrap();
    assert_eq!(service.refresh_count(), 6);
    assert_eq!(storage.download_count(), 6);
    assert_eq!(third, runner.store().load(&started.run_path).unwrap());
}

#[tokio::test]
async fn test_mock_mode_skips_artifact_fetch() {
    let dir = common::scratch();
    let mut config = common::test_config(dir.path());
    config.mock = true;
    config.endpoints = Endpoints {
        testing: "http://localhost:9000".to_string(),
        storage: "http://localhost:9000".to_string(),
        tool_results: "http://localhost:9000".to_string(),
    };
    let service = Arc::new(FakeExecutionService::new(call_log()).with_outcome(ExecutionOutcome::Failure));
    let storage = Arc::new(FakeStorage::new(call_log()));
    seed_results(&storage, 3);

    let plan = plan_run(&config, Overrides::default()).unwrap();
    let ledger = orchestrator(config, &service, &storage)
        .new_run(&plan)
        .await
        .unwrap();

    assert!(ledger.jobs.values().all(|r| r.outcome == Outcome::Failure));
    assert!(ledger.jobs.values().all(|r| !r.downloaded));
    assert!(storage.listed_prefixes().is_empty());
}

#[tokio::test]
async fn test_html_report_written_after_run() {
    let dir = common::scratch();
    let config = common::test_config(dir.path());
    let service = Arc::new(FakeExecutionService::new(call_log()));
    let storage = Arc::new(FakeStorage::new(call_log()));
    let report = dir.path().join("reports").join("run.html");

    let plan = plan_run(&config, Overrides::default()).unwrap();
    orchestrator(config, &service, &storage)
        .with_reporter(Box::new(HtmlReport::new(&report)))
        .new_run(&plan)
        .await
        .unwrap();

    let html = std::fs::read_to_string(&report).unwrap();
    for n in 0..3 {
        assert!(html.contains(&format!("job-{n}")));
    }
    assert!(html.contains("FINISHED"));
}
