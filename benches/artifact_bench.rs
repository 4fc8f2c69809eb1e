use anyhow::Result;
use async_trait::async_trait;
use criterion::{Criterion, criterion_group, criterion_main};
use shard_runner::core::artifacts::is_artifact;
use shard_runner::core::poll::refresh_ledger;
use shard_runner::infra::client::{ExecutionService, JobRequest};
use shard_runner::models::{JobRecord, JobState, JobStatus, RunLedger, RunPath};
use std::hint::black_box;
use tokio::runtime::Runtime;

fn object_listing() -> Vec<String> {
    (0..200)
        .flat_map(|n| {
            [
                format!("run/job-{n}/test_result_{n}.xml"),
                format!("run/job-{n}/artifacts/screen_{n}.png"),
                format!("run/job-{n}/logcat"),
                format!("run/job-{n}/video.mp4"),
            ]
        })
        .collect()
}

fn snapshot(job_id: &str, state: JobState) -> JobStatus {
    JobStatus {
        job_id: job_id.to_string(),
        state,
        executions: vec![],
        result_storage: format!("bucket/run/{job_id}"),
        web_link: String::new(),
    }
}

/// Answers every refresh immediately with a running job.
struct InstantService;

#[async_trait]
impl ExecutionService for InstantService {
    async fn submit(&self, _request: &JobRequest) -> Result<JobStatus> {
        Ok(snapshot("bench", JobState::Validating))
    }

    async fn refresh(&self, job_id: &str) -> Result<JobStatus> {
        Ok(snapshot(job_id, JobState::Running))
    }
}

fn bench_is_artifact(c: &mut Criterion) {
    let listing = object_listing();
    c.bench_function("is_artifact", |b| {
        b.iter(|| listing.iter().filter(|name| is_artifact(black_box(name))).count());
    });
}

fn bench_refresh_ledger(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut template = RunLedger::new(RunPath::from("2024-01-01_00.00.00.000000_1"));
    for n in 0..50 {
        let record = JobRecord::from_status(&snapshot(&format!("job-{n}"), JobState::Pending));
        template.jobs.insert(record.job_id.clone(), record);
    }

    c.bench_function("refresh_ledger", |b| {
        b.to_async(&rt).iter(|| {
            let mut ledger = template.clone();
            async move {
                let _ = refresh_ledger(&InstantService, &mut ledger).await;
            }
        });
    });
}

criterion_group!(benches, bench_is_artifact, bench_refresh_ledger);
criterion_main!(benches);
