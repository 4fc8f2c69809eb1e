// Shared test helpers for integration tests
#![allow(dead_code)]

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use shard_runner::config::{DeviceMatrix, Endpoints, RunConfig};
use shard_runner::infra::client::{ExecutionService, JobRequest, ObjectRef, ObjectStorage};
use shard_runner::models::{ExecutionOutcome, JobState, JobStatus, TestDetails, TestExecution};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const BUCKET: &str = "test-bucket";

/// Shared, ordered log of remote calls across fakes.
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Builds a status snapshot with a single execution.
pub fn status(
    job_id: &str,
    state: JobState,
    outcome: Option<ExecutionOutcome>,
    progress: &[&str],
    error: Option<&str>,
) -> JobStatus {
    JobStatus {
        job_id: job_id.to_string(),
        state,
        executions: vec![TestExecution {
            id: format!("{job_id}-exec-0"),
            state,
            details: Some(TestDetails {
                progress_messages: progress.iter().map(|m| m.to_string()).collect(),
                error_message: error.map(str::to_string),
            }),
            outcome,
            duration_secs: if state.completed() { Some(90) } else { None },
            physical_device: false,
        }],
        result_storage: format!("{BUCKET}/run/{job_id}"),
        web_link: format!("https://lab.example/{job_id}"),
    }
}

/// A run configuration pointing at a scratch directory, with real input files.
pub fn test_config(dir: &Path) -> RunConfig {
    let app = dir.join("app-debug.apk");
    let test = dir.join("app-debug-androidTest.apk");
    fs::write(&app, b"app").expect("write app package");
    fs::write(&test, b"test").expect("write test package");
    RunConfig {
        language: "en".to_string(),
        project: "test-project".to_string(),
        app_apk: app,
        test_apk: test,
        results_bucket: BUCKET.to_string(),
        results_dir: dir.join("results"),
        shard_count: 3,
        wait_for_results: true,
        test_methods: vec![],
        use_orchestrator: true,
        mock: false,
        storage_console: "https://console.example/storage".to_string(),
        device: DeviceMatrix::default(),
        endpoints: Endpoints::default(),
    }
}

pub fn scratch() -> TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// In-process execution service. Each submitted job walks through `lifecycle`,
/// one state per refresh, and then stays on the last one.
pub struct FakeExecutionService {
    next_id: AtomicUsize,
    lifecycle: Vec<JobState>,
    final_outcome: ExecutionOutcome,
    fail_shard: Option<usize>,
    scripts: Mutex<HashMap<String, VecDeque<JobStatus>>>,
    pub submitted: Mutex<Vec<JobRequest>>,
    pub refreshed: Mutex<Vec<String>>,
    log: CallLog,
}

impl FakeExecutionService {
    pub fn new(log: CallLog) -> Self {
        Self {
            next_id: AtomicUsize::new(0),
            lifecycle: vec![JobState::Validating, JobState::Running, JobState::Finished],
            final_outcome: ExecutionOutcome::Success,
            fail_shard: None,
            scripts: Mutex::new(HashMap::new()),
            submitted: Mutex::new(Vec::new()),
            refreshed: Mutex::new(Vec::new()),
            log,
        }
    }

    pub fn with_outcome(mut self, outcome: ExecutionOutcome) -> Self {
        self.final_outcome = outcome;
        self
    }

    pub fn failing_shard(mut self, index: usize) -> Self {
        self.fail_shard = Some(index);
        self
    }

    /// Replaces the scripted snapshots returned for `job_id`.
    pub fn script(&self, job_id: &str, statuses: Vec<JobStatus>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(job_id.to_string(), statuses.into());
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshed.lock().unwrap().len()
    }

    fn lifecycle_for(&self, job_id: &str) -> Vec<JobStatus> {
        self.lifecycle
            .iter()
            .map(|state| {
                let outcome = state.completed().then_some(self.final_outcome);
                status(job_id, *state, outcome, &[], None)
            })
            .collect()
    }
}

#[async_trait]
impl ExecutionService for FakeExecutionService {
    async fn submit(&self, request: &JobRequest) -> Result<JobStatus> {
        self.log
            .lock()
            .unwrap()
            .push(format!("submit:{}", request.shard.index));
        self.submitted.lock().unwrap().push(request.clone());
        if self.fail_shard == Some(request.shard.index) {
            bail!("quota exceeded");
        }
        let job_id = format!("job-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let mut statuses: VecDeque<JobStatus> = self.lifecycle_for(&job_id).into();
        let first = statuses.pop_front().ok_or_else(|| anyhow!("empty lifecycle"))?;
        self.scripts.lock().unwrap().insert(job_id, statuses);
        Ok(first)
    }

    async fn refresh(&self, job_id: &str) -> Result<JobStatus> {
        self.log.lock().unwrap().push(format!("refresh:{job_id}"));
        self.refreshed.lock().unwrap().push(job_id.to_string());
        let mut scripts = self.scripts.lock().unwrap();
        let queue = scripts
            .get_mut(job_id)
            .ok_or_else(|| anyhow!("unknown job {job_id}"))?;
        if queue.len() > 1 {
            queue.pop_front().ok_or_else(|| anyhow!("empty script"))
        } else {
            queue.front().cloned().ok_or_else(|| anyhow!("empty script"))
        }
    }
}

/// In-memory object store that counts listings and downloads.
pub struct FakeStorage {
    objects: Mutex<BTreeMap<(String, String), Vec<u8>>>,
    pub listed: Mutex<Vec<String>>,
    pub downloads: AtomicUsize,
    log: CallLog,
}

impl FakeStorage {
    pub fn new(log: CallLog) -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            listed: Mutex::new(Vec::new()),
            downloads: AtomicUsize::new(0),
            log,
        }
    }

    pub fn put(&self, bucket: &str, name: &str, content: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), name.to_string()), content.to_vec());
    }

    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    pub fn listed_prefixes(&self) -> Vec<String> {
        self.listed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn upload(&self, local: &Path, bucket: &str, name: &str) -> Result<ObjectRef> {
        self.log.lock().unwrap().push(format!("upload:{name}"));
        let content = fs::read(local)?;
        self.put(bucket, name, &content);
        Ok(ObjectRef::new(bucket, name))
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectRef>> {
        self.listed.lock().unwrap().push(prefix.to_string());
        Ok(self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|(b, name)| b == bucket && name.starts_with(prefix))
            .map(|(b, name)| ObjectRef::new(b.clone(), name.clone()))
            .collect())
    }

    async fn download(&self, object: &ObjectRef, local: &Path) -> Result<()> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        let content = self
            .objects
            .lock()
            .unwrap()
            .get(&(object.bucket.clone(), object.name.clone()))
            .cloned()
            .ok_or_else(|| anyhow!("no such object {object}"))?;
        fs::write(local, content)?;
        Ok(())
    }
}
