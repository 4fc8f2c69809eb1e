//! # HTTP Clients / HTTP 客户端
//!
//! JSON-over-HTTP implementations of [`ExecutionService`] and [`ObjectStorage`].
//! The storage client follows the object-store JSON API layout
//! (`/storage/v1/b/{bucket}/o`); the execution client posts job requests to
//! `/v1/projects/{project}/testMatrices`.
//!
//! [`ExecutionService`] 和 [`ObjectStorage`] 的 JSON-over-HTTP 实现。

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::core::config::{self, Endpoints, RunConfig};
use crate::core::models::JobStatus;
use crate::infra::client::{ExecutionService, JobRequest, ObjectRef, ObjectStorage};
use crate::infra::fs::ensure_parent;

/// Attempts made for a single job submission before giving up.
pub const SUBMIT_ATTEMPTS: u32 = 3;

const RETRY_DELAY: Duration = Duration::from_secs(2);

fn parse_base(url: &str) -> Result<Url> {
    Url::parse(url).with_context(|| format!("Invalid endpoint URL: {url}"))
}

/// Appends path segments to `base`, percent-encoding each one.
fn with_segments(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| anyhow!("Endpoint cannot be a base URL: {base}"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Client for the remote test execution service.
/// 远程测试执行服务的客户端。
pub struct HttpExecutionService {
    client: Client,
    base: Url,
    project: String,
}

impl HttpExecutionService {
    pub fn new(config: &RunConfig) -> Result<Self> {
        let endpoint = config
            .endpoints
            .checked(config::Client::Testing, config.mock)?;
        Ok(Self {
            client: Client::new(),
            base: parse_base(endpoint)?,
            project: config.project.clone(),
        })
    }

    fn jobs_url(&self) -> Result<Url> {
        with_segments(&self.base, &["v1", "projects", &self.project, "testMatrices"])
    }

    async fn try_submit(&self, url: &Url, request: &JobRequest) -> Result<JobStatus> {
        let status = self
            .client
            .post(url.clone())
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json::<JobStatus>()
            .await?;
        Ok(status)
    }
}

#[async_trait]
impl ExecutionService for HttpExecutionService {
    async fn submit(&self, request: &JobRequest) -> Result<JobStatus> {
        let url = self.jobs_url()?;
        let mut attempt = 1;
        loop {
            match self.try_submit(&url, request).await {
                Ok(status) => {
                    tracing::debug!(job_id = %status.job_id, shard = request.shard.index, "job created");
                    return Ok(status);
                }
                Err(e) if attempt < SUBMIT_ATTEMPTS => {
                    tracing::warn!(
                        shard = request.shard.index,
                        attempt,
                        error = %e,
                        "job submission failed, retrying"
                    );
                    attempt += 1;
                    tokio::time::sleep(RETRY_DELAY).await;
                }
                Err(e) => {
                    return Err(e.context(format!(
                        "Job submission failed after {SUBMIT_ATTEMPTS} attempts"
                    )));
                }
            }
        }
    }

    async fn refresh(&self, job_id: &str) -> Result<JobStatus> {
        let url = with_segments(&self.jobs_url()?, &[job_id])?;
        let status = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<JobStatus>()
            .await
            .with_context(|| format!("Failed to refresh job {job_id}"))?;
        tracing::debug!(job_id, state = %status.state, "job refreshed");
        Ok(status)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectList {
    #[serde(default)]
    items: Vec<ObjectRef>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Client for the object store.
/// 对象存储的客户端。
pub struct HttpStorage {
    client: Client,
    base: Url,
}

impl HttpStorage {
    pub fn new(endpoints: &Endpoints, mock: bool) -> Result<Self> {
        let endpoint = endpoints.checked(config::Client::Storage, mock)?;
        Ok(Self {
            client: Client::new(),
            base: parse_base(endpoint)?,
        })
    }
}

#[async_trait]
impl ObjectStorage for HttpStorage {
    async fn upload(&self, local: &Path, bucket: &str, name: &str) -> Result<ObjectRef> {
        let body = tokio::fs::read(local)
            .await
            .with_context(|| format!("Failed to read {}", local.display()))?;
        let url = with_segments(&self.base, &["upload", "storage", "v1", "b", bucket, "o"])?;
        let object = self
            .client
            .post(url)
            .query(&[("uploadType", "media"), ("name", name)])
            .body(body)
            .send()
            .await?
            .error_for_status()?
            .json::<ObjectRef>()
            .await
            .with_context(|| format!("Failed to upload {}", local.display()))?;
        tracing::info!(object = %object, "uploaded");
        Ok(object)
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectRef>> {
        let url = with_segments(&self.base, &["storage", "v1", "b", bucket, "o"])?;
        let mut objects = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut request = self
                .client
                .get(url.clone())
                .query(&[("prefix", prefix), ("fields", "items(bucket,name),nextPageToken")]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }
            let page = request
                .send()
                .await?
                .error_for_status()?
                .json::<ObjectList>()
                .await
                .with_context(|| format!("Failed to list gs://{bucket}/{prefix}"))?;
            objects.extend(page.items);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        tracing::debug!(bucket, prefix, count = objects.len(), "listed objects");
        Ok(objects)
    }

    async fn download(&self, object: &ObjectRef, local: &Path) -> Result<()> {
        let url = with_segments(&self.base, &["storage", "v1", "b", &object.bucket, "o", &object.name])?;
        let bytes = self
            .client
            .get(url)
            .query(&[("alt", "media")])
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await
            .with_context(|| format!("Failed to download {object}"))?;
        ensure_parent(local)?;
        tokio::fs::write(local, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", local.display()))?;
        Ok(())
    }
}
