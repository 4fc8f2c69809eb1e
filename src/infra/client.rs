//! # Remote Collaborators / 远程协作者
//!
//! The run engine only talks to the outside world through these two traits.
//! Implementations own transport, authentication and retries.
//!
//! 运行引擎只通过这两个 trait 与外界通信。
//! 实现负责传输、认证和重试。

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::core::config::DeviceMatrix;
use crate::core::models::JobStatus;

/// A remote object: bucket plus full object name.
/// 远程对象：存储桶加完整对象名。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub bucket: String,
    pub name: String,
}

impl ObjectRef {
    pub fn new(bucket: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gs://{}/{}", self.bucket, self.name)
    }
}

/// Position of one shard in the fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardIndex {
    pub index: usize,
    pub count: usize,
}

/// Everything needed to create one remote job.
/// 创建一个远程作业所需的全部信息。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub project: String,
    pub app: ObjectRef,
    pub test: ObjectRef,
    /// `bucket/runPath` the job writes its results under.
    pub result_prefix: String,
    pub device: DeviceMatrix,
    /// Class-level selectors; `None` runs the full suite.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_targets: Option<Vec<String>>,
    pub use_orchestrator: bool,
    pub shard: ShardIndex,
}

/// The remote test execution service.
/// 远程测试执行服务。
#[async_trait]
pub trait ExecutionService: Send + Sync {
    /// Creates one job. Transient failures are retried inside the implementation;
    /// an error here is final.
    /// 创建一个作业。瞬时失败在实现内部重试；此处返回的错误即为最终结果。
    async fn submit(&self, request: &JobRequest) -> Result<JobStatus>;

    /// Fetches the current status of a job.
    /// 获取作业的当前状态。
    async fn refresh(&self, job_id: &str) -> Result<JobStatus>;
}

/// The object store holding inputs and results.
/// 保存输入和结果的对象存储。
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(&self, local: &Path, bucket: &str, name: &str) -> Result<ObjectRef>;

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectRef>>;

    async fn download(&self, object: &ObjectRef, local: &Path) -> Result<()>;
}
