//! # Configuration Module / 配置模块
//!
//! The run configuration is read once from a TOML file and stays immutable
//! for the duration of a run.
//!
//! 运行配置从 TOML 文件中读取一次，并在整个运行期间保持不变。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::ConfigError;
use crate::infra::fs::expand_path;

/// Default file name looked up by the CLI.
pub const DEFAULT_CONFIG_FILE: &str = "ShardRun.toml";

/// Device and OS the shards run on.
/// 分片运行所使用的设备和操作系统。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeviceMatrix {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default = "default_orientation")]
    pub orientation: String,
}

impl Default for DeviceMatrix {
    fn default() -> Self {
        Self {
            model: default_model(),
            version: default_version(),
            locale: default_locale(),
            orientation: default_orientation(),
        }
    }
}

/// Which remote client an endpoint belongs to.
/// 端点所属的远程客户端。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Client {
    Testing,
    Storage,
    ToolResults,
}

impl Client {
    pub fn name(self) -> &'static str {
        match self {
            Client::Testing => "testing",
            Client::Storage => "storage",
            Client::ToolResults => "tool_results",
        }
    }
}

/// Base URLs of the remote collaborators.
/// 远程协作者的基础 URL。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Endpoints {
    #[serde(default = "default_testing_endpoint")]
    pub testing: String,
    #[serde(default = "default_storage_endpoint")]
    pub storage: String,
    #[serde(default = "default_tool_results_endpoint")]
    pub tool_results: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            testing: default_testing_endpoint(),
            storage: default_storage_endpoint(),
            tool_results: default_tool_results_endpoint(),
        }
    }
}

impl Endpoints {
    pub fn get(&self, client: Client) -> &str {
        match client {
            Client::Testing => &self.testing,
            Client::Storage => &self.storage,
            Client::ToolResults => &self.tool_results,
        }
    }

    /// Returns the endpoint for `client`, refusing anything but a local double in mock mode.
    /// 返回 `client` 的端点；在模拟模式下，除本地替身外一律拒绝。
    pub fn checked(&self, client: Client, mock: bool) -> Result<&str, ConfigError> {
        let url = self.get(client);
        if mock && !url.contains(LOCALHOST) {
            return Err(ConfigError::MockEndpoint {
                client: client.name(),
                url: url.to_string(),
            });
        }
        Ok(url)
    }
}

/// The whole run configuration.
/// 完整的运行配置。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunConfig {
    /// Language for console messages (e.g. "en", "zh-CN").
    /// 控制台消息的语言（例如 "en", "zh-CN"）。
    #[serde(default = "default_language")]
    pub language: String,

    /// Remote project the jobs are billed to.
    pub project: String,

    pub app_apk: PathBuf,
    pub test_apk: PathBuf,

    /// Bucket receiving the uploaded inputs and every job's results.
    /// 接收上传输入和每个作业结果的存储桶。
    pub results_bucket: String,

    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,

    #[serde(default = "default_shard_count")]
    pub shard_count: usize,

    #[serde(default = "default_true")]
    pub wait_for_results: bool,

    /// Test methods to run. Empty means the full suite.
    /// 要运行的测试方法。为空表示运行整个测试套件。
    #[serde(default)]
    pub test_methods: Vec<String>,

    #[serde(default = "default_true")]
    pub use_orchestrator: bool,

    /// Every client must then point at a local double.
    /// 此时所有客户端都必须指向本地替身。
    #[serde(default)]
    pub mock: bool,

    #[serde(default = "default_storage_console")]
    pub storage_console: String,

    #[serde(default)]
    pub device: DeviceMatrix,

    #[serde(default)]
    pub endpoints: Endpoints,
}

impl RunConfig {
    /// Checks every invariant that must hold before the first remote call.
    /// 检查第一次远程调用之前必须满足的所有不变量。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shard_count == 0 {
            return Err(ConfigError::ZeroShards);
        }
        if self.project.trim().is_empty() {
            return Err(ConfigError::MissingField("project"));
        }
        if self.results_bucket.trim().is_empty() {
            return Err(ConfigError::MissingField("results_bucket"));
        }
        if self.app_apk.as_os_str().is_empty() {
            return Err(ConfigError::MissingField("app_apk"));
        }
        if self.test_apk.as_os_str().is_empty() {
            return Err(ConfigError::MissingField("test_apk"));
        }
        for client in [Client::Testing, Client::Storage, Client::ToolResults] {
            self.endpoints.checked(client, self.mock)?;
        }
        Ok(())
    }

    /// Browser URL of the run's storage prefix.
    /// 运行存储前缀的浏览器 URL。
    pub fn storage_browser_url(&self, run_path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.storage_console.trim_end_matches('/'),
            self.results_bucket,
            run_path
        )
    }

    /// Resolves every path field against `base` (normally the config file's directory).
    /// 将所有路径字段相对于 `base`（通常是配置文件所在目录）进行解析。
    pub fn resolve_paths(&mut self, base: &Path) -> Result<()> {
        self.app_apk = expand_path(&self.app_apk, base)?;
        self.test_apk = expand_path(&self.test_apk, base)?;
        self.results_dir = expand_path(&self.results_dir, base)?;
        Ok(())
    }
}

/// Reads and parses a configuration file, resolving relative paths against its directory.
/// 读取并解析配置文件，并相对于其所在目录解析相对路径。
pub fn load_run_config(path: &Path) -> Result<RunConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let mut config: RunConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    let base = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    config.resolve_paths(base)?;
    tracing::debug!(config = %path.display(), shards = config.shard_count, "loaded run config");
    Ok(config)
}

const LOCALHOST: &str = "localhost";

fn default_language() -> String {
    "en".to_string()
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_shard_count() -> usize {
    1
}

fn default_true() -> bool {
    true
}

fn default_storage_console() -> String {
    "https://console.developers.google.com/storage/browser".to_string()
}

fn default_model() -> String {
    "NexusLowRes".to_string()
}

fn default_version() -> String {
    "26".to_string()
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_orientation() -> String {
    "portrait".to_string()
}

fn default_testing_endpoint() -> String {
    "https://testing.googleapis.com".to_string()
}

fn default_storage_endpoint() -> String {
    "https://storage.googleapis.com".to_string()
}

fn default_tool_results_endpoint() -> String {
    "https://toolresults.googleapis.com".to_string()
}
