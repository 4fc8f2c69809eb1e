//! # Error Taxonomy / 错误分类
//!
//! Typed errors raised by the run engine. Anything that is not listed here
//! (remote fetch failures, local I/O) travels as a plain `anyhow::Error`
//! with context attached at the call site.
//!
//! 运行引擎抛出的类型化错误。未在此列出的错误（远程获取失败、本地 I/O）
//! 以普通的 `anyhow::Error` 形式传递，并在调用处附加上下文。

use thiserror::Error;

/// Problems with the run configuration. Always fatal, always raised before
/// the first remote call.
/// 运行配置的问题。总是致命的，并且总是在第一次远程调用之前抛出。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("shard_count must be at least 1")]
    ZeroShards,

    #[error("`{0}` must not be empty")]
    MissingField(&'static str),

    #[error("mock mode requires the {client} endpoint to point at localhost, got `{url}`")]
    MockEndpoint { client: &'static str, url: String },

    #[error("--wait and --no-wait are mutually exclusive")]
    ConflictingWait,
}

/// Failures of the run engine itself.
/// 运行引擎自身的失败。
#[derive(Debug, Error)]
pub enum RunError {
    #[error("no previous runs found in {0}")]
    NoRuns(String),

    #[error("shard {index} could not be submitted")]
    Submission {
        index: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("the execution service returned job id `{0}` twice")]
    DuplicateJob(String),

    #[error("run directory `{0}` does not carry a creation timestamp")]
    UnparsableRunPath(String),
}
