//! # Core Module / 核心模块
//!
//! This module contains the run engine of Shard Runner: configuration, data
//! models, the persisted run ledger, shard dispatch, polling, artifact
//! retrieval and the orchestrator tying them together.
//!
//! 此模块包含 Shard Runner 的运行引擎：配置、数据模型、持久化运行账本、
//! 分片分发、轮询、产物获取以及将它们串联起来的编排器。

pub mod artifacts;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod ledger;
pub mod models;
pub mod orchestrator;
pub mod planner;
pub mod poll;

// Re-exports
pub use config::RunConfig;
pub use ledger::LedgerStore;
pub use models::{JobRecord, RunLedger};
pub use orchestrator::Orchestrator;
