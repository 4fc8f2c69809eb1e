//! # Infrastructure Module / 基础设施模块
//!
//! This module provides the remote collaborators (execution service and
//! object storage) behind traits, their HTTP implementations, and file
//! system helpers.
//!
//! 此模块在 trait 之后提供远程协作者（执行服务和对象存储）、
//! 它们的 HTTP 实现以及文件系统辅助函数。

pub mod client;
pub mod fs;
pub mod http;

// Re-export i18n functions for easier access
pub use rust_i18n::t;
