//! # Reporting Module / 报告模块
//!
//! This module renders a run ledger for humans: cost and result summaries on
//! the console, and an optional HTML page.
//!
//! 此模块为用户渲染运行账本：控制台上的费用和结果摘要，以及可选的 HTML 页面。

pub mod console;
pub mod html;

// Re-export common reporting types
pub use console::{CostSummary, Reporter, ResultSummary};
pub use html::HtmlReport;
