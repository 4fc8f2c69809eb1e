//! # HTML Reporting Module / HTML 报告模块
//!
//! Renders a run ledger as a self-contained HTML page: a statistics header
//! followed by one table row per job.
//!
//! 将运行账本渲染为独立的 HTML 页面：统计信息头部，后跟每个作业一行的表格。

use anyhow::{Context, Result};
use maud::{DOCTYPE, Markup, html};
use std::fs;
use std::path::PathBuf;

use crate::core::models::{JobRecord, Outcome, RunLedger};
use crate::infra::fs::ensure_parent;
use crate::infra::t;
use crate::reporting::console::{CostEstimate, Reporter};

const HTML_STYLE: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif; margin: 2em; color: #24292e; }
h1 { font-size: 1.6em; }
.stats { display: flex; gap: 1.5em; margin-bottom: 1.5em; }
.stat { padding: 0.6em 1em; border-radius: 6px; background: #f6f8fa; }
table { border-collapse: collapse; width: 100%; }
th, td { text-align: left; padding: 0.4em 0.8em; border-bottom: 1px solid #e1e4e8; }
.outcome-success { color: #22863a; font-weight: 600; }
.outcome-failure { color: #cb2431; font-weight: 600; }
.outcome-unknown { color: #6a737d; }
"#;

fn outcome_class(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Success => "outcome-success",
        Outcome::Failure => "outcome-failure",
        Outcome::Unknown => "outcome-unknown",
    }
}

fn outcome_label(outcome: Outcome) -> String {
    match outcome {
        Outcome::Success => t!("report.outcome_success").to_string(),
        Outcome::Failure => t!("report.outcome_failure").to_string(),
        Outcome::Unknown => t!("report.outcome_unknown").to_string(),
    }
}

fn job_row(record: &JobRecord) -> Markup {
    html! {
        tr {
            td { (record.job_id) }
            td { (record.state.to_string()) }
            td class=(outcome_class(record.outcome)) { (outcome_label(record.outcome)) }
            td { (record.storage_path) }
            td {
                @if record.web_link.is_empty() {
                    "-"
                } @else {
                    a href=(record.web_link) { (t!("html_report.open").to_string()) }
                }
            }
            td { @if record.downloaded { "✔" } }
        }
    }
}

/// Builds the HTML page for `ledger`.
/// 为 `ledger` 构建 HTML 页面。
pub fn render_ledger(ledger: &RunLedger) -> Markup {
    let (success, failure, unknown) = ledger.outcome_counts();
    let cost = CostEstimate::from_ledger(ledger);
    let title = t!("html_report.title", run = ledger.run_path.as_str()).to_string();

    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (title) }
                style { (maud::PreEscaped(HTML_STYLE)) }
            }
            body {
                h1 { (title) }
                div class="stats" {
                    div class="stat" { (t!("html_report.total").to_string()) ": " (ledger.len()) }
                    div class="stat outcome-success" { (t!("report.outcome_success").to_string()) ": " (success) }
                    div class="stat outcome-failure" { (t!("report.outcome_failure").to_string()) ": " (failure) }
                    div class="stat outcome-unknown" { (t!("report.outcome_unknown").to_string()) ": " (unknown) }
                    div class="stat" { (t!("html_report.cost").to_string()) ": $" (format!("{:.2}", cost.dollars())) }
                }
                table {
                    thead {
                        tr {
                            th { (t!("html_report.job_id").to_string()) }
                            th { (t!("html_report.state").to_string()) }
                            th { (t!("html_report.outcome").to_string()) }
                            th { (t!("html_report.storage").to_string()) }
                            th { (t!("html_report.link").to_string()) }
                            th { (t!("html_report.downloaded").to_string()) }
                        }
                    }
                    tbody {
                        @for record in ledger.jobs.values() {
                            (job_row(record))
                        }
                    }
                }
            }
        }
    }
}

/// Writes the HTML report of a ledger to a fixed path.
/// 将账本的 HTML 报告写入固定路径。
#[derive(Debug, Clone)]
pub struct HtmlReport {
    pub output: PathBuf,
}

impl HtmlReport {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
        }
    }
}

impl Reporter for HtmlReport {
    fn render(&self, ledger: &RunLedger) -> Result<()> {
        ensure_parent(&self.output)?;
        fs::write(&self.output, render_ledger(ledger).into_string())
            .with_context(|| format!("Failed to write HTML report: {}", self.output.display()))?;
        println!("{}", t!("report.html_written", path = self.output.display()));
        Ok(())
    }
}
