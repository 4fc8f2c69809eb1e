//! # Console Reporting Module / 控制台报告模块
//!
//! Summaries printed at the end of a run. Both read the ledger only.
//!
//! 在运行结束时打印的摘要。两者都只读取账本。

use anyhow::Result;
use colored::*;

use crate::core::models::{Outcome, RunLedger};
use crate::infra::t;

/// Price per billable minute on a physical device, in dollars ($5/hour).
pub const PHYSICAL_PRICE_PER_MINUTE: f64 = 5.0 / 60.0;
/// Price per billable minute on a virtual device, in dollars ($1/hour).
pub const VIRTUAL_PRICE_PER_MINUTE: f64 = 1.0 / 60.0;

/// Renders a view of a run ledger.
/// 渲染运行账本的某种视图。
pub trait Reporter: Send + Sync {
    fn render(&self, ledger: &RunLedger) -> Result<()>;
}

/// Totals of billable minutes across a ledger.
/// 整个账本的可计费分钟合计。
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CostEstimate {
    pub physical_minutes: u64,
    pub virtual_minutes: u64,
}

impl CostEstimate {
    pub fn from_ledger(ledger: &RunLedger) -> Self {
        ledger.jobs.values().fold(Self::default(), |acc, record| Self {
            physical_minutes: acc.physical_minutes + record.billable_physical_minutes,
            virtual_minutes: acc.virtual_minutes + record.billable_virtual_minutes,
        })
    }

    /// Estimated cost in dollars.
    pub fn dollars(&self) -> f64 {
        self.physical_minutes as f64 * PHYSICAL_PRICE_PER_MINUTE
            + self.virtual_minutes as f64 * VIRTUAL_PRICE_PER_MINUTE
    }
}

/// Prints billable minutes and the estimated cost of the run.
/// 打印可计费分钟数和运行的预估费用。
#[derive(Debug, Default)]
pub struct CostSummary;

impl Reporter for CostSummary {
    fn render(&self, ledger: &RunLedger) -> Result<()> {
        let estimate = CostEstimate::from_ledger(ledger);
        println!("{}", t!("report.cost_banner").bold());
        println!(
            "  {}",
            t!(
                "report.billable_minutes",
                physical = estimate.physical_minutes,
                emulated = estimate.virtual_minutes
            )
        );
        println!(
            "  {}",
            t!("report.estimated_cost", cost = format!("{:.2}", estimate.dollars())).yellow()
        );
        Ok(())
    }
}

/// Prints outcome counts and the web link of every failed job.
/// 打印结果计数以及每个失败作业的网页链接。
#[derive(Debug, Default)]
pub struct ResultSummary;

impl Reporter for ResultSummary {
    fn render(&self, ledger: &RunLedger) -> Result<()> {
        let (success, failure, unknown) = ledger.outcome_counts();
        println!("{}", t!("report.result_banner").bold());
        println!(
            "  {}",
            t!(
                "report.outcome_counts",
                total = ledger.len(),
                success = success.to_string().green(),
                failure = failure.to_string().red(),
                unknown = unknown.to_string().dimmed()
            )
        );
        for record in ledger.jobs.values().filter(|r| r.outcome == Outcome::Failure) {
            println!("  - {} {}", record.job_id.red(), record.web_link);
        }
        println!();
        Ok(())
    }
}
