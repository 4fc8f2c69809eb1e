//! # Reporting Unit Tests / 报告单元测试
//!
//! Cost estimation and the HTML page built from a ledger.
//!
//! 费用估算以及从账本构建的 HTML 页面。

mod common;

use common::status;
use shard_runner::models::{ExecutionOutcome, JobRecord, JobState, RunLedger, RunPath};
use shard_runner::reporting::console::{CostEstimate, Reporter};
use shard_runner::reporting::html::{HtmlReport, render_ledger};

fn sample_ledger() -> RunLedger {
    let mut ledger = RunLedger::new(RunPath::from("2025-06-07_08.09.10.000000_1"));
    let mut failed = JobRecord::from_status(&status(
        "job-fail",
        JobState::Finished,
        Some(ExecutionOutcome::Failure),
        &[],
        None,
    ));
    failed.billable_physical_minutes = 12;
    failed.downloaded = true;
    let mut passed = JobRecord::from_status(&status(
        "job-pass",
        JobState::Finished,
        Some(ExecutionOutcome::Success),
        &[],
        None,
    ));
    passed.billable_virtual_minutes = 30;
    let pending = JobRecord::from_status(&status("job-wait", JobState::Pending, None, &[], None));

    for record in [failed, passed, pending] {
        ledger.jobs.insert(record.job_id.clone(), record);
    }
    ledger
}

#[cfg(test)]
mod cost_tests {
    use super::*;

    #[test]
    fn test_minutes_summed_across_jobs() {
        let estimate = CostEstimate::from_ledger(&sample_ledger());
        assert_eq!(estimate.physical_minutes, 12);
        assert_eq!(estimate.virtual_minutes, 30);
    }

    #[test]
    fn test_dollars_use_hourly_rates() {
        let estimate = CostEstimate {
            physical_minutes: 60,
            virtual_minutes: 120,
        };
        assert!((estimate.dollars() - 7.0).abs() < 1e-9);
        assert_eq!(CostEstimate::default().dollars(), 0.0);
    }
}

#[cfg(test)]
mod html_tests {
    use super::*;

    #[test]
    fn test_page_lists_every_job() {
        let page = render_ledger(&sample_ledger()).into_string();
        assert!(page.starts_with("<!DOCTYPE html>"));
        for id in ["job-fail", "job-pass", "job-wait"] {
            assert!(page.contains(id), "missing row for {id}");
        }
        assert!(page.contains("outcome-failure"));
        assert!(page.contains("https://lab.example/job-fail"));
        assert!(page.contains("2025-06-07_08.09.10.000000_1"));
    }

    #[test]
    fn test_report_written_to_disk() {
        let dir = common::scratch();
        let output = dir.path().join("out").join("report.html");
        HtmlReport::new(&output).render(&sample_ledger()).unwrap();
        assert!(std::fs::read_to_string(&output).unwrap().contains("job-pass"));
    }
}
