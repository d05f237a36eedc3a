use std::time::Instant;

use chrono::Utc;

use crate::error::Result;
use crate::scheduler::job::{DurationDistribution, Job};
use crate::scheduler::policy::DispatchPolicy;
use crate::stats::{JobReport, RpcBreakdown, RunStats};

/// Drives a policy through a run of synthetic jobs, one at a time.
///
/// Each job's response time is the wall-clock time of its dispatch call.
/// The next job starts only after the previous dispatch returned.
pub struct Runner<D> {
    policy: Box<dyn DispatchPolicy>,
    durations: D,
    reports: Vec<JobReport>,
    rpcs: RpcBreakdown,
    failed_rpcs: usize,
}

impl<D: DurationDistribution> Runner<D> {
    pub fn new(policy: Box<dyn DispatchPolicy>, durations: D) -> Self {
        Self {
            policy,
            durations,
            reports: Vec::new(),
            rpcs: RpcBreakdown::default(),
            failed_rpcs: 0,
        }
    }

    /// Dispatch one job and record its report.
    pub async fn run_job(&mut self, index: usize) -> Result<JobReport> {
        let job = Job::new(
            index,
            self.durations.next_duration(),
            self.policy.tasks_per_job(),
        );

        let start = Instant::now();
        let outcome = self.policy.dispatch(&job).await?;
        let response_ms = start.elapsed().as_secs_f64() * 1000.0;

        self.rpcs += outcome.rpcs;
        self.failed_rpcs += outcome.failed_rpcs;
        let report = JobReport::new(index, job.duration_ms, response_ms, outcome.rpc_count);
        tracing::debug!(
            job = index,
            duration_ms = job.duration_ms,
            response_ms,
            rpc_count = outcome.rpc_count,
            "Job dispatched"
        );
        self.reports.push(report.clone());
        Ok(report)
    }

    /// Dispatch `jobs` jobs sequentially and aggregate the results.
    pub async fn run(mut self, jobs: usize) -> Result<RunStats> {
        let started_at = Utc::now();
        tracing::info!(policy = self.policy.name(), jobs, "Starting run");

        for index in 0..jobs {
            self.run_job(index).await?;
        }

        let stats = RunStats::from_reports(
            self.policy.name(),
            &self.reports,
            self.rpcs,
            self.failed_rpcs,
            started_at,
            Utc::now(),
        );
        tracing::info!(
            policy = %stats.policy,
            avg_response_ms = stats.avg_response_ms,
            avg_rpcs_per_job = stats.avg_rpcs_per_job,
            failed_rpcs = stats.failed_rpcs,
            "Run finished"
        );
        Ok(stats)
    }

    pub fn reports(&self) -> &[JobReport] {
        &self.reports
    }

    /// RPCs sent so far, by request type.
    pub fn rpc_breakdown(&self) -> RpcBreakdown {
        self.rpcs
    }
}
