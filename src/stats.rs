use std::ops::AddAssign;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::protocol::Request;

/// RPCs sent, by request type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RpcBreakdown {
    pub probes: usize,
    pub assigns: usize,
    pub requests: usize,
    pub cancels: usize,
}

impl RpcBreakdown {
    pub fn record(&mut self, request: &Request) {
        match request {
            Request::Probe => self.probes += 1,
            Request::Assign { .. } => self.assigns += 1,
            Request::Request { .. } => self.requests += 1,
            Request::Cancel => self.cancels += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.probes + self.assigns + self.requests + self.cancels
    }
}

impl AddAssign for RpcBreakdown {
    fn add_assign(&mut self, other: Self) {
        self.probes += other.probes;
        self.assigns += other.assigns;
        self.requests += other.requests;
        self.cancels += other.cancels;
    }
}

/// Timing of one job's dispatch round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobReport {
    pub index: usize,
    /// Simulated service time of the job.
    pub service_ms: f64,
    /// Wall-clock time spent inside the dispatch call.
    pub response_ms: f64,
    /// `response_ms - service_ms`. Negative when dispatch returns before the
    /// work could have finished, which is the common case.
    pub wait_ms: f64,
    pub rpc_count: usize,
}

impl JobReport {
    pub fn new(index: usize, service_ms: u64, response_ms: f64, rpc_count: usize) -> Self {
        let service_ms = service_ms as f64;
        Self {
            index,
            service_ms,
            response_ms,
            wait_ms: response_ms - service_ms,
            rpc_count,
        }
    }
}

/// Aggregate statistics over a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    pub policy: String,
    pub jobs: usize,
    pub avg_response_ms: f64,
    pub avg_wait_ms: f64,
    pub avg_service_ms: f64,
    pub avg_rpcs_per_job: f64,
    pub total_rpcs: usize,
    pub rpc_breakdown: RpcBreakdown,
    pub failed_rpcs: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunStats {
    pub fn from_reports(
        policy: &str,
        reports: &[JobReport],
        rpc_breakdown: RpcBreakdown,
        failed_rpcs: usize,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        let total_rpcs = reports.iter().map(|r| r.rpc_count).sum();
        Self {
            policy: policy.to_string(),
            jobs: reports.len(),
            avg_response_ms: mean(reports.iter().map(|r| r.response_ms)),
            avg_wait_ms: mean(reports.iter().map(|r| r.wait_ms)),
            avg_service_ms: mean(reports.iter().map(|r| r.service_ms)),
            avg_rpcs_per_job: mean(reports.iter().map(|r| r.rpc_count as f64)),
            total_rpcs,
            rpc_breakdown,
            failed_rpcs,
            started_at,
            finished_at,
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
