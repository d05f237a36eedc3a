use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::{PolicyKind, SchedulerConfig};
use crate::error::Result;
use crate::protocol::Request;
use crate::scheduler::batch::BatchSampling;
use crate::scheduler::job::Job;
use crate::scheduler::late_binding::LateBindingWithCancel;
use crate::stats::RpcBreakdown;
use crate::transport::Transport;

/// What a single dispatch round did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchOutcome {
    /// Every RPC attempted, successful or not.
    pub rpc_count: usize,
    /// The same RPCs split by request type.
    pub rpcs: RpcBreakdown,
    /// Worker indices that were sent work, one entry per task sent.
    pub placements: Vec<usize>,
    /// RPCs that failed or got an unexpected reply.
    pub failed_rpcs: usize,
}

impl DispatchOutcome {
    /// Count one RPC attempt carrying `request`.
    pub fn record_rpc(&mut self, request: &Request) {
        self.rpc_count += 1;
        self.rpcs.record(request);
    }
}

/// A strategy for placing one job's tasks on the worker pool.
#[async_trait]
pub trait DispatchPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Number of tasks each job carries under this policy.
    fn tasks_per_job(&self) -> usize;

    /// Contact workers and place `job`. Does not wait for the work to finish.
    ///
    /// Per-worker RPC failures are absorbed; only an empty pool is an error.
    async fn dispatch(&self, job: &Job) -> Result<DispatchOutcome>;
}

/// Build the policy selected in `config`.
pub fn build_policy(
    config: &SchedulerConfig,
    transport: Arc<dyn Transport>,
) -> Box<dyn DispatchPolicy> {
    match config.policy {
        PolicyKind::Batch => Box::new(BatchSampling::new(
            config.workers.clone(),
            transport,
            config.tasks_per_job,
            config.scheduler_addr.clone(),
        )),
        PolicyKind::LatePro => Box::new(LateBindingWithCancel::new(
            config.workers.clone(),
            transport,
        )),
    }
}
