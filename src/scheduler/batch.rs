use std::sync::Arc;

use async_trait::async_trait;

use crate::config::WorkerEndpoint;
use crate::error::{Result, RpcError, SparrowError};
use crate::protocol::{Reply, Request};
use crate::scheduler::job::Job;
use crate::scheduler::policy::{DispatchOutcome, DispatchPolicy};
use crate::transport::Transport;

/// Load assumed for a worker that could not be probed.
pub const UNREACHABLE_LOAD: u64 = 9999;

/// Probe every worker, then assign tasks to the least loaded ones.
///
/// Workers are ranked by reported queue length with a stable sort, so equal
/// loads keep pool order. Tasks walk the ranking cyclically: with more tasks
/// than workers the ranking wraps and a worker may get several tasks.
pub struct BatchSampling {
    workers: Vec<WorkerEndpoint>,
    transport: Arc<dyn Transport>,
    tasks_per_job: usize,
    scheduler_addr: String,
}

impl BatchSampling {
    pub fn new(
        workers: Vec<WorkerEndpoint>,
        transport: Arc<dyn Transport>,
        tasks_per_job: usize,
        scheduler_addr: String,
    ) -> Self {
        Self {
            workers,
            transport,
            tasks_per_job,
            scheduler_addr,
        }
    }

    /// Ask a worker for its queue length. Malformed replies are errors.
    async fn probe(&self, endpoint: &WorkerEndpoint) -> std::result::Result<u64, RpcError> {
        let reply = self
            .transport
            .call(endpoint, &Request::Probe.to_string())
            .await?;
        match Reply::parse(&reply) {
            Some(Reply::Queue(n)) => Ok(n),
            _ => Err(RpcError::UnexpectedReply {
                addr: endpoint.to_string(),
                reply,
            }),
        }
    }

    /// One full probe round in pool order. Returns `(worker index, load)`.
    async fn probe_all(&self, outcome: &mut DispatchOutcome) -> Vec<(usize, u64)> {
        let mut loads = Vec::with_capacity(self.workers.len());
        for (idx, endpoint) in self.workers.iter().enumerate() {
            outcome.record_rpc(&Request::Probe);
            let load = match self.probe(endpoint).await {
                Ok(n) => n,
                Err(e) => {
                    outcome.failed_rpcs += 1;
                    tracing::warn!(worker = %endpoint, error = %e, "Probe failed, assuming worst load");
                    UNREACHABLE_LOAD
                }
            };
            loads.push((idx, load));
        }
        loads
    }
}

/// Rank workers by load. Stable: ties keep pool order.
pub fn rank_by_load(mut loads: Vec<(usize, u64)>) -> Vec<usize> {
    loads.sort_by_key(|&(_, load)| load);
    loads.into_iter().map(|(idx, _)| idx).collect()
}

#[async_trait]
impl DispatchPolicy for BatchSampling {
    fn name(&self) -> &'static str {
        "batch"
    }

    fn tasks_per_job(&self) -> usize {
        self.tasks_per_job
    }

    async fn dispatch(&self, job: &Job) -> Result<DispatchOutcome> {
        if self.workers.is_empty() {
            return Err(SparrowError::NoWorkersAvailable);
        }

        let mut outcome = DispatchOutcome::default();
        let loads = self.probe_all(&mut outcome).await;
        tracing::debug!(job = job.index, ?loads, "Probe round complete");
        let ranking = rank_by_load(loads);

        let request = Request::Assign {
            duration_ms: job.duration_ms,
            origin: Some(self.scheduler_addr.clone()),
        };
        let assign = request.to_string();

        for task in 0..job.task_count {
            let idx = ranking[task % ranking.len()];
            let endpoint = &self.workers[idx];
            outcome.record_rpc(&request);
            outcome.placements.push(idx);

            match self.transport.call(endpoint, &assign).await {
                Ok(reply) if Reply::parse(&reply) == Some(Reply::Ok) => {}
                Ok(reply) => {
                    outcome.failed_rpcs += 1;
                    tracing::warn!(worker = %endpoint, task, reply = %reply, "Unexpected ASSIGN reply");
                }
                Err(e) => {
                    outcome.failed_rpcs += 1;
                    tracing::warn!(worker = %endpoint, task, error = %e, "ASSIGN failed");
                }
            }
        }

        tracing::debug!(
            job = job.index,
            placements = ?outcome.placements,
            probes = outcome.rpcs.probes,
            assigns = outcome.rpcs.assigns,
            "Job placed"
        );
        Ok(outcome)
    }
}
