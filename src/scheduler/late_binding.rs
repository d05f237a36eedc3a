use std::sync::Arc;

use async_trait::async_trait;

use crate::config::WorkerEndpoint;
use crate::error::{Result, SparrowError};
use crate::protocol::{Reply, Request};
use crate::scheduler::job::Job;
use crate::scheduler::policy::{DispatchOutcome, DispatchPolicy};
use crate::transport::Transport;

/// Late binding with proactive cancellation.
///
/// Sends `REQUEST` to every worker, then `CANCEL` to every worker, without
/// looking at who replied first. Workers start executing on `REQUEST` and
/// ignore `CANCEL`, so every worker in the pool runs the task.
pub struct LateBindingWithCancel {
    workers: Vec<WorkerEndpoint>,
    transport: Arc<dyn Transport>,
}

impl LateBindingWithCancel {
    pub fn new(workers: Vec<WorkerEndpoint>, transport: Arc<dyn Transport>) -> Self {
        Self { workers, transport }
    }

    /// Send `request` to every worker. Failures are counted and skipped.
    async fn fan_out(&self, request: &Request, expected: Reply, outcome: &mut DispatchOutcome) {
        let message = request.to_string();
        for endpoint in &self.workers {
            outcome.record_rpc(request);
            match self.transport.call(endpoint, &message).await {
                Ok(reply) if Reply::parse(&reply) == Some(expected) => {}
                Ok(reply) => {
                    outcome.failed_rpcs += 1;
                    tracing::warn!(worker = %endpoint, request = %message, reply = %reply, "Unexpected reply");
                }
                Err(e) => {
                    outcome.failed_rpcs += 1;
                    tracing::warn!(worker = %endpoint, request = %message, error = %e, "RPC failed");
                }
            }
        }
    }
}

#[async_trait]
impl DispatchPolicy for LateBindingWithCancel {
    fn name(&self) -> &'static str {
        "latepro"
    }

    fn tasks_per_job(&self) -> usize {
        1
    }

    async fn dispatch(&self, job: &Job) -> Result<DispatchOutcome> {
        if self.workers.is_empty() {
            return Err(SparrowError::NoWorkersAvailable);
        }

        let mut outcome = DispatchOutcome::default();

        let request = Request::Request {
            duration_ms: job.duration_ms,
        };
        self.fan_out(&request, Reply::Start, &mut outcome).await;
        outcome.placements = (0..self.workers.len()).collect();

        // TODO: cancel only the workers that lost the race once CANCEL stops a running record
        self.fan_out(&Request::Cancel, Reply::Cancelled, &mut outcome)
            .await;

        tracing::debug!(
            job = job.index,
            requests = outcome.rpcs.requests,
            cancels = outcome.rpcs.cancels,
            failed = outcome.failed_rpcs,
            "Job requested and cancelled on all workers"
        );
        Ok(outcome)
    }
}
