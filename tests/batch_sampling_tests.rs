
use std::sync::Arc;

use sparrow_lite::config::WorkerEndpoint;
use sparrow_lite::error::SparrowError;
use sparrow_lite::scheduler::{BatchSampling, DispatchPolicy, Job};
use sparrow_lite::transport::Transport;
use test_harness::{MockTransport, MockWorker};

fn batch(
    transport: Arc<MockTransport>,
    workers: Vec<WorkerEndpoint>,
    tasks: usize,
) -> BatchSampling {
    BatchSampling::new(
        workers,
        transport as Arc<dyn Transport>,
        tasks,
        "10.0.0.1".to_string(),
    )
}

#[tokio::test]
async fn test_selects_unique_least_loaded_worker() {
    let (transport, workers) = MockTransport::with_loads(&[5, 5, 2, 8]);
    let policy = batch(transport.clone(), workers.clone(), 1);

    let outcome = policy.dispatch(&Job::new(0, 30, 1)).await.unwrap();

    assert_eq!(outcome.placements, vec![2]);
    let assigns = transport.calls_for("ASSIGN");
    assert_eq!(assigns.len(), 1);
    assert_eq!(assigns[0].0, workers[2]);
    assert_eq!(assigns[0].1, "ASSIGN 30 10.0.0.1");
}

#[tokio::test]
async fn test_ties_break_by_pool_order() {
    let (transport, workers) = MockTransport::with_loads(&[3, 3, 7]);
    let policy = batch(transport.clone(), workers.clone(), 1);

    let outcome = policy.dispatch(&Job::new(0, 30, 1)).await.unwrap();

    assert_eq!(outcome.placements, vec![0]);
    assert_eq!(transport.calls_for("ASSIGN")[0].0, workers[0]);
}

#[tokio::test]
async fn test_probes_every_worker_in_order_before_assigning() {
    let (transport, workers) = MockTransport::with_loads(&[1, 0, 2]);
    let policy = batch(transport.clone(), workers.clone(), 2);

    policy.dispatch(&Job::new(0, 400, 2)).await.unwrap();

    let calls = transport.calls();
    let probed: Vec<_> = calls[..3].iter().map(|(ep, _)| ep.clone()).collect();
    assert_eq!(probed, workers);
    assert!(calls[..3].iter().all(|(_, msg)| msg == "PROBE"));
    assert!(calls[3..].iter().all(|(_, msg)| msg == "ASSIGN 400 10.0.0.1"));
    // least loaded first, then the next
    assert_eq!(calls[3].0, workers[1]);
    assert_eq!(calls[4].0, workers[0]);
}

#[tokio::test]
async fn test_more_tasks_than_workers_wraps_around() {
    let (transport, workers) = MockTransport::with_loads(&[4, 1]);
    let policy = batch(transport.clone(), workers.clone(), 3);

    let outcome = policy.dispatch(&Job::new(0, 30, 3)).await.unwrap();

    let assigns = transport.calls_for("ASSIGN");
    assert_eq!(assigns.len(), 3);
    assert_eq!(outcome.placements, vec![1, 0, 1]);
    assert_eq!(assigns[0].0, assigns[2].0);
    assert_eq!(assigns[0].0, workers[1]);
}

#[tokio::test]
async fn test_unreachable_worker_gets_sentinel_load() {
    let (transport, workers) = MockTransport::with_workers(vec![
        MockWorker::Unreachable,
        MockWorker::Load(50),
    ]);
    let policy = batch(transport.clone(), workers.clone(), 1);

    let outcome = policy.dispatch(&Job::new(0, 30, 1)).await.unwrap();

    // 50 < 9999, so the reachable worker wins
    assert_eq!(outcome.placements, vec![1]);
    assert_eq!(outcome.failed_rpcs, 1);
    assert_eq!(outcome.rpc_count, 3);
}

#[tokio::test]
async fn test_unreachable_worker_still_eligible_when_wrapping() {
    let (transport, workers) = MockTransport::with_workers(vec![
        MockWorker::Unreachable,
        MockWorker::Load(0),
    ]);
    let policy = batch(transport.clone(), workers, 2);

    let outcome = policy.dispatch(&Job::new(0, 30, 2)).await.unwrap();

    assert_eq!(outcome.placements, vec![1, 0]);
    // one failed probe, one failed assign
    assert_eq!(outcome.failed_rpcs, 2);
}

#[tokio::test]
async fn test_all_workers_failing_picks_first_worker() {
    let (transport, workers) = MockTransport::with_workers(vec![
        MockWorker::Unreachable,
        MockWorker::Silent,
        MockWorker::Unreachable,
    ]);
    let policy = batch(transport.clone(), workers.clone(), 1);

    let outcome = policy.dispatch(&Job::new(0, 30, 1)).await.unwrap();

    assert_eq!(outcome.placements, vec![0]);
    assert_eq!(transport.calls_for("ASSIGN")[0].0, workers[0]);
    assert_eq!(outcome.rpc_count, 4);
}

#[tokio::test]
async fn test_garbled_probe_reply_falls_back_to_sentinel() {
    let (transport, workers) = MockTransport::with_workers(vec![
        MockWorker::GarbledProbe("Q lots".to_string()),
        MockWorker::Load(9000),
        MockWorker::GarbledProbe("HELLO".to_string()),
    ]);
    let policy = batch(transport.clone(), workers, 1);

    let outcome = policy.dispatch(&Job::new(0, 30, 1)).await.unwrap();

    assert_eq!(outcome.placements, vec![1]);
    assert_eq!(outcome.failed_rpcs, 2);
}

#[tokio::test]
async fn test_rpc_count_is_workers_plus_tasks() {
    for (workers, tasks) in [(1, 1), (2, 3), (4, 3), (5, 10)] {
        let loads: Vec<u64> = (0..workers as u64).collect();
        let (transport, endpoints) = MockTransport::with_loads(&loads);
        let policy = batch(transport.clone(), endpoints, tasks);

        let outcome = policy.dispatch(&Job::new(0, 30, tasks)).await.unwrap();

        assert_eq!(outcome.rpc_count, workers + tasks);
        assert_eq!(transport.call_count(), workers + tasks);
        assert_eq!(transport.calls_for("PROBE").len(), workers);
        assert_eq!(transport.calls_for("ASSIGN").len(), tasks);
        assert_eq!(outcome.rpcs.probes, workers);
        assert_eq!(outcome.rpcs.assigns, tasks);
        assert_eq!(outcome.rpcs.requests + outcome.rpcs.cancels, 0);
        assert_eq!(outcome.failed_rpcs, 0);
    }
}

#[tokio::test]
async fn test_empty_pool_is_an_error() {
    let (transport, _) = MockTransport::with_loads(&[]);
    let policy = batch(transport.clone(), Vec::new(), 1);

    let result = policy.dispatch(&Job::new(0, 30, 1)).await;

    assert!(matches!(result, Err(SparrowError::NoWorkersAvailable)));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_tasks_per_job_reports_configured_count() {
    let (transport, workers) = MockTransport::with_loads(&[0]);
    let policy = batch(transport, workers, 3);
    assert_eq!(policy.tasks_per_job(), 3);
    assert_eq!(policy.name(), "batch");
}
