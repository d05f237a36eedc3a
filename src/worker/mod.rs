//! Worker side of the experiment: a queue-length counter, an executor that
//! simulates work, and the line-protocol endpoint in front of them.
//!
//! # Components
//!
//! - [`QueueState`]: atomic count of execution records in flight
//! - [`TaskExecutor`]: spawns detached execution records that sleep for the
//!   task duration, then decrement the count
//! - [`WorkerServer`]: accepts connections, answers one request each
//!
//! # Cancellation
//!
//! `CANCEL` is acknowledged but stops nothing. Every accepted `ASSIGN` or
//! `REQUEST` runs to completion.

pub mod executor;
pub mod queue;
pub mod server;

pub use executor::TaskExecutor;
pub use queue::QueueState;
pub use server::WorkerServer;
