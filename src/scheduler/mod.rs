//! Scheduler side: the two dispatch policies and the loop that drives them.
//!
//! - [`BatchSampling`]: probe every worker, rank by queue length, assign
//! - [`LateBindingWithCancel`]: request on every worker, then cancel on every worker
//! - [`Runner`]: feeds synthetic [`Job`]s to a policy one at a time and times them

pub mod batch;
pub mod job;
pub mod late_binding;
pub mod policy;
pub mod runner;

pub use batch::{BatchSampling, UNREACHABLE_LOAD};
pub use job::{Bimodal, DurationDistribution, FixedSequence, Job};
pub use late_binding::LateBindingWithCancel;
pub use policy::{build_policy, DispatchOutcome, DispatchPolicy};
pub use runner::Runner;
