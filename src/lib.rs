pub mod config;
pub mod error;
pub mod protocol;
pub mod scheduler;
pub mod stats;
pub mod transport;
pub mod worker;
