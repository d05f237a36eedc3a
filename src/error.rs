use thiserror::Error;

/// Failure of a single request/reply exchange with a worker.
///
/// Dispatch policies never propagate these: batch sampling turns them into
/// the worst-load sentinel and late binding ignores them per worker.
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error talking to {addr}: {source}")]
    Io {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Peer {addr} closed without a reply")]
    EmptyReply { addr: String },

    #[error("Unexpected reply from {addr}: {reply:?}")]
    UnexpectedReply { addr: String, reply: String },
}

#[derive(Error, Debug)]
pub enum SparrowError {
    #[error("No workers available")]
    NoWorkersAvailable,

    #[error("Invalid worker address: {0}")]
    InvalidWorkerAddr(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SparrowError>;
