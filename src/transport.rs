use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_stream::StreamExt;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};

use crate::config::WorkerEndpoint;
use crate::error::RpcError;
use crate::protocol::MAX_LINE_LEN;

/// Blocking request/reply primitive the dispatch policies are written against.
///
/// One call is one round trip: send a line, receive a line or a failure.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(&self, endpoint: &WorkerEndpoint, message: &str) -> Result<String, RpcError>;
}

/// Opens a fresh TCP connection per call. No pooling, retry or timeout.
#[derive(Debug, Clone, Default)]
pub struct TcpTransport;

impl TcpTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn call(&self, endpoint: &WorkerEndpoint, message: &str) -> Result<String, RpcError> {
        let addr = endpoint.to_string();

        let stream = TcpStream::connect((endpoint.host.as_str(), endpoint.port))
            .await
            .map_err(|source| RpcError::Connect {
                addr: addr.clone(),
                source,
            })?;
        let (read_half, mut write_half) = stream.into_split();

        let mut line = String::with_capacity(message.len() + 1);
        line.push_str(message);
        line.push('\n');
        write_half
            .write_all(line.as_bytes())
            .await
            .map_err(|source| RpcError::Io {
                addr: addr.clone(),
                source,
            })?;

        let mut lines = FramedRead::new(read_half, LinesCodec::new_with_max_length(MAX_LINE_LEN));
        match lines.next().await {
            Some(Ok(reply)) => {
                let reply = reply.trim();
                if reply.is_empty() {
                    Err(RpcError::EmptyReply { addr })
                } else {
                    tracing::trace!(addr = %addr, request = message, reply, "RPC complete");
                    Ok(reply.to_string())
                }
            }
            Some(Err(LinesCodecError::Io(source))) => Err(RpcError::Io { addr, source }),
            Some(Err(LinesCodecError::MaxLineLengthExceeded)) => Err(RpcError::UnexpectedReply {
                addr,
                reply: format!("<line longer than {} bytes>", MAX_LINE_LEN),
            }),
            None => Err(RpcError::EmptyReply { addr }),
        }
    }
}
