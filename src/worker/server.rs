use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use crate::config::WorkerConfig;
use crate::error::Result;
use crate::protocol::{Reply, Request, MAX_LINE_LEN};
use crate::worker::executor::TaskExecutor;
use crate::worker::queue::QueueState;

/// Line-protocol endpoint in front of a worker's queue model.
pub struct WorkerServer {
    listener: TcpListener,
    executor: TaskExecutor,
}

impl WorkerServer {
    pub async fn bind(config: &WorkerConfig) -> Result<Self> {
        let listener = TcpListener::bind(config.listen_addr).await?;
        Ok(Self {
            listener,
            executor: TaskExecutor::new(Arc::new(QueueState::new())),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Shared handle to the queue length, for observation.
    pub fn queue(&self) -> Arc<QueueState> {
        self.executor.queue().clone()
    }

    /// Accept connections forever, one spawned task per connection.
    pub async fn run(self) -> Result<()> {
        let addr = self.local_addr()?;
        tracing::info!(addr = %addr, "Worker listening");

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let executor = self.executor.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, &executor).await {
                            tracing::warn!(peer = %peer, error = %e, "Connection error");
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Accept failed");
                }
            }
        }
    }
}

/// Read one request line, answer it, and close.
///
/// Only the first [`MAX_LINE_LEN`] bytes of the line are interpreted; the
/// remainder is read and discarded.
async fn handle_connection(stream: TcpStream, executor: &TaskExecutor) -> std::io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let mut buf = Vec::with_capacity(128);
    (&mut reader)
        .take(MAX_LINE_LEN as u64)
        .read_until(b'\n', &mut buf)
        .await?;
    if buf.last() != Some(&b'\n') && buf.len() == MAX_LINE_LEN {
        tracing::debug!(limit = MAX_LINE_LEN, "Request line truncated");
        discard_rest_of_line(&mut reader).await?;
    }

    let line = String::from_utf8_lossy(&buf);
    if let Some(reply) = handle_line(&line, executor) {
        write_half
            .write_all(format!("{}\n", reply).as_bytes())
            .await?;
    }
    write_half.shutdown().await
}

/// Consume input up to and including the next newline, or to EOF.
async fn discard_rest_of_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> std::io::Result<()> {
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(());
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                reader.consume(pos + 1);
                return Ok(());
            }
            None => {
                let len = available.len();
                reader.consume(len);
            }
        }
    }
}

/// Apply one request line to the queue model and produce the reply.
///
/// Unknown commands produce no reply; the caller just closes the connection.
pub fn handle_line(line: &str, executor: &TaskExecutor) -> Option<Reply> {
    let Some(request) = Request::parse(line) else {
        tracing::debug!(line, "Unknown command, dropping");
        return None;
    };
    tracing::debug!(request = %request, "Request received");

    let reply = match request {
        Request::Probe => Reply::Queue(executor.queue().len()),
        Request::Assign { duration_ms, .. } => {
            executor.submit(duration_ms);
            Reply::Ok
        }
        Request::Request { duration_ms } => {
            executor.submit(duration_ms);
            Reply::Start
        }
        Request::Cancel => Reply::Cancelled,
    };
    Some(reply)
}
