use std::io;
use thiserror::Error;

/// A traceroute result.
pub type Result<T> = std::result::Result<T, TraceError>;

/// A traceroute error.
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("could not resolve {host}: {source}")]
    Resolution { host: String, source: io::Error },
    #[error("failed to open ICMP socket (raw sockets usually need root or CAP_NET_RAW): {0}")]
    Socket(io::Error),
    #[error("failed to send probe: {0}")]
    Send(io::Error),
    #[error("failed to receive reply: {0}")]
    Receive(io::Error),
    #[error("failed to start resolver runtime: {0}")]
    Runtime(io::Error),
    #[error("failed to write output: {0}")]
    Output(io::Error),
}
