use std::net::SocketAddr;

use crate::protocol::ProtocolError;

/// Errors surfaced by the bridge
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Failed to listen on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Failed to publish: {0}")]
    Publish(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
