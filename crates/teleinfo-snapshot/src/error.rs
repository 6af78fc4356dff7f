use std::net::SocketAddr;

/// Errors raised while publishing a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The outgoing socket could not be set up.
    #[error("failed to prepare broadcast socket: {0}")]
    Bind(std::io::Error),

    /// The snapshot could not be serialized.
    #[error("snapshot encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// The datagram could not be sent.
    #[error("failed to send to {target}: {source}")]
    Send {
        target: SocketAddr,
        source: std::io::Error,
    },

    /// A sink other than the network failed (stdout, file).
    #[error("publication I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PublishError>;
