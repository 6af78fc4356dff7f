use teleinfo_transport::TransportError;

/// Errors that can occur while pulling a tag/value pair off the line.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The device read failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A frame arrived but its checksum byte does not match its content.
    #[error("checksum mismatch in frame \"{frame}\"")]
    Checksum { frame: String },

    /// The frame is too short to hold a tag and a value.
    #[error("malformed frame ({tokens} field tokens, need tag and value)")]
    Malformed { tokens: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
