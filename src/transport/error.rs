use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("handshake failed: {message}")]
    HandshakeFailed { message: String },
    #[error("transport not connected")]
    NotConnected,
    #[error("outbound queue rejected frame")]
    Send,
    #[error("failed to encode wire message")]
    Encode {
        #[source]
        source: serde_json::Error,
    },
}
