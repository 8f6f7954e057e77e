use std::fmt;

// Error taxonomy shared by every client workflow.
// Clone + PartialEq so failures can travel on broadcast channels and be asserted in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    // Local request construction failed (bad host/path); never sent.
    InvalidRequest(String),
    // Server answered with a status outside [200, 300).
    HttpStatus(u16),
    // Connectivity-layer failure reported by the transport.
    Transport(String),
    // Transport finished without a response or an error.
    UnknownTransport,
    // Body could not be decoded into the expected payload.
    Decoding(String),
    // OAuth code already requested and not yet completed.
    DuplicateRequest,
    // No access token is stored.
    MissingToken,
    // A newer call superseded this one.
    Cancelled,
    // Token store failed to read or write.
    Storage(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::InvalidRequest(reason) => write!(f, "invalid request: {reason}"),
            ClientError::HttpStatus(code) => {
                write!(f, "http request failed with status code {code}")
            }
            ClientError::Transport(err) => write!(f, "transport error: {err}"),
            ClientError::UnknownTransport => write!(f, "transport finished without a response"),
            ClientError::Decoding(err) => write!(f, "response decode error: {err}"),
            ClientError::DuplicateRequest => write!(f, "request for this code is already in flight"),
            ClientError::MissingToken => write!(f, "no access token stored"),
            ClientError::Cancelled => write!(f, "request superseded by a newer call"),
            ClientError::Storage(err) => write!(f, "token storage error: {err}"),
        }
    }
}

impl std::error::Error for ClientError {}
