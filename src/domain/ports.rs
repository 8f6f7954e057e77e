use async_trait::async_trait;

use crate::domain::request::HttpRequest;

// Raw response handed back by a transport, before status mapping.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    // Connectivity-layer error (DNS, TLS, reset, timeout).
    Connection(String),
    // The transport completed without a response and without an error.
    Empty,
}

// Port for performing HTTP requests. Use cases depend on this trait,
// not on the reqwest adapter.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn perform(&self, request: &HttpRequest) -> Result<HttpResponse, TransportFailure>;
}

// Port for the persisted access token.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Result<Option<String>, String>;
    fn set(&self, token: &str) -> Result<(), String>;
    fn clear(&self) -> Result<(), String>;
}
