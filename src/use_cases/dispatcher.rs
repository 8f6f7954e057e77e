use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::domain::{ClientError, HttpRequest, HttpTransport, TransportFailure};

// Executes requests through the transport port and maps every outcome
// into the client error taxonomy.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn HttpTransport>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    #[tracing::instrument(
        name = "dispatch",
        skip_all,
        fields(method = request.method().as_str(), path = request.url().path())
    )]
    pub async fn fetch_data(&self, request: &HttpRequest) -> Result<Vec<u8>, ClientError> {
        let response = self
            .transport
            .perform(request)
            .await
            .map_err(|failure| match failure {
                TransportFailure::Connection(message) => {
                    tracing::warn!(error = %message, "transport failure");
                    ClientError::Transport(message)
                }
                TransportFailure::Empty => {
                    tracing::warn!("transport returned neither response nor error");
                    ClientError::UnknownTransport
                }
            })?;

        if !(200..300).contains(&response.status) {
            tracing::warn!(status = response.status, "unexpected http status");
            return Err(ClientError::HttpStatus(response.status));
        }

        tracing::debug!(status = response.status, bytes = response.body.len(), "response received");
        Ok(response.body)
    }

    pub async fn fetch_object<T: DeserializeOwned>(
        &self,
        request: &HttpRequest,
    ) -> Result<T, ClientError> {
        let body = self.fetch_data(request).await?;
        serde_json::from_slice(&body).map_err(|err| {
            tracing::warn!(error = %err, "failed to decode response body");
            ClientError::Decoding(err.to_string())
        })
    }
}
