use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};

use crate::domain::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportFailure};

// Thin wrapper around reqwest implementing the transport port.
#[derive(Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Delete => Method::DELETE,
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn perform(&self, request: &HttpRequest) -> Result<HttpResponse, TransportFailure> {
        let mut builder = self
            .http
            .request(method(request.method()), request.url().clone());
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body() {
            builder = builder.body(body.to_vec());
        }

        let res = builder
            .send()
            .await
            .map_err(|err| TransportFailure::Connection(err.to_string()))?;
        let status = res.status().as_u16();

        // Any status is handed back; mapping to errors happens in the dispatcher.
        let body = res
            .bytes()
            .await
            .map_err(|err| TransportFailure::Connection(err.to_string()))?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}
