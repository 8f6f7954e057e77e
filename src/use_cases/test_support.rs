use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::domain::{
    HttpRequest, HttpResponse, HttpTransport, TokenStore, TransportFailure,
};

type Scripted = Result<HttpResponse, TransportFailure>;

// Transport fake that records every request and answers from a queue.
// With a gate, each request waits for a released permit before answering,
// which lets tests observe services while a request is in flight.
pub(crate) struct ScriptedTransport {
    requests: Mutex<Vec<HttpRequest>>,
    responses: Mutex<VecDeque<Scripted>>,
    gate: Option<Semaphore>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            responses: Mutex::new(VecDeque::new()),
            gate: None,
        })
    }

    pub(crate) fn gated() -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            responses: Mutex::new(VecDeque::new()),
            gate: Some(Semaphore::new(0)),
        })
    }

    pub(crate) fn respond(&self, status: u16, body: impl Into<String>) {
        let response = HttpResponse {
            status,
            body: body.into().into_bytes(),
        };
        self.responses
            .lock()
            .expect("responses mutex poisoned")
            .push_back(Ok(response));
    }

    pub(crate) fn fail(&self, failure: TransportFailure) {
        self.responses
            .lock()
            .expect("responses mutex poisoned")
            .push_back(Err(failure));
    }

    // Let `count` gated requests answer.
    pub(crate) fn release(&self, count: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(count);
        }
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().expect("requests mutex poisoned").len()
    }

    pub(crate) fn request(&self, index: usize) -> HttpRequest {
        self.requests.lock().expect("requests mutex poisoned")[index].clone()
    }

    // Yield to spawned tasks until `count` requests have been recorded.
    pub(crate) async fn wait_for_requests(&self, count: usize) {
        for _ in 0..500 {
            if self.request_count() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!("expected {count} requests, saw {}", self.request_count());
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn perform(&self, request: &HttpRequest) -> Result<HttpResponse, TransportFailure> {
        self.requests
            .lock()
            .expect("requests mutex poisoned")
            .push(request.clone());

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }

        self.responses
            .lock()
            .expect("responses mutex poisoned")
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted response for {}", request.url()))
    }
}

#[derive(Default)]
pub(crate) struct RecordingTokenStore {
    token: Mutex<Option<String>>,
    pub(crate) fail_writes: bool,
}

impl RecordingTokenStore {
    pub(crate) fn with_token(token: &str) -> Arc<Self> {
        Arc::new(Self {
            token: Mutex::new(Some(token.to_string())),
            fail_writes: false,
        })
    }

    pub(crate) fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn failing() -> Arc<Self> {
        Arc::new(Self {
            token: Mutex::new(None),
            fail_writes: true,
        })
    }

    pub(crate) fn current(&self) -> Option<String> {
        self.token.lock().expect("token mutex poisoned").clone()
    }
}

impl TokenStore for RecordingTokenStore {
    fn get(&self) -> Result<Option<String>, String> {
        Ok(self.current())
    }

    fn set(&self, token: &str) -> Result<(), String> {
        if self.fail_writes {
            return Err("keychain unavailable".to_string());
        }
        *self.token.lock().expect("token mutex poisoned") = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), String> {
        if self.fail_writes {
            return Err("keychain unavailable".to_string());
        }
        *self.token.lock().expect("token mutex poisoned") = None;
        Ok(())
    }
}

// JSON for one element of the `/photos` array.
pub(crate) fn photo_json(id: &str, liked: bool) -> String {
    format!(
        r#"{{"id":"{id}","created_at":"2024-01-0{day}T10:00:00Z","width":1080,"height":720,"liked_by_user":{liked},"description":null,"urls":{{"thumb":"https://images.example/{id}/thumb","full":"https://images.example/{id}/full"}}}}"#,
        day = 1 + id.len() % 9,
    )
}

// JSON array for the given ids, none liked.
pub(crate) fn page_json<S: AsRef<str>>(ids: &[S]) -> String {
    let items: Vec<String> = ids.iter().map(|id| photo_json(id.as_ref(), false)).collect();
    format!("[{}]", items.join(","))
}

pub(crate) fn ids(prefix: &str, range: std::ops::RangeInclusive<u32>) -> Vec<String> {
    range.map(|n| format!("{prefix}{n}")).collect()
}
