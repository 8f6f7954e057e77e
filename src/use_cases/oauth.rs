use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::AbortHandle;

use crate::domain::{ClientError, OAuthTokenResponseBody, TokenStore};
use crate::use_cases::dispatcher::Dispatcher;
use crate::use_cases::endpoints::Endpoints;

#[derive(Default)]
struct ExchangeState {
    last_requested_code: Option<String>,
    pending: Option<AbortHandle>,
    // Bumped per accepted exchange so a superseded call never clears a newer guard.
    generation: u64,
}

// Exchanges authorization codes for access tokens, one code in flight at a time.
pub struct OAuthService {
    dispatcher: Dispatcher,
    endpoints: Endpoints,
    tokens: Arc<dyn TokenStore>,
    state: Mutex<ExchangeState>,
}

impl OAuthService {
    pub fn new(dispatcher: Dispatcher, endpoints: Endpoints, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            dispatcher,
            endpoints,
            tokens,
            state: Mutex::new(ExchangeState::default()),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ExchangeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[tracing::instrument(name = "oauth_exchange", skip_all)]
    pub async fn exchange(&self, code: &str) -> Result<String, ClientError> {
        let generation = {
            let mut state = self.lock_state();
            if state.last_requested_code.as_deref() == Some(code) {
                tracing::warn!("duplicate authorization code rejected");
                return Err(ClientError::DuplicateRequest);
            }
            if let Some(pending) = state.pending.take() {
                tracing::debug!("aborting exchange for a superseded code");
                pending.abort();
            }
            state.last_requested_code = Some(code.to_string());
            state.generation += 1;
            state.generation
        };
        // Clears the guard on every exit path, including a dropped future.
        let _guard = ExchangeGuard {
            service: self,
            generation,
        };

        let request = self.endpoints.token_exchange(code)?;

        let dispatcher = self.dispatcher.clone();
        let task = tokio::spawn(async move {
            dispatcher
                .fetch_object::<OAuthTokenResponseBody>(&request)
                .await
        });
        {
            let mut state = self.lock_state();
            // A newer code may have slipped in while the request was being built.
            if state.generation == generation {
                state.pending = Some(task.abort_handle());
            } else {
                task.abort();
            }
        }

        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => {
                tracing::info!("token exchange cancelled");
                return Err(ClientError::Cancelled);
            }
        };

        let body = outcome.inspect_err(|err| {
            tracing::error!(error = %err, "token exchange failed");
        })?;
        self.tokens.set(&body.access_token).map_err(|err| {
            tracing::error!(error = %err, "failed to persist access token");
            ClientError::Storage(err)
        })?;

        tracing::info!(token_type = %body.token_type, scope = %body.scope, "access token issued");
        Ok(body.access_token)
    }
}

struct ExchangeGuard<'a> {
    service: &'a OAuthService,
    generation: u64,
}

impl Drop for ExchangeGuard<'_> {
    // Release the guard so the same code may be retried, unless a newer code owns it.
    fn drop(&mut self) {
        let mut state = self.service.lock_state();
        if state.generation == self.generation {
            if let Some(pending) = state.pending.take() {
                pending.abort();
            }
            state.last_requested_code = None;
        }
    }
}
