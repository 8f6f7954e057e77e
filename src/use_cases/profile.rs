use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::AbortHandle;

use crate::domain::{ClientError, Profile, ProfileResult, TokenStore, UserResult};
use crate::use_cases::dispatcher::Dispatcher;
use crate::use_cases::endpoints::Endpoints;

// Most recent in-flight fetch of one kind.
#[derive(Default)]
struct Latest {
    pending: Option<AbortHandle>,
    generation: u64,
}

impl Latest {
    // Track `handle` as the current fetch, aborting whatever it replaces.
    fn start(&mut self, handle: AbortHandle) -> u64 {
        if let Some(previous) = self.pending.replace(handle) {
            tracing::debug!("aborting superseded fetch");
            previous.abort();
        }
        self.generation += 1;
        self.generation
    }

    // True when `generation` is still the current fetch; only then may it publish.
    fn finish(&mut self, generation: u64) -> bool {
        if self.generation != generation {
            return false;
        }
        self.pending = None;
        true
    }

    // Abort the current fetch and make any already-completed one stale.
    fn invalidate(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
        self.generation += 1;
    }
}

#[derive(Default)]
struct ProfileState {
    profile: Option<Profile>,
    profile_fetch: Latest,
    image_fetch: Latest,
}

// Fetches the signed-in user's profile and avatar, caching the last success.
// A new fetch aborts the previous one of the same kind (last call wins).
pub struct ProfileService {
    dispatcher: Dispatcher,
    endpoints: Endpoints,
    tokens: Arc<dyn TokenStore>,
    state: Mutex<ProfileState>,
    avatar: watch::Sender<Option<String>>,
}

impl ProfileService {
    pub fn new(dispatcher: Dispatcher, endpoints: Endpoints, tokens: Arc<dyn TokenStore>) -> Self {
        let (avatar, _) = watch::channel(None);
        Self {
            dispatcher,
            endpoints,
            tokens,
            state: Mutex::new(ProfileState::default()),
            avatar,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ProfileState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn profile(&self) -> Option<Profile> {
        self.lock_state().profile.clone()
    }

    pub fn avatar_url(&self) -> Option<String> {
        self.avatar.borrow().clone()
    }

    // Observers are notified whenever the avatar URL changes.
    pub fn subscribe_avatar(&self) -> watch::Receiver<Option<String>> {
        self.avatar.subscribe()
    }

    #[tracing::instrument(name = "fetch_profile", skip_all)]
    pub async fn fetch_profile(&self, token: &str) -> Result<Profile, ClientError> {
        let request = self.endpoints.me(token)?;
        let dispatcher = self.dispatcher.clone();
        let task = tokio::spawn(async move { dispatcher.fetch_object::<ProfileResult>(&request).await });

        let generation = self.lock_state().profile_fetch.start(task.abort_handle());

        let result = match task.await {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => return Err(ClientError::Cancelled),
        };

        let mut state = self.lock_state();
        if !state.profile_fetch.finish(generation) {
            tracing::debug!("discarding superseded profile");
            return Err(ClientError::Cancelled);
        }
        let profile = Profile::from(result.inspect_err(|err| {
            tracing::error!(error = %err, "profile fetch failed");
        })?);
        state.profile = Some(profile.clone());

        tracing::info!(username = %profile.username, "profile loaded");
        Ok(profile)
    }

    #[tracing::instrument(name = "fetch_profile_image", skip_all, fields(username = %username))]
    pub async fn fetch_profile_image_url(&self, username: &str) -> Result<String, ClientError> {
        let token = self
            .tokens
            .get()
            .map_err(ClientError::Storage)?
            .ok_or(ClientError::MissingToken)?;
        let request = self.endpoints.user(&token, username)?;
        let dispatcher = self.dispatcher.clone();
        let task = tokio::spawn(async move { dispatcher.fetch_object::<UserResult>(&request).await });

        let generation = self.lock_state().image_fetch.start(task.abort_handle());

        let result = match task.await {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => return Err(ClientError::Cancelled),
        };

        // Publish under the lock so a concurrent reset or newer fetch cannot interleave.
        let mut state = self.lock_state();
        if !state.image_fetch.finish(generation) {
            tracing::debug!("discarding superseded profile image");
            return Err(ClientError::Cancelled);
        }
        let user = result.inspect_err(|err| {
            tracing::error!(error = %err, "profile image fetch failed");
        })?;

        let url = user.profile_image.small;
        self.avatar.send_replace(Some(url.clone()));
        Ok(url)
    }

    // Forget the cached profile and avatar and abort anything in flight.
    pub fn reset(&self) {
        let mut state = self.lock_state();
        state.profile_fetch.invalidate();
        state.image_fetch.invalidate();
        state.profile = None;
        self.avatar.send_replace(None);
    }
}
