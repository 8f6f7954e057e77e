use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;

use crate::domain::{ClientError, Photo, PhotoLikeResult, PhotoResult, TokenStore};
use crate::use_cases::dispatcher::Dispatcher;
use crate::use_cases::endpoints::Endpoints;

const EVENT_CHANNEL_CAPACITY: usize = 64;

// Change signals raised by the feed. Observers subscribe to a broadcast
// channel and unsubscribe by dropping their receiver.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    // Photos were appended; carries the counts before and after the merge.
    PhotosChanged { old_count: usize, new_count: usize },
    // The photo at `index` was replaced with the server's like state.
    PhotoUpdated { index: usize },
    // A page fetch failed; the cursor did not move.
    FetchFailed(ClientError),
}

// Outcome of a single `fetch_next_page` call.
#[derive(Debug, Clone, PartialEq)]
pub enum PageFetch {
    // Another fetch was already running; nothing was requested.
    AlreadyInFlight,
    Loaded {
        page: u32,
        old_count: usize,
        new_count: usize,
    },
    Failed(ClientError),
    // The feed was reset while the page was loading; the page was dropped.
    Discarded,
}

#[derive(Default)]
struct FeedState {
    photos: Vec<Photo>,
    known_ids: HashSet<String>,
    last_loaded_page: Option<u32>,
    fetch_in_progress: bool,
    // Bumped on reset so pages requested by a previous session are dropped.
    session: u64,
}

/// Paginated photo feed with like toggling.
///
/// Photos accumulate in arrival order and are unique by id. At most one page
/// fetch runs at a time; extra calls while one is in flight are ignored.
/// The page cursor only advances after a page has been merged.
pub struct PhotoFeedService {
    dispatcher: Dispatcher,
    endpoints: Endpoints,
    tokens: Arc<dyn TokenStore>,
    state: Mutex<FeedState>,
    events: broadcast::Sender<FeedEvent>,
}

// Clears `fetch_in_progress` on every exit path, including a dropped future.
struct FetchGuard<'a> {
    state: &'a Mutex<FeedState>,
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .fetch_in_progress = false;
    }
}

impl PhotoFeedService {
    pub fn new(dispatcher: Dispatcher, endpoints: Endpoints, tokens: Arc<dyn TokenStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            dispatcher,
            endpoints,
            tokens,
            state: Mutex::new(FeedState::default()),
            events,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.events.subscribe()
    }

    pub fn photos(&self) -> Vec<Photo> {
        self.lock_state().photos.clone()
    }

    pub fn photo(&self, index: usize) -> Option<Photo> {
        self.lock_state().photos.get(index).cloned()
    }

    pub fn photos_count(&self) -> usize {
        self.lock_state().photos.len()
    }

    pub fn last_loaded_page(&self) -> Option<u32> {
        self.lock_state().last_loaded_page
    }

    pub fn is_fetching(&self) -> bool {
        self.lock_state().fetch_in_progress
    }

    fn emit(&self, event: FeedEvent) {
        // No subscribers is fine; the state is still readable.
        let _ = self.events.send(event);
    }

    fn token(&self) -> Result<String, ClientError> {
        self.tokens
            .get()
            .map_err(ClientError::Storage)?
            .ok_or(ClientError::MissingToken)
    }

    #[tracing::instrument(name = "fetch_next_page", skip_all)]
    pub async fn fetch_next_page(&self) -> PageFetch {
        let (page, session) = {
            let mut state = self.lock_state();
            if state.fetch_in_progress {
                tracing::debug!("page fetch already in flight, ignoring");
                return PageFetch::AlreadyInFlight;
            }
            state.fetch_in_progress = true;
            (state.last_loaded_page.unwrap_or(0) + 1, state.session)
        };
        let _guard = FetchGuard { state: &self.state };
        tracing::debug!(page, "requesting page");

        let result = self.load_page(page).await;

        let mut state = self.lock_state();
        if state.session != session {
            tracing::debug!(page, "feed reset while loading, dropping page");
            return PageFetch::Discarded;
        }

        let results = match result {
            Ok(results) => results,
            Err(err) => {
                drop(state);
                tracing::error!(page, error = %err, "page fetch failed");
                self.emit(FeedEvent::FetchFailed(err.clone()));
                return PageFetch::Failed(err);
            }
        };

        let received = results.len();
        let old_count = state.photos.len();
        for item in results {
            if state.known_ids.insert(item.id.clone()) {
                state.photos.push(Photo::from(item));
            }
        }
        let new_count = state.photos.len();
        state.last_loaded_page = Some(page);
        drop(state);

        tracing::info!(page, received, added = new_count - old_count, "page merged");
        if new_count != old_count {
            self.emit(FeedEvent::PhotosChanged {
                old_count,
                new_count,
            });
        }

        PageFetch::Loaded {
            page,
            old_count,
            new_count,
        }
    }

    async fn load_page(&self, page: u32) -> Result<Vec<PhotoResult>, ClientError> {
        let token = self.token()?;
        let request = self.endpoints.photos_page(&token, page)?;
        self.dispatcher.fetch_object(&request).await
    }

    // Ask the server to like or unlike a photo, then adopt the server's answer.
    #[tracing::instrument(name = "change_like", skip_all, fields(photo_id = %photo_id, liked = liked))]
    pub async fn change_like(&self, photo_id: &str, liked: bool) -> Result<(), ClientError> {
        let token = self.token()?;
        let request = self.endpoints.change_like(&token, photo_id, liked)?;
        let envelope: PhotoLikeResult = self
            .dispatcher
            .fetch_object(&request)
            .await
            .inspect_err(|err| tracing::error!(error = %err, "like change failed"))?;

        let authoritative = envelope.photo;
        let mut state = self.lock_state();
        let Some(index) = state
            .photos
            .iter()
            .position(|photo| photo.id == authoritative.id)
        else {
            tracing::debug!("photo no longer in feed, dropping like update");
            return Ok(());
        };

        let updated = state.photos[index].with_liked(authoritative.liked_by_user);
        if updated.is_liked != liked {
            tracing::warn!(server_liked = updated.is_liked, "server disagreed with requested like state");
        }
        state.photos[index] = updated;
        drop(state);

        self.emit(FeedEvent::PhotoUpdated { index });
        Ok(())
    }

    // Drop every photo and the cursor. Used on logout; no network call.
    pub fn reset(&self) {
        let mut state = self.lock_state();
        state.photos.clear();
        state.known_ids.clear();
        state.last_loaded_page = None;
        state.session += 1;
        tracing::info!("feed reset");
    }
}
