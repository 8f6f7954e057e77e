use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::domain::{ClientError, Photo};
use crate::use_cases::feed::{FeedEvent, PhotoFeedService};

// What a feed screen must be able to render.
pub trait FeedView: Send + Sync {
    // Rows `old_count..new_count` were appended.
    fn update_rows(&self, old_count: usize, new_count: usize);
    fn reload_row(&self, index: usize);
    // A page failed to load; the view may offer a retry.
    fn show_fetch_error(&self, error: &ClientError);
}

// Keeps a view's snapshot of the feed in sync with the service.
// Dropping the presenter unsubscribes it.
pub struct FeedPresenter {
    feed: Arc<PhotoFeedService>,
    photos: Arc<Mutex<Vec<Photo>>>,
    listener: JoinHandle<()>,
}

impl FeedPresenter {
    // Subscribe `view` to feed changes and load the first page.
    pub fn start(feed: Arc<PhotoFeedService>, view: Arc<dyn FeedView>) -> Self {
        let photos = Arc::new(Mutex::new(feed.photos()));
        let mut events = feed.subscribe();

        let listener = tokio::spawn({
            let feed = feed.clone();
            let photos = photos.clone();
            async move {
                loop {
                    match events.recv().await {
                        Ok(FeedEvent::PhotosChanged { .. }) | Err(RecvError::Lagged(_)) => {
                            sync_photos(&feed, &photos, view.as_ref());
                        }
                        Ok(FeedEvent::PhotoUpdated { index }) => {
                            let Some(photo) = feed.photo(index) else {
                                continue;
                            };
                            let replaced = match photos
                                .lock()
                                .unwrap_or_else(PoisonError::into_inner)
                                .get_mut(index)
                            {
                                Some(slot) => {
                                    *slot = photo;
                                    true
                                }
                                None => false,
                            };
                            if replaced {
                                view.reload_row(index);
                            }
                        }
                        Ok(FeedEvent::FetchFailed(error)) => view.show_fetch_error(&error),
                        Err(RecvError::Closed) => break,
                    }
                }
            }
        });

        let presenter = Self {
            feed,
            photos,
            listener,
        };
        presenter.request_next_page();
        presenter
    }

    pub fn photos_count(&self) -> usize {
        self.photos.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn photo(&self, index: usize) -> Option<Photo> {
        self.photos
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(index)
            .cloned()
    }

    // Called as rows become visible; loads more once the last row shows.
    pub fn fetch_next_page_if_needed(&self, index: usize) {
        if index + 1 == self.photos_count() {
            self.request_next_page();
        }
    }

    // Retry hook for the view's error prompt.
    pub fn retry(&self) {
        self.request_next_page();
    }

    fn request_next_page(&self) {
        let feed = self.feed.clone();
        tokio::spawn(async move {
            feed.fetch_next_page().await;
        });
    }

    // Flip the like state of the photo at `index`; returns the server's verdict.
    pub async fn toggle_like(&self, index: usize) -> Result<bool, ClientError> {
        let Some(photo) = self.photo(index) else {
            return Err(ClientError::InvalidRequest(format!("no photo at row {index}")));
        };

        self.feed.change_like(&photo.id, !photo.is_liked).await?;

        // Read back the reconciled state instead of trusting the request.
        // A photo the service no longer holds keeps the state the row already shows.
        let liked = self
            .feed
            .photos()
            .into_iter()
            .find(|candidate| candidate.id == photo.id)
            .map_or(photo.is_liked, |updated| updated.is_liked);
        if let Some(slot) = self
            .photos
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(index)
            .filter(|slot| slot.id == photo.id)
        {
            *slot = slot.with_liked(liked);
        }
        Ok(liked)
    }
}

impl Drop for FeedPresenter {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

fn sync_photos(feed: &PhotoFeedService, photos: &Mutex<Vec<Photo>>, view: &dyn FeedView) {
    let latest = feed.photos();
    let new_count = latest.len();
    let old_count = {
        let mut snapshot = photos.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *snapshot, latest).len()
    };
    if old_count != new_count {
        view.update_rows(old_count, new_count);
    }
}
