// Use cases layer: client workflows against the photo API.

pub mod dispatcher;
pub mod endpoints;
pub mod feed;
pub mod logout;
pub mod oauth;
pub mod profile;

#[cfg(test)]
pub(crate) mod test_support;

pub use dispatcher::Dispatcher;
pub use endpoints::{Endpoints, code_from_redirect};
pub use feed::{FeedEvent, PageFetch, PhotoFeedService};
pub use logout::LogoutUseCase;
pub use oauth::OAuthService;
pub use profile::ProfileService;
