// Adapters between the use cases and the outside world.

pub mod clients;
pub mod presenter;
pub mod token_store;

pub use clients::ReqwestTransport;
pub use presenter::{FeedPresenter, FeedView};
pub use token_store::{FileTokenStore, InMemoryTokenStore};
