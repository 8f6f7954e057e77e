mod entities;
mod errors;
mod payloads;
mod ports;
mod request;

// Re-export the domain boundary types and ports.
pub use entities::{Photo, PhotoSize, Profile};
pub use errors::ClientError;
pub use payloads::{
    OAuthTokenResponseBody, PhotoLikeResult, PhotoResult, ProfileImage, ProfileResult,
    UrlsResult, UserResult,
};
pub use ports::{HttpResponse, HttpTransport, TokenStore, TransportFailure};
pub use request::{HttpMethod, HttpRequest, RequestSpec};
