use serde::Deserialize;

// Wire payloads of the photo API. Keeping serde here is a dependency leak,
// but use cases decode straight into these shapes.

// Body of `POST /oauth/token`.
#[derive(Debug, Deserialize)]
pub struct OAuthTokenResponseBody {
    pub access_token: String,
    pub token_type: String,
    pub scope: String,
    pub created_at: i64,
}

// Body of `GET /me`.
#[derive(Debug, Deserialize)]
pub struct ProfileResult {
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
}

// Body of `GET /users/{username}`.
#[derive(Debug, Deserialize)]
pub struct UserResult {
    pub profile_image: ProfileImage,
}

#[derive(Debug, Deserialize)]
pub struct ProfileImage {
    pub small: String,
}

// Element of the `GET /photos` array.
#[derive(Debug, Deserialize)]
pub struct PhotoResult {
    pub id: String,
    pub created_at: Option<String>,
    pub width: u32,
    pub height: u32,
    pub liked_by_user: bool,
    pub description: Option<String>,
    pub urls: UrlsResult,
}

#[derive(Debug, Deserialize)]
pub struct UrlsResult {
    pub thumb: String,
    pub full: String,
}

// Body of `POST|DELETE /photos/{id}/like`.
#[derive(Debug, Deserialize)]
pub struct PhotoLikeResult {
    pub photo: PhotoResult,
}
