use url::Url;

use crate::domain::{ClientError, HttpMethod, HttpRequest, RequestSpec};

// Path the authorize page redirects to once the user approves access.
const NATIVE_REDIRECT_PATH: &str = "/oauth/authorize/native";

// Endpoint catalogue of the photo API: application credentials plus hosts.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub access_key: String,
    pub secret_key: String,
    pub redirect_uri: String,
    pub scope: String,
    pub scheme: String,
    pub auth_host: String,
    pub api_host: String,
}

impl Endpoints {
    fn auth(&self, path: impl Into<String>) -> RequestSpec {
        RequestSpec::new(self.auth_host.clone(), path).scheme(self.scheme.clone())
    }

    fn api(&self, path: impl Into<String>, token: &str) -> RequestSpec {
        RequestSpec::new(self.api_host.clone(), path)
            .scheme(self.scheme.clone())
            .bearer(token)
    }

    // Page the user opens in a browser to grant access.
    pub fn authorization_url(&self) -> Result<Url, ClientError> {
        self.auth("/oauth/authorize")
            .query("client_id", &self.access_key)
            .query("redirect_uri", &self.redirect_uri)
            .query("response_type", "code")
            .query("scope", &self.scope)
            .build()
            .map(|request| request.url().clone())
    }

    pub fn token_exchange(&self, code: &str) -> Result<HttpRequest, ClientError> {
        self.auth("/oauth/token")
            .method(HttpMethod::Post)
            .query("client_id", &self.access_key)
            .query("client_secret", &self.secret_key)
            .query("redirect_uri", &self.redirect_uri)
            .query("code", code)
            .query("grant_type", "authorization_code")
            .build()
    }

    pub fn me(&self, token: &str) -> Result<HttpRequest, ClientError> {
        self.api("/me", token).build()
    }

    pub fn user(&self, token: &str, username: &str) -> Result<HttpRequest, ClientError> {
        self.api("/users", token).segment(username).build()
    }

    pub fn photos_page(&self, token: &str, page: u32) -> Result<HttpRequest, ClientError> {
        self.api("/photos", token)
            .query("page", page.to_string())
            .build()
    }

    pub fn change_like(
        &self,
        token: &str,
        photo_id: &str,
        liked: bool,
    ) -> Result<HttpRequest, ClientError> {
        let method = if liked {
            HttpMethod::Post
        } else {
            HttpMethod::Delete
        };
        self.api("/photos", token)
            .segment(photo_id)
            .segment("like")
            .method(method)
            .build()
    }
}

// Extract the authorization code from a redirect URL, if it is the native redirect.
pub fn code_from_redirect(redirect: &str) -> Option<String> {
    let url = Url::parse(redirect).ok()?;
    if url.path() != NATIVE_REDIRECT_PATH {
        return None;
    }
    url.query_pairs()
        .find(|(name, _)| name == "code")
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
pub(crate) fn test_endpoints() -> Endpoints {
    Endpoints {
        access_key: "access-key".to_string(),
        secret_key: "secret-key".to_string(),
        redirect_uri: "urn:ietf:wg:oauth:2.0:oob".to_string(),
        scope: "public read_user write_likes".to_string(),
        scheme: "https".to_string(),
        auth_host: "unsplash.com".to_string(),
        api_host: "api.unsplash.com".to_string(),
    }
}
