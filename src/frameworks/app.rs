use std::sync::Arc;

use url::Url;

use crate::domain::{ClientError, HttpTransport, Profile, TokenStore};
use crate::frameworks::config::Settings;
use crate::interface_adapters::{FileTokenStore, ReqwestTransport};
use crate::use_cases::{
    Dispatcher, Endpoints, LogoutUseCase, OAuthService, PhotoFeedService, ProfileService,
};

// Composition root: every service is built here and shared explicitly.
pub struct ImageFeedApp {
    pub endpoints: Endpoints,
    pub tokens: Arc<dyn TokenStore>,
    pub oauth: Arc<OAuthService>,
    pub profile: Arc<ProfileService>,
    pub feed: Arc<PhotoFeedService>,
}

impl ImageFeedApp {
    pub fn new(
        endpoints: Endpoints,
        transport: Arc<dyn HttpTransport>,
        tokens: Arc<dyn TokenStore>,
    ) -> Self {
        let dispatcher = Dispatcher::new(transport);
        Self {
            oauth: Arc::new(OAuthService::new(
                dispatcher.clone(),
                endpoints.clone(),
                tokens.clone(),
            )),
            profile: Arc::new(ProfileService::new(
                dispatcher.clone(),
                endpoints.clone(),
                tokens.clone(),
            )),
            feed: Arc::new(PhotoFeedService::new(
                dispatcher,
                endpoints.clone(),
                tokens.clone(),
            )),
            endpoints,
            tokens,
        }
    }

    // Production wiring: reqwest transport and a file-backed token store.
    pub fn from_settings(settings: &Settings) -> Result<Self, reqwest::Error> {
        let transport = ReqwestTransport::new(settings.request_timeout)?;
        let tokens = FileTokenStore::new(settings.token_store_path.clone());
        Ok(Self::new(
            settings.endpoints.clone(),
            Arc::new(transport),
            Arc::new(tokens),
        ))
    }

    pub fn authorization_url(&self) -> Result<Url, ClientError> {
        self.endpoints.authorization_url()
    }

    pub fn access_token(&self) -> Result<Option<String>, ClientError> {
        self.tokens.get().map_err(ClientError::Storage)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.access_token(), Ok(Some(_)))
    }

    // Exchange `code`, then load the profile and avatar for the new session.
    #[tracing::instrument(name = "login", skip_all)]
    pub async fn login(&self, code: &str) -> Result<Profile, ClientError> {
        let token = self.oauth.exchange(code).await?;
        self.load_session(&token).await
    }

    // Load profile and avatar using the stored token.
    pub async fn restore_session(&self) -> Result<Profile, ClientError> {
        let token = self.access_token()?.ok_or(ClientError::MissingToken)?;
        self.load_session(&token).await
    }

    async fn load_session(&self, token: &str) -> Result<Profile, ClientError> {
        let profile = self.profile.fetch_profile(token).await?;
        // A missing avatar is not fatal; the profile is still usable.
        if let Err(err) = self.profile.fetch_profile_image_url(&profile.username).await {
            tracing::warn!(error = %err, "failed to load profile image");
        }
        Ok(profile)
    }

    pub fn logout(&self) -> Result<(), ClientError> {
        LogoutUseCase {
            tokens: self.tokens.clone(),
            profile: self.profile.clone(),
            feed: self.feed.clone(),
        }
        .execute()
    }
}
