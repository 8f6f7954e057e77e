use std::sync::Arc;

use crate::domain::{ClientError, TokenStore};
use crate::use_cases::feed::PhotoFeedService;
use crate::use_cases::profile::ProfileService;

// Logout use case: forget the token and every piece of session state.
pub struct LogoutUseCase {
    pub tokens: Arc<dyn TokenStore>,
    pub profile: Arc<ProfileService>,
    pub feed: Arc<PhotoFeedService>,
}

impl LogoutUseCase {
    #[tracing::instrument(name = "logout", skip_all)]
    pub fn execute(&self) -> Result<(), ClientError> {
        // Session state goes first so a storage failure still leaves nothing cached.
        self.profile.reset();
        self.feed.reset();
        self.tokens.clear().map_err(|err| {
            tracing::error!(error = %err, "failed to clear access token");
            ClientError::Storage(err)
        })?;

        tracing::info!("logged out");
        Ok(())
    }
}
