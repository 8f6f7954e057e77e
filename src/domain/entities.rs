use chrono::{DateTime, Utc};

use crate::domain::payloads::{PhotoResult, ProfileResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotoSize {
    pub width: u32,
    pub height: u32,
}

// Photo held by the feed. Identity is `id`; updates replace the whole value.
#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    pub id: String,
    pub size: PhotoSize,
    pub created_at: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub thumb_url: String,
    pub full_url: String,
    pub is_liked: bool,
}

impl Photo {
    // Copy of this photo with only the like state changed.
    pub fn with_liked(&self, is_liked: bool) -> Self {
        Self {
            is_liked,
            ..self.clone()
        }
    }
}

impl From<PhotoResult> for Photo {
    fn from(result: PhotoResult) -> Self {
        // Unparseable timestamps are dropped rather than failing the whole page.
        let created_at = result.created_at.as_deref().and_then(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|date| date.with_timezone(&Utc))
                .map_err(|err| {
                    tracing::debug!(photo_id = %result.id, error = %err, "invalid created_at");
                })
                .ok()
        });

        Self {
            id: result.id,
            size: PhotoSize {
                width: result.width,
                height: result.height,
            },
            created_at,
            description: result.description,
            thumb_url: result.urls.thumb,
            full_url: result.urls.full,
            is_liked: result.liked_by_user,
        }
    }
}

// Profile of the signed-in user, derived from the `/me` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub username: String,
    pub display_name: String,
    pub login_handle: String,
    pub bio: String,
}

impl From<ProfileResult> for Profile {
    fn from(result: ProfileResult) -> Self {
        let display_name = [result.first_name.as_deref(), result.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            login_handle: format!("@{}", result.username),
            username: result.username,
            display_name,
            bio: result.bio.unwrap_or_default(),
        }
    }
}
