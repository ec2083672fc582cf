// SPDX-License-Identifier: GPL-3.0-or-later

use crate::api::WeakApi;
use crate::artist::Artist;
use crate::entity::impl_entity_identity;
use crate::error::{Result, ScrobblerError};
use crate::models::{images, non_empty, FriendsEnvelope, Images, RecommendationsEnvelope, UserData};
use scrobbler_core::{
    depaginate, require_authenticated, HasSession, IdentityKey, LazyList, Page, Session,
    SessionSource,
};
use std::sync::Arc;

/// A user of the service.
#[derive(Debug)]
pub struct User {
    api: WeakApi,
    key: IdentityKey,
    name: String,
    real_name: Option<String>,
    url: Option<String>,
    images: Images,
}

impl_entity_identity!(User, "user");

impl User {
    pub(crate) fn new(api: WeakApi, key: IdentityKey, data: UserData) -> Self {
        Self {
            api,
            key,
            name: data.name.unwrap_or_default().trim().to_string(),
            real_name: non_empty(data.realname),
            url: non_empty(data.url),
            images: images(data.images),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn real_name(&self) -> Option<&str> {
        self.real_name.as_deref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn images(&self) -> &Images {
        &self.images
    }

    /// Whether the handle's session belongs to this user.
    pub fn authenticated(&self) -> bool {
        self.api
            .upgrade()
            .map(|api| api.session_username() == Some(self.name.as_str()))
            .unwrap_or(false)
    }

    /// Every friend of the user, fetched page by page as consumed.
    pub fn friends(self: &Arc<Self>) -> LazyList<Arc<User>, ScrobblerError> {
        let user = Arc::clone(self);
        depaginate(move |page| {
            let user = Arc::clone(&user);
            async move { user.friends_page(page).await }
        })
    }

    /// Artists the service recommends to this user. Only available for the
    /// user the session belongs to.
    pub fn recommended_artists(self: &Arc<Self>) -> Result<LazyList<Arc<Artist>, ScrobblerError>> {
        require_authenticated(self.as_ref())?;
        let user = Arc::clone(self);
        Ok(depaginate(move |page| {
            let user = Arc::clone(&user);
            async move { user.recommended_artists_page(page).await }
        }))
    }

    async fn friends_page(&self, page: u32) -> Result<Page<Arc<User>>> {
        let api = self.api.upgrade()?;
        let envelope: FriendsEnvelope = api
            .fetch(
                "user.getFriends",
                &[("user", self.name.clone()), ("page", page.to_string())],
            )
            .await?;

        let friends = envelope
            .friends
            .users
            .into_iter()
            .map(|data| api.user_from(data))
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::new(friends, envelope.friends.total_pages))
    }

    async fn recommended_artists_page(&self, page: u32) -> Result<Page<Arc<Artist>>> {
        let api = self.api.upgrade()?;
        let envelope: RecommendationsEnvelope = api
            .fetch_authenticated("user.getRecommendedArtists", &[("page", page.to_string())])
            .await?;

        let artists = envelope
            .recommendations
            .artists
            .into_iter()
            .map(|data| api.artist_from(data))
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::new(artists, envelope.recommendations.total_pages))
    }
}

impl Session for User {
    fn session_name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn is_authenticated(&self) -> bool {
        self.authenticated()
    }
}

impl HasSession for User {
    fn session_source(&self) -> SessionSource<'_> {
        SessionSource::Own(self)
    }
}
