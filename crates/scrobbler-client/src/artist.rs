// SPDX-License-Identifier: GPL-3.0-or-later

use crate::api::WeakApi;
use crate::entity::impl_entity_identity;
use crate::error::{Result, ScrobblerError};
use crate::models::{images, non_empty, ArtistData, Images, TagsEnvelope, TopTracksEnvelope, Track};
use scrobbler_core::{
    authenticated, spawn_with_callback, HasSession, IdentityKey, Memo, SessionSource,
};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// An artist known to the service.
#[derive(Debug)]
pub struct Artist {
    api: WeakApi,
    key: IdentityKey,
    name: String,
    mbid: Option<String>,
    url: Option<String>,
    images: Images,
    top_tracks: Memo<Vec<Track>>,
}

impl_entity_identity!(Artist, "artist");

impl Artist {
    pub(crate) fn new(api: WeakApi, key: IdentityKey, data: ArtistData) -> Self {
        Self {
            api,
            key,
            name: data.name.unwrap_or_default().trim().to_string(),
            mbid: non_empty(data.mbid),
            url: non_empty(data.url),
            images: images(data.images),
            top_tracks: Memo::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mbid(&self) -> Option<&str> {
        self.mbid.as_deref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn images(&self) -> &Images {
        &self.images
    }

    /// Most played tracks of the artist. Fetched once, then served from memory.
    pub async fn top_tracks(&self) -> Result<Vec<Track>> {
        self.top_tracks
            .get_or_try_init(|| self.fetch_top_tracks())
            .await
    }

    pub async fn top_track(&self) -> Result<Option<Track>> {
        Ok(self.top_tracks().await?.into_iter().next())
    }

    /// Fetch the top tracks in the background and hand them to `callback`.
    pub fn top_tracks_with<C>(self: &Arc<Self>, callback: C) -> JoinHandle<()>
    where
        C: FnOnce(Result<Vec<Track>>) + Send + 'static,
    {
        let artist = Arc::clone(self);
        spawn_with_callback(async move { artist.top_tracks().await }, callback)
    }

    /// Tags the session user applied to this artist.
    pub async fn tags(&self) -> Result<Vec<String>> {
        authenticated(self, || async {
            let envelope: TagsEnvelope = self
                .api
                .upgrade()?
                .fetch_authenticated("artist.getTags", &[("artist", self.name.clone())])
                .await?;
            Ok::<_, ScrobblerError>(
                envelope
                    .tags
                    .tags
                    .into_iter()
                    .map(|tag| tag.name.trim().to_string())
                    .collect(),
            )
        })
        .await
    }

    async fn fetch_top_tracks(&self) -> Result<Vec<Track>> {
        let envelope: TopTracksEnvelope = self
            .api
            .upgrade()?
            .fetch("artist.getTopTracks", &[("artist", self.name.clone())])
            .await?;
        Ok(envelope
            .toptracks
            .tracks
            .into_iter()
            .map(|track| track.into_track(&self.name))
            .collect())
    }
}

impl HasSession for Artist {
    fn session_source(&self) -> SessionSource<'_> {
        SessionSource::Client(&self.api)
    }
}
