// SPDX-License-Identifier: GPL-3.0-or-later

use crate::artist::Artist;
use crate::error::{Result, ScrobblerError};
use crate::group::Group;
use crate::models::{non_empty, ArtistData, StatusEnvelope, UserData};
use crate::rate_limiter::RateLimiter;
use crate::user::User;
use reqwest::Client;
use scrobbler_core::{CoreError, Identity, IdentityKey, ObjectCache, SessionResolver};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

const API_BASE: &str = "https://ws.audioscrobbler.com/2.0/";
const USER_AGENT: &str = concat!("scrobbler/", env!("CARGO_PKG_VERSION"));

/// Session obtained out of band for a user of the service.
#[derive(Clone)]
pub struct SessionCredentials {
    pub username: String,
    pub session_key: String,
}

impl fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("username", &self.username)
            .field("session_key", &"<redacted>")
            .finish()
    }
}

/// Handle to the web service.
///
/// Cheap to clone. Every entity is created through the object cache owned by
/// the handle, so asking twice for the same artist yields the same instance.
/// Entities only keep a weak reference back to the handle: once the last
/// `Api` clone is dropped the cache is freed and remote operations on
/// surviving entities fail with `ApiDropped`.
#[derive(Clone)]
pub struct Api {
    inner: Arc<ApiInner>,
}

struct ApiInner {
    client: Client,
    base_url: String,
    api_key: String,
    session: Option<SessionCredentials>,
    rate_limiter: RateLimiter,
    cache: ObjectCache,
}

impl Api {
    /// Create a client with default settings.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder(api_key).build()
    }

    pub fn builder(api_key: impl Into<String>) -> ApiBuilder {
        ApiBuilder::new(api_key)
    }

    pub fn cache(&self) -> &ObjectCache {
        &self.inner.cache
    }

    /// Drop every cached entity. Entities still held by callers stay usable.
    pub fn clear_cache(&self) {
        self.inner.cache.clear();
    }

    /// Stop issuing requests. Every later call, from this handle or any of
    /// its entities, fails with `RateLimiterClosed`.
    pub fn shutdown(&self) {
        debug!(target: "api", "shutting down, refusing further requests");
        self.inner.rate_limiter.close();
    }

    pub(crate) fn downgrade(&self) -> WeakApi {
        WeakApi {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Name of the user the configured session belongs to.
    pub fn session_username(&self) -> Option<&str> {
        self.inner.session.as_ref().map(|s| s.username.as_str())
    }

    /// The authenticated user, or `AuthenticationRequired` without a session.
    pub fn authenticated_user(&self) -> Result<Arc<User>> {
        match self.session_username() {
            Some(name) => self.user(name),
            None => Err(CoreError::AuthenticationRequired { identity: None }.into()),
        }
    }

    /// User with the given name.
    ///
    /// # Example
    /// ```no_run
    /// # use scrobbler_client::Api;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let api = Api::new("your_api_key")?;
    /// let rj = api.user("RJ")?;
    /// let mut friends = rj.friends();
    /// while let Some(friend) = friends.next().await {
    ///     println!("{}", friend?.name());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn user(&self, name: &str) -> Result<Arc<User>> {
        self.user_from(UserData {
            name: Some(name.to_string()),
            realname: None,
            url: None,
            images: Vec::new(),
        })
    }

    pub fn group(&self, name: &str) -> Result<Arc<Group>> {
        let key = IdentityKey::named(Group::KIND, Some(name))?;
        let api = self.downgrade();
        Ok(self
            .inner
            .cache
            .get_or_create(key.clone(), move || Group::new(api, key))?)
    }

    pub fn artist(&self, name: &str) -> Result<Arc<Artist>> {
        self.artist_from(ArtistData {
            name: Some(name.to_string()),
            mbid: None,
            url: None,
            images: Vec::new(),
        })
    }

    /// Cached user for a parsed `<user>` element. An already cached user keeps
    /// the data it was first created with.
    pub(crate) fn user_from(&self, data: UserData) -> Result<Arc<User>> {
        let key = IdentityKey::named(User::KIND, data.name.as_deref())?;
        let api = self.downgrade();
        Ok(self
            .inner
            .cache
            .get_or_create(key.clone(), move || User::new(api, key, data))?)
    }

    pub(crate) fn artist_from(&self, data: ArtistData) -> Result<Arc<Artist>> {
        let key = IdentityKey::named(Artist::KIND, data.name.as_deref())?;
        let api = self.downgrade();
        Ok(self
            .inner
            .cache
            .get_or_create(key.clone(), move || Artist::new(api, key, data))?)
    }

    /// Call `method` and decode the response body into `T`.
    pub(crate) async fn fetch<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = self.method_url(method, params, None)?;
        self.get(url).await
    }

    /// Like [`Api::fetch`], on behalf of the configured session.
    pub(crate) async fn fetch_authenticated<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let session = self.inner.session.as_ref().ok_or_else(|| {
            ScrobblerError::from(CoreError::AuthenticationRequired {
                identity: None,
            })
        })?;
        let url = self.method_url(method, params, Some(&session.session_key))?;
        self.get(url).await
    }

    fn method_url(
        &self,
        method: &str,
        params: &[(&str, String)],
        session_key: Option<&str>,
    ) -> Result<Url> {
        let mut url = Url::parse(&self.inner.base_url)
            .map_err(|e| ScrobblerError::InvalidParameters(format!("base url: {}", e)))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("method", method)
                .append_pair("api_key", &self.inner.api_key);
            for (name, value) in params {
                query.append_pair(name, value);
            }
            if let Some(sk) = session_key {
                query.append_pair("sk", sk);
            }
        }
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        self.inner.rate_limiter.acquire().await?;

        trace!(target: "api", "GET {}", redact(&url));

        let response = self.inner.client.get(url.clone()).send().await?;

        let status = response.status();
        debug!(target: "api", "response status: {}", status);

        if status == 404 {
            return Err(ScrobblerError::NotFound(redact(&url)));
        }

        if status == 503 || status == 429 {
            return Err(ScrobblerError::RateLimitExceeded);
        }

        let body = response.text().await?;
        trace!(target: "api", "response body: {}", body);

        let envelope: StatusEnvelope = quick_xml::de::from_str(&body).map_err(|e| {
            if status.is_success() {
                ScrobblerError::InvalidResponse(format!("Failed to parse response: {}", e))
            } else {
                ScrobblerError::Http {
                    status: status.as_u16(),
                    message: body.clone(),
                }
            }
        })?;

        if let Some(error) = envelope.error {
            return Err(ScrobblerError::Api {
                code: error.code,
                message: error.message.trim().to_string(),
            });
        }

        if !status.is_success() || envelope.status.as_deref() == Some("failed") {
            return Err(ScrobblerError::Http {
                status: status.as_u16(),
                message: non_empty(Some(body)).unwrap_or_else(|| "Unknown error".to_string()),
            });
        }

        Ok(quick_xml::de::from_str(&body)?)
    }
}

impl fmt::Debug for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Api")
            .field("base_url", &self.inner.base_url)
            .field("session", &self.inner.session)
            .field("cache", &self.inner.cache)
            .finish_non_exhaustive()
    }
}

impl SessionResolver for Api {
    fn authenticated_name(&self) -> Option<String> {
        self.session_username().map(str::to_string)
    }
}

/// Reference from an entity back to the handle that created it.
#[derive(Clone)]
pub(crate) struct WeakApi {
    inner: Weak<ApiInner>,
}

impl WeakApi {
    pub(crate) fn upgrade(&self) -> Result<Api> {
        self.inner
            .upgrade()
            .map(|inner| Api { inner })
            .ok_or(ScrobblerError::ApiDropped)
    }
}

impl fmt::Debug for WeakApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakApi")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl SessionResolver for WeakApi {
    fn authenticated_name(&self) -> Option<String> {
        self.upgrade().ok()?.authenticated_name()
    }
}

/// Request URL with credentials masked, for logs and errors.
fn redact(url: &Url) -> String {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let masked = matches!(k.as_ref(), "api_key" | "sk");
            (
                k.into_owned(),
                if masked { "***".to_string() } else { v.into_owned() },
            )
        })
        .collect();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

/// Builder for configuring an [`Api`] handle.
#[derive(Debug)]
pub struct ApiBuilder {
    api_key: String,
    base_url: String,
    timeout: Duration,
    rate_limit_interval: Duration,
    session: Option<SessionCredentials>,
    cache_capacity: Option<u64>,
}

impl ApiBuilder {
    fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: API_BASE.to_string(),
            timeout: Duration::from_secs(30),
            rate_limit_interval: RateLimiter::DEFAULT_INTERVAL,
            session: None,
            cache_capacity: None,
        }
    }

    /// Set a custom base URL (useful for testing with mock servers).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set rate limit interval between requests.
    pub fn rate_limit_interval(mut self, interval: Duration) -> Self {
        self.rate_limit_interval = interval;
        self
    }

    /// Act on behalf of `username` using a previously obtained session key.
    pub fn session(mut self, username: impl Into<String>, session_key: impl Into<String>) -> Self {
        self.session = Some(SessionCredentials {
            username: username.into(),
            session_key: session_key.into(),
        });
        self
    }

    /// Bound the entity cache; unbounded when not set.
    pub fn cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = Some(capacity);
        self
    }

    pub fn build(self) -> Result<Api> {
        if self.api_key.trim().is_empty() {
            return Err(ScrobblerError::InvalidParameters(
                "api key has to be provided".to_string(),
            ));
        }
        Url::parse(&self.base_url)
            .map_err(|e| ScrobblerError::InvalidParameters(format!("base url: {}", e)))?;

        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        let cache = match self.cache_capacity {
            Some(capacity) => ObjectCache::with_capacity(capacity),
            None => ObjectCache::new(),
        };

        Ok(Api {
            inner: Arc::new(ApiInner {
                client,
                base_url: self.base_url,
                api_key: self.api_key,
                session: self.session,
                rate_limiter: RateLimiter::new(self.rate_limit_interval),
                cache,
            }),
        })
    }
}
