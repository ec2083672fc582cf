// SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::{CoreError, Result};
use std::future::Future;
use tracing::debug;

/// A user-like entity that may carry an authenticated session.
pub trait Session: Send + Sync {
    fn session_name(&self) -> Option<&str>;

    fn is_authenticated(&self) -> bool;
}

/// An API handle able to name the currently authenticated user, if any.
pub trait SessionResolver: Send + Sync {
    fn authenticated_name(&self) -> Option<String>;
}

/// Where a caller's session comes from.
pub enum SessionSource<'a> {
    /// The caller is itself the session-bearing user.
    Own(&'a dyn Session),
    /// The caller holds a reference to a user.
    Held(&'a dyn Session),
    /// The caller holds an API handle that resolves the session.
    Client(&'a dyn SessionResolver),
    Unavailable,
}

/// Capability implemented by every entity whose operations can be gated.
pub trait HasSession {
    fn session_source(&self) -> SessionSource<'_>;
}

/// Fail with [`CoreError::AuthenticationRequired`] unless `caller` resolves
/// to an authenticated session.
pub fn require_authenticated<C>(caller: &C) -> Result<()>
where
    C: HasSession + ?Sized,
{
    let (identity, authenticated) = match caller.session_source() {
        SessionSource::Own(session) | SessionSource::Held(session) => (
            session.session_name().map(str::to_string),
            session.is_authenticated(),
        ),
        SessionSource::Client(resolver) => match resolver.authenticated_name() {
            Some(name) => (Some(name), true),
            None => (None, false),
        },
        SessionSource::Unavailable => (None, false),
    };

    if authenticated {
        debug!(target: "auth", identity = ?identity, "session authenticated");
        Ok(())
    } else {
        debug!(target: "auth", identity = ?identity, "session not authenticated");
        Err(CoreError::AuthenticationRequired { identity })
    }
}

/// Run `op` once if `caller` is authenticated, otherwise fail without running it.
pub async fn authenticated<C, F, Fut, T, E>(caller: &C, op: F) -> std::result::Result<T, E>
where
    C: HasSession + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: From<CoreError>,
{
    require_authenticated(caller)?;
    op().await
}
