// SPDX-License-Identifier: GPL-3.0-or-later

//! Caching and pagination primitives shared by every scrobbler entity.
//!
//! This crate knows nothing about HTTP or XML. It provides an identity keyed
//! object cache, memoized property slots, lazily paginated lists, an
//! authentication gate and fire-and-forget task dispatch. The client crate
//! plugs its page fetchers and entity constructors into these.

pub mod auth;
pub mod depaginate;
pub mod dispatch;
pub mod error;
pub mod identity;
pub mod lazy_list;
pub mod memo;
pub mod object_cache;

pub use auth::{authenticated, require_authenticated, HasSession, Session, SessionResolver, SessionSource};
pub use depaginate::{depaginate, Depaginator, Page};
pub use dispatch::{spawn_with_callback, spawn_with_channel};
pub use error::{CoreError, Result};
pub use identity::{Identity, IdentityKey, IdentityKeyBuilder};
pub use lazy_list::{LazyList, ListState, Producer};
pub use memo::Memo;
pub use object_cache::ObjectCache;
