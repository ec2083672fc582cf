// SPDX-License-Identifier: GPL-3.0-or-later

//! Client for the audioscrobbler web service (API 2.0).
//!
//! Users, groups and artists are obtained from an [`Api`] handle and are
//! shared: asking for the same name twice returns the same `Arc`. Paginated
//! resources come back as a [`LazyList`] that fetches pages as it is read.

mod api;
pub mod artist;
mod entity;
pub mod error;
pub mod group;
pub mod models;
pub mod rate_limiter;
pub mod user;

#[cfg(test)]
mod client_tests;

pub use api::{Api, ApiBuilder, SessionCredentials};
pub use artist::Artist;
pub use error::{Result, ScrobblerError};
pub use group::Group;
pub use models::{ChartAlbum, ChartRange, Images, Track, WeeklyAlbumChart};
pub use scrobbler_core::{CoreError, LazyList, ListState};
pub use user::User;
