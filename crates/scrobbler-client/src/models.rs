// SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::{Result, ScrobblerError};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Image URLs keyed by size name ("small", "medium", "large", ...).
pub type Images = BTreeMap<String, String>;

/// Track entry of an artist's top tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub name: String,
    pub artist: String,
    /// Position in the chart the track was listed in.
    pub rank: Option<u32>,
    pub playcount: Option<u64>,
    pub listeners: Option<u64>,
    pub mbid: Option<String>,
    pub url: Option<String>,
}

/// Week covered by a weekly chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChartRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl ChartRange {
    pub fn from_timestamps(from: i64, to: i64) -> Result<Self> {
        let convert = |secs: i64| {
            DateTime::<Utc>::from_timestamp(secs, 0).ok_or_else(|| {
                ScrobblerError::InvalidResponse(format!("chart timestamp out of range: {}", secs))
            })
        };
        let range = Self {
            from: convert(from)?,
            to: convert(to)?,
        };
        if range.from > range.to {
            return Err(ScrobblerError::InvalidParameters(format!(
                "chart starts after it ends: {} > {}",
                from, to
            )));
        }
        Ok(range)
    }
}

/// Album chart of one week for a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyAlbumChart {
    /// Name of the group the chart belongs to.
    pub subject: String,
    pub range: ChartRange,
    pub albums: Vec<ChartAlbum>,
}

impl WeeklyAlbumChart {
    pub fn top_album(&self) -> Option<&ChartAlbum> {
        self.albums.first()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartAlbum {
    pub rank: Option<u32>,
    pub name: String,
    pub artist: String,
    pub artist_mbid: Option<String>,
    pub mbid: Option<String>,
    pub playcount: Option<u64>,
    pub url: Option<String>,
}

// Wire format. Every response is wrapped in <lfm status="ok|failed">; the
// root element name is not checked, only its attributes and children.

#[derive(Debug, Deserialize)]
pub(crate) struct StatusEnvelope {
    #[serde(rename = "@status", default)]
    pub status: Option<String>,
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(rename = "@code")]
    pub code: u32,
    #[serde(rename = "$text", default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImageData {
    #[serde(rename = "@size", default)]
    pub size: String,
    #[serde(rename = "$text", default)]
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserData {
    pub name: Option<String>,
    pub realname: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "image", default)]
    pub images: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserPage {
    #[serde(rename = "@totalPages", default)]
    pub total_pages: u32,
    #[serde(rename = "user", default)]
    pub users: Vec<UserData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FriendsEnvelope {
    pub friends: UserPage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MembersEnvelope {
    pub members: UserPage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ArtistData {
    pub name: Option<String>,
    pub mbid: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "image", default)]
    pub images: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ArtistPage {
    #[serde(rename = "@totalPages", default)]
    pub total_pages: u32,
    #[serde(rename = "artist", default)]
    pub artists: Vec<ArtistData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecommendationsEnvelope {
    pub recommendations: ArtistPage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TopTracksEnvelope {
    pub toptracks: TopTracksData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TopTracksData {
    #[serde(rename = "track", default)]
    pub tracks: Vec<TrackData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrackData {
    #[serde(rename = "@rank", default)]
    pub rank: Option<u32>,
    pub name: String,
    pub playcount: Option<u64>,
    pub listeners: Option<u64>,
    pub mbid: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TagsEnvelope {
    pub tags: TagsData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TagsData {
    #[serde(rename = "tag", default)]
    pub tags: Vec<TagData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TagData {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChartListEnvelope {
    pub weeklychartlist: ChartListData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChartListData {
    #[serde(rename = "chart", default)]
    pub charts: Vec<ChartRangeData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChartRangeData {
    #[serde(rename = "@from")]
    pub from: i64,
    #[serde(rename = "@to")]
    pub to: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AlbumChartEnvelope {
    pub weeklyalbumchart: AlbumChartData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AlbumChartData {
    #[serde(rename = "@from")]
    pub from: i64,
    #[serde(rename = "@to")]
    pub to: i64,
    #[serde(rename = "album", default)]
    pub albums: Vec<ChartAlbumData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChartAlbumData {
    #[serde(rename = "@rank", default)]
    pub rank: Option<u32>,
    pub artist: ArtistRefData,
    pub name: String,
    pub mbid: Option<String>,
    pub playcount: Option<u64>,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ArtistRefData {
    #[serde(rename = "@mbid", default)]
    pub mbid: Option<String>,
    #[serde(rename = "$text", default)]
    pub name: String,
}

/// Empty elements come through as empty strings.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn images(data: Vec<ImageData>) -> Images {
    data.into_iter()
        .filter(|image| !image.url.trim().is_empty())
        .map(|image| (image.size, image.url.trim().to_string()))
        .collect()
}

impl TrackData {
    pub(crate) fn into_track(self, artist: &str) -> Track {
        Track {
            name: self.name,
            artist: artist.to_string(),
            rank: self.rank,
            playcount: self.playcount,
            listeners: self.listeners,
            mbid: non_empty(self.mbid),
            url: non_empty(self.url),
        }
    }
}

impl AlbumChartData {
    pub(crate) fn into_chart(self, subject: &str) -> Result<WeeklyAlbumChart> {
        Ok(WeeklyAlbumChart {
            subject: subject.to_string(),
            range: ChartRange::from_timestamps(self.from, self.to)?,
            albums: self
                .albums
                .into_iter()
                .map(|album| ChartAlbum {
                    rank: album.rank,
                    name: album.name,
                    artist: album.artist.name,
                    artist_mbid: non_empty(album.artist.mbid),
                    mbid: non_empty(album.mbid),
                    playcount: album.playcount,
                    url: non_empty(album.url),
                })
                .collect(),
        })
    }
}
