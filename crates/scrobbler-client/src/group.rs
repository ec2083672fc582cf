// SPDX-License-Identifier: GPL-3.0-or-later

use crate::api::WeakApi;
use crate::entity::impl_entity_identity;
use crate::error::{Result, ScrobblerError};
use crate::models::{AlbumChartEnvelope, ChartListEnvelope, ChartRange, MembersEnvelope, WeeklyAlbumChart};
use crate::user::User;
use scrobbler_core::{depaginate, IdentityKey, LazyList, Memo, Page};
use std::sync::Arc;
use tracing::debug;

/// A group of users on the service.
#[derive(Debug)]
pub struct Group {
    api: WeakApi,
    key: IdentityKey,
    name: String,
    weekly_chart_list: Memo<Vec<ChartRange>>,
    recent_weekly_album_chart: Memo<WeeklyAlbumChart>,
}

impl_entity_identity!(Group, "group");

impl Group {
    pub(crate) fn new(api: WeakApi, key: IdentityKey) -> Self {
        let name = key.parts().join(" ");
        Self {
            api,
            key,
            name,
            weekly_chart_list: Memo::new(),
            recent_weekly_album_chart: Memo::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Members of the group, fetched page by page as consumed.
    pub fn members(self: &Arc<Self>) -> LazyList<Arc<User>, ScrobblerError> {
        let group = Arc::clone(self);
        depaginate(move |page| {
            let group = Arc::clone(&group);
            async move { group.members_page(page).await }
        })
    }

    /// Weeks for which charts are available, oldest first.
    pub async fn weekly_chart_list(&self) -> Result<Vec<ChartRange>> {
        self.weekly_chart_list
            .get_or_try_init(|| self.fetch_weekly_chart_list())
            .await
    }

    /// Album chart for one week, or for the most recent week without a range.
    pub async fn weekly_album_chart(&self, range: Option<ChartRange>) -> Result<WeeklyAlbumChart> {
        let mut params = vec![("group", self.name.clone())];
        if let Some(range) = range {
            params.push(("from", range.from.timestamp().to_string()));
            params.push(("to", range.to.timestamp().to_string()));
        }

        let envelope: AlbumChartEnvelope = self
            .api
            .upgrade()?
            .fetch("group.getWeeklyAlbumChart", &params)
            .await?;
        envelope.weeklyalbumchart.into_chart(&self.name)
    }

    pub async fn recent_weekly_album_chart(&self) -> Result<WeeklyAlbumChart> {
        self.recent_weekly_album_chart
            .get_or_try_init(|| self.weekly_album_chart(None))
            .await
    }

    /// Album chart of every available week, most recent first, each fetched
    /// when reached.
    pub async fn weekly_album_chart_list(
        self: &Arc<Self>,
    ) -> Result<LazyList<WeeklyAlbumChart, ScrobblerError>> {
        let mut ranges = self.weekly_chart_list().await?;
        ranges.reverse();

        let group = Arc::clone(self);
        Ok(LazyList::from_each(ranges, move |range| {
            let group = Arc::clone(&group);
            async move { group.weekly_album_chart(Some(range)).await }
        }))
    }

    async fn members_page(&self, page: u32) -> Result<Page<Arc<User>>> {
        let api = self.api.upgrade()?;
        let envelope: MembersEnvelope = api
            .fetch(
                "group.getMembers",
                &[("group", self.name.clone()), ("page", page.to_string())],
            )
            .await?;

        let members = envelope
            .members
            .users
            .into_iter()
            .map(|data| api.user_from(data))
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::new(members, envelope.members.total_pages))
    }

    async fn fetch_weekly_chart_list(&self) -> Result<Vec<ChartRange>> {
        let envelope: ChartListEnvelope = self
            .api
            .upgrade()?
            .fetch("group.getWeeklyChartList", &[("group", self.name.clone())])
            .await?;
        debug!(
            target: "api",
            group = %self.name,
            charts = envelope.weeklychartlist.charts.len(),
            "weekly chart list fetched"
        );
        envelope
            .weeklychartlist
            .charts
            .into_iter()
            .map(|chart| ChartRange::from_timestamps(chart.from, chart.to))
            .collect()
    }
}
