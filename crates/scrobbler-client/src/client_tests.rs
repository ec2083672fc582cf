// SPDX-License-Identifier: GPL-3.0-or-later

#[cfg(test)]
mod tests {
    use crate::{Api, CoreError, ScrobblerError};
    use scrobbler_core::Identity;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FIRST_WEEK: (i64, i64) = (1108296002, 1108900802);
    const SECOND_WEEK: (i64, i64) = (1108900802, 1109505602);

    fn api(mock_server: &MockServer) -> Api {
        Api::builder("test-key")
            .base_url(mock_server.uri())
            .rate_limit_interval(Duration::ZERO)
            .build()
            .unwrap()
    }

    fn members_page(page: u32, total_pages: u32, names: &[&str]) -> String {
        let users: String = names
            .iter()
            .map(|name| format!("<user><name>{}</name><url>http://www.last.fm/user/{}</url></user>", name, name))
            .collect();
        format!(
            r#"<lfm status="ok"><members for="mnml" page="{}" totalPages="{}">{}</members></lfm>"#,
            page, total_pages, users
        )
    }

    fn top_tracks_response() -> String {
        r#"
            <lfm status="ok">
                <toptracks artist="Cher">
                    <track rank="1">
                        <name>Believe</name>
                        <playcount>1234</playcount>
                        <listeners>567</listeners>
                        <mbid></mbid>
                        <url>http://www.last.fm/music/Cher/_/Believe</url>
                        <artist><name>Cher</name></artist>
                    </track>
                    <track rank="2">
                        <name>Strong Enough</name>
                        <playcount>900</playcount>
                        <listeners>400</listeners>
                    </track>
                </toptracks>
            </lfm>
        "#
        .to_string()
    }

    fn chart_list_response() -> String {
        format!(
            r#"<lfm status="ok"><weeklychartlist group="mnml"><chart from="{}" to="{}"/><chart from="{}" to="{}"/></weeklychartlist></lfm>"#,
            FIRST_WEEK.0, FIRST_WEEK.1, SECOND_WEEK.0, SECOND_WEEK.1
        )
    }

    fn album_chart_response(week: (i64, i64), album: &str) -> String {
        format!(
            r#"<lfm status="ok"><weeklyalbumchart group="mnml" from="{}" to="{}"><album rank="1"><artist mbid="">Dominik Eulberg</artist><name>{}</name><playcount>6</playcount></album></weeklyalbumchart></lfm>"#,
            week.0, week.1, album
        )
    }

    async fn mount_members_page(mock_server: &MockServer, page: u32, body: String) {
        Mock::given(method("GET"))
            .and(query_param("method", "group.getMembers"))
            .and(query_param("group", "mnml"))
            .and(query_param("page", page.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(mock_server)
            .await;
    }

    async fn request_count(mock_server: &MockServer) -> usize {
        mock_server.received_requests().await.unwrap().len()
    }

    #[test]
    fn test_same_name_yields_same_instance() {
        let api = Api::new("test-key").unwrap();

        let first = api.artist("Cher").unwrap();
        let second = api.artist("  Cher ").unwrap();
        let other = api.artist("Madonna").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(first.to_string(), "<artist: Cher>");
    }

    #[test]
    fn test_user_and_group_with_same_name_are_distinct() {
        let api = Api::new("test-key").unwrap();

        let user = api.user("mnml").unwrap();
        let group = api.group("mnml").unwrap();

        assert_eq!(user.name(), group.name());
        assert_eq!(user.to_string(), "<user: mnml>");
        assert_eq!(group.to_string(), "<group: mnml>");
        assert!(api.cache().contains::<crate::User>(user.identity_key()));
        assert!(api.cache().contains::<crate::Group>(group.identity_key()));
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let api = Api::new("test-key").unwrap();

        let err = api.user("   ").unwrap_err();
        assert!(matches!(
            err,
            ScrobblerError::Core(CoreError::InvalidIdentity { .. })
        ));
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let err = Api::new("  ").unwrap_err();
        assert!(matches!(err, ScrobblerError::InvalidParameters(_)));
    }

    #[test]
    fn test_clear_cache_creates_fresh_instances() {
        let api = Api::new("test-key").unwrap();

        let before = api.artist("Cher").unwrap();
        api.clear_cache();
        let after = api.artist("Cher").unwrap();

        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_group_members_span_pages() {
        let mock_server = MockServer::start().await;
        mount_members_page(&mock_server, 1, members_page(1, 2, &["RJ", "franz"])).await;
        mount_members_page(&mock_server, 2, members_page(2, 2, &["Russ"])).await;

        let api = api(&mock_server);
        let group = api.group("mnml").unwrap();

        let members = group.members().collect().await.unwrap();
        let names: Vec<&str> = members.iter().map(|user| user.name()).collect();
        assert_eq!(names, vec!["RJ", "franz", "Russ"]);

        // Members are shared with the cache.
        let rj = api.user("RJ").unwrap();
        assert!(Arc::ptr_eq(&rj, &members[0]));
        assert_eq!(rj.url(), Some("http://www.last.fm/user/RJ"));
    }

    #[tokio::test]
    async fn test_group_members_fetch_pages_on_demand() {
        let mock_server = MockServer::start().await;
        mount_members_page(&mock_server, 1, members_page(1, 2, &["RJ", "franz"])).await;
        mount_members_page(&mock_server, 2, members_page(2, 2, &["Russ"])).await;

        let api = api(&mock_server);
        let mut members = api.group("mnml").unwrap().members();

        assert_eq!(request_count(&mock_server).await, 0);

        let first = members.first().await.unwrap().unwrap();
        assert_eq!(first.name(), "RJ");
        assert_eq!(request_count(&mock_server).await, 1);

        let second = members.get(1).await.unwrap().unwrap();
        assert_eq!(second.name(), "franz");
        assert_eq!(request_count(&mock_server).await, 1);

        let third = members.get(2).await.unwrap().unwrap();
        assert_eq!(third.name(), "Russ");
        assert_eq!(request_count(&mock_server).await, 2);

        assert!(members.get(3).await.unwrap().is_none());
        assert_eq!(request_count(&mock_server).await, 2);
    }

    #[tokio::test]
    async fn test_user_friends() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("method", "user.getFriends"))
            .and(query_param("user", "RJ"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<lfm status="ok"><friends for="RJ" page="1" totalPages="1"><user><name>eartle</name><realname>Michael</realname></user></friends></lfm>"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let api = api(&mock_server);
        let friends = api.user("RJ").unwrap().friends().collect().await.unwrap();

        assert_eq!(friends.len(), 1);
        assert_eq!(friends[0].name(), "eartle");
        assert_eq!(friends[0].real_name(), Some("Michael"));
    }

    #[tokio::test]
    async fn test_top_tracks_are_memoized() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("method", "artist.getTopTracks"))
            .and(query_param("artist", "Cher"))
            .and(query_param("api_key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_string(top_tracks_response()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let api = api(&mock_server);
        let cher = api.artist("Cher").unwrap();

        let tracks = cher.top_tracks().await.unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].name, "Believe");
        assert_eq!(tracks[0].artist, "Cher");
        assert_eq!(tracks[0].rank, Some(1));
        assert_eq!(tracks[0].playcount, Some(1234));
        assert_eq!(tracks[0].mbid, None);

        let again = api.artist("Cher").unwrap().top_tracks().await.unwrap();
        assert_eq!(tracks, again);

        let top = cher.top_track().await.unwrap().unwrap();
        assert_eq!(top.name, "Believe");
    }

    #[tokio::test]
    async fn test_failed_top_tracks_are_not_memoized() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("method", "artist.getTopTracks"))
            .respond_with(ResponseTemplate::new(500).set_body_string(
                r#"<lfm status="failed"><error code="8">Operation failed</error></lfm>"#,
            ))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(query_param("method", "artist.getTopTracks"))
            .respond_with(ResponseTemplate::new(200).set_body_string(top_tracks_response()))
            .mount(&mock_server)
            .await;

        let api = api(&mock_server);
        let cher = api.artist("Cher").unwrap();

        let err = cher.top_tracks().await.unwrap_err();
        assert!(matches!(err, ScrobblerError::Api { code: 8, .. }));

        let tracks = cher.top_tracks().await.unwrap();
        assert_eq!(tracks.len(), 2);
    }

    #[tokio::test]
    async fn test_api_error_envelope() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("method", "group.getWeeklyChartList"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<lfm status="failed"><error code="6">Group not found</error></lfm>"#,
            ))
            .mount(&mock_server)
            .await;

        let api = api(&mock_server);
        let err = api
            .group("nobody")
            .unwrap()
            .weekly_chart_list()
            .await
            .unwrap_err();

        match err {
            ScrobblerError::Api { code, message } => {
                assert_eq!(code, 6);
                assert_eq!(message, "Group not found");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_not_found() {
        let mock_server = MockServer::start().await;

        let api = api(&mock_server);
        let err = api.artist("Cher").unwrap().top_tracks().await.unwrap_err();

        match err {
            ScrobblerError::NotFound(url) => {
                assert!(url.contains("artist.getTopTracks"));
                assert!(!url.contains("test-key"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rate_limited_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let api = api(&mock_server);
        let err = api.artist("Cher").unwrap().top_tracks().await.unwrap_err();
        assert!(matches!(err, ScrobblerError::RateLimitExceeded));
    }

    #[tokio::test]
    async fn test_recommended_artists_require_session() {
        let mock_server = MockServer::start().await;

        let api = api(&mock_server);
        let rj = api.user("RJ").unwrap();

        assert!(!rj.authenticated());
        let err = rj.recommended_artists().unwrap_err();
        match err {
            ScrobblerError::Core(CoreError::AuthenticationRequired { identity }) => {
                assert_eq!(identity.as_deref(), Some("RJ"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(api.authenticated_user().is_err());
        assert_eq!(request_count(&mock_server).await, 0);
    }

    #[tokio::test]
    async fn test_recommended_artists_with_session() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("method", "user.getRecommendedArtists"))
            .and(query_param("sk", "session-key"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<lfm status="ok"><recommendations user="RJ" page="1" totalPages="1"><artist><name>Madonna</name><mbid>79239441</mbid></artist><artist><name>Cher</name></artist></recommendations></lfm>"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let api = Api::builder("test-key")
            .base_url(mock_server.uri())
            .rate_limit_interval(Duration::ZERO)
            .session("RJ", "session-key")
            .build()
            .unwrap();

        let rj = api.authenticated_user().unwrap();
        assert!(rj.authenticated());
        assert!(Arc::ptr_eq(&rj, &api.user("RJ").unwrap()));

        let artists = rj.recommended_artists().unwrap().collect().await.unwrap();
        assert_eq!(artists.len(), 2);
        assert_eq!(artists[0].name(), "Madonna");
        assert_eq!(artists[0].mbid(), Some("79239441"));
        assert!(Arc::ptr_eq(&artists[1], &api.artist("Cher").unwrap()));

        // Someone else's recommendations stay out of reach.
        assert!(api.user("franz").unwrap().recommended_artists().is_err());
    }

    #[tokio::test]
    async fn test_top_tracks_with_callback() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("method", "artist.getTopTracks"))
            .respond_with(ResponseTemplate::new(200).set_body_string(top_tracks_response()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let api = api(&mock_server);
        let cher = api.artist("Cher").unwrap();

        let (tx, rx) = tokio::sync::oneshot::channel();
        let handle = cher.top_tracks_with(move |result| {
            let _ = tx.send(result.map(|tracks| tracks.len()));
        });

        handle.await.unwrap();
        assert_eq!(rx.await.unwrap().unwrap(), 2);

        // The background fetch filled the memo.
        assert_eq!(cher.top_tracks().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_weekly_chart_list_is_memoized() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("method", "group.getWeeklyChartList"))
            .and(query_param("group", "mnml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(chart_list_response()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let api = api(&mock_server);
        let group = api.group("mnml").unwrap();

        let ranges = group.weekly_chart_list().await.unwrap();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].from.timestamp(), FIRST_WEEK.0);
        assert_eq!(ranges[1].to.timestamp(), SECOND_WEEK.1);

        assert_eq!(group.weekly_chart_list().await.unwrap(), ranges);
    }

    #[tokio::test]
    async fn test_weekly_album_chart_list_newest_first() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("method", "group.getWeeklyChartList"))
            .respond_with(ResponseTemplate::new(200).set_body_string(chart_list_response()))
            .expect(1)
            .mount(&mock_server)
            .await;

        for (week, album) in [(FIRST_WEEK, "Heimische Gefilde"), (SECOND_WEEK, "Flora und Fauna")] {
            Mock::given(method("GET"))
                .and(query_param("method", "group.getWeeklyAlbumChart"))
                .and(query_param("from", week.0.to_string()))
                .and(query_param("to", week.1.to_string()))
                .respond_with(
                    ResponseTemplate::new(200).set_body_string(album_chart_response(week, album)),
                )
                .expect(1)
                .mount(&mock_server)
                .await;
        }

        let api = api(&mock_server);
        let group = api.group("mnml").unwrap();

        let mut charts = group.weekly_album_chart_list().await.unwrap();
        assert_eq!(request_count(&mock_server).await, 1);

        let newest = charts.next().await.unwrap().unwrap();
        assert_eq!(newest.range.from.timestamp(), SECOND_WEEK.0);
        assert_eq!(newest.subject, "mnml");
        assert_eq!(newest.top_album().unwrap().name, "Flora und Fauna");
        assert_eq!(newest.top_album().unwrap().artist_mbid, None);
        assert_eq!(request_count(&mock_server).await, 2);

        let oldest = charts.next().await.unwrap().unwrap();
        assert_eq!(oldest.top_album().unwrap().name, "Heimische Gefilde");
        assert!(charts.next().await.is_none());
    }

    #[tokio::test]
    async fn test_recent_weekly_album_chart_is_memoized() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("method", "group.getWeeklyAlbumChart"))
            .and(query_param("group", "mnml"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(album_chart_response(SECOND_WEEK, "Flora und Fauna")),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let api = api(&mock_server);
        let group = api.group("mnml").unwrap();

        let chart = group.recent_weekly_album_chart().await.unwrap();
        let again = group.recent_weekly_album_chart().await.unwrap();
        assert_eq!(chart, again);

        let requests = mock_server.received_requests().await.unwrap();
        assert!(!requests[0].url.query().unwrap_or_default().contains("from="));
    }

    #[tokio::test]
    async fn test_shutdown_refuses_requests() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(top_tracks_response()))
            .expect(0)
            .mount(&mock_server)
            .await;

        let api = api(&mock_server);
        let cher = api.artist("Cher").unwrap();
        api.shutdown();

        let err = cher.top_tracks().await.unwrap_err();
        assert!(matches!(err, ScrobblerError::RateLimiterClosed));
        let err = api.group("mnml").unwrap().members().first().await.unwrap_err();
        assert!(matches!(err, ScrobblerError::RateLimiterClosed));
    }

    #[tokio::test]
    async fn test_artist_tags_require_session() {
        let mock_server = MockServer::start().await;

        let api = api(&mock_server);
        let err = api.artist("Cher").unwrap().tags().await.unwrap_err();

        assert!(matches!(
            err,
            ScrobblerError::Core(CoreError::AuthenticationRequired { identity: None })
        ));
        assert_eq!(request_count(&mock_server).await, 0);
    }

    #[tokio::test]
    async fn test_artist_tags_with_session() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("method", "artist.getTags"))
            .and(query_param("artist", "Cher"))
            .and(query_param("sk", "session-key"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<lfm status="ok"><tags artist="Cher"><tag><name>pop</name><url>http://www.last.fm/tag/pop</url></tag><tag><name> diva </name></tag></tags></lfm>"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let api = Api::builder("test-key")
            .base_url(mock_server.uri())
            .rate_limit_interval(Duration::ZERO)
            .session("RJ", "session-key")
            .build()
            .unwrap();

        let tags = api.artist("Cher").unwrap().tags().await.unwrap();
        assert_eq!(tags, vec!["pop".to_string(), "diva".to_string()]);
    }
}
