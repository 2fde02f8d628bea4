//! Integration tests for the club-feed publications service
//!
//! These tests run the fetch → aggregate → normalize → HTTP pipeline
//! against local mock feed servers.

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common {
    use super::*;
    use club_feed::fetcher::Fetcher;

    pub fn test_fetcher() -> Fetcher {
        Fetcher::new("club-feed-test/0.1", Duration::from_secs(5)).expect("failed to build fetcher")
    }

    /// Build an RSS 2.0 document from `(title, link, pubDate)` triples.
    pub fn rss_feed(items: &[(&str, &str, &str)]) -> String {
        let items: String = items
            .iter()
            .map(|(title, link, pub_date)| {
                format!(
                    r#"<item>
                        <title>{title}</title>
                        <link>{link}</link>
                        <guid>{link}</guid>
                        <dc:creator><![CDATA[Club Writer]]></dc:creator>
                        <pubDate>{pub_date}</pubDate>
                        <content:encoded><![CDATA[<p><img src="https://example.com/{title}.png"></p><p>About {title}.</p>]]></content:encoded>
                    </item>"#
                )
            })
            .collect();

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <rss xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:content="http://purl.org/rss/1.0/modules/content/" version="2.0">
                <channel>
                    <title>Test Feed</title>
                    <link>https://example.com</link>
                    <description>Test</description>
                    {items}
                </channel>
            </rss>"#
        )
    }

    pub async fn mount_feed(server: &MockServer, feed_path: &str, body: String) {
        Mock::given(method("GET"))
            .and(path(feed_path))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/rss+xml")
                    .set_body_string(body),
            )
            .mount(server)
            .await;
    }

    pub async fn mount_failure(server: &MockServer, feed_path: &str) {
        Mock::given(method("GET"))
            .and(path(feed_path))
            .respond_with(ResponseTemplate::new(500))
            .mount(server)
            .await;
    }
}

#[cfg(test)]
mod config_integration_tests {
    use club_feed::config::Config;

    #[test]
    fn test_load_actual_config_file() {
        let config = Config::load("club-feed.toml");
        assert!(config.is_ok(), "Failed to load club-feed.toml: {:?}", config.err());

        let config = config.unwrap();
        assert!(config.locale().is_ok());
        assert!(config.request_timeout_secs > 0);
        assert_eq!(config.sources_env, "MEDIUM_RSS_URLS");
    }
}

#[cfg(test)]
mod fetcher_integration_tests {
    use super::common::*;
    use super::*;
    use club_feed::error::FetchError;
    use club_feed::fetcher::Fetcher;

    #[tokio::test]
    async fn test_fetch_feed_parses_items() {
        let server = MockServer::start().await;
        mount_feed(
            &server,
            "/feed",
            rss_feed(&[("First", "https://example.com/1", "Mon, 02 Dec 2024 10:00:00 GMT")]),
        )
        .await;

        let items = test_fetcher()
            .fetch_feed(&format!("{}/feed", server.uri()))
            .await
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title.as_deref(), Some("First"));
        assert_eq!(items[0].creator.as_deref(), Some("Club Writer"));
        assert!(items[0].published.is_some());
    }

    #[tokio::test]
    async fn test_fetch_sends_configured_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .and(header("user-agent", "Mozilla/5.0 club-test"))
            .respond_with(ResponseTemplate::new(200).set_body_string(rss_feed(&[])))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = Fetcher::new("Mozilla/5.0 club-test", Duration::from_secs(5)).unwrap();
        let items = fetcher
            .fetch_feed(&format!("{}/feed", server.uri()))
            .await
            .unwrap();

        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let server = MockServer::start().await;
        mount_failure(&server, "/feed").await;

        let url = format!("{}/feed", server.uri());
        let err = test_fetcher().fetch_feed(&url).await.unwrap_err();

        assert!(matches!(err, FetchError::Status { .. }));
        assert_eq!(err.url(), url);
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let server = MockServer::start().await;
        mount_feed(&server, "/feed", "<html><body>Not a feed".to_string()).await;

        let err = test_fetcher()
            .fetch_feed(&format!("{}/feed", server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Parse { .. }));
    }
}

#[cfg(test)]
mod aggregator_integration_tests {
    use super::common::*;
    use super::*;
    use club_feed::aggregator::fetch_all;

    #[tokio::test]
    async fn test_failed_source_is_skipped() {
        let server = MockServer::start().await;
        mount_feed(
            &server,
            "/one",
            rss_feed(&[("One", "https://one.example.com/a", "Mon, 02 Dec 2024 10:00:00 GMT")]),
        )
        .await;
        mount_failure(&server, "/two").await;
        mount_feed(
            &server,
            "/three",
            rss_feed(&[("Three", "https://three.example.com/a", "Wed, 04 Dec 2024 10:00:00 GMT")]),
        )
        .await;

        let urls: Vec<String> = ["/one", "/two", "/three"]
            .iter()
            .map(|p| format!("{}{}", server.uri(), p))
            .collect();

        let items = fetch_all(&test_fetcher(), &urls).await;

        let links: Vec<&str> = items.iter().map(|i| i.link.as_str()).collect();
        assert_eq!(
            links,
            vec!["https://three.example.com/a", "https://one.example.com/a"]
        );
        assert!(items
            .iter()
            .all(|i| i.source.as_deref() == Some("127.0.0.1")));
    }

    #[tokio::test]
    async fn test_all_sources_failing_gives_empty_list() {
        let server = MockServer::start().await;
        mount_failure(&server, "/one").await;
        mount_failure(&server, "/two").await;

        let urls = vec![
            format!("{}/one", server.uri()),
            format!("{}/two", server.uri()),
        ];

        assert!(fetch_all(&test_fetcher(), &urls).await.is_empty());
    }

    #[tokio::test]
    async fn test_medium_style_path_gets_handle_as_source() {
        let server = MockServer::start().await;
        mount_feed(
            &server,
            "/medium.com/feed/@jane-doe",
            rss_feed(&[("Post", "https://medium.com/p/1", "Mon, 02 Dec 2024 10:00:00 GMT")]),
        )
        .await;

        let urls = vec![format!("{}/medium.com/feed/@jane-doe", server.uri())];
        let items = fetch_all(&test_fetcher(), &urls).await;

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].source.as_deref(), Some("Jane Doe"));
    }
}

#[cfg(test)]
mod end_to_end_tests {
    use super::common::*;
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use chrono::Locale;
    use club_feed::config::FeedSources;
    use club_feed::routes::{app, AppState};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn create_app(sources: Option<String>) -> Router {
        let state = AppState::new(
            Arc::new(test_fetcher()),
            FeedSources::Fixed(sources),
            Locale::tr_TR,
        );
        app(Arc::new(state))
    }

    async fn get_rss(app: Router) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri("/rss").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_partial_failure_still_succeeds() {
        let server = MockServer::start().await;
        mount_feed(
            &server,
            "/one",
            rss_feed(&[
                ("Oldest", "https://one.example.com/oldest", "Sun, 01 Dec 2024 10:00:00 GMT"),
                ("Newer", "https://one.example.com/newer", "Thu, 05 Dec 2024 10:00:00 GMT"),
            ]),
        )
        .await;
        mount_failure(&server, "/two").await;
        mount_feed(
            &server,
            "/medium.com/feed/@jane-doe",
            rss_feed(&[
                ("Middle", "https://medium.com/p/middle", "Tue, 03 Dec 2024 10:00:00 GMT"),
                ("Newest", "https://medium.com/p/newest", "Sat, 07 Dec 2024 10:00:00 GMT"),
            ]),
        )
        .await;

        let sources = format!(
            "{uri}/one, {uri}/two ,{uri}/medium.com/feed/@jane-doe",
            uri = server.uri()
        );
        let (status, body) = get_rss(create_app(Some(sources))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "RSS beslemeleri başarıyla çekildi");
        assert_eq!(body["count"], 4);
        assert_eq!(body["sources"], 3);

        let items = body["data"]["items"].as_array().unwrap();
        let titles: Vec<&str> = items.iter().map(|i| i["title"].as_str().unwrap()).collect();
        assert_eq!(titles, vec!["Newest", "Newer", "Middle", "Oldest"]);

        let newest = &items[0];
        assert_eq!(newest["source"], "Jane Doe");
        assert_eq!(newest["author"], "Club Writer");
        assert_eq!(newest["date"], "7 Aralık 2024");
        assert_eq!(newest["coverImage"], "https://example.com/Newest.png");
        assert_eq!(newest["excerpt"], "About Newest.");
        assert_eq!(newest["link"], "https://medium.com/p/newest");
        assert_eq!(items[1]["source"], "127.0.0.1");
    }

    #[tokio::test]
    async fn test_all_sources_down_is_empty_success() {
        let server = MockServer::start().await;
        mount_failure(&server, "/one").await;

        let (status, body) = get_rss(create_app(Some(format!("{}/one", server.uri())))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["count"], 0);
        assert_eq!(body["sources"], 1);
        assert_eq!(body["data"]["items"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_zero_config_makes_no_network_calls() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(rss_feed(&[])))
            .expect(0)
            .mount(&server)
            .await;

        let (status, body) = get_rss(create_app(None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, _) = get_rss(create_app(Some(" , ".to_string()))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let received = server.received_requests().await.unwrap();
        assert!(received.is_empty());
    }
}
