//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small phpBB-style forum and run the
//! full crawl cycle end-to-end, including persistence and deduplication.

use forum_scribe::config::Config;
use forum_scribe::crawler::{crawl, CrawlOrchestrator, HttpFetcher, StopReason};
use forum_scribe::model::{Post, TopicDocument};
use forum_scribe::output::{
    deduplicate_file, load_documents, write_documents, DedupKey, DiscardSink, JsonFileSink,
};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, output: &str) -> Config {
    let mut config = Config::default();
    config.forum.base_url = base_url.to_string();
    config.forum.start_url = format!("{}/forum/page1", base_url);
    config.crawler.delay_ms = 0;
    config.crawler.max_listing_pages = 10;
    config.crawler.max_topic_pages = 10;
    config.crawler.request_timeout_secs = 5;
    config.user_agent.crawler_name = "TestBot".to_string();
    config.user_agent.crawler_version = "1.0".to_string();
    config.output.path = output.to_string();
    config
}

fn listing_page(topics: &[(&str, &str)], next: Option<&str>) -> String {
    let items: String = topics
        .iter()
        .map(|(href, title)| {
            format!(
                r#"<li class="row"><dl><dt><a href="{}" class="topictitle">{}</a></dt></dl></li>"#,
                href, title
            )
        })
        .collect();
    let next = next
        .map(|href| format!(r#"<li class="arrow next"><a rel="next" href="{}">Next</a></li>"#, href))
        .unwrap_or_default();
    format!(
        r#"<html><head><title>Help</title></head><body>
        <ul class="topiclist topics">{}</ul>
        <div class="pagination"><ul>{}</ul></div>
        </body></html>"#,
        items, next
    )
}

fn topic_page(posts: &[(&str, &str)], next: Option<&str>) -> String {
    let items: String = posts
        .iter()
        .map(|(author, content)| {
            format!(
                r#"<div class="post bg2">
                    <p class="author">by <strong><a class="username">{}</a></strong> » Mon Jan 01, 2024 10:00 am</p>
                    <div class="content">{}</div>
                </div>"#,
                author, content
            )
        })
        .collect();
    let next = next
        .map(|href| format!(r#"<a rel="next" href="{}">Next</a>"#, href))
        .unwrap_or_default();
    format!("<html><body>{}{}</body></html>", items, next)
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=UTF-8")
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html(body))
        .mount(server)
        .await;
}

/// Three listing pages with two single-post topics each
async fn mount_three_page_forum(server: &MockServer) {
    mount_page(
        server,
        "/forum/page1",
        listing_page(&[("/t/1", "Topic 1"), ("/t/2", "Topic 2")], Some("/forum/page2")),
    )
    .await;
    mount_page(
        server,
        "/forum/page2",
        listing_page(&[("/t/3", "Topic 3"), ("/t/4", "Topic 4")], Some("/forum/page3")),
    )
    .await;
    mount_page(
        server,
        "/forum/page3",
        listing_page(&[("/t/5", "Topic 5"), ("/t/6", "Topic 6")], None),
    )
    .await;

    for i in 1..=6 {
        mount_page(
            server,
            &format!("/t/{}", i),
            topic_page(&[("alice", &format!("post in topic {}", i))], None),
        )
        .await;
    }
}

#[tokio::test]
async fn test_listing_pagination_collects_all_topics_in_order() {
    let mock_server = MockServer::start().await;
    mount_three_page_forum(&mock_server).await;

    let config = create_test_config(&mock_server.uri(), "unused.json");
    let fetcher = HttpFetcher::from_config(&config.user_agent, Duration::from_secs(5)).unwrap();
    let orchestrator = CrawlOrchestrator::new(fetcher, &config).unwrap();

    let listing = orchestrator.collect_topics().await;

    let titles: Vec<&str> = listing.records.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["Topic 1", "Topic 2", "Topic 3", "Topic 4", "Topic 5", "Topic 6"]
    );
    assert_eq!(
        listing.records[2].url.as_str(),
        format!("{}/t/3", mock_server.uri())
    );
    assert_eq!(listing.stop, StopReason::Exhausted);
}

#[tokio::test]
async fn test_listing_page_cap_stops_early() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/forum/page1",
        listing_page(&[("/t/1", "Topic 1"), ("/t/2", "Topic 2")], Some("/forum/page2")),
    )
    .await;
    mount_page(
        &mock_server,
        "/forum/page2",
        listing_page(&[("/t/3", "Topic 3"), ("/t/4", "Topic 4")], Some("/forum/page3")),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/forum/page3"))
        .respond_with(html(listing_page(&[("/t/5", "Topic 5")], None)))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), "unused.json");
    config.crawler.max_listing_pages = 2;
    let fetcher = HttpFetcher::from_config(&config.user_agent, Duration::from_secs(5)).unwrap();
    let orchestrator = CrawlOrchestrator::new(fetcher, &config).unwrap();

    let listing = orchestrator.collect_topics().await;

    assert_eq!(listing.records.len(), 4);
    assert_eq!(listing.records[3].title, "Topic 4");
    assert_eq!(listing.stop, StopReason::PageCap);
}

#[tokio::test]
async fn test_full_crawl_writes_well_formed_document() {
    let mock_server = MockServer::start().await;
    mount_three_page_forum(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("collected_forum_data/all_posts.json");
    let config = create_test_config(&mock_server.uri(), output.to_str().unwrap());

    let mut sink = JsonFileSink::create(&output, 1).unwrap();
    let report = crawl(&config, &mut sink).await.expect("Crawl failed");

    assert_eq!(report.topic_count(), 6);
    assert_eq!(report.post_count(), 6);
    assert!(report.truncated_topics.is_empty());
    assert_eq!(report.requests_issued, 9);

    let documents = load_documents(&output).expect("Output should be valid JSON");
    assert_eq!(documents.len(), 6);
    assert_eq!(documents[0].title, "Topic 1");
    assert_eq!(documents[0].posts[0].author, "alice");
    assert_eq!(
        documents[0].posts[0].date,
        "by alice » Mon Jan 01, 2024 10:00 am"
    );
    assert_eq!(documents[5].posts[0].content, "post in topic 6");

    let raw = std::fs::read_to_string(&output).unwrap();
    assert!(raw.contains("\"chat\""));
}

#[tokio::test]
async fn test_topic_page_failure_keeps_first_page_posts() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/forum/page1",
        listing_page(&[("/t/1", "Flaky"), ("/t/2", "Healthy")], None),
    )
    .await;
    mount_page(
        &mock_server,
        "/t/1",
        topic_page(&[("alice", "q"), ("bob", "a")], Some("/t/1/page2")),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/t/1/page2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/t/2", topic_page(&[("carol", "fine")], None)).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("posts.json");
    let config = create_test_config(&mock_server.uri(), output.to_str().unwrap());

    let mut sink = JsonFileSink::create(&output, 1).unwrap();
    let report = crawl(&config, &mut sink).await.unwrap();

    assert_eq!(report.truncated_topics, vec!["Flaky".to_string()]);

    let documents = load_documents(&output).unwrap();
    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0].title, "Flaky");
    assert_eq!(documents[0].posts.len(), 2);
    assert_eq!(documents[0].posts[1].author, "bob");
    assert_eq!(documents[1].posts[0].content, "fine");
}

#[tokio::test]
async fn test_transient_failure_recovered_with_retries() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/forum/page1",
        listing_page(&[("/t/1", "Retry me")], None),
    )
    .await;
    // registered first, so it answers the first request and then stops matching
    Mock::given(method("GET"))
        .and(path("/t/1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/t/1", topic_page(&[("dave", "recovered")], None)).await;

    let mut config = create_test_config(&mock_server.uri(), "unused.json");
    config.crawler.max_retries = 2;
    config.crawler.retry_backoff_ms = 10;

    let report = crawl(&config, &mut DiscardSink).await.unwrap();

    assert!(report.truncated_topics.is_empty());
    assert_eq!(report.result.documents()[0].posts[0].content, "recovered");
    assert_eq!(report.requests_issued, 3);
}

#[tokio::test]
async fn test_sends_configured_user_agent() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forum/page1"))
        .and(header("user-agent", "TestBot/1.0"))
        .respond_with(html(listing_page(&[], None)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), "unused.json");
    let report = crawl(&config, &mut DiscardSink).await.unwrap();

    assert_eq!(report.topic_count(), 0);
    assert_eq!(report.listing_stop, StopReason::Exhausted);
}

#[tokio::test]
async fn test_politeness_delay_spaces_requests() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/forum/page1",
        listing_page(&[("/t/1", "A"), ("/t/2", "B")], None),
    )
    .await;
    mount_page(&mock_server, "/t/1", topic_page(&[("x", "1")], None)).await;
    mount_page(&mock_server, "/t/2", topic_page(&[("y", "2")], None)).await;

    let mut config = create_test_config(&mock_server.uri(), "unused.json");
    config.crawler.delay_ms = 50;
    config.crawler.max_concurrent_topics = 2;

    let start = Instant::now();
    let report = crawl(&config, &mut DiscardSink).await.unwrap();

    assert_eq!(report.requests_issued, 3);
    // three requests, two enforced gaps, even with two workers
    assert!(start.elapsed() >= Duration::from_millis(100));
}

#[tokio::test]
async fn test_crawl_then_deduplicate_by_title() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/forum/page1",
        listing_page(
            &[("/t/1", "Bug report"), ("/t/2", "Feature"), ("/t/3", "Bug report")],
            None,
        ),
    )
    .await;
    mount_page(&mock_server, "/t/1", topic_page(&[("alice", "crash on save")], None)).await;
    mount_page(&mock_server, "/t/2", topic_page(&[("bob", "dark mode")], None)).await;
    mount_page(&mock_server, "/t/3", topic_page(&[("carol", "crash on open")], None)).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("all_posts.json");
    let config = create_test_config(&mock_server.uri(), output.to_str().unwrap());

    let mut sink = JsonFileSink::create(&output, 0).unwrap();
    crawl(&config, &mut sink).await.unwrap();
    assert_eq!(load_documents(&output).unwrap().len(), 3);

    // distinct URLs keep both threads under the composite key
    let summary = deduplicate_file(&output, DedupKey::TitleAndUrl).unwrap();
    assert_eq!(summary.removed(), 0);

    let summary = deduplicate_file(&output, DedupKey::Title).unwrap();
    assert_eq!(summary.before, 3);
    assert_eq!(summary.after, 2);

    let documents = load_documents(&output).unwrap();
    assert_eq!(documents[0].title, "Bug report");
    assert_eq!(documents[0].posts[0].content, "crash on save");
    assert_eq!(documents[1].title, "Feature");
}

#[tokio::test]
async fn test_unreachable_forum_yields_empty_result() {
    // Nothing listens on this port once the server is dropped
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };

    let mut config = create_test_config(&uri, "unused.json");
    config.crawler.request_timeout_secs = 2;

    let report = crawl(&config, &mut DiscardSink).await.unwrap();

    assert_eq!(report.topic_count(), 0);
    assert!(matches!(report.listing_stop, StopReason::Failed(_)));
}

#[tokio::test]
async fn test_unreachable_forum_keeps_previous_harvest() {
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("all_posts.json");
    let earlier = vec![TopicDocument {
        title: "Earlier topic".to_string(),
        url: Some(format!("{}/t/1", uri)),
        posts: vec![Post::default()],
    }];
    write_documents(&output, &earlier).unwrap();

    let mut config = create_test_config(&uri, output.to_str().unwrap());
    config.crawler.request_timeout_secs = 2;

    let mut sink = JsonFileSink::append(&output, config.output.checkpoint_every).unwrap();
    let report = crawl(&config, &mut sink).await.unwrap();

    assert!(matches!(report.listing_stop, StopReason::Failed(_)));
    assert_eq!(load_documents(&output).unwrap(), earlier);
}

#[tokio::test]
async fn test_second_crawl_appends_after_first() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/forum/page1",
        listing_page(&[("/t/1", "Only topic")], None),
    )
    .await;
    mount_page(&mock_server, "/t/1", topic_page(&[("alice", "hello")], None)).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("all_posts.json");
    let config = create_test_config(&mock_server.uri(), output.to_str().unwrap());

    for _ in 0..2 {
        let mut sink = JsonFileSink::append(&output, 1).unwrap();
        crawl(&config, &mut sink).await.unwrap();
    }
    assert_eq!(load_documents(&output).unwrap().len(), 2);

    let summary = deduplicate_file(&output, DedupKey::Title).unwrap();
    assert_eq!(summary.removed(), 1);
}
