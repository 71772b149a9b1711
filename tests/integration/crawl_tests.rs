//! Integration tests for the crawl engine
//!
//! These tests use wiremock to create mock HTTP servers and verify crawler
//! behavior end to end.

use site_sweep::config::{Config, FrontierStrategy};
use site_sweep::crawler::{Coordinator, PageFailure};
use site_sweep::handlers::{BrokenLinkHandler, SeoHandler};
use site_sweep::output::{write_broken_links, write_seo_report};
use std::collections::HashSet;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Config for tests: no delay, short timeout
fn test_config(max_pages: usize) -> Config {
    let mut config = Config::default();
    config.crawler.max_pages = max_pages;
    config.crawler.delay_ms = 0;
    config.crawler.timeout_secs = 5;
    config
}

/// Mounts an HTML page that must be fetched exactly `times` times
async fn mount_html(server: &MockServer, p: &str, body: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path(p))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html"))
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_each_page_visited_at_most_once() {
    let mock_server = MockServer::start().await;

    // Every page links to every other page, and to itself
    let links = r#"<a href="/">home</a><a href="/a">a</a><a href="/b">b</a><a href="/a">a again</a>"#;
    mount_html(&mock_server, "/", links, 1).await;
    mount_html(&mock_server, "/a", links, 1).await;
    mount_html(&mock_server, "/b", links, 1).await;

    let coordinator = Coordinator::new(test_config(50), SeoHandler::new()).unwrap();
    let report = coordinator
        .crawl(&format!("{}/", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(report.results.len(), 3);
    let unique: HashSet<_> = report.results.iter().map(|r| r.url.clone()).collect();
    assert_eq!(unique.len(), 3);
}

#[tokio::test]
async fn test_budget_respected() {
    let mock_server = MockServer::start().await;

    // A site with far more pages than the budget
    let hub: String = (0..20)
        .map(|i| format!(r#"<a href="/p{}">p{}</a>"#, i, i))
        .collect();
    mount_html(&mock_server, "/", &hub, 1).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(hub.clone(), "text/html"))
        .mount(&mock_server)
        .await;

    let coordinator = Coordinator::new(test_config(4), SeoHandler::new()).unwrap();
    let report = coordinator
        .crawl(&format!("{}/", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(report.results.len(), 4);
    assert_eq!(report.stats.pages_visited, 4);

    let received = mock_server.received_requests().await.unwrap();
    assert_eq!(received.len(), 4);
}

#[tokio::test]
async fn test_other_origins_never_crawled() {
    let mock_server = MockServer::start().await;
    let other_server = MockServer::start().await;

    let home = format!(
        r#"<a href="{}/x">other</a><a href="/local">local</a>"#,
        other_server.uri()
    );
    mount_html(&mock_server, "/", &home, 1).await;
    mount_html(&mock_server, "/local", "<p>local</p>", 1).await;

    // Same host, different port: a different origin
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&other_server)
        .await;

    let coordinator = Coordinator::new(test_config(50), SeoHandler::new()).unwrap();
    let report = coordinator
        .crawl(&format!("{}/", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(report.results.len(), 2);
}

#[tokio::test]
async fn test_assets_and_fragments_not_queued() {
    let mock_server = MockServer::start().await;

    let home = r#"
        <a href="/photo.jpg">photo</a>
        <a href="/manual.pdf">manual</a>
        <a href="/page#section">section</a>
        <a href="/page">page</a>
    "#;
    mount_html(&mock_server, "/", home, 1).await;
    mount_html(&mock_server, "/page", "<p>page</p>", 1).await;
    Mock::given(method("GET"))
        .and(path("/photo.jpg"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/manual.pdf"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let coordinator = Coordinator::new(test_config(50), SeoHandler::new()).unwrap();
    let report = coordinator
        .crawl(&format!("{}/", mock_server.uri()))
        .await
        .unwrap();

    let visited: Vec<&str> = report.results.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(visited.len(), 2);
    assert!(visited.iter().all(|url| !url.contains('#')));
}

#[tokio::test]
async fn test_failure_isolation() {
    let mock_server = MockServer::start().await;

    mount_html(
        &mock_server,
        "/",
        r#"<a href="/broken">broken</a><a href="/fine">fine</a>"#,
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_html(&mock_server, "/fine", "<title>Fine</title>", 1).await;

    let coordinator = Coordinator::new(test_config(50), SeoHandler::new()).unwrap();
    let report = coordinator
        .crawl(&format!("{}/", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(report.results.len(), 3);

    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].0.as_str().ends_with("/broken"));
    assert_eq!(failures[0].1, &PageFailure::HttpStatus { code: 500 });

    assert_eq!(report.stats.pages_processed, 2);
    assert_eq!(report.stats.pages_failed, 1);
}

#[tokio::test]
async fn test_single_page_site_terminates() {
    let mock_server = MockServer::start().await;
    mount_html(&mock_server, "/", "<html><body>No links here</body></html>", 1).await;

    let coordinator = Coordinator::new(test_config(50), SeoHandler::new()).unwrap();
    let report = coordinator
        .crawl(&format!("{}/", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(report.results.len(), 1);
    assert!(report.results[0].is_success());
    assert_eq!(report.stats.frontier_remaining, 0);
}

#[tokio::test]
async fn test_unreachable_seed_is_a_failed_page() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let coordinator = Coordinator::new(test_config(50), BrokenLinkHandler::new()).unwrap();
    let report = coordinator
        .crawl(&format!("http://127.0.0.1:{}/", port))
        .await
        .unwrap();

    assert_eq!(report.results.len(), 1);
    assert!(matches!(
        report.results[0].failure(),
        Some(PageFailure::Fetch(_))
    ));
    let check = report.results[0].record().unwrap();
    assert!(check.broken);
}

#[tokio::test]
async fn test_visit_order_follows_strategy() {
    let mock_server = MockServer::start().await;

    mount_html(
        &mock_server,
        "/",
        r#"<a href="/a">a</a><a href="/b">b</a>"#,
        1,
    )
    .await;
    mount_html(&mock_server, "/a", r#"<a href="/a/deep">deep</a>"#, 1).await;
    mount_html(&mock_server, "/b", "<p>b</p>", 1).await;
    mount_html(&mock_server, "/a/deep", "<p>deep</p>", 1).await;

    let mut config = test_config(50);
    config.crawler.strategy = FrontierStrategy::BreadthFirst;
    let coordinator = Coordinator::new(config, SeoHandler::new()).unwrap();
    let report = coordinator
        .crawl(&format!("{}/", mock_server.uri()))
        .await
        .unwrap();

    let paths: Vec<&str> = report.results.iter().map(|r| r.url.url().path()).collect();
    assert_eq!(paths, vec!["/", "/a", "/b", "/a/deep"]);
}

#[tokio::test]
async fn test_depth_first_order() {
    let mock_server = MockServer::start().await;

    mount_html(
        &mock_server,
        "/",
        r#"<a href="/a">a</a><a href="/b">b</a>"#,
        1,
    )
    .await;
    mount_html(&mock_server, "/a", "<p>a</p>", 1).await;
    mount_html(&mock_server, "/b", r#"<a href="/b/deep">deep</a>"#, 1).await;
    mount_html(&mock_server, "/b/deep", "<p>deep</p>", 1).await;

    let mut config = test_config(50);
    config.crawler.strategy = FrontierStrategy::DepthFirst;
    let coordinator = Coordinator::new(config, SeoHandler::new()).unwrap();
    let report = coordinator
        .crawl(&format!("{}/", mock_server.uri()))
        .await
        .unwrap();

    let paths: Vec<&str> = report.results.iter().map(|r| r.url.url().path()).collect();
    assert_eq!(paths, vec!["/", "/b", "/b/deep", "/a"]);
}

#[tokio::test]
async fn test_seo_crawl_writes_report() {
    let mock_server = MockServer::start().await;

    mount_html(
        &mock_server,
        "/",
        r#"<html><head><title>Home</title>
           <meta name="description" content="The home page">
           <meta property="og:title" content="Home">
           </head><body><h1>Welcome</h1><img src="/logo.png"><a href="/about">About</a></body></html>"#,
        1,
    )
    .await;
    mount_html(
        &mock_server,
        "/about",
        r#"<html><head><title>About us</title></head><body><h1>About</h1><h2>Team</h2></body></html>"#,
        1,
    )
    .await;

    let coordinator = Coordinator::new(test_config(50), SeoHandler::new()).unwrap();
    let report = coordinator
        .crawl(&format!("{}/", mock_server.uri()))
        .await
        .unwrap();

    let records = report.into_records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].title.as_deref(), Some("Home"));
    assert_eq!(records[0].images_without_alt(), 1);
    assert_eq!(records[0].og_tags.len(), 1);
    assert_eq!(records[1].title.as_deref(), Some("About us"));
    assert_eq!(records[1].h2_count, 1);

    let dir = tempfile::tempdir().unwrap();
    let path = write_seo_report(&records, dir.path(), "20240101_0000").unwrap();
    let text = std::fs::read_to_string(path).unwrap();
    // BOM + header + two rows
    assert!(text.starts_with('\u{feff}'));
    assert_eq!(text.lines().count(), 3);
}

#[tokio::test]
async fn test_broken_link_crawl() {
    let mock_server = MockServer::start().await;

    mount_html(
        &mock_server,
        "/",
        r#"<a href="/gone">gone</a><a href="/error">error</a><a href="/ok">ok</a>"#,
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/error"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_html(&mock_server, "/ok", "<p>ok</p>", 1).await;

    let coordinator = Coordinator::new(test_config(50), BrokenLinkHandler::new()).unwrap();
    let report = coordinator
        .crawl(&format!("{}/", mock_server.uri()))
        .await
        .unwrap();

    let origin = report.seed.origin();
    let checks = report.into_records();
    assert_eq!(checks.len(), 4);

    let broken: Vec<&str> = checks
        .iter()
        .filter(|c| c.broken)
        .map(|c| c.url.as_str())
        .collect();
    assert_eq!(broken.len(), 1);
    assert!(broken[0].ends_with("/gone"));

    let dir = tempfile::tempdir().unwrap();
    let (_, count) = write_broken_links(&checks, dir.path(), &origin).unwrap();
    assert_eq!(count, 1);
}
