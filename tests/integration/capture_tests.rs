//! Integration tests for the capture pipeline
//!
//! These tests use wiremock to create mock HTTP servers and run full
//! captures end-to-end, verifying the produced archive.

use site_archiver::config::CaptureSettings;
use site_archiver::crawler::capture;
use site_archiver::{CaptureError, CaptureEvent, CaptureMode, CaptureService};
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::ZipArchive;

fn html(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into(), "text/html; charset=utf-8")
}

fn bytes(body: &[u8], mime: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_vec(), mime)
}

/// Creates fast test settings
fn test_settings() -> CaptureSettings {
    CaptureSettings {
        request_timeout_secs: 5,
        user_agent: "TestArchiver/1.0".to_string(),
        ..CaptureSettings::default()
    }
}

async fn mount_get(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn mount_get_expect(server: &MockServer, route: &str, response: ResponseTemplate, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .expect(times)
        .mount(server)
        .await;
}

fn read_archive(archive: Vec<u8>) -> BTreeMap<String, Vec<u8>> {
    let mut zip = ZipArchive::new(Cursor::new(archive)).expect("archive should be a valid zip");
    let mut files = BTreeMap::new();
    for i in 0..zip.len() {
        let mut file = zip.by_index(i).expect("entry should be readable");
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).expect("entry should decompress");
        files.insert(file.name().to_string(), contents);
    }
    files
}

fn text(files: &BTreeMap<String, Vec<u8>>, name: &str) -> String {
    String::from_utf8(files[name].clone()).expect("entry should be UTF-8")
}

#[tokio::test]
async fn test_full_capture_single_site() {
    let server = MockServer::start().await;
    let seed = format!("{}/", server.uri());

    mount_get(
        &server,
        "/",
        html(format!(
            r#"<html><head><title>Home</title>
            <link rel="stylesheet" href="/css/site.css"></head><body>
            <img src="/img/logo.png">
            <a href="/about">About</a>
            <a href="{}/blog/post">Post</a>
            </body></html>"#,
            server.uri()
        )),
    )
    .await;
    mount_get(
        &server,
        "/about",
        html(r#"<html><body><img src="img/logo.png"><script src="/js/app.js"></script></body></html>"#),
    )
    .await;
    mount_get(
        &server,
        "/blog/post",
        html(format!(
            r#"<html><body><img src="{}/img/logo.png"></body></html>"#,
            server.uri()
        )),
    )
    .await;
    mount_get(
        &server,
        "/css/site.css",
        bytes(b"body { background: url('../img/logo.png'); }", "text/css"),
    )
    .await;
    mount_get(&server, "/js/app.js", bytes(b"console.log(1);", "application/javascript")).await;
    // Referenced from every page, fetched exactly once
    mount_get_expect(&server, "/img/logo.png", bytes(b"PNGDATA", "image/png"), 1).await;

    let outcome = capture(&seed, CaptureMode::Full, test_settings())
        .await
        .expect("capture should succeed");

    assert_eq!(outcome.pages, 3);
    assert_eq!(outcome.assets, 3);
    assert_eq!(outcome.progress.downloaded, 3);
    assert_eq!(outcome.progress.failed, 0);
    assert!(outcome.progress.completed);

    let files = read_archive(outcome.archive);
    let names: Vec<&str> = files.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        vec![
            "css/site.css",
            "images/logo.png",
            "index.html",
            "js/app.js",
            "pages/about.html",
            "pages/blog/post.html",
        ]
    );

    assert_eq!(files["images/logo.png"], b"PNGDATA");
    assert!(text(&files, "index.html").contains(r#"href="css/site.css""#));
    assert!(text(&files, "index.html").contains(r#"src="images/logo.png""#));
    assert!(text(&files, "pages/about.html").contains(r#"src="../images/logo.png""#));
    assert!(text(&files, "pages/about.html").contains(r#"src="../js/app.js""#));
    assert!(text(&files, "pages/blog/post.html").contains(r#"src="../../images/logo.png""#));
    assert_eq!(
        text(&files, "css/site.css"),
        r#"body { background: url("../images/logo.png"); }"#
    );
}

#[tokio::test]
async fn test_redirected_seed_crawls_landing_origin() {
    let server = MockServer::start().await;
    let port = server.address().port();
    let seed = format!("http://localhost:{}/", port);

    mount_get(
        &server,
        "/",
        ResponseTemplate::new(302).insert_header("Location", format!("{}/home", server.uri()).as_str()),
    )
    .await;
    mount_get(
        &server,
        "/home",
        html(r#"<html><body><img src="/logo.png"><a href="/about">About</a></body></html>"#),
    )
    .await;
    mount_get(&server, "/about", html("<html><body>About</body></html>")).await;
    mount_get_expect(&server, "/logo.png", bytes(b"PNGDATA", "image/png"), 1).await;

    let mut settings = test_settings();
    settings.ignore_external = true;
    let outcome = capture(&seed, CaptureMode::Full, settings)
        .await
        .expect("capture should succeed");

    assert_eq!(outcome.progress.pages_crawled, 2);
    assert_eq!(outcome.progress.downloaded, 1);

    let files = read_archive(outcome.archive);
    let names: Vec<&str> = files.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["images/logo.png", "index.html", "pages/about.html"]);
    assert!(text(&files, "index.html").contains(r#"src="images/logo.png""#));
}

#[tokio::test]
async fn test_depth_zero_visits_only_seed() {
    let server = MockServer::start().await;
    let seed = format!("{}/", server.uri());

    mount_get(
        &server,
        "/",
        html(r#"<a href="/one">1</a><a href="/two">2</a><a href="/three">3</a>"#),
    )
    .await;
    mount_get_expect(&server, "/one", html("one"), 0).await;
    mount_get_expect(&server, "/two", html("two"), 0).await;
    mount_get_expect(&server, "/three", html("three"), 0).await;

    let mut settings = test_settings();
    settings.max_depth = 0;
    let outcome = capture(&seed, CaptureMode::Full, settings).await.unwrap();

    assert_eq!(outcome.pages, 1);
    let files = read_archive(outcome.archive);
    assert_eq!(files.keys().collect::<Vec<_>>(), vec!["index.html"]);
}

#[tokio::test]
async fn test_page_count_bound() {
    let server = MockServer::start().await;
    let seed = format!("{}/", server.uri());

    let links: String = (1..=6)
        .map(|i| format!(r#"<a href="/p{}">{}</a>"#, i, i))
        .collect();
    mount_get(&server, "/", html(links)).await;
    for i in 1..=6 {
        mount_get(&server, &format!("/p{}", i), html(format!("page {}", i))).await;
    }

    let mut settings = test_settings();
    settings.max_pages = 3;
    let outcome = capture(&seed, CaptureMode::Full, settings).await.unwrap();

    assert_eq!(outcome.pages, 3);
    assert_eq!(outcome.progress.pages_crawled, 3);

    let files = read_archive(outcome.archive);
    let names: Vec<&str> = files.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["index.html", "pages/p1.html", "pages/p2.html"]);
}

#[tokio::test]
async fn test_fragment_variants_are_one_asset() {
    let server = MockServer::start().await;
    let seed = format!("{}/", server.uri());

    mount_get(
        &server,
        "/",
        html(r#"<img src="/img/a.png"><img src="/img/a.png#zoomed"><img src="/img/b.png">"#),
    )
    .await;
    mount_get_expect(&server, "/img/a.png", bytes(b"A", "image/png"), 1).await;
    mount_get_expect(&server, "/img/b.png", bytes(b"B", "image/png"), 1).await;

    let outcome = capture(&seed, CaptureMode::PageOnly, test_settings())
        .await
        .unwrap();

    assert_eq!(outcome.assets, 2);
    assert_eq!(outcome.progress.total, 2);
    assert_eq!(outcome.progress.downloaded, 2);
}

#[tokio::test]
async fn test_page_only_fetches_only_seed_assets() {
    let server = MockServer::start().await;
    let seed = format!("{}/", server.uri());

    mount_get(
        &server,
        "/",
        html(r#"<img src="/img/home.png"><a href="/about">About</a>"#),
    )
    .await;
    mount_get_expect(&server, "/about", html(r#"<img src="/img/about.png">"#), 0).await;
    mount_get_expect(&server, "/img/home.png", bytes(b"H", "image/png"), 1).await;
    mount_get_expect(&server, "/img/about.png", bytes(b"X", "image/png"), 0).await;

    let outcome = capture(&seed, CaptureMode::PageOnly, test_settings())
        .await
        .unwrap();

    assert_eq!(outcome.pages, 1);
    let files = read_archive(outcome.archive);
    let names: Vec<&str> = files.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["images/home.png", "index.html"]);
}

#[tokio::test]
async fn test_assets_only_archive_has_no_pages() {
    let server = MockServer::start().await;
    let seed = format!("{}/", server.uri());

    mount_get(&server, "/", html(r#"<script src="/js/app.js"></script>"#)).await;
    mount_get(&server, "/js/app.js", bytes(b"let a;", "application/javascript")).await;

    let outcome = capture(&seed, CaptureMode::AssetsOnly, test_settings())
        .await
        .unwrap();

    let files = read_archive(outcome.archive);
    assert_eq!(files.keys().collect::<Vec<_>>(), vec!["js/app.js"]);
}

#[tokio::test]
async fn test_oversize_asset_skipped_and_absent() {
    let server = MockServer::start().await;
    let seed = format!("{}/", server.uri());

    mount_get(
        &server,
        "/",
        html(r#"<video src="/media/big.mp4"></video><img src="/img/small.png">"#),
    )
    .await;
    mount_get(&server, "/media/big.mp4", bytes(&vec![7u8; 64 * 1024], "video/mp4")).await;
    mount_get(&server, "/img/small.png", bytes(b"tiny", "image/png")).await;

    let mut settings = test_settings();
    settings.max_file_size_bytes = 16 * 1024;
    let outcome = capture(&seed, CaptureMode::PageOnly, settings).await.unwrap();

    assert_eq!(outcome.progress.skipped, 1);
    assert_eq!(outcome.progress.downloaded, 1);
    assert_eq!(outcome.progress.failed, 0);
    assert_eq!(outcome.progress.bytes_downloaded, 4);

    let files = read_archive(outcome.archive);
    assert!(!files.contains_key("media/big.mp4"));
    assert!(files.contains_key("images/small.png"));
}

#[tokio::test]
async fn test_missing_page_counted_and_siblings_visited() {
    let server = MockServer::start().await;
    let seed = format!("{}/", server.uri());

    mount_get(
        &server,
        "/",
        html(r#"<a href="/gone">Gone</a><a href="/here">Here</a>"#),
    )
    .await;
    mount_get_expect(&server, "/gone", ResponseTemplate::new(404), 1).await;
    mount_get_expect(&server, "/here", html("still here"), 1).await;

    let outcome = capture(&seed, CaptureMode::Full, test_settings())
        .await
        .expect("a missing page must not fail the task");

    assert_eq!(outcome.progress.failed, 1);
    assert_eq!(outcome.pages, 2);
    assert!(outcome.progress.completed);

    let files = read_archive(outcome.archive);
    assert!(files.contains_key("pages/here.html"));
    assert!(!files.contains_key("pages/gone.html"));
}

#[tokio::test]
async fn test_failed_asset_is_absent() {
    let server = MockServer::start().await;
    let seed = format!("{}/", server.uri());

    mount_get(
        &server,
        "/",
        html(r#"<img src="/img/broken.png"><img src="/img/ok.png">"#),
    )
    .await;
    mount_get(&server, "/img/broken.png", ResponseTemplate::new(500)).await;
    mount_get(&server, "/img/ok.png", bytes(b"ok", "image/png")).await;

    let outcome = capture(&seed, CaptureMode::PageOnly, test_settings())
        .await
        .unwrap();

    assert_eq!(outcome.progress.failed, 1);
    assert_eq!(outcome.progress.downloaded, 1);

    let files = read_archive(outcome.archive);
    assert!(!files.contains_key("images/broken.png"));
    // Unfetched references keep their original form
    assert!(text(&files, "index.html").contains(r#"src="/img/broken.png""#));
    assert!(text(&files, "index.html").contains(r#"src="images/ok.png""#));
}

#[tokio::test]
async fn test_external_assets_and_ignore_external() {
    let site = MockServer::start().await;
    let cdn = MockServer::start().await;
    let seed = format!("{}/", site.uri());

    mount_get(
        &site,
        "/",
        html(format!(r#"<script src="{}/lib/vendor.js"></script>"#, cdn.uri())),
    )
    .await;
    mount_get_expect(
        &cdn,
        "/lib/vendor.js",
        bytes(b"vendor", "application/javascript"),
        1,
    )
    .await;

    let outcome = capture(&seed, CaptureMode::PageOnly, test_settings())
        .await
        .unwrap();
    let files = read_archive(outcome.archive);
    assert!(files.contains_key("external/127_0_0_1/vendor.js"));
    assert!(text(&files, "index.html").contains(r#"src="external/127_0_0_1/vendor.js""#));

    let mut settings = test_settings();
    settings.ignore_external = true;
    let outcome = capture(&seed, CaptureMode::PageOnly, settings).await.unwrap();
    assert_eq!(outcome.assets, 0);
}

#[tokio::test]
async fn test_unreachable_seed_fails() {
    let server = MockServer::start().await;
    let seed = format!("{}/", server.uri());

    mount_get(&server, "/", ResponseTemplate::new(503)).await;

    let err = capture(&seed, CaptureMode::Full, test_settings())
        .await
        .unwrap_err();
    assert!(matches!(err, CaptureError::SeedUnreachable { .. }));
}

#[tokio::test]
async fn test_invalid_seed_rejected() {
    let err = capture("ftp://example.com/", CaptureMode::Full, test_settings())
        .await
        .unwrap_err();
    assert!(matches!(err, CaptureError::InvalidSeedUrl { .. }));

    let service = CaptureService::new();
    let result = service.start_capture("javascript:alert(1)", CaptureMode::Full, test_settings());
    assert!(matches!(result, Err(CaptureError::InvalidSeedUrl { .. })));
    assert!(service.active_tasks().is_empty());
}

#[tokio::test]
async fn test_cancellation_produces_no_archive() {
    let server = MockServer::start().await;
    let seed = format!("{}/", server.uri());

    mount_get(
        &server,
        "/",
        html(r#"<img src="/img/a.png"><a href="/next">Next</a>"#)
            .set_delay(Duration::from_millis(300)),
    )
    .await;
    mount_get_expect(&server, "/next", html("next"), 0).await;
    mount_get_expect(&server, "/img/a.png", bytes(b"A", "image/png"), 0).await;

    let service = CaptureService::new();
    let mut handle = service
        .start_capture(&seed, CaptureMode::Full, test_settings())
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(service.cancel(handle.id));

    let mut last_progress = None;
    let mut terminal = None;
    while let Some(event) = handle.events.recv().await {
        match event {
            CaptureEvent::Progress(snapshot) => last_progress = Some(snapshot),
            other if other.is_terminal() => terminal = Some(other),
            _ => {}
        }
    }

    match terminal {
        Some(CaptureEvent::Cancelled(snapshot)) => {
            assert_eq!(snapshot.downloaded, 0);
            assert_eq!(snapshot.pages_crawled, 0);
            assert!(!snapshot.completed);
        }
        other => panic!("expected a cancelled event, got {:?}", other),
    }
    assert!(last_progress.is_none());
    assert!(matches!(handle.wait().await, Err(CaptureError::Cancelled)));
    assert!(!service.cancel(uuid::Uuid::new_v4()));
}

#[tokio::test]
async fn test_events_end_with_completed() {
    let server = MockServer::start().await;
    let seed = format!("{}/", server.uri());

    mount_get(&server, "/", html(r#"<img src="/a.png"><img src="/b.png">"#)).await;
    mount_get(&server, "/a.png", bytes(b"a", "image/png")).await;
    mount_get(&server, "/b.png", bytes(b"b", "image/png")).await;

    let service = CaptureService::new();
    let mut handle = service
        .start_capture(&seed, CaptureMode::PageOnly, test_settings())
        .unwrap();

    let mut events = Vec::new();
    while let Some(event) = handle.events.recv().await {
        events.push(event);
    }
    let outcome = handle.wait().await.unwrap();

    // One per page, one per asset, one after packaging
    let progress_events = events
        .iter()
        .filter(|e| matches!(e, CaptureEvent::Progress(_)))
        .count();
    assert_eq!(progress_events, 4);

    match events.last() {
        Some(CaptureEvent::Completed(snapshot)) => {
            assert_eq!(*snapshot, outcome.progress);
            assert!(snapshot.completed);
        }
        other => panic!("expected a completed event, got {:?}", other),
    }
    assert!(service.active_tasks().is_empty());
}
