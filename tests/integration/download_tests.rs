//! Integration tests for the downloader
//!
//! These tests use wiremock to stand in for tululu.org and drive full
//! download runs end-to-end.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tululu_downloader::config::Config;
use tululu_downloader::crawler::{
    Downloader, FetchError, Fetcher, HttpFetcher, RedirectGuard, RetryFailure, RetryPolicy,
    Selection, TokioSleeper,
};
use tululu_downloader::BookOutcome;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server and writing into `root`
fn create_test_config(base_url: &str, root: &Path) -> Config {
    let mut config = Config::default();
    config.site.base_url = format!("{}/", base_url);
    config.retry.max_attempts = 3;
    config.retry.delay_seconds = 0;
    config.output.dest_folder = root.to_path_buf();
    config
}

fn book_page(title: &str, author: &str, cover: &str) -> String {
    format!(
        r##"<html><body>
        <h1>{}&nbsp;::&nbsp;<a href="/a1/">{}</a></h1>
        <span class="d_book">Жанр: <a href="/l55/">Научная фантастика</a></span>
        <div class="bookimage"><a href="#"><img src="{}"></a></div>
        <div class="texts"><b>Reader</b> <span class="black">Great read</span></div>
        </body></html>"##,
        title, author, cover
    )
}

/// Mounts the page, text and cover of one complete book
async fn mount_book(server: &MockServer, id: u32, title: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/b{}/", id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(book_page(title, "Author", &format!("/shots/{}.jpg", id)))
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/txt.php"))
        .and(query_param("id", id.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!("Text of {}", title)))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/shots/{}.jpg", id)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xff, 0xd8, 0xff, 0xe0]))
        .mount(server)
        .await;
}

/// Mounts the site's "unknown book" answer: a redirect to the homepage
async fn mount_redirect(server: &MockServer, route: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/"))
        .mount(server)
        .await;
}

/// Returns the address of a local port nothing listens on
fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let port = listener.local_addr().expect("No local address").port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

#[tokio::test]
async fn test_range_skips_redirected_book() {
    let mock_server = MockServer::start().await;
    let root = TempDir::new().expect("Failed to create temp dir");

    mount_book(&mock_server, 1, "First").await;
    mount_redirect(&mock_server, "/b2/").await;
    mount_book(&mock_server, 3, "Third").await;

    // The missing book's text endpoint must never be hit
    Mock::given(method("GET"))
        .and(path("/txt.php"))
        .and(query_param("id", "2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), root.path());
    let downloader = Downloader::new(config).expect("Failed to create downloader");
    let stats = downloader
        .run(&Selection::Range {
            start_id: 1,
            end_id: 3,
        })
        .await
        .expect("Run failed");

    assert_eq!(stats.saved(), 2);
    assert_eq!(stats.count(BookOutcome::NotFound), 1);

    let books = root.path().join("books");
    assert_eq!(
        std::fs::read_to_string(books.join("1_First.txt")).expect("Missing text"),
        "Text of First"
    );
    assert!(books.join("3_Third.txt").exists());

    let images = root.path().join("images");
    assert_eq!(
        std::fs::read(images.join("1_First.jpg")).expect("Missing cover"),
        vec![0xff, 0xd8, 0xff, 0xe0]
    );

    let comments = root.path().join("comments");
    assert_eq!(
        std::fs::read_to_string(comments.join("3_Third.txt")).expect("Missing comments"),
        "ReaderGreat read\n\n"
    );

    let json = std::fs::read_to_string(root.path().join("book_descriptions.json"))
        .expect("Missing JSON");
    let descriptions: serde_json::Value = serde_json::from_str(&json).expect("Invalid JSON");
    let names: Vec<_> = descriptions
        .as_array()
        .expect("Not an array")
        .iter()
        .map(|d| d["Name"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(names, vec!["First".to_string(), "Third".to_string()]);
    assert_eq!(descriptions[0]["Author"], "Author");
    assert_eq!(
        descriptions[0]["Cover"],
        format!("{}/shots/1.jpg", mock_server.uri())
    );
}

#[tokio::test]
async fn test_redirected_text_is_not_retried() {
    let mock_server = MockServer::start().await;
    let root = TempDir::new().expect("Failed to create temp dir");

    Mock::given(method("GET"))
        .and(path("/b5/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(book_page("NoText", "A", "/shots/5.jpg")),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/txt.php"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/"))
        .expect(1)
        .mount(&mock_server)
        .await;

    // The cover is not fetched once the text is unavailable
    Mock::given(method("GET"))
        .and(path("/shots/5.jpg"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), root.path());
    let stats = Downloader::new(config)
        .expect("Failed to create downloader")
        .run_range(5, 5)
        .await
        .expect("Run failed");

    assert_eq!(stats.count(BookOutcome::TextUnavailable), 1);
    assert!(!root.path().join("books").join("5_NoText.txt").exists());
}

#[tokio::test]
async fn test_server_error_on_text_is_not_retried() {
    let mock_server = MockServer::start().await;
    let root = TempDir::new().expect("Failed to create temp dir");

    Mock::given(method("GET"))
        .and(path("/b6/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(book_page("Broken", "A", "/shots/6.jpg")),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/txt.php"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), root.path());
    let stats = Downloader::new(config)
        .expect("Failed to create downloader")
        .run_range(6, 6)
        .await
        .expect("Run failed");

    assert_eq!(stats.failed_books, vec![(6, BookOutcome::TextUnavailable)]);
}

#[tokio::test]
async fn test_skip_flags() {
    let mock_server = MockServer::start().await;
    let root = TempDir::new().expect("Failed to create temp dir");

    mount_book(&mock_server, 8, "Skipped").await;

    let mut config = create_test_config(&mock_server.uri(), root.path());
    config.output.skip_txt = true;
    config.output.skip_imgs = true;
    config.output.json_path = None;

    let stats = Downloader::new(config)
        .expect("Failed to create downloader")
        .run_range(8, 8)
        .await
        .expect("Run failed");

    assert_eq!(stats.saved(), 1);
    assert!(!root.path().join("books").exists());
    assert!(!root.path().join("images").exists());
    assert!(!root.path().join("book_descriptions.json").exists());
    assert!(root.path().join("comments").join("8_Skipped.txt").exists());

    let requests = mock_server
        .received_requests()
        .await
        .expect("Request recording disabled");
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn test_category_pages() {
    let mock_server = MockServer::start().await;
    let root = TempDir::new().expect("Failed to create temp dir");

    Mock::given(method("GET"))
        .and(path("/l55/1/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
            <table class="d_book"><tr><td><a href="/b21/">Twenty one</a></td></tr></table>
            <table class="d_book"><tr><td><a href="/b22/">Twenty two</a></td></tr></table>
            </body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/l55/2/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    mount_book(&mock_server, 21, "TwentyOne").await;
    mount_redirect(&mock_server, "/b22/").await;

    let config = create_test_config(&mock_server.uri(), root.path());
    let stats = Downloader::new(config)
        .expect("Failed to create downloader")
        .run(&Selection::Pages(vec![1, 2]))
        .await
        .expect("Run failed");

    assert_eq!(stats.saved(), 1);
    assert_eq!(stats.count(BookOutcome::NotFound), 1);
    assert!(root.path().join("books").join("21_TwentyOne.txt").exists());
}

#[tokio::test]
async fn test_http_fetcher_reports_redirects() {
    let mock_server = MockServer::start().await;
    mount_redirect(&mock_server, "/b2/").await;

    Mock::given(method("GET"))
        .and(path("/b1/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::from_config(&Config::default().http).expect("Failed to build client");
    let guard = RedirectGuard::new();

    let ok_url = Url::parse(&format!("{}/b1/", mock_server.uri())).expect("Bad URL");
    let ok = fetcher.fetch(&ok_url).await.expect("Fetch failed");
    assert_eq!(ok.status_code, 200);
    assert_eq!(ok.final_url, ok_url.to_string());
    assert!(guard.is_valid(&ok_url, &ok));

    let missing_url = Url::parse(&format!("{}/b2/", mock_server.uri())).expect("Bad URL");
    let missing = fetcher.fetch(&missing_url).await.expect("Fetch failed");
    assert_eq!(missing.status_code, 302);
    assert!(missing.redirected);
    assert_eq!(missing.final_url, format!("{}/", mock_server.uri()));
    assert!(!guard.is_valid(&missing_url, &missing));
}

#[tokio::test]
async fn test_http_fetcher_status_error() {
    let mock_server = MockServer::start().await;

    let fetcher = HttpFetcher::from_config(&Config::default().http).expect("Failed to build client");
    let url = Url::parse(&format!("{}/b404/", mock_server.uri())).expect("Bad URL");

    // Unmatched requests get a 404 from wiremock
    let error = fetcher.fetch(&url).await.expect_err("Expected an error");
    assert_eq!(error, FetchError::Status { status_code: 404 });
}

#[tokio::test]
async fn test_retry_against_closed_port() {
    let fetcher = HttpFetcher::from_config(&Config::default().http).expect("Failed to build client");
    let url = Url::parse(&format!("{}/txt.php?id=1", closed_port_url())).expect("Bad URL");

    let outcome = RetryPolicy::new(3, Duration::from_millis(10))
        .fetch_with_retry(&fetcher, &TokioSleeper, &url)
        .await;

    assert!(!outcome.succeeded);
    assert!(outcome.result.is_none());
    assert_eq!(outcome.attempts_used, 3);
}

/// Starts a server that reads each request and closes the socket without answering
async fn hang_up_server() -> String {
    use tokio::io::AsyncReadExt;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind listener");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
        }
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_retry_when_server_hangs_up() {
    let fetcher = HttpFetcher::from_config(&Config::default().http).expect("Failed to build client");
    let url = Url::parse(&format!("{}/txt.php?id=1", hang_up_server().await)).expect("Bad URL");

    let outcome = RetryPolicy::new(3, Duration::from_millis(10))
        .fetch_with_retry(&fetcher, &TokioSleeper, &url)
        .await;

    assert!(!outcome.succeeded);
    assert_eq!(outcome.attempts_used, 3);
    assert!(
        matches!(
            outcome.failure,
            Some(RetryFailure::Exhausted {
                attempts: 3,
                last_error: FetchError::Connection { .. },
            })
        ),
        "{:?}",
        outcome.failure
    );
}

#[tokio::test]
async fn test_unreachable_site_is_per_book() {
    let root = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&closed_port_url(), root.path());

    let stats = Downloader::with_parts(
        config,
        Arc::new(HttpFetcher::from_config(&Config::default().http).expect("Failed to build client")),
        Arc::new(TokioSleeper),
    )
    .expect("Failed to create downloader")
    .run_range(1, 2)
    .await
    .expect("Run failed");

    assert_eq!(stats.count(BookOutcome::ConnectionFailed), 2);
}
