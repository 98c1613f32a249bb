//! Integration tests for the crawler
//!
//! These tests use wiremock to stand up a small fake wiki and run the full
//! fetch → parse → dedup cycle against it over real HTTP.

use std::collections::HashSet;
use wiki_crawler::config::{Config, CrawlerConfig, HttpConfig, StorageConfig};
use wiki_crawler::crawler::{http_crawler, Fetch, FetchError, HttpFetcher};
use wiki_crawler::storage::{RunStatus, SqliteStorage, VisitedStore};
use wiki_crawler::Termination;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration resolving links against the mock server
fn create_test_config(base_origin: &str) -> Config {
    Config {
        crawler: CrawlerConfig {
            fetch_concurrency: 4,
            parse_workers: 2,
            base_origin: base_origin.to_string(),
        },
        http: HttpConfig {
            user_agent: "TestBot/1.0".to_string(),
            timeout_secs: 5,
            connect_timeout_secs: 2,
        },
        storage: StorageConfig::default(),
    }
}

/// Serves an HTML page whose body links to each of `titles`
async fn mount_page(server: &MockServer, title: &str, titles: &[&str]) {
    let body: String = titles
        .iter()
        .map(|t| format!(r#"<a href="/wiki/{}">{}</a>"#, t, t))
        .collect();

    Mock::given(method("GET"))
        .and(path(format!("/wiki/{}", title)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!("<html><body>{}</body></html>", body))
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

fn seed(server: &MockServer, title: &str) -> HashSet<String> {
    HashSet::from([format!("{}/wiki/{}", server.uri(), title)])
}

fn wiki(server: &MockServer, title: &str) -> String {
    format!("{}/wiki/{}", server.uri(), title)
}

#[tokio::test]
async fn test_max_depth_one_fetches_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let mut crawler = http_crawler(&config, SqliteStorage::new_in_memory().unwrap()).unwrap();

    let report = crawler.crawl(seed(&mock_server, "A"), 1).await.unwrap();

    assert_eq!(report.termination, Termination::MaxDepthReached);
    let store = crawler.into_store();
    assert_eq!(store.count().unwrap(), 1);
    assert_eq!(store.depth_of(&wiki(&mock_server, "A")).unwrap(), Some(1));
}

#[tokio::test]
async fn test_self_link_keeps_first_depth() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "A", &["B", "A"]).await;

    let config = create_test_config(&mock_server.uri());
    let mut crawler = http_crawler(&config, SqliteStorage::new_in_memory().unwrap()).unwrap();

    crawler.crawl(seed(&mock_server, "A"), 2).await.unwrap();

    let store = crawler.into_store();
    assert_eq!(store.count().unwrap(), 2);
    assert_eq!(store.depth_of(&wiki(&mock_server, "A")).unwrap(), Some(1));
    assert_eq!(store.depth_of(&wiki(&mock_server, "B")).unwrap(), Some(2));
}

#[tokio::test]
async fn test_media_links_are_excluded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wiki/A"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
                <a href="/wiki/B">B</a>
                <a href="/image.png">Image</a>
                <a href="/wiki/File:Diagram.svg">Diagram</a>
            </body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let mut crawler = http_crawler(&config, SqliteStorage::new_in_memory().unwrap()).unwrap();

    crawler.crawl(seed(&mock_server, "A"), 2).await.unwrap();

    let known = crawler.into_store().all_known().unwrap();
    assert_eq!(
        known,
        HashSet::from([wiki(&mock_server, "A"), wiki(&mock_server, "B")])
    );
}

#[tokio::test]
async fn test_failed_page_does_not_stop_siblings() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "A", &["B", "C"]).await;
    mount_page(&mock_server, "C", &["D"]).await;

    // B would link to E, but the server fails it
    Mock::given(method("GET"))
        .and(path("/wiki/B"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let mut crawler = http_crawler(&config, SqliteStorage::new_in_memory().unwrap()).unwrap();

    crawler.crawl(seed(&mock_server, "A"), 3).await.unwrap();

    let store = crawler.into_store();
    assert_eq!(store.depth_of(&wiki(&mock_server, "C")).unwrap(), Some(2));
    assert_eq!(store.depth_of(&wiki(&mock_server, "D")).unwrap(), Some(3));
    assert_eq!(store.depth_of(&wiki(&mock_server, "E")).unwrap(), None);
}

#[tokio::test]
async fn test_each_page_fetched_once() {
    let mock_server = MockServer::start().await;

    // A <-> B, both link to C, C links back to A
    for (title, targets) in [("A", vec!["B", "C"]), ("B", vec!["A", "C"]), ("C", vec!["A"])] {
        Mock::given(method("GET"))
            .and(path(format!("/wiki/{}", title)))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                targets
                    .iter()
                    .map(|t| format!(r#"<a href="/wiki/{}">{}</a>"#, t, t))
                    .collect::<String>(),
            ))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let config = create_test_config(&mock_server.uri());
    let mut crawler = http_crawler(&config, SqliteStorage::new_in_memory().unwrap()).unwrap();

    let report = crawler.crawl(seed(&mock_server, "A"), 10).await.unwrap();

    assert_eq!(report.termination, Termination::FrontierExhausted);
    assert_eq!(report.deepest_level, 2);
    assert_eq!(report.urls_recorded, 3);
}

#[tokio::test]
async fn test_full_crawl_with_run_ledger() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "Root", &["Left", "Right"]).await;
    mount_page(&mock_server, "Left", &["Leaf"]).await;
    mount_page(&mock_server, "Right", &["Leaf", "Root"]).await;
    mount_page(&mock_server, "Leaf", &[]).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("visited.db");

    let mut storage = SqliteStorage::new(&db_path).expect("Failed to open database");
    let run_id = storage.create_run(&wiki(&mock_server, "Root"), 3).unwrap();

    let config = create_test_config(&mock_server.uri());
    let report = {
        let mut crawler = http_crawler(&config, &mut storage).unwrap();
        crawler.crawl(seed(&mock_server, "Root"), 3).await.unwrap()
    };
    storage.finish_run(run_id, RunStatus::Completed).unwrap();

    assert_eq!(report.termination, Termination::MaxDepthReached);
    assert_eq!(report.urls_recorded, 4);

    // Reopen and check persisted state
    drop(storage);
    let storage = SqliteStorage::new(&db_path).unwrap();
    assert_eq!(storage.depth_of(&wiki(&mock_server, "Root")).unwrap(), Some(1));
    assert_eq!(storage.depth_of(&wiki(&mock_server, "Left")).unwrap(), Some(2));
    assert_eq!(storage.depth_of(&wiki(&mock_server, "Right")).unwrap(), Some(2));
    assert_eq!(storage.depth_of(&wiki(&mock_server, "Leaf")).unwrap(), Some(3));

    let run = storage.get_run(run_id).unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert!(run.finished_at.is_some());
}

#[tokio::test]
async fn test_resumed_crawl_only_records_new_urls() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "A", &["B"]).await;
    mount_page(&mock_server, "B", &["C"]).await;
    mount_page(&mock_server, "C", &[]).await;

    let config = create_test_config(&mock_server.uri());
    let mut storage = SqliteStorage::new_in_memory().unwrap();

    {
        let mut crawler = http_crawler(&config, &mut storage).unwrap();
        crawler.crawl(seed(&mock_server, "A"), 2).await.unwrap();
    }
    assert_eq!(storage.count().unwrap(), 2);

    let report = {
        let mut crawler = http_crawler(&config, &mut storage).unwrap();
        crawler.crawl(seed(&mock_server, "A"), 3).await.unwrap()
    };

    // B was already known, so nothing past it is expanded
    assert_eq!(report.urls_recorded, 0);
    assert_eq!(storage.depth_of(&wiki(&mock_server, "C")).unwrap(), None);

    storage.clear().unwrap();
    let report = {
        let mut crawler = http_crawler(&config, &mut storage).unwrap();
        crawler.crawl(seed(&mock_server, "A"), 3).await.unwrap()
    };
    assert_eq!(report.urls_recorded, 3);
    assert_eq!(storage.depth_of(&wiki(&mock_server, "C")).unwrap(), Some(3));
}

#[tokio::test]
async fn test_http_fetcher_classifies_errors() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "Exists", &[]).await;

    Mock::given(method("GET"))
        .and(path("/wiki/Missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::from_config(&HttpConfig::default()).unwrap();

    let body = fetcher.fetch(&wiki(&mock_server, "Exists")).await.unwrap();
    assert!(body.contains("<html>"));

    let missing = fetcher.fetch(&wiki(&mock_server, "Missing")).await;
    assert!(matches!(missing, Err(FetchError::Status { status: 404, .. })));

    // Nothing listens on port 1
    let refused = fetcher.fetch("http://127.0.0.1:1/wiki/A").await;
    assert!(matches!(refused, Err(FetchError::Transport { .. })));
}
