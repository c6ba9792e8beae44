//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end: frontier, fetch, extraction, storage,
//! indexing and the deferred normalization pass.

use dex_crawler::config::{Config, CrawlerConfig, IndexConfig, OutputConfig, UserAgentConfig};
use dex_crawler::crawler::{Coordinator, CrawlOptions};
use dex_crawler::output::load_statistics;
use dex_crawler::storage::DocumentStore;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with the given seeds
fn create_test_config(seeds: Vec<String>, db_path: &str) -> Config {
    Config {
        crawler: CrawlerConfig {
            workers: Some(3),
            idle_poll_ms: 10, // Very short for testing
            seeds,
            seeds_file: None,
            request_timeout_secs: 5,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
        },
        index: IndexConfig::default(),
        output: OutputConfig {
            database_path: db_path.to_string(),
        },
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html")
}

/// Mounts a small site: a home page linking to two content pages, a
/// missing page and a JSON document
async fn mount_site(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><head><title>Home</title></head><body>
               <p>cats and dogs</p>
               <a href="/cat">one</a>
               <a href="/dog">two</a>
               <a href="/missing">three</a>
               <a href="/data.json">four</a>
               </body></html>"#,
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cat"))
        .respond_with(html(
            r#"<html><head><title>Cat</title></head><body>
               <p>cat cat cat</p><img src="/cat.png" alt="A cat">
               <a href="/">back</a></body></html>"#,
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/dog"))
        .respond_with(html(
            r#"<html><head><title>Dog</title></head><body><p>dog cat</p></body></html>"#,
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_full_crawl_and_normalization() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;
    let base_url = mock_server.uri();

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("dex.db");
    let config = create_test_config(
        vec![format!("{}/", base_url)],
        &db_path.to_string_lossy(),
    );

    let coordinator = Coordinator::new(config, CrawlOptions::default()).unwrap();
    let summary = coordinator
        .run_until_cancelled(3, CancellationToken::new())
        .await
        .unwrap();

    // The home page is rediscovered from /cat: seeds are not deduplicated
    // against the pool, so it is fetched and stored a second time.
    assert_eq!(summary.crawl.links_processed, 6);
    assert_eq!(summary.crawl.pages_stored, 4);
    assert_eq!(summary.crawl.fetch_failures, 2);
    assert_eq!(summary.crawl.workers_failed, 0);
    assert!(!summary.crawl.cancelled);
    assert_eq!(summary.persisted_links, 0);

    let normalization = summary.normalization.unwrap();
    assert_eq!(normalization.failed, 0);
    assert_eq!(normalization.skipped, 0);
    assert!(normalization.normalized > 0);

    let store = coordinator.engine().store().lock();
    let stats = load_statistics(&*store).unwrap();
    assert_eq!(stats.total_pages, 4);
    assert_eq!(stats.indexed_pages, 4);
    assert_eq!(stats.pending_entries(), 0);
    assert_eq!(stats.images, 1);
    assert_eq!(stats.unprocessed_links, 0);
    drop(store);

    // "cat" fills the whole title and body of /cat but only half the body
    // of /dog, so /cat ranks first
    let postings = coordinator.engine().lookup("cat").unwrap();
    assert_eq!(postings.len(), 2);
    assert!(postings.iter().all(|entry| entry.normalized));
    assert!(postings[0].tf_idf > postings[1].tf_idf);

    let store = coordinator.engine().store().lock();
    let top = store.get_page(postings[0].document_id).unwrap().unwrap();
    assert_eq!(top.link, format!("{}/cat", base_url));
    assert!(top.indexed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_second_normalization_is_a_no_op() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("dex.db");
    let config = create_test_config(
        vec![format!("{}/dog", mock_server.uri())],
        &db_path.to_string_lossy(),
    );

    let coordinator = Coordinator::new(config, CrawlOptions::default()).unwrap();
    coordinator
        .run_until_cancelled(2, CancellationToken::new())
        .await
        .unwrap();

    let before = coordinator.engine().lookup("dog").unwrap();
    let report = coordinator.engine().normalize_pass().unwrap();
    let after = coordinator.engine().lookup("dog").unwrap();

    assert_eq!(report.normalized, 0);
    assert_eq!(before, after);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_skip_normalize_leaves_raw_counts() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("dex.db");
    let config = create_test_config(
        vec![format!("{}/cat", mock_server.uri())],
        &db_path.to_string_lossy(),
    );

    let options = CrawlOptions {
        skip_normalize: true,
        ..Default::default()
    };
    let coordinator = Coordinator::new(config, options).unwrap();
    let summary = coordinator
        .run_until_cancelled(2, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.normalization, None);

    let store = coordinator.engine().store().lock();
    let stats = load_statistics(&*store).unwrap();
    assert!(stats.term_entries > 0);
    assert_eq!(stats.normalized_entries, 0);
    assert_eq!(stats.indexed_pages, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_interrupted_crawl_resumes_saved_links() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;
    let base_url = mock_server.uri();

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("dex.db");
    let db_path = db_path.to_string_lossy().to_string();
    let dog_url = format!("{}/dog", base_url);

    // First run: interrupted before any worker picks up a link
    {
        let config = create_test_config(vec![format!("{}/cat", base_url)], &db_path);
        let coordinator = Coordinator::new(config, CrawlOptions::default()).unwrap();
        coordinator
            .frontier()
            .add_discovered_links(vec![dog_url.clone()]);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let summary = coordinator.run_until_cancelled(2, cancel).await.unwrap();

        assert!(summary.crawl.cancelled);
        assert_eq!(summary.persisted_links, 1);
        assert_eq!(summary.normalization, None);
    }

    // Second run picks the saved link back up
    let config = create_test_config(vec![format!("{}/cat", base_url)], &db_path);
    let coordinator = Coordinator::new(config, CrawlOptions::default()).unwrap();
    assert_eq!(
        coordinator.frontier().snapshot_unprocessed(),
        vec![dog_url.clone()]
    );

    let summary = coordinator
        .run_until_cancelled(2, CancellationToken::new())
        .await
        .unwrap();

    assert!(!summary.crawl.cancelled);
    assert!(coordinator.frontier().processed_links().contains(&dog_url));
    assert_eq!(
        coordinator
            .engine()
            .store()
            .lock()
            .count_unprocessed_links()
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_fresh_run_drops_previous_data() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("dex.db");
    let db_path = db_path.to_string_lossy().to_string();
    let seeds = vec![format!("{}/dog", mock_server.uri())];

    {
        let coordinator =
            Coordinator::new(create_test_config(seeds.clone(), &db_path), CrawlOptions::default())
                .unwrap();
        coordinator
            .run_until_cancelled(1, CancellationToken::new())
            .await
            .unwrap();
    }

    let options = CrawlOptions {
        fresh: true,
        ..Default::default()
    };
    let coordinator = Coordinator::new(create_test_config(seeds, &db_path), options).unwrap();
    let store = coordinator.engine().store().lock();
    assert_eq!(store.count_pages().unwrap(), 0);
    assert_eq!(store.count_term_entries(None).unwrap(), 0);
}
