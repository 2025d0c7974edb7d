//! Integration tests for the memo server.

use std::sync::Arc;

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::app::{App, Outbound};
use crate::backend::{Backend, HttpBackend};
use crate::client::RevisionStore;
use crate::config::Config;
use crate::db::{init_database, Repository};
use crate::errors::AppError;
use crate::lifecycle;
use crate::models::{Memo, MemoId, TopicId};
use crate::{create_router, AppState};

const TEST_PSK: &str = "test-api-key";

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    store: HttpBackend,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_psk(Some(TEST_PSK.to_string())).await
    }

    async fn with_psk(psk: Option<String>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let backend = Arc::new(Repository::new(pool));

        // Create config
        let config = Config {
            api_psk: psk.clone(),
            db_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            ..Config::default()
        };

        let state = AppState {
            backend,
            config: Arc::new(config),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let mut client_builder = Client::builder();
        if let Some(key) = &psk {
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert("x-api-key", key.parse().unwrap());
            client_builder = client_builder.default_headers(headers);
        }

        let store = HttpBackend::new(&base_url, psk).expect("Failed to create store client");

        TestFixture {
            client: client_builder.build().unwrap(),
            base_url,
            store,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = Client::new()
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_auth_missing_psk() {
    let fixture = TestFixture::new().await;

    // Request without API key
    let resp = Client::new()
        .get(fixture.url("/api/topics"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_auth_invalid_psk() {
    let fixture = TestFixture::new().await;

    // Request with wrong API key
    let resp = Client::new()
        .get(fixture.url("/api/topics"))
        .header("x-api-key", "wrong-key")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let wrong = HttpBackend::new(&fixture.base_url, Some("wrong-key".to_string())).unwrap();
    let err = wrong.list_topics("").await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[tokio::test]
async fn test_auth_valid_psk() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/topics"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Bearer tokens are accepted too
    let resp = Client::new()
        .get(fixture.url("/api/topics"))
        .bearer_auth(TEST_PSK)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_auth_disabled_without_psk() {
    let fixture = TestFixture::with_psk(None).await;

    let resp = Client::new()
        .get(fixture.url("/api/topics"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_memo_lifecycle_over_rest() {
    let fixture = TestFixture::new().await;

    // Unsaved topic yields the empty memo
    let resp = fixture
        .client
        .get(fixture.url("/api/topics/t1/memo"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["id"], "");
    assert_eq!(body["data"]["topicId"], "t1");
    assert_eq!(body["data"]["timestamp"], 0);
    assert_eq!(body["data"]["latest"], true);
    assert_eq!(body["data"]["content"], "");

    // Create two revisions
    for content in ["# First\nbody", "# Second\nbody"] {
        let resp = fixture
            .client
            .post(fixture.url("/api/topics/t1/memos"))
            .json(&json!({ "content": content }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    // History is newest first with one latest
    let resp = fixture
        .client
        .get(fixture.url("/api/topics/t1/memos"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let memos: Vec<Memo> = serde_json::from_value(body["data"].clone()).unwrap();
    assert_eq!(memos.len(), 2);
    assert_eq!(memos[0].content, "# Second\nbody");
    lifecycle::check_latest_invariant(&memos).unwrap();

    // Topic list carries the derived title
    let resp = fixture
        .client
        .get(fixture.url("/api/topics"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"][0]["id"], "t1");
    assert_eq!(body["data"][0]["title"], "Second");

    // Delete the latest; the remaining one is promoted
    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/topics/t1/memos/{}", memos[0].id)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["remaining"], 1);

    let resp = fixture
        .client
        .get(fixture.url("/api/topics/t1/memo"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["content"], "# First\nbody");
    assert_eq!(body["data"]["latest"], true);

    // A specific revision by id
    let resp = fixture
        .client
        .get(fixture.url(&format!("/api/topics/t1/memo?id={}", memos[1].id)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["id"], memos[1].id.as_str());
}

#[tokio::test]
async fn test_tag_errors_over_rest() {
    let fixture = TestFixture::new().await;

    // Topic without revisions
    let resp = fixture
        .client
        .post(fixture.url("/api/topics/t1/tags"))
        .json(&json!({ "tag": "rust" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    fixture
        .store
        .create_memo(&TopicId::from("t1"), "memo")
        .await
        .unwrap();

    let resp = fixture
        .client
        .post(fixture.url("/api/topics/t1/tags"))
        .json(&json!({ "tag": "rust" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Duplicate
    let resp = fixture
        .client
        .post(fixture.url("/api/topics/t1/tags"))
        .json(&json!({ "tag": "rust" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "CONFLICT");

    // Empty tag
    let resp = fixture
        .client
        .post(fixture.url("/api/topics/t1/tags"))
        .json(&json!({ "tag": "  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    // Missing tag
    let resp = fixture
        .client
        .delete(fixture.url("/api/topics/t1/tags/nothing"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_not_found_revision() {
    let fixture = TestFixture::new().await;
    let topic = TopicId::from("t1");
    fixture.store.create_memo(&topic, "x").await.unwrap();

    let err = fixture
        .store
        .get_memo(&topic, Some(&MemoId::from("missing")))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_http_backend_round_trip() {
    let fixture = TestFixture::new().await;
    let store = &fixture.store;
    let topic = TopicId::from("topic with spaces/and slash");

    let created = store.create_memo(&topic, "x").await.unwrap();
    let latest = store.get_memo(&topic, None).await.unwrap();
    assert_eq!(latest, created);
    assert_eq!(latest.content, "x");
    assert!(latest.latest);

    store.add_tag(&topic, "rust").await.unwrap();
    assert!(matches!(
        store.add_tag(&topic, "rust").await.unwrap_err(),
        AppError::Conflict(_)
    ));
    assert_eq!(store.list_tags(&topic).await.unwrap(), vec!["rust".to_string()]);

    let found = store.list_topics("#rust").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, topic);

    store.remove_tag(&topic, "rust").await.unwrap();
    assert!(matches!(
        store.remove_tag(&topic, "rust").await.unwrap_err(),
        AppError::NotFound(_)
    ));

    // Deleting the last revision empties the topic
    let remaining = store.delete_memo(&topic, &created.id).await.unwrap();
    assert_eq!(remaining, 0);
    assert_eq!(store.get_memo(&topic, None).await.unwrap(), Memo::empty(topic.clone()));
    assert!(store.list_topics("").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_concurrent_creates_keep_single_latest() {
    let fixture = TestFixture::new().await;
    let topic = TopicId::from("busy");

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = fixture.store.clone();
        let topic = topic.clone();
        handles.push(tokio::spawn(async move {
            store.create_memo(&topic, &format!("rev {i}")).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let memos = fixture.store.list_memos(&topic).await.unwrap();
    assert_eq!(memos.len(), 8);
    lifecycle::check_latest_invariant(&memos).unwrap();
}

#[tokio::test]
async fn test_client_against_remote_store() {
    let fixture = TestFixture::new().await;
    let store = RevisionStore::new(Arc::new(fixture.store.clone()));
    let mut app = App::new(store, 1000);
    app.start();
    app.settle().await;

    app.edit("# Remote\nnote");
    app.save();
    app.settle().await;
    assert!(!app.session().is_dirty());

    app.submit_tag("remote");
    let prompt = match app.take_outbound().as_slice() {
        [Outbound::Prompt { id, .. }] => *id,
        other => panic!("expected a prompt, got {other:?}"),
    };
    app.answer(prompt, true);
    app.settle().await;

    assert_eq!(app.tag_panel().tags(), &["remote".to_string()]);
    let topics = fixture.store.list_topics("#remote").await.unwrap();
    assert_eq!(topics.len(), 1);
    assert_eq!(topics[0].title, "Remote");
    assert_eq!(&topics[0].id, app.session().topic_id());
}
