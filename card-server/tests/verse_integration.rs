//! Integration tests for random and curated verse selection.

mod common;

use card_core::popular_verses;
use card_server::ServerConfig;
use common::TestServer;
use reqwest::StatusCode;
use serde_json::{json, Value};
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn dataset_with(response: ResponseTemplate) -> MockServer {
    let dataset = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/bibles/en-asv/books/[0-9a-z]+/chapters/[0-9]+\.json$"))
        .respond_with(response)
        .mount(&dataset)
        .await;
    dataset
}

async fn server_for(dataset: &MockServer) -> TestServer {
    TestServer::start_with(ServerConfig {
        verse_base_url: format!("{}/bibles", dataset.uri()),
        ..ServerConfig::default()
    })
    .await
}

fn is_curated(verse: &Value) -> bool {
    popular_verses().iter().any(|v| {
        verse["text"] == v.text.as_str() && verse["reference"] == v.reference.as_str()
    })
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_random_verse_from_dataset() {
    let dataset = dataset_with(ResponseTemplate::new(200).set_body_json(json!({
        "verses": [
            { "book": "John", "chapter": "3", "verse": "16", "text": "For God so loved the world" }
        ]
    })))
    .await;
    let server = server_for(&dataset).await;

    let body: Value = reqwest::get(server.url("/api/verses/random"))
        .await
        .expect("request")
        .json()
        .await
        .expect("json");

    assert_eq!(body["origin"], "remote");
    assert_eq!(body["verse"]["reference"], "John 3:16");
    assert_eq!(body["verse"]["text"], "For God so loved the world");
    assert_eq!(body["notice"], "Random verse loaded!");

    server.shutdown().await;
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_numeric_chapter_and_verse() {
    let dataset = dataset_with(ResponseTemplate::new(200).set_body_json(json!({
        "verses": [{ "book": "Psalms", "chapter": 23, "verse": 1, "text": "Jehovah is my shepherd" }]
    })))
    .await;
    let server = server_for(&dataset).await;

    let body: Value = reqwest::get(server.url("/api/verses/random"))
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(body["verse"]["reference"], "Psalms 23:1");

    server.shutdown().await;
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_falls_back_on_error_status() {
    let dataset = dataset_with(ResponseTemplate::new(500)).await;
    let server = server_for(&dataset).await;

    let body: Value = reqwest::get(server.url("/api/verses/random"))
        .await
        .expect("request")
        .json()
        .await
        .expect("json");

    assert_eq!(body["origin"], "fallback");
    assert!(is_curated(&body["verse"]));
    assert_eq!(
        body["notice"],
        "Couldn't fetch random verse, using a popular one instead"
    );

    server.shutdown().await;
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_falls_back_on_empty_or_malformed_chapter() {
    for response in [
        ResponseTemplate::new(200).set_body_json(json!({ "verses": [] })),
        ResponseTemplate::new(200).set_body_json(json!({ "something": "else" })),
        ResponseTemplate::new(200).set_body_string("not json"),
    ] {
        let dataset = dataset_with(response).await;
        let server = server_for(&dataset).await;

        let body: Value = reqwest::get(server.url("/api/verses/random"))
            .await
            .expect("request")
            .json()
            .await
            .expect("json");
        assert_eq!(body["origin"], "fallback");
        assert!(is_curated(&body["verse"]));

        server.shutdown().await;
    }
}

#[tokio::test]
async fn test_random_selection_updates_session_even_when_offline() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.session_url("s1", "/verse/random"))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.expect("json");
    assert_eq!(body["origin"], "fallback");
    assert_eq!(body["snapshot"]["session_id"], "s1");
    assert_eq!(body["snapshot"]["can_export"], true);
    assert_eq!(body["snapshot"]["verse_origin"], "fallback");
    assert!(is_curated(&body["snapshot"]["verse"]));

    server.shutdown().await;
}

#[tokio::test]
async fn test_popular_list_and_selection() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let list: Vec<Value> = client
        .get(server.url("/api/verses/popular"))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(list.len(), popular_verses().len());

    let snapshot: Value = client
        .post(server.session_url("s1", "/verse/popular/2"))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(snapshot["verse"], list[2]);
    assert_eq!(snapshot["verse_origin"], "popular");

    let response = client
        .post(server.session_url("s1", "/verse/popular/99"))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    server.shutdown().await;
}

#[tokio::test]
async fn test_custom_verse() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let snapshot: Value = client
        .post(server.session_url("s1", "/verse"))
        .json(&json!({ "text": "  Be still, and know  ", "reference": "" }))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(snapshot["verse"]["text"], "Be still, and know");
    assert_eq!(snapshot["verse"]["reference"], "Custom Verse");
    assert_eq!(snapshot["verse_origin"], "custom");

    let response = client
        .post(server.session_url("s1", "/verse"))
        .json(&json!({ "text": "   ", "reference": "Psalms 46:10" }))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("json");
    assert_eq!(body["error"], "Please enter verse text");

    // The rejected submission left the earlier verse in place.
    let current = server.state().store.snapshot("s1");
    assert_eq!(
        current.verse.map(|v| v.reference),
        Some("Custom Verse".to_string())
    );

    server.shutdown().await;
}
