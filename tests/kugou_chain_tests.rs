//! Drives the three-step Kugou chain against a local stub server to pin the
//! protocol details: query parameter names, response field names, and the
//! base64 content encoding.

use axum::Router;
use axum::extract::Query;
use axum::response::Json;
use axum::routing::get;
use base64::{Engine as _, engine::general_purpose};
use lyrics_api::cache::LyricsCache;
use lyrics_api::remote::{KugouClient, LyricsSource};
use lyrics_api::resolver::Resolver;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::tempdir;

const LYRICS: &str = "[00:01.00]hello\n[00:05.00]world";

async fn search_song(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    assert_eq!(params.get("format").map(String::as_str), Some("json"));
    assert_eq!(params.get("page").map(String::as_str), Some("1"));
    assert_eq!(params.get("pagesize").map(String::as_str), Some("2"));
    assert_eq!(params.get("showtype").map(String::as_str), Some("1"));

    // Title and artist are concatenated with no separator
    if params.get("keyword").map(String::as_str) == Some("SkyAnon") {
        Json(json!({"data": {"info": [{"hash": "abc123hash"}]}}))
    } else {
        Json(json!({"data": {"info": []}}))
    }
}

async fn list_candidates(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    assert_eq!(params.get("ver").map(String::as_str), Some("1"));
    assert_eq!(params.get("man").map(String::as_str), Some("yes"));
    assert_eq!(params.get("client").map(String::as_str), Some("mobi"));

    if params.get("hash").map(String::as_str) == Some("abc123hash") {
        Json(json!({"candidates": [{"id": "42", "accesskey": "key42"}]}))
    } else {
        Json(json!({"candidates": []}))
    }
}

async fn download(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    assert_eq!(params.get("fmt").map(String::as_str), Some("lrc"));
    assert_eq!(params.get("charset").map(String::as_str), Some("utf8"));
    assert_eq!(params.get("id").map(String::as_str), Some("42"));
    assert_eq!(params.get("accesskey").map(String::as_str), Some("key42"));

    Json(json!({"content": general_purpose::STANDARD.encode(LYRICS)}))
}

async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn stub_router() -> Router {
    Router::new()
        .route("/api/v3/search/song", get(search_song))
        .route("/search", get(list_candidates))
        .route("/download", get(download))
}

async fn stub_client() -> KugouClient {
    let base = spawn_stub(stub_router()).await;
    KugouClient::with_endpoints(
        format!("{base}/api/v3/search/song"),
        format!("{base}/search"),
        format!("{base}/download"),
    )
    .unwrap()
}

#[tokio::test]
async fn full_chain_decodes_lyrics() {
    let client = stub_client().await;
    let lyrics = client.fetch("Sky", "Anon").await.unwrap();
    assert_eq!(lyrics.as_deref(), Some(LYRICS));
}

#[tokio::test]
async fn empty_search_result_is_absent() {
    let client = stub_client().await;
    assert_eq!(client.fetch("Unknown", "Nobody").await.unwrap(), None);
}

#[tokio::test]
async fn empty_title_skips_the_network_entirely() {
    // Unroutable endpoints: any network attempt would error
    let client = KugouClient::with_endpoints(
        "http://127.0.0.1:9/search/song",
        "http://127.0.0.1:9/search",
        "http://127.0.0.1:9/download",
    )
    .unwrap();

    assert_eq!(client.fetch("", "Anon").await.unwrap(), None);
}

#[tokio::test]
async fn unreachable_service_is_an_error() {
    let client = KugouClient::with_endpoints(
        "http://127.0.0.1:9/search/song",
        "http://127.0.0.1:9/search",
        "http://127.0.0.1:9/download",
    )
    .unwrap();

    assert!(client.fetch("Sky", "Anon").await.is_err());
}

#[tokio::test]
async fn invalid_base64_content_is_an_error() {
    async fn bad_download() -> Json<Value> {
        Json(json!({"content": "not@base64!"}))
    }

    let router = Router::new()
        .route("/api/v3/search/song", get(search_song))
        .route("/search", get(list_candidates))
        .route("/download", get(bad_download));

    let base = spawn_stub(router).await;
    let client = KugouClient::with_endpoints(
        format!("{base}/api/v3/search/song"),
        format!("{base}/search"),
        format!("{base}/download"),
    )
    .unwrap();

    assert!(client.fetch("Sky", "Anon").await.is_err());
}

#[tokio::test]
async fn resolver_returns_404_outcome_and_writes_nothing_on_empty_search() {
    let dir = tempdir().unwrap();
    let client = stub_client().await;
    let resolver = Resolver::new(LyricsCache::new(dir.path()), Arc::new(client));

    // Stub returns an empty info list for this keyword
    assert_eq!(resolver.resolve("Nobody", "Unknown").await, None);

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn resolver_round_trips_remote_content_through_the_cache() {
    let dir = tempdir().unwrap();
    let client = stub_client().await;
    let resolver = Resolver::new(LyricsCache::new(dir.path()), Arc::new(client));

    assert_eq!(resolver.resolve("Anon", "Sky").await.as_deref(), Some(LYRICS));

    // Wait for the detached write-back, then confirm byte-identical content
    let cached = dir.path().join("Anon-Sky.lrc");
    for _ in 0..100 {
        if cached.exists() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(std::fs::read_to_string(&cached).unwrap(), LYRICS);

    // Second resolution is a cache hit returning identical bytes
    assert_eq!(resolver.resolve("Anon", "Sky").await.as_deref(), Some(LYRICS));
}
