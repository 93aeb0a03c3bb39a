//! End-to-end tests: WebSocket client → server → pipeline → mock sites.

use futures_util::{SinkExt, StreamExt};
use scour::{AppState, ScourConfig};
use scour_search::{SearchType, SelectorSet, SourceDefinition, StaticCatalog};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const LISTING_HTML: &str = r#"<html><body>
<div class="item"><a class="t" href="/m/1">First</a><img src="/p/1.jpg"></div>
<div class="item"><a class="t" href="/m/2">Second</a></div>
<div class="item"><a class="t" href="/m/3">Third</a><img src="/p/3.jpg"></div>
</body></html>"#;

const SOURCES_TOML: &str = r#"
[[sources]]
name = "FromFile"
base_url = "BASE_URL"
search_type = "GET"
search_endpoint = "/?s=%QUERY%"

[sources.selectors]
container = "div.item"
title = "a.t"
link = "a.t"
poster = "img"
"#;

fn source(name: &str, base_url: &str) -> SourceDefinition {
    SourceDefinition {
        name: name.into(),
        base_url: base_url.into(),
        is_active: true,
        search_type: SearchType::Get,
        search_endpoint: "/?s=%QUERY%".into(),
        post_payload_template: None,
        requires_bypass: false,
        selectors: SelectorSet {
            container: "div.item".into(),
            title: "a.t".into(),
            link: "a.t".into(),
            poster: "img".into(),
            poster_attribute: "src".into(),
        },
    }
}

async fn mock_site(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("s", "dune"))
        .respond_with(ResponseTemplate::new(status).set_body_string(LISTING_HTML))
        .mount(&server)
        .await;
    server
}

async fn start_server(state: AppState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        scour::server::serve(listener, state)
            .await
            .expect("server should run");
    });
    addr
}

async fn start_with_sources(sources: Vec<SourceDefinition>) -> SocketAddr {
    let state = AppState::with_catalog(&ScourConfig::default(), Arc::new(StaticCatalog::new(sources)))
        .expect("app state");
    start_server(state).await
}

async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws/search/"))
        .await
        .expect("websocket connect");
    ws
}

async fn send(ws: &mut Client, value: Value) {
    ws.send(Message::Text(value.to_string()))
        .await
        .expect("send frame");
}

async fn recv(ws: &mut Client) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).expect("json frame");
        }
    }
}

async fn assert_silent(ws: &mut Client) {
    let next = tokio::time::timeout(Duration::from_millis(300), ws.next()).await;
    assert!(next.is_err(), "expected no further frames, got {next:?}");
}

#[tokio::test]
async fn search_streams_each_complete_result() {
    let site = mock_site(200).await;
    let addr = start_with_sources(vec![source("Site", &site.uri())]).await;
    let mut ws = connect(addr).await;

    send(&mut ws, json!({"action": "search", "term": "dune"})).await;

    let first = recv(&mut ws).await;
    let second = recv(&mut ws).await;
    assert_silent(&mut ws).await;

    let mut titles = vec![
        first["title"].as_str().expect("title").to_owned(),
        second["title"].as_str().expect("title").to_owned(),
    ];
    titles.sort();
    assert_eq!(titles, vec!["First", "Third"]);

    let record = if first["title"] == "First" { &first } else { &second };
    assert_eq!(record["source"], "Site");
    assert_eq!(record["link"], format!("{}/m/1", site.uri()));
    assert_eq!(record["poster"], format!("{}/p/1.jpg", site.uri()));
    assert!(record.get("error").is_none());
}

#[tokio::test]
async fn missing_term_yields_error_message() {
    let site = mock_site(200).await;
    let addr = start_with_sources(vec![source("Site", &site.uri())]).await;
    let mut ws = connect(addr).await;

    send(&mut ws, json!({"action": "search"})).await;

    assert_eq!(
        recv(&mut ws).await,
        json!({"error": true, "message": "No search term provided."})
    );
    assert_silent(&mut ws).await;
}

#[tokio::test]
async fn empty_catalog_yields_error_message() {
    let addr = start_with_sources(vec![]).await;
    let mut ws = connect(addr).await;

    send(&mut ws, json!({"action": "search", "term": "dune"})).await;

    assert_eq!(
        recv(&mut ws).await,
        json!({"error": true, "message": "No active sites configured."})
    );
}

#[tokio::test]
async fn invalid_frame_yields_format_error() {
    let addr = start_with_sources(vec![]).await;
    let mut ws = connect(addr).await;

    ws.send(Message::Text("not json".into()))
        .await
        .expect("send frame");

    let reply = recv(&mut ws).await;
    assert_eq!(reply["error"], true);
    assert!(
        reply["message"]
            .as_str()
            .expect("message")
            .starts_with("Invalid message format:")
    );
}

#[tokio::test]
async fn unknown_action_is_ignored() {
    let addr = start_with_sources(vec![]).await;
    let mut ws = connect(addr).await;

    send(&mut ws, json!({"action": "subscribe", "term": "dune"})).await;
    send(&mut ws, json!({"action": "search", "term": ""})).await;

    // The only reply belongs to the second frame.
    assert_eq!(recv(&mut ws).await["message"], "No search term provided.");
    assert_silent(&mut ws).await;
}

#[tokio::test]
async fn failing_source_is_reported_alongside_results() {
    let good = mock_site(200).await;
    let bad = mock_site(502).await;
    let addr = start_with_sources(vec![
        source("Good", &good.uri()),
        source("Bad", &bad.uri()),
    ])
    .await;
    let mut ws = connect(addr).await;

    send(&mut ws, json!({"action": "search", "term": "dune"})).await;

    let mut results = 0;
    let mut failures = Vec::new();
    for _ in 0..3 {
        let frame = recv(&mut ws).await;
        if frame["error"] == true {
            failures.push(frame);
        } else {
            assert_eq!(frame["source"], "Good");
            results += 1;
        }
    }
    assert_silent(&mut ws).await;

    assert_eq!(results, 2);
    assert_eq!(
        failures,
        vec![json!({
            "error": true,
            "source": "Bad",
            "message": "Failed to fetch data from Bad: HTTP status 502"
        })]
    );
}

#[tokio::test]
async fn sessions_only_see_their_own_results() {
    let site = mock_site(200).await;
    let addr = start_with_sources(vec![source("Site", &site.uri())]).await;
    let mut searcher = connect(addr).await;
    let mut bystander = connect(addr).await;

    send(&mut searcher, json!({"action": "search", "term": "dune"})).await;

    recv(&mut searcher).await;
    recv(&mut searcher).await;
    assert_silent(&mut bystander).await;
}

#[tokio::test]
async fn file_catalog_is_read_per_search() {
    let site = mock_site(200).await;
    let dir = tempfile::tempdir().expect("tempdir");
    let catalog_path = dir.path().join("sources.toml");
    std::fs::write(&catalog_path, "").expect("write empty catalog");

    let mut config = ScourConfig::default();
    config.catalog.path = catalog_path.clone();
    let addr = start_server(AppState::from_config(&config).expect("app state")).await;
    let mut ws = connect(addr).await;

    send(&mut ws, json!({"action": "search", "term": "dune"})).await;
    assert_eq!(recv(&mut ws).await["message"], "No active sites configured.");

    std::fs::write(
        &catalog_path,
        SOURCES_TOML.replace("BASE_URL", &site.uri()),
    )
    .expect("write catalog");

    send(&mut ws, json!({"action": "search", "term": "dune"})).await;
    assert_eq!(recv(&mut ws).await["source"], "FromFile");
    assert_eq!(recv(&mut ws).await["source"], "FromFile");
}

#[tokio::test]
async fn health_reports_ok() {
    let addr = start_with_sources(vec![]).await;

    let body: Value = reqwest::get(format!("http://{addr}/health"))
        .await
        .expect("health request")
        .json()
        .await
        .expect("health json");
    assert_eq!(body, json!({"status": "ok"}));
}
