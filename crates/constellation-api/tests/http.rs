use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use constellation_api::clock::ManualClock;
use constellation_api::service::{ServiceConfig, StarService};
use constellation_api::{AppStateInner, router};
use constellation_db::Database;

fn app() -> Router {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 7, 7, 7, 0, 0).unwrap()));
    let service = StarService::new(db, ServiceConfig::default(), clock);
    router(Arc::new(AppStateInner {
        service,
        trust_proxy: true,
    }))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_star(ip: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/stars")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", ip)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn react(ip: &str, star_id: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/api/stars/{}/react", star_id))
        .header("x-forwarded-for", ip)
        .body(Body::empty())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn create_star_returns_201_without_hashes() {
    let app = app();
    let (status, body) = send(
        &app,
        post_star("198.51.100.1", json!({ "message": "hello from the night sky", "theme": "CRUSH" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let star = &body["star"];
    assert_eq!(star["theme"], "CRUSH");
    assert_eq!(star["brightness"], 0);
    assert_eq!(star["hasTwin"], false);
    assert!(star["twinLink"].is_null());
    let x = star["posX"].as_f64().unwrap();
    assert!((0.0..100.0).contains(&x));
    assert!(star.get("ipHash").is_none());
    assert!(star.get("codeHash").is_none());
}

#[tokio::test]
async fn validation_and_rate_limit_are_distinguishable() {
    let app = app();

    let (status, body) = send(&app, post_star("198.51.100.2", json!({ "message": "too short", "theme": "CRUSH" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("between 10 and 500"));

    let (status, _) = send(&app, post_star("198.51.100.2", json!({ "message": "valid enough message" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        post_star("198.51.100.2", json!({ "message": "valid enough message", "theme": "SADNESS" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for _ in 0..3 {
        let (status, _) = send(
            &app,
            post_star("198.51.100.2", json!({ "message": "valid enough message", "theme": "GRATITUDE" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(
        &app,
        post_star("198.51.100.2", json!({ "message": "valid enough message", "theme": "GRATITUDE" })),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "Rate limit exceeded. Please try again later.");
}

fn raw_post_star(content_type: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/stars")
        .header("x-forwarded-for", "198.51.100.9");
    if let Some(ct) = content_type {
        builder = builder.header(header::CONTENT_TYPE, ct);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn assert_json_400(status: StatusCode, body: &Value) {
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!body["error"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_bodies_are_json_validation_errors() {
    let app = app();

    let (status, body) = send(
        &app,
        raw_post_star(Some("application/json"), r#"{"message": 12345678901, "theme": "CRUSH"}"#),
    )
    .await;
    assert_json_400(status, &body);

    let (status, body) = send(
        &app,
        raw_post_star(None, r#"{"message": "valid enough message", "theme": "CRUSH"}"#),
    )
    .await;
    assert_json_400(status, &body);

    let (status, body) = send(&app, raw_post_star(Some("application/json"), "not json")).await;
    assert_json_400(status, &body);

    // none of the rejected requests used up the rate limit
    for _ in 0..3 {
        let (status, _) = send(
            &app,
            raw_post_star(Some("application/json"), r#"{"message": "valid enough message", "theme": "CRUSH"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
}

#[tokio::test]
async fn malformed_query_is_a_json_validation_error() {
    let app = app();
    let (status, body) = send(&app, get("/api/stars?limit=abc")).await;
    assert_json_400(status, &body);

    let (status, body) = send(&app, get("/api/stars?offset=-1")).await;
    assert_json_400(status, &body);
}

#[tokio::test]
async fn twins_show_up_in_listing() {
    let app = app();
    let (_, a) = send(
        &app,
        post_star(
            "198.51.100.3",
            json!({ "message": "looking for my twin", "theme": "WHAT_IF", "initials": "da", "birthMonth": "7" }),
        ),
    )
    .await;
    let (status, b) = send(
        &app,
        post_star(
            "198.51.100.4",
            json!({ "message": "found you at last", "theme": "CRUSH", "initials": "DA", "birthMonth": "07" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(b["star"]["hasTwin"], true);
    assert_eq!(b["star"]["twinLink"]["id"], a["star"]["id"]);

    let (status, list) = send(&app, get("/api/stars")).await;
    assert_eq!(status, StatusCode::OK);
    let stars = list["stars"].as_array().unwrap();
    assert_eq!(stars.len(), 2);
    assert!(stars.iter().all(|s| s["hasTwin"] == true));
    for s in stars {
        let twin = s["twinLink"].as_object().unwrap();
        assert_eq!(twin.len(), 3);
        assert!(twin.contains_key("id") && twin.contains_key("posX") && twin.contains_key("posY"));
    }

    let (_, filtered) = send(&app, get("/api/stars?theme=WHAT_IF")).await;
    let filtered = filtered["stars"].as_array().unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["id"], a["star"]["id"]);

    let (status, _) = send(&app, get("/api/stars?theme=NOT_A_THEME")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn react_flow() {
    let app = app();
    let (_, created) = send(
        &app,
        post_star("198.51.100.5", json!({ "message": "shine a little light", "theme": "MOVING_ON" })),
    )
    .await;
    let id = created["star"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, react("203.0.113.50", &id)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["brightness"], 1);
    assert_eq!(body["reaction"]["starId"], id.as_str());
    assert!(body["reaction"].get("ipHash").is_none());

    let (status, body) = send(&app, react("203.0.113.50", &id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Already reacted to this star");

    let (status, _) = send(&app, react("203.0.113.50", "does-not-exist")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, get(&format!("/api/stars/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["star"]["brightness"], 1);

    let (status, _) = send(&app, get("/api/stars/does-not-exist")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn themes_and_health() {
    let app = app();
    let (status, body) = send(&app, get("/api/themes")).await;
    assert_eq!(status, StatusCode::OK);
    let themes = body["themes"].as_array().unwrap();
    assert_eq!(themes.len(), 8);
    assert_eq!(themes[0]["value"], "CRUSH");
    assert_eq!(themes[0]["label"], "💕 Crush");

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
