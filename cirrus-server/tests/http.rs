mod common;

use std::sync::Arc;

use axum::http::HeaderValue;
use cirrus_store::MemoryStore;
use common::{body_bytes, config, get, json_body, post, router};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn health_is_unprefixed() {
    let store = Arc::new(MemoryStore::new());
    let res = router(config(&[]), &store).oneshot(get("/health")).await.unwrap();

    assert_eq!(res.status().as_u16(), 200);
    assert!(res.headers().get("x-request-id").is_some());
    assert_eq!(body_bytes(res).await, b"HEALTHY");
}

#[tokio::test]
async fn hello_reports_org_and_time() {
    let store = Arc::new(MemoryStore::new());
    let res = router(config(&[]), &store).oneshot(get("/acme/hello")).await.unwrap();
    assert_eq!(res.status().as_u16(), 200);

    let text = String::from_utf8(body_bytes(res).await).unwrap();
    let millis = text.strip_prefix("TEST (acme):").unwrap();
    assert!(millis.parse::<i64>().unwrap() > 0);
}

#[tokio::test]
async fn templates_are_served_under_the_org() {
    let store = Arc::new(MemoryStore::new());
    let app = router(config(&[]), &store);

    let res = app.clone().oneshot(get("/acme/templates/invalid_link.html")).await.unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let page = String::from_utf8(body_bytes(res).await).unwrap();
    assert!(page.contains("Invalid link"));

    let res = app.oneshot(get("/acme/templates/missing.html")).await.unwrap();
    assert_eq!(res.status().as_u16(), 404);
}

#[tokio::test]
async fn environment_dump_is_not_exposed() {
    let store = Arc::new(MemoryStore::new());
    let res = router(config(&[]), &store).oneshot(get("/acme/env")).await.unwrap();
    assert_eq!(res.status().as_u16(), 404);
}

#[tokio::test]
async fn webhook_key_is_enforced_when_configured() {
    let store = Arc::new(MemoryStore::new());
    let app = router(config(&[("WEBHOOK_KEY", "hook-secret")]), &store);
    let body = json!({"params": {"id": "g1"}});

    let res = app
        .clone()
        .oneshot(post("/acme/webhooks/functions/gltfUsageById", body.clone()))
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 401);

    let mut req = post("/acme/webhooks/functions/gltfUsageById", body);
    req.headers_mut()
        .insert("x-parse-webhook-key", HeaderValue::from_static("hook-secret"));
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(json_body(res).await, json!({"success": []}));
}

#[tokio::test]
async fn webhooks_live_under_the_org_prefix_only() {
    let store = Arc::new(MemoryStore::new());
    let res = router(config(&[]), &store)
        .oneshot(post("/other/webhooks/functions/gltfUsageById", json!({"params": {}})))
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 404);
}
