mod common;

use std::sync::Arc;

use cirrus_server::services::users::SIGNUP_DENIED;
use cirrus_store::{MemoryStore, ROLE_CLASS};
use common::{config, json_body, post, router};
use serde_json::{json, Value};
use tower::ServiceExt;

const BEFORE_SAVE: &str = "/acme/webhooks/triggers/_User/beforeSave";

async fn before_save(object: Value) -> (Value, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let res = router(config(&[]), &store)
        .oneshot(post(
            BEFORE_SAVE,
            json!({"triggerName": "beforeSave", "object": object, "master": false}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    (json_body(res).await, store)
}

#[tokio::test]
async fn anonymous_users_are_rejected_even_when_email_matches() {
    let (body, store) = before_save(json!({
        "className": "_User",
        "username": "a@example.com",
        "email": "a@example.com",
        "authData": {"anonymous": {"id": "9a1c"}}
    }))
    .await;

    assert_eq!(body, json!({"code": 142, "error": SIGNUP_DENIED}));
    assert_eq!(store.count(ROLE_CLASS), 0);
}

#[tokio::test]
async fn email_username_mismatch_is_rejected() {
    let (body, _) = before_save(json!({
        "className": "_User",
        "username": "a",
        "email": "a@example.com"
    }))
    .await;

    assert_eq!(body, json!({"code": 142, "error": SIGNUP_DENIED}));
}

#[tokio::test]
async fn missing_email_with_username_is_rejected() {
    let (body, _) = before_save(json!({"className": "_User", "username": "a"})).await;
    assert_eq!(body["code"], 142);
}

#[tokio::test]
async fn matching_email_and_username_is_accepted_unchanged() {
    let (body, _) = before_save(json!({
        "className": "_User",
        "username": "a@example.com",
        "email": "a@example.com",
        "authData": {"anonymous": null}
    }))
    .await;

    let saved = &body["success"];
    assert_eq!(saved["className"], "_User");
    assert_eq!(saved["username"], "a@example.com");
    assert_eq!(saved["email"], "a@example.com");
}

#[tokio::test]
async fn domain_does_not_matter_for_signup() {
    let (body, _) = before_save(json!({
        "className": "_User",
        "username": "c@other.org",
        "email": "c@other.org"
    }))
    .await;
    assert!(body.get("success").is_some());
}
