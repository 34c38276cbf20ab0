#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::Router;
use cirrus_server::OrgConfig;
use cirrus_store::{MemoryStore, ObjectStore, ParseObject, Query, ROLE_CLASS};
use http_body_util::BodyExt;
use serde_json::Value;

pub const ORG: &str = "acme";

pub fn config(extra: &[(&str, &str)]) -> Arc<OrgConfig> {
    let mut vars: HashMap<String, String> = [
        ("appId", "app"),
        ("masterKey", "mk"),
        ("organisationId", ORG),
        ("organisationDomain", "example.com"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }
    Arc::new(OrgConfig::from_lookup(|key| vars.get(key).cloned()).unwrap())
}

pub fn router(config: Arc<OrgConfig>, store: &Arc<MemoryStore>) -> Router {
    let store: Arc<dyn ObjectStore> = store.clone();
    cirrus_server::build(config, store).unwrap().into_router()
}

pub fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_bytes(res: axum::response::Response) -> Vec<u8> {
    res.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn json_body(res: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(res).await).unwrap()
}

/// Role documents by name.
pub async fn roles(store: &MemoryStore) -> HashMap<String, ParseObject> {
    store
        .find_all(&Query::new(ROLE_CLASS))
        .await
        .unwrap()
        .into_iter()
        .map(|r| (r.get_str("name").unwrap().to_string(), r))
        .collect()
}
