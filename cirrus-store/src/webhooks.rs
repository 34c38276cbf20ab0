//! Registration of cloud-code webhooks with the hosted platform
//! (`/hooks/functions`, `/hooks/triggers`).

use reqwest::Method;
use serde_json::{json, Value};
use tracing::info;

use crate::error::StoreError;
use crate::rest::RestStore;

/// Parse code returned when a webhook with the same key already exists.
const WEBHOOK_EXISTS: i32 = 143;

impl RestStore {
    /// Point function `name` at `url`, creating or updating the registration.
    pub async fn register_function(&self, name: &str, url: &str) -> Result<Value, StoreError> {
        let created = self
            .send_hook(Method::POST, "hooks/functions", json!({ "functionName": name, "url": url }))
            .await;

        match created {
            Err(StoreError::Server { code: WEBHOOK_EXISTS, .. }) => {
                info!(function = name, url, "updating function webhook");
                self.send_hook(Method::PUT, &format!("hooks/functions/{name}"), json!({ "url": url }))
                    .await
            }
            other => {
                if other.is_ok() {
                    info!(function = name, url, "registered function webhook");
                }
                other
            }
        }
    }

    /// Point trigger `trigger_name` on `class_name` at `url`.
    pub async fn register_trigger(&self, class_name: &str, trigger_name: &str, url: &str) -> Result<Value, StoreError> {
        let created = self
            .send_hook(
                Method::POST,
                "hooks/triggers",
                json!({ "className": class_name, "triggerName": trigger_name, "url": url }),
            )
            .await;

        match created {
            Err(StoreError::Server { code: WEBHOOK_EXISTS, .. }) => {
                info!(class = class_name, trigger = trigger_name, url, "updating trigger webhook");
                self.send_hook(
                    Method::PUT,
                    &format!("hooks/triggers/{class_name}/{trigger_name}"),
                    json!({ "url": url }),
                )
                .await
            }
            other => {
                if other.is_ok() {
                    info!(class = class_name, trigger = trigger_name, url, "registered trigger webhook");
                }
                other
            }
        }
    }

    async fn send_hook(&self, method: Method, path: &str, body: Value) -> Result<Value, StoreError> {
        let response = self.request(method, path).json(&body).send().await?;
        Self::read_json(response).await
    }
}
