//! Wire types for the hosted platform's cloud-code webhooks.

use cirrus_core::{CloudError, RequestContext};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Header carrying the shared webhook key.
pub const WEBHOOK_KEY_HEADER: &str = "x-parse-webhook-key";

/// Body of a function webhook call.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionRequest {
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub master: bool,
    #[serde(default)]
    pub user: Option<Value>,
    #[serde(default)]
    pub installation_id: Option<String>,
}

/// Body of a trigger webhook call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRequest<R> {
    #[serde(default)]
    pub trigger_name: Option<String>,
    pub object: R,
    pub original: Option<R>,
    #[serde(default)]
    pub master: bool,
    #[serde(default)]
    pub user: Option<Value>,
    #[serde(default)]
    pub installation_id: Option<String>,
}

fn context(master: bool, user: Option<&Value>, installation_id: Option<&String>) -> RequestContext {
    RequestContext {
        master,
        user_id: user
            .and_then(|u| u.get("objectId"))
            .and_then(Value::as_str)
            .map(str::to_string),
        installation_id: installation_id.cloned(),
        request_id: None,
    }
}

impl FunctionRequest {
    pub fn context(&self) -> RequestContext {
        context(self.master, self.user.as_ref(), self.installation_id.as_ref())
    }
}

impl<R> TriggerRequest<R> {
    pub fn context(&self) -> RequestContext {
        context(self.master, self.user.as_ref(), self.installation_id.as_ref())
    }
}

/// `{"success": ...}` or `{"code": ..., "error": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WebhookResponse {
    Success { success: Value },
    Error { code: i32, error: String },
}

impl WebhookResponse {
    pub fn success(value: Value) -> Self {
        WebhookResponse::Success { success: value }
    }

    pub fn error(err: &CloudError) -> Self {
        WebhookResponse::Error {
            code: err.code(),
            error: err.message.clone(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, WebhookResponse::Success { .. })
    }
}
