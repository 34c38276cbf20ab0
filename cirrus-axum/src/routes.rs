use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use cirrus_core::{CloudError, RequestContext, TriggerKind};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::state::WebhookState;
use crate::webhook::{FunctionRequest, TriggerRequest, WebhookResponse, WEBHOOK_KEY_HEADER};
use crate::CloudAxumError;

fn map_json_rejection(rejection: JsonRejection) -> CloudAxumError {
    CloudError::invalid_json("Failed to parse the webhook body as JSON")
        .with_data(json!({ "body": rejection.body_text() }))
        .into()
}

fn request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn with_request_id(mut ctx: RequestContext, headers: &HeaderMap) -> RequestContext {
    ctx.request_id = request_id(headers);
    ctx
}

/// `None` when the key matches (or no key is configured).
fn check_key(expected: Option<&str>, headers: &HeaderMap) -> Option<Response> {
    let expected = expected?;
    let provided = headers.get(WEBHOOK_KEY_HEADER).and_then(|v| v.to_str().ok());
    if provided == Some(expected) {
        return None;
    }
    warn!("webhook call with a missing or wrong key");
    let err = CloudError::operation_forbidden("Unauthorized");
    Some((StatusCode::UNAUTHORIZED, Json(WebhookResponse::error(&err))).into_response())
}

fn failure(err: CloudError) -> Json<WebhookResponse> {
    match &err.source {
        Some(source) => warn!(code = err.code(), error = %err.message, cause = %source, "cloud code failed"),
        None => info!(code = err.code(), error = %err.message, "cloud code failed"),
    }
    Json(WebhookResponse::error(&err.sanitize_for_client()))
}

/// Router for `/functions/{name}` and `/triggers/{className}/{triggerName}`.
pub fn webhook_router<R>(state: WebhookState<R>) -> Router<()>
where
    R: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    Router::new()
        .route("/functions/{name}", post(run_function::<R>))
        .route("/triggers/{class_name}/{trigger_name}", post(run_trigger::<R>))
        .with_state(state)
}

async fn run_function<R>(
    State(state): State<WebhookState<R>>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Result<Json<FunctionRequest>, JsonRejection>,
) -> Result<Response, CloudAxumError>
where
    R: Send + Sync + 'static,
{
    if let Some(denied) = check_key(state.key.as_deref(), &headers) {
        return Ok(denied);
    }
    let Json(body) = body.map_err(map_json_rejection)?;
    let ctx = with_request_id(body.context(), &headers);

    let reply = match state.app.run_function(&ctx, &name, body.params).await {
        Ok(value) => Json(WebhookResponse::success(value)),
        Err(err) => failure(CloudError::normalize(err)),
    };
    Ok(reply.into_response())
}

async fn run_trigger<R>(
    State(state): State<WebhookState<R>>,
    Path((class_name, trigger_name)): Path<(String, String)>,
    headers: HeaderMap,
    body: Result<Json<TriggerRequest<R>>, JsonRejection>,
) -> Result<Response, CloudAxumError>
where
    R: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    if let Some(denied) = check_key(state.key.as_deref(), &headers) {
        return Ok(denied);
    }
    let Some(kind) = TriggerKind::parse(&trigger_name) else {
        return Err(CloudError::webhook(format!("Unsupported trigger: {trigger_name}")).into());
    };
    let Json(body) = body.map_err(map_json_rejection)?;
    let ctx = with_request_id(body.context(), &headers);
    let TriggerRequest { object, original, .. } = body;

    let reply = match kind {
        TriggerKind::BeforeSave => match state.app.run_before_save(ctx, &class_name, object, original).await {
            Ok(object) => {
                let value = serde_json::to_value(&object)
                    .map_err(|e| CloudError::internal(format!("failed to encode object: {e}")))?;
                Json(WebhookResponse::success(value))
            }
            Err(rejection) => failure(CloudError::from(rejection)),
        },
        TriggerKind::AfterSave => match state.app.run_after_save(ctx, &class_name, object, original).await {
            Ok(()) => Json(WebhookResponse::success(Value::Bool(true))),
            Err(rejection) => failure(CloudError::from(rejection)),
        },
    };
    Ok(reply.into_response())
}
