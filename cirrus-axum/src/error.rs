use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cirrus_core::CloudError;

/// Transport-level failure, answered with an HTTP error status.
///
/// Cloud-code outcomes (function errors, trigger rejections) are not
/// sent this way; they travel inside the webhook envelope.
#[derive(Debug)]
pub struct CloudAxumError(pub anyhow::Error);

impl From<anyhow::Error> for CloudAxumError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<CloudError> for CloudAxumError {
    fn from(e: CloudError) -> Self {
        Self(e.into_anyhow())
    }
}

impl IntoResponse for CloudAxumError {
    fn into_response(self) -> Response {
        let safe = match CloudError::from_anyhow(&self.0) {
            Some(cloud) => cloud.sanitize_for_client(),
            None => CloudError::internal(self.0.to_string()),
        };
        let status = StatusCode::from_u16(safe.kind.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(safe.to_json())).into_response()
    }
}
