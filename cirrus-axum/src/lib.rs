//! cirrus-axum: serves a [`cirrus_core::CloudApp`] as hosted-platform webhooks.
//!
//! Function and trigger calls arrive as JSON posts and are answered with
//! the `{"success": ...}` / `{"code", "error"}` envelope.

pub mod app;
pub mod routes;
pub mod state;
pub mod webhook;
mod error;

pub use app::{axum, AxumApp};
pub use error::CloudAxumError;
pub use state::WebhookState;
pub use webhook::{FunctionRequest, TriggerRequest, WebhookResponse, WEBHOOK_KEY_HEADER};
