use std::sync::Arc;

use cirrus_core::CloudApp;

/// Shared state behind the webhook routes.
pub struct WebhookState<R>
where
    R: Send + Sync + 'static,
{
    pub app: Arc<CloudApp<R>>,
    /// Expected `X-Parse-Webhook-Key`; `None` accepts any caller.
    pub key: Option<Arc<str>>,
}

impl<R> Clone for WebhookState<R>
where
    R: Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            app: Arc::clone(&self.app),
            key: self.key.clone(),
        }
    }
}

impl<R> WebhookState<R>
where
    R: Send + Sync + 'static,
{
    pub fn new(app: Arc<CloudApp<R>>, key: Option<String>) -> Self {
        Self {
            app,
            key: key.filter(|k| !k.is_empty()).map(Arc::from),
        }
    }
}
