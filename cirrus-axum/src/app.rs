use std::sync::Arc;

use axum::handler::Handler;
use axum::routing::get;
use axum::Router;
use cirrus_core::CloudApp;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::routes::webhook_router;
use crate::state::WebhookState;

pub struct AxumApp<R>
where
    R: Send + Sync + 'static,
{
    pub app: Arc<CloudApp<R>>,
    pub router: Router<()>,
}

impl<R> Clone for AxumApp<R>
where
    R: Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            app: Arc::clone(&self.app),
            router: self.router.clone(),
        }
    }
}

impl<R> AxumApp<R>
where
    R: Send + Sync + 'static,
{
    pub fn new(app: CloudApp<R>) -> Self {
        Self {
            app: Arc::new(app),
            router: Router::new(),
        }
    }

    pub fn use_router(mut self, path: &str, router: Router<()>) -> Self {
        self.router = self.router.nest(path, router);
        self
    }

    /// Merge routes without a prefix.
    pub fn merge(mut self, router: Router<()>) -> Self {
        self.router = self.router.merge(router);
        self
    }

    pub fn use_get<H, T>(mut self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()> + Clone + Send + Sync + 'static,
        T: 'static,
    {
        self.router = self.router.route(path, get(handler));
        self
    }

    /// Mount the cloud-code webhook routes under `{prefix}/webhooks`.
    pub fn use_webhooks(self, prefix: &str, key: Option<String>) -> Self
    where
        R: Serialize + DeserializeOwned,
    {
        let state = WebhookState::new(Arc::clone(&self.app), key);
        let path = format!("{}/webhooks", prefix.trim_end_matches('/'));
        self.use_router(&path, webhook_router(state))
    }

    /// Final router with request ids and HTTP tracing applied.
    pub fn into_router(self) -> Router<()> {
        self.router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
    }

    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "cloud code listening");
        axum::serve(listener, self.into_router()).await?;
        Ok(())
    }
}

pub fn axum<R>(app: CloudApp<R>) -> AxumApp<R>
where
    R: Send + Sync + 'static,
{
    AxumApp::new(app)
}
