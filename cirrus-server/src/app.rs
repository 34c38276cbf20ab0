use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use chrono::Utc;
use cirrus_axum::AxumApp;
use cirrus_core::CloudApp;
use cirrus_store::{ObjectStore, ParseObject};
use tower_http::services::ServeDir;

use crate::config::OrgConfig;
use crate::services;

/// The organisation's HTTP surface:
///
/// - `/{org}/webhooks/...` cloud functions and triggers
/// - `/{org}/hello` and `/health`
/// - `/{org}/templates/*` static pages
pub fn cloud_app(config: Arc<OrgConfig>, store: Arc<dyn ObjectStore>) -> Result<AxumApp<ParseObject>> {
    let cloud: CloudApp<ParseObject> = CloudApp::new();
    services::configure(&cloud, Arc::clone(&config), store)?;

    let prefix = config.route_prefix();
    let org = config.organisation_id.clone();
    let templates = Router::new().nest_service(
        &format!("{prefix}/templates"),
        ServeDir::new(&config.templates_dir),
    );

    let ax = AxumApp::new(cloud)
        .use_webhooks(&prefix, config.webhook_key.clone())
        .use_get("/health", || async { "HEALTHY" })
        .use_get(&format!("{prefix}/hello"), move || {
            let org = org.clone();
            async move { format!("TEST ({org}):{}", Utc::now().timestamp_millis()) }
        })
        .merge(templates);

    Ok(ax)
}
