use async_trait::async_trait;
use cirrus_core::{CloudError, CloudFunction, RequestContext};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::config::PortalConfig;

pub const GET_TOKEN: &str = "getToken";

/// Token lifetime requested from the portal, in minutes.
const EXPIRATION_MINUTES: &str = "1440";

#[derive(Debug, Serialize)]
struct TokenForm<'a> {
    username: &'a str,
    password: &'a str,
    client: &'static str,
    ip: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    referer: Option<&'a str>,
    expiration: &'static str,
    f: &'static str,
}

/// Exchanges the service-account credentials for a portal token bound to
/// `params.referer`. The portal's response body is returned verbatim.
pub struct GetToken {
    portal: PortalConfig,
    client: Client,
}

impl GetToken {
    pub fn new(portal: PortalConfig) -> Self {
        Self::with_client(portal, Client::new())
    }

    pub fn with_client(portal: PortalConfig, client: Client) -> Self {
        Self { portal, client }
    }

    async fn request(&self, referer: Option<&str>) -> anyhow::Result<String> {
        let url = self
            .portal
            .token_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("tokenUrl is not configured"))?;

        let form = TokenForm {
            username: self.portal.user.as_deref().unwrap_or_default(),
            password: self.portal.pass.as_deref().unwrap_or_default(),
            client: "referer",
            ip: "",
            referer,
            expiration: EXPIRATION_MINUTES,
            f: "json",
        };

        let body = self
            .client
            .post(url)
            .form(&form)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }
}

#[async_trait]
impl CloudFunction for GetToken {
    async fn call(&self, _ctx: &RequestContext, params: Value) -> anyhow::Result<Value> {
        let referer = params.get("referer").and_then(Value::as_str);
        debug!(referer, "requesting portal token");

        match self.request(referer).await {
            Ok(body) => Ok(Value::String(body)),
            Err(e) => {
                error!(error = %e, "getToken failed");
                Err(CloudError::script_failed("Failed to get token").with_source(e).into_anyhow())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_skips_missing_referer() {
        let form = TokenForm {
            username: "svc",
            password: "pw",
            client: "referer",
            ip: "",
            referer: None,
            expiration: EXPIRATION_MINUTES,
            f: "json",
        };
        let value = serde_json::to_value(&form).unwrap();
        assert!(value.get("referer").is_none());
        assert_eq!(value["expiration"], "1440");
        assert_eq!(value["client"], "referer");
    }
}
