use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::StoreError;
use crate::object::ParseObject;
use crate::query::Query;
use crate::store::ObjectStore;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: i32,
    error: String,
}

#[derive(Debug, Deserialize)]
struct FindBody {
    results: Vec<Value>,
}

/// REST adapter for the hosted platform, authenticated with the master key.
pub struct RestStore {
    client: Client,
    server_url: String,
    app_id: String,
    master_key: String,
}

impl RestStore {
    pub fn new(server_url: impl Into<String>, app_id: impl Into<String>, master_key: impl Into<String>) -> Self {
        Self::with_client(Client::new(), server_url, app_id, master_key)
    }

    pub fn with_client(
        client: Client,
        server_url: impl Into<String>,
        app_id: impl Into<String>,
        master_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            server_url: server_url.into().trim_end_matches('/').to_string(),
            app_id: app_id.into(),
            master_key: master_key.into(),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.server_url, path))
            .header("X-Parse-Application-Id", &self.app_id)
            .header("X-Parse-Master-Key", &self.master_key)
    }

    /// Success bodies as JSON; failures decoded from `{code, error}` when present.
    pub(crate) async fn read_json(response: Response) -> Result<Value, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<Value>().await?);
        }

        let text = response.text().await?;
        match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => Err(StoreError::Server {
                code: body.code,
                message: body.error,
            }),
            Err(_) => Err(StoreError::Server {
                code: 1,
                message: format!("HTTP {status}: {text}"),
            }),
        }
    }
}

/// REST path for a class; system classes have their own endpoints.
pub fn class_path(class_name: &str) -> String {
    match class_name {
        "_User" => "users".to_string(),
        "_Role" => "roles".to_string(),
        "_Installation" => "installations".to_string(),
        "_Session" => "sessions".to_string(),
        other => format!("classes/{other}"),
    }
}

#[async_trait]
impl ObjectStore for RestStore {
    async fn find(&self, query: &Query) -> Result<Vec<ParseObject>, StoreError> {
        let mut params: Vec<(&str, String)> = vec![("where", query.where_json().to_string())];
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }
        if query.skip > 0 {
            params.push(("skip", query.skip.to_string()));
        }
        if let Some(order) = &query.order {
            params.push(("order", order.clone()));
        }

        debug!(class = %query.class_name, skip = query.skip, "store find");
        let response = self
            .request(Method::GET, &class_path(&query.class_name))
            .query(&params)
            .send()
            .await?;

        let body: FindBody = serde_json::from_value(Self::read_json(response).await?)
            .map_err(|e| StoreError::decode(format!("invalid find response: {e}")))?;

        body.results
            .into_iter()
            .map(|v| ParseObject::from_json(Some(&query.class_name), v))
            .collect()
    }

    async fn get(&self, class_name: &str, object_id: &str) -> Result<ParseObject, StoreError> {
        let path = format!("{}/{}", class_path(class_name), object_id);
        let response = self.request(Method::GET, &path).send().await?;

        match Self::read_json(response).await {
            Ok(v) => ParseObject::from_json(Some(class_name), v),
            Err(StoreError::Server { code: 101, .. }) => Err(StoreError::NotFound {
                class_name: class_name.to_string(),
                object_id: object_id.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    async fn save(&self, object: &ParseObject) -> Result<ParseObject, StoreError> {
        let base = class_path(&object.class_name);
        let request = match &object.object_id {
            Some(id) => self.request(Method::PUT, &format!("{base}/{id}")),
            None => self.request(Method::POST, &base),
        };

        let response = request.json(&object.to_save_body()).send().await?;
        let body = Self::read_json(response).await?;

        let mut saved = object.clone();
        saved.mark_saved();
        if let Some(id) = body.get("objectId").and_then(Value::as_str) {
            saved.object_id = Some(id.to_string());
        }
        if let Some(ts) = body.get("createdAt").and_then(Value::as_str) {
            saved.created_at = Some(ts.to_string());
            saved.updated_at = Some(ts.to_string());
        }
        if let Some(ts) = body.get("updatedAt").and_then(Value::as_str) {
            saved.updated_at = Some(ts.to_string());
        }
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_classes_use_their_own_endpoints() {
        assert_eq!(class_path("_User"), "users");
        assert_eq!(class_path("_Role"), "roles");
        assert_eq!(class_path("Design"), "classes/Design");
    }

    #[test]
    fn trailing_slash_is_trimmed_from_server_url() {
        let store = RestStore::new("http://localhost:1337/acme/parse/", "app", "master");
        assert_eq!(store.server_url(), "http://localhost:1337/acme/parse");
    }
}
