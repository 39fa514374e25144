//! REST gateway against the backend API (bearer-token authenticated).

use serde_json::{Value, json};

use coachdesk_auth::LoginResponse;
use coachdesk_core::ResourceType;

use crate::gateway::normalize_listing;
use crate::{EntityGateway, GatewayConfig, GatewayError};

pub const LOGIN_PATH: &str = "auth/login";

/// HTTP client for the backend collections.
#[derive(Debug, Clone)]
pub struct RestGateway {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl RestGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path)
    }

    /// Exchange credentials for a bearer token and the user profile.
    ///
    /// Accepts the response body bare or wrapped in `{ "data": ... }`.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, GatewayError> {
        let resp = self
            .client
            .post(self.url(LOGIN_PATH))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let body = read_json(resp).await?;
        let body = match body {
            Value::Object(mut map) if !map.contains_key("token") && map.contains_key("data") => {
                map.remove("data").unwrap_or(Value::Null)
            }
            other => other,
        };

        serde_json::from_value(body).map_err(|e| GatewayError::Parse {
            resource: LOGIN_PATH.to_string(),
            message: e.to_string(),
        })
    }
}

async fn read_json(resp: reqwest::Response) -> Result<Value, GatewayError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.map_err(|e| {
            GatewayError::Network(format!("API error ({status}) with unreadable body: {e}"))
        })?;
        return Err(GatewayError::Api(status.as_u16(), body));
    }

    resp.json::<Value>()
        .await
        .map_err(|e| GatewayError::Network(format!("response body unreadable: {e}")))
}

#[async_trait::async_trait]
impl EntityGateway for RestGateway {
    async fn list(&self, resource: ResourceType) -> Result<Vec<Value>, GatewayError> {
        let mut req = self.client.get(self.url(resource.path()));
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await.map_err(|e| GatewayError::Network(e.to_string()))?;
        let body = read_json(resp).await?;
        let rows = normalize_listing(resource, body)?;

        tracing::debug!(resource = %resource, rows = rows.len(), "collection listed");
        Ok(rows)
    }
}
