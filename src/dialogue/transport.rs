use crate::dialogue::config::DialogueConfig;
use crate::dialogue::response::DialogueError;
use crate::{ParleyError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Carries one request payload to the dialogue service and returns the decoded
/// JSON body.
#[async_trait]
pub trait DialogueTransport: Send + Sync {
    async fn invoke(&self, payload: &Value) -> std::result::Result<Value, DialogueError>;
}

/// JSON-over-HTTP transport with bearer-token auth
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &DialogueConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ParleyError::ConfigError(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            token: config.token.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl DialogueTransport for HttpTransport {
    async fn invoke(&self, payload: &Value) -> std::result::Result<Value, DialogueError> {
        let mut request = self.client.post(&self.endpoint).json(payload);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DialogueError::Transport(e.to_string()))?;

        let status = response.status();
        debug!("Dialogue service responded with {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DialogueError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| DialogueError::Malformed(e.to_string()))
    }
}
