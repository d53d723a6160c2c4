//! HTTP client for the chat backend

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5001";

const START_CONVERSATION: &str = "/api/start-conversation";
const SEND_MESSAGE: &str = "/api/send-message";
const AVAILABLE_MODELS: &str = "/api/available-models";
const SELECT_MODEL: &str = "/api/select-model";
const CLEAR_MEMORY: &str = "/api/clear-memory";

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{endpoint} returned status {status}")]
    Status {
        endpoint: &'static str,
        status: StatusCode,
    },

    #[error("Invalid response from {endpoint}: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    message: &'a str,
}

#[derive(Serialize)]
struct SelectModelRequest<'a> {
    model: &'a str,
}

#[derive(Deserialize)]
struct StartConversationResponse {
    message: String,
}

#[derive(Deserialize)]
struct SendMessageResponse {
    response: String,
}

#[derive(Deserialize)]
struct AvailableModelsResponse {
    models: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: normalize_base_url(base_url),
        }
    }

    /// Client with a per-request timeout instead of the transport default.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: normalize_base_url(base_url),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ask the backend for a fresh conversation and return its greeting.
    pub async fn start_conversation(&self) -> Result<String, BackendError> {
        let response = self.client.post(self.url(START_CONVERSATION)).send().await?;
        let body: StartConversationResponse = decode(START_CONVERSATION, response).await?;
        Ok(body.message)
    }

    pub async fn send_message(&self, message: &str) -> Result<String, BackendError> {
        let response = self
            .client
            .post(self.url(SEND_MESSAGE))
            .json(&SendMessageRequest { message })
            .send()
            .await?;
        let body: SendMessageResponse = decode(SEND_MESSAGE, response).await?;
        Ok(body.response)
    }

    pub async fn available_models(&self) -> Result<Vec<String>, BackendError> {
        let response = self.client.get(self.url(AVAILABLE_MODELS)).send().await?;
        let body: AvailableModelsResponse = decode(AVAILABLE_MODELS, response).await?;
        Ok(body.models)
    }

    pub async fn select_model(&self, model: &str) -> Result<(), BackendError> {
        let response = self
            .client
            .post(self.url(SELECT_MODEL))
            .json(&SelectModelRequest { model })
            .send()
            .await?;
        check_status(SELECT_MODEL, &response)
    }

    pub async fn clear_memory(&self) -> Result<(), BackendError> {
        let response = self.client.post(self.url(CLEAR_MEMORY)).send().await?;
        check_status(CLEAR_MEMORY, &response)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

fn check_status(endpoint: &'static str, response: &Response) -> Result<(), BackendError> {
    let status = response.status();
    if !status.is_success() {
        return Err(BackendError::Status { endpoint, status });
    }
    Ok(())
}

async fn decode<T: DeserializeOwned>(
    endpoint: &'static str,
    response: Response,
) -> Result<T, BackendError> {
    check_status(endpoint, &response)?;
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|source| BackendError::Decode { endpoint, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let client = BackendClient::new("http://localhost:5001/");
        assert_eq!(client.base_url(), "http://localhost:5001");
        assert_eq!(
            client.url(SEND_MESSAGE),
            "http://localhost:5001/api/send-message"
        );
    }

    #[test]
    fn request_bodies_match_backend_contract() {
        let send = serde_json::to_value(SendMessageRequest { message: "Hallo" }).unwrap();
        assert_eq!(send, serde_json::json!({ "message": "Hallo" }));

        let select = serde_json::to_value(SelectModelRequest { model: "gpt-4o" }).unwrap();
        assert_eq!(select, serde_json::json!({ "model": "gpt-4o" }));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        // Port 9 (discard) on localhost is closed in any sane test environment
        let client = BackendClient::new("http://127.0.0.1:9");
        let err = client.send_message("Hallo").await.unwrap_err();
        assert!(matches!(err, BackendError::Transport(_)));
    }
}
