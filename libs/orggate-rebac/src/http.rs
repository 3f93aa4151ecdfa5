//! HTTP client for a deployed relationship engine.
//!
//! The wire contract is deliberately small: `POST /v1/check` answering
//! `{"allowed": bool}`, and `POST`/`DELETE /v1/tuples` for graph
//! synchronization. The engine's expansion algorithm stays on its side.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::engine::{EngineError, RelationEngine};
use crate::tuple::RelationTuple;

/// Configuration for the HTTP engine client.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct HttpEngineConfig {
    /// Base URL of the engine, e.g. `http://rebac:8443`.
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    2_000
}

/// `RelationEngine` backed by an HTTP engine deployment.
pub struct HttpRelationEngine {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct CheckResponse {
    allowed: bool,
}

impl HttpRelationEngine {
    /// Build a client from configuration.
    ///
    /// # Errors
    /// Returns `EngineError::Protocol` when the base URL is invalid or the
    /// HTTP client cannot be constructed.
    pub fn new(config: &HttpEngineConfig) -> Result<Self, EngineError> {
        let base_url = config.base_url.trim_end_matches('/').to_owned();
        url::Url::parse(&base_url)
            .map_err(|e| EngineError::Protocol(format!("invalid engine base url: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| EngineError::Protocol(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn transport_error(e: &reqwest::Error) -> EngineError {
    if e.is_timeout() || e.is_connect() {
        EngineError::Unavailable(e.to_string())
    } else {
        EngineError::Protocol(e.to_string())
    }
}

#[async_trait]
impl RelationEngine for HttpRelationEngine {
    async fn check(
        &self,
        subject: &str,
        relation: &str,
        object: &str,
    ) -> Result<bool, EngineError> {
        let response = self
            .client
            .post(self.url("/v1/check"))
            .json(&RelationTuple::new(subject, relation, object))
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        if response.status().is_server_error() {
            return Err(EngineError::Unavailable(format!(
                "engine returned {}",
                response.status()
            )));
        }
        if !response.status().is_success() {
            return Err(EngineError::Protocol(format!(
                "engine returned {}",
                response.status()
            )));
        }

        let body: CheckResponse = response
            .json()
            .await
            .map_err(|e| EngineError::Protocol(e.to_string()))?;
        Ok(body.allowed)
    }

    async fn write_tuple(&self, tuple: &RelationTuple) -> Result<(), EngineError> {
        let response = self
            .client
            .post(self.url("/v1/tuples"))
            .json(tuple)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        if !response.status().is_success() {
            return Err(EngineError::Protocol(format!(
                "tuple write returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn delete_tuple(&self, tuple: &RelationTuple) -> Result<(), EngineError> {
        let response = self
            .client
            .delete(self.url("/v1/tuples"))
            .json(tuple)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        // Deleting a tuple that is already gone is not an error.
        if !response.status().is_success() && response.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(EngineError::Protocol(format!(
                "tuple delete returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}
