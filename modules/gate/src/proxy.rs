//! Forwarding of allowed requests to the downstream business service.
//!
//! The downstream trusts the identity headers the gate emitted; it never
//! re-validates them. The proxy is deliberately thin: method, path, query,
//! headers and body pass through, hop-by-hop headers excepted.

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

/// Inbound bodies above this size are rejected before forwarding.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Downstream business-service settings.
#[derive(Clone, Debug, Deserialize)]
pub struct ProxyConfig {
    /// Base URL of the downstream service, e.g. `http://backend:8080`.
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    30_000
}

/// Reqwest-backed forwarder.
pub struct Proxy {
    client: reqwest::Client,
    base_url: String,
}

impl Proxy {
    /// Build the forwarder.
    ///
    /// # Errors
    /// Invalid base URL or client construction failure.
    pub fn new(config: &ProxyConfig) -> anyhow::Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_owned();
        url::Url::parse(&base_url)
            .map_err(|e| anyhow::anyhow!("invalid downstream base url: {e}"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self { client, base_url })
    }

    async fn forward(&self, req: Request) -> Response {
        let (parts, body) = req.into_parts();

        let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
            Ok(bytes) => bytes,
            Err(_) => {
                return (
                    StatusCode::PAYLOAD_TOO_LARGE,
                    Json(serde_json::json!({
                        "error": "payload_too_large",
                        "message": "request body exceeds the forwarding limit"
                    })),
                )
                    .into_response();
            }
        };

        let mut url = format!("{}{}", self.base_url, parts.uri.path());
        if let Some(query) = parts.uri.query() {
            url.push('?');
            url.push_str(query);
        }

        let mut builder = self.client.request(parts.method, url);
        for (name, value) in &parts.headers {
            if name == header::HOST || name == header::CONTENT_LENGTH {
                continue;
            }
            builder = builder.header(name, value);
        }

        let response = match builder.body(bytes.to_vec()).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "downstream forward failed");
                return (
                    StatusCode::BAD_GATEWAY,
                    Json(serde_json::json!({
                        "error": "downstream_unavailable",
                        "message": "downstream service did not answer"
                    })),
                )
                    .into_response();
            }
        };

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.unwrap_or_default();

        let mut out = Response::builder().status(status);
        for (name, value) in &headers {
            if name == header::TRANSFER_ENCODING || name == header::CONTENT_LENGTH {
                continue;
            }
            out = out.header(name, value);
        }
        out.body(Body::from(body)).unwrap_or_else(|_| {
            StatusCode::BAD_GATEWAY.into_response()
        })
    }
}

/// Fallback handler forwarding everything the gate allowed.
pub async fn proxy_handler(State(proxy): State<Arc<Proxy>>, req: Request) -> Response {
    proxy.forward(req).await
}
