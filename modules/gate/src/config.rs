//! Gate configuration.

use orggate_rebac::{BackoffStrategy, CheckRetry};
use serde::Deserialize;

/// Session-token validation settings.
#[derive(Clone, Debug, Deserialize)]
pub struct SessionConfig {
    /// HMAC secret used to verify session tokens.
    pub secret: String,
    /// Clock-skew leeway in seconds for `exp` validation.
    #[serde(default = "default_leeway_secs")]
    pub leeway_secs: u64,
}

fn default_leeway_secs() -> u64 {
    30
}

/// Retry policy for engine point checks. Checks only; tuple writes and
/// deletes are never retried.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CheckRetryConfig {
    pub max_attempts: u32,
    pub initial_ms: u64,
    pub max_ms: u64,
}

impl Default for CheckRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_ms: 50,
            max_ms: 500,
        }
    }
}

impl CheckRetryConfig {
    #[must_use]
    pub fn to_policy(&self) -> CheckRetry {
        CheckRetry {
            max_attempts: self.max_attempts.max(1),
            backoff: BackoffStrategy::Exponential {
                initial_ms: self.initial_ms,
                multiplier: 2.0,
                max_ms: self.max_ms,
            },
        }
    }
}

/// Gate settings, loaded by the server binary.
#[derive(Clone, Debug, Deserialize)]
pub struct GateConfig {
    /// Skip authentication entirely and inject a synthetic admin identity.
    /// Explicit, injected at construction; never enable outside local
    /// development.
    #[serde(default)]
    pub dev_mode: bool,

    pub session: SessionConfig,

    /// TTL in seconds for the programmatic-key lookup cache. Permission
    /// decisions are never cached.
    #[serde(default = "default_key_cache_ttl_secs")]
    pub key_cache_ttl_secs: u64,

    /// Route patterns that bypass the gate with no identity.
    #[serde(default = "default_public_routes")]
    pub public_routes: Vec<String>,

    #[serde(default)]
    pub check_retry: CheckRetryConfig,
}

fn default_key_cache_ttl_secs() -> u64 {
    15
}

fn default_public_routes() -> Vec<String> {
    vec![
        "/healthz".to_owned(),
        "/v1/auth/login".to_owned(),
        "/v1/auth/register".to_owned(),
    ]
}
