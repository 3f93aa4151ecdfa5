//! Credential validation entry point.
//!
//! Disambiguation is by shape: a bearer value starting with `sk-` is a
//! programmatic key, anything else is treated as a session token.

use axum::http::{HeaderMap, header};
use uuid::Uuid;

use orggate_security::Identity;

use super::error::CredentialError;
use super::key::{KeyLookupError, KeyStore, parse_key_token};
use super::session::SessionValidator;

/// Header naming the container a key credential addresses. Mandatory for
/// key credentials; optional scope hint for session credentials.
pub const SCOPE_HEADER: &str = "x-scope-id";

/// Why authentication did not produce an identity.
#[derive(Debug, thiserror::Error)]
pub enum AuthFailure {
    /// Rejected credential; maps to 401.
    #[error(transparent)]
    Credential(#[from] CredentialError),
    /// Key store unreachable; maps to 503, fail closed.
    #[error("credential store unavailable: {0}")]
    Datastore(sea_orm::DbErr),
}

impl From<KeyLookupError> for AuthFailure {
    fn from(e: KeyLookupError) -> Self {
        match e {
            KeyLookupError::Credential(c) => Self::Credential(c),
            KeyLookupError::Datastore(d) => Self::Datastore(d),
        }
    }
}

/// Resolves inbound credentials into an [`Identity`].
pub struct CredentialValidator {
    session: SessionValidator,
    keys: KeyStore,
}

impl CredentialValidator {
    #[must_use]
    pub fn new(session: SessionValidator, keys: KeyStore) -> Self {
        Self { session, keys }
    }

    #[must_use]
    pub fn key_store(&self) -> &KeyStore {
        &self.keys
    }

    /// Authenticate a request from its headers.
    ///
    /// # Errors
    /// `CredentialError` (401) on any rejected credential; `Datastore`
    /// (503) when the key store cannot be reached.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, AuthFailure> {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(CredentialError::MissingCredential)?;
        let token = bearer.strip_prefix("Bearer ").unwrap_or(bearer);

        if token.starts_with("sk-") {
            self.authenticate_key(token, headers).await
        } else {
            Ok(self.session.validate(token)?)
        }
    }

    async fn authenticate_key(
        &self,
        token: &str,
        headers: &HeaderMap,
    ) -> Result<Identity, AuthFailure> {
        let parsed = parse_key_token(token).ok_or(CredentialError::MalformedCredential)?;

        // Keys must name the container they address.
        let scope = scope_header(headers).ok_or(CredentialError::MalformedCredential)?;

        let record = self.keys.validate(&parsed).await?;
        tracing::debug!(key_id = %parsed.key_id, container_id = %record.container_id, requested_scope = %scope, "key credential accepted");
        Ok(Identity::key(
            record.user_id,
            record.container_id,
            record.root_id,
        ))
    }
}

/// Parse the scope header, if present and well-formed.
#[must_use]
pub fn scope_header(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(SCOPE_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
}
