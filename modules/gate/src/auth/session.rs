//! Session-token validation (HS256).

use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use orggate_security::Identity;

use crate::config::SessionConfig;

use super::error::CredentialError;

/// Claims carried by a session token. Issued by the identity provider;
/// this gate only consumes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject id.
    pub sub: Uuid,
    pub email: Option<String>,
    /// Root (tenant) binding, when the session is tenant-scoped.
    pub tenant_id: Option<Uuid>,
    /// Platform-admin flag; bypasses all container-scoped checks.
    #[serde(default)]
    pub admin: bool,
    pub exp: i64,
    pub iat: i64,
}

/// Verifies session tokens against the configured HMAC secret.
pub struct SessionValidator {
    key: DecodingKey,
    validation: Validation,
}

impl SessionValidator {
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_secs;
        validation.set_required_spec_claims(&["exp"]);
        Self {
            key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }

    /// Verify a token and resolve the caller identity.
    ///
    /// # Errors
    /// `ExpiredCredential` when `exp` has passed, `InvalidSignature` on a
    /// bad signature, `MalformedCredential` otherwise.
    pub fn validate(&self, token: &str) -> Result<Identity, CredentialError> {
        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => CredentialError::ExpiredCredential,
                ErrorKind::InvalidSignature => CredentialError::InvalidSignature,
                _ => CredentialError::MalformedCredential,
            })?;

        let claims = data.claims;
        let mut identity = Identity::user(claims.sub, claims.tenant_id, claims.admin);
        if let Some(email) = claims.email {
            identity = identity.with_email(email);
        }
        Ok(identity)
    }
}
