//! Credential validation errors. Every variant maps to 401, never to a
//! silent allow.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// No credential was presented on a gated route.
    #[error("no credential presented")]
    MissingCredential,

    /// The credential could not be parsed, or a key credential omitted its
    /// required scope header.
    #[error("credential is malformed")]
    MalformedCredential,

    /// The session token's `exp` has passed.
    #[error("credential has expired")]
    ExpiredCredential,

    /// Signature or secret verification failed.
    #[error("credential signature is invalid")]
    InvalidSignature,

    /// The key is revoked or unknown. Unknown keys share this variant so
    /// the response does not reveal which ids exist.
    #[error("key is revoked")]
    RevokedKey,
}

impl CredentialError {
    /// Stable label for rejection bodies and logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::MalformedCredential => "malformed_credential",
            Self::ExpiredCredential => "expired_credential",
            Self::InvalidSignature => "invalid_signature",
            Self::RevokedKey => "revoked_key",
        }
    }
}
