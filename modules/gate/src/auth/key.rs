//! Programmatic keys: `sk-<key_id>-<secret>`.
//!
//! Secrets are stored as SHA-256 digests and compared in constant time.
//! Lookups go through a short-TTL cache; the cache holds the key record
//! only, never a permission decision, so a revocation becomes visible
//! within one TTL.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use rand::Rng;
use rand::distr::Alphanumeric;
use sea_orm::{DatabaseConnection, DbErr};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::infra::storage::entity::api_key;
use crate::infra::storage::repo::{self, NewKeyRow};

use super::error::CredentialError;

const KEY_ID_LEN: usize = 16;
const SECRET_LEN: usize = 40;

/// A key token split into its parts. The `key_id` segment never contains
/// `-`; the secret may.
#[derive(Debug, PartialEq, Eq)]
pub struct ParsedKey<'a> {
    pub key_id: &'a str,
    pub secret: &'a str,
}

/// Parse a `sk-<key_id>-<secret>` token.
#[must_use]
pub fn parse_key_token(token: &str) -> Option<ParsedKey<'_>> {
    let rest = token.strip_prefix("sk-")?;
    let (key_id, secret) = rest.split_once('-')?;
    if key_id.is_empty() || secret.is_empty() {
        return None;
    }
    Some(ParsedKey { key_id, secret })
}

fn digest(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

fn digest_matches(stored_hash: &str, presented_secret: &str) -> bool {
    let presented_hash = digest(presented_secret);
    if stored_hash.len() != presented_hash.len() {
        return false;
    }
    stored_hash
        .as_bytes()
        .ct_eq(presented_hash.as_bytes())
        .into()
}

/// A freshly minted key. The full token is only available here; the
/// stored record keeps the digest.
pub struct IssuedKey {
    pub token: String,
    pub record: api_key::Model,
}

struct CachedKey {
    record: api_key::Model,
    fetched_at: Instant,
}

/// Key persistence plus the short-TTL lookup cache.
pub struct KeyStore {
    db: DatabaseConnection,
    cache: DashMap<String, CachedKey>,
    ttl: Duration,
}

impl KeyStore {
    #[must_use]
    pub fn new(db: DatabaseConnection, ttl: Duration) -> Self {
        Self {
            db,
            cache: DashMap::new(),
            ttl,
        }
    }

    /// Mint a key bound to one container. Returns the only copy of the
    /// full token.
    ///
    /// # Errors
    /// Database failures.
    pub async fn issue(
        &self,
        user_id: Uuid,
        container_id: Uuid,
        root_id: Uuid,
    ) -> Result<IssuedKey, DbErr> {
        let key_id = random_token(KEY_ID_LEN);
        let secret = random_token(SECRET_LEN);

        let record = repo::insert_key(
            &self.db,
            NewKeyRow {
                key_id: key_id.clone(),
                secret_hash: digest(&secret),
                user_id,
                container_id,
                root_id,
            },
        )
        .await?;

        Ok(IssuedKey {
            token: format!("sk-{key_id}-{secret}"),
            record,
        })
    }

    /// Revoke a key and drop it from the cache.
    ///
    /// # Errors
    /// Database failures.
    pub async fn revoke(&self, key_id: &str) -> Result<bool, DbErr> {
        let revoked = repo::revoke_key(&self.db, key_id).await?;
        self.cache.remove(key_id);
        Ok(revoked)
    }

    /// Validate a parsed key against the stored record.
    ///
    /// Unknown and revoked keys share `RevokedKey` so the response does not
    /// reveal which key ids exist.
    ///
    /// # Errors
    /// `CredentialError` on rejection; `DbErr` when the datastore is
    /// unreachable (surfaced as a dependency failure, not a 401).
    pub async fn validate(
        &self,
        key: &ParsedKey<'_>,
    ) -> Result<api_key::Model, KeyLookupError> {
        let record = match self.cached(key.key_id) {
            Some(record) => record,
            None => {
                let record = repo::find_by_key_id(&self.db, key.key_id)
                    .await?
                    .ok_or(KeyLookupError::Credential(CredentialError::RevokedKey))?;
                self.cache.insert(
                    key.key_id.to_owned(),
                    CachedKey {
                        record: record.clone(),
                        fetched_at: Instant::now(),
                    },
                );
                record
            }
        };

        if record.revoked {
            return Err(KeyLookupError::Credential(CredentialError::RevokedKey));
        }
        if !digest_matches(&record.secret_hash, key.secret) {
            return Err(KeyLookupError::Credential(CredentialError::InvalidSignature));
        }
        Ok(record)
    }

    fn cached(&self, key_id: &str) -> Option<api_key::Model> {
        let entry = self.cache.get(key_id)?;
        if entry.fetched_at.elapsed() > self.ttl {
            drop(entry);
            self.cache.remove(key_id);
            return None;
        }
        Some(entry.record.clone())
    }
}

/// Outcome of a key lookup: a credential rejection or a datastore failure.
#[derive(Debug, thiserror::Error)]
pub enum KeyLookupError {
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error("key store unavailable: {0}")]
    Datastore(#[from] DbErr),
}

fn random_token(len: usize) -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_tokens() {
        let parsed = parse_key_token("sk-abc123-s3cr-et");
        assert_eq!(
            parsed,
            Some(ParsedKey {
                key_id: "abc123",
                secret: "s3cr-et"
            })
        );
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert_eq!(parse_key_token("abc123"), None);
        assert_eq!(parse_key_token("sk-"), None);
        assert_eq!(parse_key_token("sk-abc123"), None);
        assert_eq!(parse_key_token("sk--secret"), None);
        assert_eq!(parse_key_token("sk-abc123-"), None);
    }

    #[test]
    fn digest_comparison_requires_exact_secret() {
        let stored = digest("topsecret");
        assert!(digest_matches(&stored, "topsecret"));
        assert!(!digest_matches(&stored, "topsecreT"));
        assert!(!digest_matches("short", "topsecret"));
    }

    #[test]
    fn random_tokens_have_no_separator() {
        let t = random_token(64);
        assert_eq!(t.len(), 64);
        assert!(!t.contains('-'));
    }
}
