//! Credential validation: session tokens and programmatic keys.

pub mod error;
pub mod key;
pub mod session;
pub mod validator;

pub use error::CredentialError;
pub use key::{IssuedKey, KeyStore};
pub use session::{SessionClaims, SessionValidator};
pub use validator::CredentialValidator;
