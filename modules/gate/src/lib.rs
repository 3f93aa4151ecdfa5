//! Gate module: credential validation, permission resolution and the
//! per-request allow/deny decision.
//!
//! The gate sits in front of every routed request. It authenticates the
//! caller (session token or programmatic key), resolves the addressed
//! container, asks the relationship engine for a point check, and either
//! forwards the request with trusted identity headers or rejects it with a
//! structured body. Decisions are computed fresh per request; only the
//! credential lookup step is cached, briefly.

pub mod auth;
pub mod config;
pub mod infra;
pub mod middleware;
pub mod proxy;
pub mod resolver;

pub use auth::error::CredentialError;
pub use auth::validator::CredentialValidator;
pub use config::GateConfig;
pub use middleware::{GateState, gate_middleware};
pub use resolver::PermissionResolver;
